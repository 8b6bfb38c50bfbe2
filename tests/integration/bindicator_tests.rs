//! Integration tests for the Bindicator state machine against mock ports.
//!
//! Times are chosen in January (GMT, local == UTC) unless a test is about
//! summer time.

use std::sync::atomic::Ordering;

use super::mock_ports::{MemoryStorage, drain, rig, rig_with, utc};

use bindicator::app::commands::{COMMAND_QUEUE_DEPTH, Command, CommandChannel};
use bindicator::app::persistence::{self, KEY_COMPLETED_TIME, KEY_STATE, NAMESPACE};
use bindicator::app::ports::StoragePort;
use bindicator::config::BindicatorConfig;
use bindicator::fsm::{CollectionState, CollectionStatus, ErrorKind};

fn stored(status: CollectionStatus, completed_at: i64) -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    persistence::save(&mut storage, status, completed_at).unwrap();
    storage.writes = 0;
    storage
}

// ── Idempotence ───────────────────────────────────────────────

#[test]
fn repeated_calendar_answer_is_a_no_op() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);

    r.bindicator.update_from_calendar(CollectionState::RecyclingDue);
    let writes = r.bindicator.storage().writes;
    r.bindicator.update_from_calendar(CollectionState::RecyclingDue);

    assert_eq!(drain(&channel), vec![Command::ShowRecycling]);
    assert_eq!(r.bindicator.storage().writes, writes);
}

#[test]
fn double_button_press_emits_once() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.wall.set_utc(2024, 1, 11, 8, 0);

    r.bindicator.update_from_calendar(CollectionState::RubbishDue);
    r.bindicator.handle_button_press();
    r.bindicator.handle_button_press();

    assert_eq!(
        drain(&channel),
        vec![Command::ShowRubbish, Command::ShowCompleted]
    );
}

// ── Completion gating ─────────────────────────────────────────

#[test]
fn button_ignored_unless_a_bin_is_due() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.wall.set_utc(2024, 1, 11, 8, 0);

    for step in 0..5 {
        match step {
            0 => {}
            1 => r.bindicator.update_from_calendar(CollectionState::NoCollection),
            2 => r.bindicator.enter_setup_mode(),
            3 => r.bindicator.set_error_state(ErrorKind::Wifi),
            _ => r.bindicator.set_error_state(ErrorKind::Api),
        }
        let before = r.bindicator.status();
        drain(&channel);
        let writes = r.bindicator.storage().writes;

        r.bindicator.handle_button_press();

        assert_eq!(r.bindicator.status(), before);
        assert_eq!(r.bindicator.completed_at(), 0);
        assert!(drain(&channel).is_empty(), "no command from {}", before);
        assert_eq!(r.bindicator.storage().writes, writes);
    }
}

// ── Reset-time asymmetry ──────────────────────────────────────

#[test]
fn completion_before_reset_hour_resets_same_day() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.wall.set_utc(2024, 1, 11, 2, 0);
    r.bindicator.update_from_calendar(CollectionState::RecyclingDue);
    r.bindicator.handle_button_press();
    drain(&channel);

    r.wall.set_utc(2024, 1, 11, 2, 59);
    assert!(!r.bindicator.should_check_calendar());
    assert!(r.bindicator.is_bin_taken_out());

    r.wall.set_utc(2024, 1, 11, 3, 0);
    assert!(r.bindicator.should_check_calendar());
    assert_eq!(r.bindicator.status(), CollectionStatus::Loading);
    assert_eq!(r.bindicator.completed_at(), 0);
    assert_eq!(drain(&channel), vec![Command::ShowLoading]);
}

#[test]
fn completion_after_reset_hour_waits_for_next_day() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.wall.set_utc(2024, 1, 11, 15, 0);
    r.bindicator.update_from_calendar(CollectionState::RubbishDue);
    r.bindicator.handle_button_press();

    for (d, h, mi) in [(11, 15, 1), (11, 23, 59), (12, 0, 0), (12, 2, 59)] {
        r.wall.set_utc(2024, 1, d, h, mi);
        assert!(
            !r.bindicator.should_check_calendar(),
            "must still wait at {d} {h:02}:{mi:02}"
        );
    }

    r.wall.set_utc(2024, 1, 12, 3, 0);
    assert!(r.bindicator.should_check_calendar());
    assert_eq!(r.bindicator.status(), CollectionStatus::Loading);
}

#[test]
fn reset_hour_follows_summer_time() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    // 16:00 BST
    r.wall.set_utc(2024, 7, 11, 15, 0);
    r.bindicator.update_from_calendar(CollectionState::RecyclingDue);
    r.bindicator.handle_button_press();

    // 03:00 BST on the 12th is 02:00 UTC.
    r.wall.set_utc(2024, 7, 12, 1, 59);
    assert!(!r.bindicator.should_check_calendar());
    r.wall.set_utc(2024, 7, 12, 2, 0);
    assert!(r.bindicator.should_check_calendar());
}

#[test]
fn configured_reset_hour_is_honoured() {
    let channel = CommandChannel::new();
    let config = BindicatorConfig {
        reset_hour: 7,
        ..Default::default()
    };
    let mut r = rig_with(&channel, &config, MemoryStorage::new());
    r.wall.set_utc(2024, 1, 11, 5, 0);
    r.bindicator.update_from_calendar(CollectionState::RubbishDue);
    r.bindicator.handle_button_press();

    r.wall.set_utc(2024, 1, 11, 6, 59);
    assert!(!r.bindicator.should_check_calendar());
    r.wall.set_utc(2024, 1, 11, 7, 0);
    assert!(r.bindicator.should_check_calendar());
}

// ── Clock unavailability ──────────────────────────────────────

#[test]
fn completed_without_wall_clock_never_resets() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.wall.set_utc(2024, 1, 11, 8, 0);
    r.bindicator.update_from_calendar(CollectionState::RecyclingDue);
    r.bindicator.handle_button_press();

    r.wall.set(None);
    assert!(!r.bindicator.should_check_calendar());
    assert!(r.bindicator.is_bin_taken_out());
    assert_eq!(r.bindicator.completed_at(), utc(2024, 1, 11, 8, 0).timestamp());
}

#[test]
fn completion_time_backfilled_once_clock_syncs() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.bindicator.update_from_calendar(CollectionState::RecyclingDue);
    r.bindicator.handle_button_press();
    assert_eq!(r.bindicator.completed_at(), 0);
    drain(&channel);

    r.wall.set_utc(2024, 1, 11, 9, 30);
    assert!(!r.bindicator.should_check_calendar());
    assert_eq!(
        r.bindicator.completed_at(),
        utc(2024, 1, 11, 9, 30).timestamp()
    );
    assert!(drain(&channel).is_empty(), "backfill emits nothing");
    assert_eq!(
        persistence::load(r.bindicator.storage()).completed_at,
        utc(2024, 1, 11, 9, 30).timestamp()
    );

    r.wall.set_utc(2024, 1, 12, 3, 0);
    assert!(r.bindicator.should_check_calendar());
}

// ── Error retry backoff ───────────────────────────────────────

#[test]
fn error_waits_full_retry_interval() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.mono.set(1_000);
    r.bindicator.set_error_state(ErrorKind::Wifi);

    assert!(r.bindicator.is_in_error_state());
    assert_eq!(drain(&channel), vec![Command::ShowErrorWifi]);
    assert!(!r.bindicator.should_check_calendar());

    r.mono.advance(299_999);
    assert!(!r.bindicator.should_check_calendar());
    r.mono.advance(1);
    assert!(r.bindicator.should_check_calendar());
    assert_eq!(r.bindicator.status(), CollectionStatus::ErrorWifi);
}

#[test]
fn error_backoff_survives_counter_wraparound() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    let epoch = u32::MAX - 100_000;
    r.mono.set(epoch);
    r.bindicator.set_error_state(ErrorKind::Api);

    r.mono.set(epoch.wrapping_add(150_000));
    assert!(!r.bindicator.should_check_calendar());

    r.mono.set(epoch.wrapping_add(300_000));
    assert!(r.bindicator.should_check_calendar());
}

#[test]
fn repeated_error_refreshes_retry_clock_without_new_command() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.bindicator.set_error_state(ErrorKind::Api);
    r.mono.set(200_000);
    r.bindicator.set_error_state(ErrorKind::Api);

    assert_eq!(drain(&channel), vec![Command::ShowErrorApi]);
    r.mono.set(300_000);
    assert!(!r.bindicator.should_check_calendar());
    r.mono.set(500_000);
    assert!(r.bindicator.should_check_calendar());
}

#[test]
fn switching_error_kind_emits_new_command() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.bindicator.set_error_state(ErrorKind::Wifi);
    r.bindicator.set_error_state(ErrorKind::Api);
    assert_eq!(
        drain(&channel),
        vec![Command::ShowErrorWifi, Command::ShowErrorApi]
    );
}

#[test]
fn clear_error_state_returns_to_loading() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.bindicator.update_from_calendar(CollectionState::NoCollection);
    r.bindicator.set_error_state(ErrorKind::Wifi);
    drain(&channel);

    r.bindicator.clear_error_state();
    assert_eq!(r.bindicator.status(), CollectionStatus::Loading);
    assert_eq!(drain(&channel), vec![Command::ShowLoading]);
    assert!(r.bindicator.should_check_calendar());

    r.bindicator.update_from_calendar(CollectionState::RubbishDue);
    drain(&channel);
    r.bindicator.clear_error_state();
    assert_eq!(r.bindicator.status(), CollectionStatus::RubbishDue);
    assert!(drain(&channel).is_empty());
}

#[test]
fn calendar_success_recovers_from_error() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.bindicator.set_error_state(ErrorKind::Api);
    r.bindicator.update_from_calendar(CollectionState::RubbishDue);
    assert!(!r.bindicator.is_in_error_state());
    assert_eq!(
        drain(&channel),
        vec![Command::ShowErrorApi, Command::ShowRubbish]
    );
}

// ── Restart reconciliation ────────────────────────────────────

#[test]
fn stale_completion_rolls_over_on_start() {
    let channel = CommandChannel::new();
    let storage = stored(
        CollectionStatus::Completed,
        utc(2024, 1, 10, 15, 0).timestamp(),
    );
    let mut r = rig_with(&channel, &BindicatorConfig::default(), storage);
    r.wall.set_utc(2024, 1, 12, 10, 0);

    r.bindicator.initialize_from_storage();

    assert_eq!(r.bindicator.status(), CollectionStatus::Loading);
    assert_eq!(r.bindicator.completed_at(), 0);
    assert_eq!(drain(&channel), vec![Command::ShowLoading]);
    let after = persistence::load(r.bindicator.storage());
    assert_eq!(after.status, CollectionStatus::Loading);
    assert_eq!(after.completed_at, 0);
}

#[test]
fn fresh_completion_survives_restart() {
    let channel = CommandChannel::new();
    let done = utc(2024, 1, 11, 15, 0).timestamp();
    let storage = stored(CollectionStatus::Completed, done);
    let mut r = rig_with(&channel, &BindicatorConfig::default(), storage);
    r.wall.set_utc(2024, 1, 11, 20, 0);

    r.bindicator.initialize_from_storage();

    assert!(r.bindicator.is_bin_taken_out());
    assert_eq!(r.bindicator.completed_at(), done);
    assert_eq!(drain(&channel), vec![Command::ShowCompleted]);
    assert_eq!(r.bindicator.storage().writes, 0);
}

#[test]
fn completion_kept_on_start_without_clock() {
    let channel = CommandChannel::new();
    let storage = stored(
        CollectionStatus::Completed,
        utc(2024, 1, 1, 12, 0).timestamp(),
    );
    let mut r = rig_with(&channel, &BindicatorConfig::default(), storage);

    r.bindicator.initialize_from_storage();

    assert!(r.bindicator.is_bin_taken_out());
    assert_eq!(drain(&channel), vec![Command::ShowCompleted]);
}

#[test]
fn stored_error_restarts_in_loading_with_expired_retry() {
    let channel = CommandChannel::new();
    let storage = stored(CollectionStatus::ErrorWifi, 0);
    let mut r = rig_with(&channel, &BindicatorConfig::default(), storage);
    r.mono.set(5);

    r.bindicator.initialize_from_storage();

    assert_eq!(r.bindicator.status(), CollectionStatus::Loading);
    assert_eq!(drain(&channel), vec![Command::ShowLoading]);
    assert!(r.bindicator.should_check_calendar());
}

#[test]
fn stored_due_status_is_reannounced() {
    let channel = CommandChannel::new();
    let storage = stored(CollectionStatus::RubbishDue, 0);
    let mut r = rig_with(&channel, &BindicatorConfig::default(), storage);

    r.bindicator.initialize_from_storage();

    assert_eq!(r.bindicator.status(), CollectionStatus::RubbishDue);
    assert_eq!(drain(&channel), vec![Command::ShowRubbish]);
    assert_eq!(r.bindicator.storage().writes, 0);
}

#[test]
fn empty_or_corrupt_storage_starts_loading() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.bindicator.initialize_from_storage();
    assert_eq!(r.bindicator.status(), CollectionStatus::Loading);
    assert_eq!(drain(&channel), vec![Command::ShowLoading]);

    let mut storage = MemoryStorage::new();
    storage.write(NAMESPACE, KEY_STATE, &[99]).unwrap();
    let mut r = rig_with(&channel, &BindicatorConfig::default(), storage);
    r.bindicator.initialize_from_storage();
    assert_eq!(r.bindicator.status(), CollectionStatus::Loading);
}

// ── End-to-end ────────────────────────────────────────────────

#[test]
fn recycling_completed_then_rubbish() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.wall.set_utc(2024, 1, 11, 7, 45);

    r.bindicator.update_from_calendar(CollectionState::RecyclingDue);
    assert_eq!(drain(&channel), vec![Command::ShowRecycling]);

    r.bindicator.handle_button_press();
    assert_eq!(drain(&channel), vec![Command::ShowCompleted]);
    assert!(r.bindicator.is_bin_taken_out());
    assert_eq!(
        r.bindicator.completed_at(),
        utc(2024, 1, 11, 7, 45).timestamp()
    );

    r.bindicator.update_from_calendar(CollectionState::RubbishDue);
    assert_eq!(drain(&channel), vec![Command::ShowRubbish]);
    assert!(!r.bindicator.is_bin_taken_out());
    assert_eq!(r.bindicator.completed_at(), 0);

    let storage = r.bindicator.storage();
    assert_eq!(storage.raw(NAMESPACE, KEY_STATE), Some(&[2u8][..]));
    assert_eq!(storage.raw(NAMESPACE, KEY_COMPLETED_TIME), Some(&[0u8][..]));
}

// ── Setup suppression ─────────────────────────────────────────

#[test]
fn setup_mode_suppresses_polling_and_retries() {
    let channel = CommandChannel::new();
    let mut r = rig(&channel);
    r.bindicator.set_error_state(ErrorKind::Wifi);
    r.bindicator.enter_setup_mode();
    assert!(r.bindicator.is_in_setup_mode());

    r.mono.advance(10_000_000);
    r.wall.set_utc(2030, 1, 1, 12, 0);
    assert!(!r.bindicator.should_check_calendar());

    r.bindicator.exit_setup_mode();
    assert_eq!(r.bindicator.status(), CollectionStatus::Loading);
    assert!(r.bindicator.should_check_calendar());
    assert_eq!(
        drain(&channel),
        vec![
            Command::ShowErrorWifi,
            Command::ShowSetupMode,
            Command::ShowLoading
        ]
    );
}

// ── Failure semantics ─────────────────────────────────────────

#[test]
fn persistence_failure_keeps_in_memory_transition() {
    let channel = CommandChannel::new();
    let (storage, failing) = MemoryStorage::failing();
    let mut r = rig_with(&channel, &BindicatorConfig::default(), storage);

    r.bindicator.update_from_calendar(CollectionState::RecyclingDue);

    assert_eq!(r.bindicator.status(), CollectionStatus::RecyclingDue);
    assert_eq!(drain(&channel), vec![Command::ShowRecycling]);
    assert_eq!(r.bindicator.storage().writes, 0);

    failing.store(false, Ordering::SeqCst);
    r.bindicator.update_from_calendar(CollectionState::NoCollection);
    assert_eq!(
        persistence::load(r.bindicator.storage()).status,
        CollectionStatus::NoCollection
    );
}

#[test]
fn full_channel_drops_command_but_keeps_status() {
    let channel = CommandChannel::new();
    for _ in 0..COMMAND_QUEUE_DEPTH {
        channel.try_send(Command::ShowLoading).unwrap();
    }
    let mut r = rig(&channel);

    r.bindicator.update_from_calendar(CollectionState::RubbishDue);

    assert_eq!(r.bindicator.status(), CollectionStatus::RubbishDue);
    let queued = drain(&channel);
    assert_eq!(queued.len(), COMMAND_QUEUE_DEPTH);
    assert!(!queued.contains(&Command::ShowRubbish));
}
