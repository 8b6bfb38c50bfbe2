//! Mock port adapters for integration tests.
//!
//! Clocks hand out shared handles so a test can move time forward after
//! the adapter has been moved into the service.  Storage counts writes
//! and can be told to fail through a shared switch.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use bindicator::app::commands::{Command, CommandChannel};
use bindicator::app::ports::{
    CalendarError, CalendarPort, MonotonicClock, StorageError, StoragePort, WallClock,
};
use bindicator::app::service::Bindicator;
use bindicator::config::BindicatorConfig;
use bindicator::fsm::CollectionState;
use chrono::{DateTime, TimeZone, Utc};

// ── Storage ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    map: HashMap<String, Vec<u8>>,
    pub writes: usize,
    fail_writes: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose writes fail until the returned switch is cleared.
    pub fn failing() -> (Self, Arc<AtomicBool>) {
        let storage = Self::default();
        storage.fail_writes.store(true, Ordering::SeqCst);
        let switch = Arc::clone(&storage.fail_writes);
        (storage, switch)
    }

    /// Raw bytes as written, for asserting on the on-flash encoding.
    pub fn raw(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.map
            .get(&format!("{}::{}", namespace, key))
            .map(Vec::as_slice)
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .map
            .get(&format!("{}::{}", namespace, key))
            .ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.map
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.map.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.map.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── Clocks ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeWallClock(Arc<Mutex<Option<DateTime<Utc>>>>);

#[allow(dead_code)]
impl FakeWallClock {
    pub fn set(&self, now: Option<DateTime<Utc>>) {
        *self.0.lock().unwrap() = now;
    }

    pub fn set_utc(&self, y: i32, mo: u32, d: u32, h: u32, mi: u32) {
        self.set(Some(utc(y, mo, d, h, mi)));
    }
}

impl WallClock for FakeWallClock {
    fn now_utc(&self) -> Option<DateTime<Utc>> {
        *self.0.lock().unwrap()
    }
}

#[derive(Clone, Default)]
pub struct FakeMonotonic(Arc<AtomicU32>);

#[allow(dead_code)]
impl FakeMonotonic {
    pub fn set(&self, ms: u32) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u32) {
        let now = self.0.load(Ordering::SeqCst);
        self.0.store(now.wrapping_add(ms), Ordering::SeqCst);
    }
}

impl MonotonicClock for FakeMonotonic {
    fn millis(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

// ── Calendar ──────────────────────────────────────────────────

/// Replays queued answers; an empty queue answers "no collection".
#[derive(Default)]
pub struct ScriptedCalendar {
    pub answers: VecDeque<Result<CollectionState, CalendarError>>,
    pub calls: usize,
}

#[allow(dead_code)]
impl ScriptedCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, answer: Result<CollectionState, CalendarError>) {
        self.answers.push_back(answer);
    }
}

impl CalendarPort for ScriptedCalendar {
    fn fetch_collection(&mut self) -> Result<CollectionState, CalendarError> {
        self.calls += 1;
        self.answers
            .pop_front()
            .unwrap_or(Ok(CollectionState::NoCollection))
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type TestBindicator<'a> =
    Bindicator<MemoryStorage, &'a CommandChannel, FakeWallClock, FakeMonotonic>;

/// Service under test plus handles on its clocks.
pub struct Rig<'a> {
    pub bindicator: TestBindicator<'a>,
    pub wall: FakeWallClock,
    pub mono: FakeMonotonic,
}

#[allow(dead_code)]
pub fn rig(channel: &CommandChannel) -> Rig<'_> {
    rig_with(channel, &BindicatorConfig::default(), MemoryStorage::new())
}

pub fn rig_with<'a>(
    channel: &'a CommandChannel,
    config: &BindicatorConfig,
    storage: MemoryStorage,
) -> Rig<'a> {
    let wall = FakeWallClock::default();
    let mono = FakeMonotonic::default();
    let bindicator = Bindicator::new(config, storage, channel, wall.clone(), mono.clone());
    Rig {
        bindicator,
        wall,
        mono,
    }
}

/// Everything currently queued on `channel`, oldest first.
pub fn drain(channel: &CommandChannel) -> Vec<Command> {
    let mut out = Vec::new();
    while let Ok(command) = channel.try_receive() {
        out.push(command);
    }
    out
}
