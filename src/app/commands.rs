//! Display commands and the bounded command channel.
//!
//! Every accepted status transition produces exactly one [`Command`].
//! The rendering layer drains [`COMMAND_CHANNEL`] and decides what to draw.
//!
//! ```text
//! ┌──────────────┐   Command (try_send)   ┌──────────────┐
//! │  Bindicator  │───────────────────────▶│ Display loop │
//! │ (any task)   │   depth 10, drop-new   │ (consumer)   │
//! └──────────────┘                        └──────────────┘
//! ```
//!
//! "No command pending" is `None` from `try_receive`; there is no
//! sentinel variant.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::fsm::CollectionStatus;

/// Display intent, one per [`CollectionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ShowNeither,
    ShowRecycling,
    ShowRubbish,
    ShowCompleted,
    ShowLoading,
    ShowSetupMode,
    ShowErrorApi,
    ShowErrorWifi,
}

impl From<CollectionStatus> for Command {
    fn from(status: CollectionStatus) -> Self {
        match status {
            CollectionStatus::NoCollection => Self::ShowNeither,
            CollectionStatus::RecyclingDue => Self::ShowRecycling,
            CollectionStatus::RubbishDue => Self::ShowRubbish,
            CollectionStatus::Completed => Self::ShowCompleted,
            CollectionStatus::Loading => Self::ShowLoading,
            CollectionStatus::Setup => Self::ShowSetupMode,
            CollectionStatus::ErrorApi => Self::ShowErrorApi,
            CollectionStatus::ErrorWifi => Self::ShowErrorWifi,
        }
    }
}

/// Pending commands the channel holds before sends are dropped.
pub const COMMAND_QUEUE_DEPTH: usize = 10;

/// Channel type shared by the state machine (producer) and display (consumer).
pub type CommandChannel = Channel<CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH>;

/// Process-wide command channel: state machine → display task.
pub static COMMAND_CHANNEL: CommandChannel = Channel::new();
