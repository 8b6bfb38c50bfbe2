//! Serial maintenance console.
//!
//! One command per line.  Output is returned as text so the UART loop in
//! `main` stays a thin read/print shell.

use core::fmt::Write as _;

use chrono::DateTime;

use crate::app::ports::{CommandSink, MonotonicClock, StoragePort, WallClock};
use crate::app::shared::SharedBindicator;
use crate::config::BindicatorConfig;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Status,
    Prefs,
    Setup,
    Clear,
}

impl ConsoleCommand {
    /// Parse a trimmed, case-insensitive line.  `None` for anything else.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "help" | "?" => Some(Self::Help),
            "status" => Some(Self::Status),
            "prefs" => Some(Self::Prefs),
            "setup" => Some(Self::Setup),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }
}

const HELP: &str = "\
Available commands:
  status - Show collection status
  prefs  - Show active configuration
  setup  - Toggle setup mode
  clear  - Forget the stored status and reload
  help   - Show this help message
";

fn secret(value: &str) -> &'static str {
    if value.is_empty() { "(empty)" } else { "(set)" }
}

fn or_empty(value: &str) -> &str {
    if value.is_empty() { "(empty)" } else { value }
}

/// Run `command` and return the text to print.
pub fn execute<S, C, W, M>(
    command: ConsoleCommand,
    bindicator: &SharedBindicator<S, C, W, M>,
    cfg: &BindicatorConfig,
) -> Result<String, Error>
where
    S: StoragePort,
    C: CommandSink,
    W: WallClock,
    M: MonotonicClock,
{
    let mut out = String::new();
    match command {
        ConsoleCommand::Help => out.push_str(HELP),

        ConsoleCommand::Status => {
            let snap = bindicator.snapshot();
            let _ = writeln!(out, "status:       {}", snap.status);
            match DateTime::from_timestamp(snap.completed_at, 0) {
                Some(t) if snap.completed_at != 0 => {
                    let _ = writeln!(out, "completed_at: {}", t.with_timezone(&snap.timezone));
                }
                _ => {
                    let _ = writeln!(out, "completed_at: -");
                }
            }
            let _ = writeln!(out, "error:        {}", snap.status.is_error());
            if let Some(ms) = snap.ms_since_error {
                let _ = writeln!(out, "since_error:  {} s", ms / 1000);
            }
            let _ = writeln!(out, "reset:        {:02}:00 {}", snap.reset_hour, snap.timezone);
        }

        ConsoleCommand::Prefs => {
            let _ = writeln!(out, "reset_hour:        {}", cfg.reset_hour);
            let _ = writeln!(out, "timezone:          {}", cfg.timezone);
            let _ = writeln!(out, "retry_interval_ms: {}", cfg.error_retry_interval_ms);
            let _ = writeln!(out, "check_interval_ms: {}", cfg.calendar_check_interval_ms);
            let _ = writeln!(out, "long_press_ms:     {}", cfg.long_press_ms);
            let _ = writeln!(out, "wifi_ssid:         {}", or_empty(&cfg.wifi_ssid));
            let _ = writeln!(out, "wifi_pass:         {}", secret(&cfg.wifi_password));
            let _ = writeln!(out, "calendar_url:      {}", or_empty(&cfg.calendar_url));
            let _ = writeln!(out, "api_token:         {}", secret(&cfg.api_token));
        }

        ConsoleCommand::Setup => {
            let entered = bindicator.toggle_setup_mode();
            out.push_str(if entered {
                "Setup mode entered\n"
            } else {
                "Setup mode exited\n"
            });
        }

        ConsoleCommand::Clear => {
            bindicator.forget_persisted_state()?;
            let _ = writeln!(out, "Stored status cleared, now {}", bindicator.status());
        }
    }
    Ok(out)
}
