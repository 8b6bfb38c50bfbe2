//! Bindicator Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  NvsAdapter        Esp32TimeAdapter      CalendarClient        │
//! │  (Config+Storage)  (Wall+Monotonic)      (CalendarPort)        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          SharedBindicator (pure logic + lock)          │    │
//! │  │  status · reset hour · retry backoff                   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  poller thread (5 s) · console thread · main loop (20 ms)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{PinDriver, Pull};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{error, info, warn};

use bindicator::adapters::calendar_client::CalendarClient;
use bindicator::adapters::nvs::NvsAdapter;
use bindicator::adapters::time::Esp32TimeAdapter;
use bindicator::app::commands::{COMMAND_CHANNEL, CommandChannel};
use bindicator::app::poller::CalendarPoller;
use bindicator::app::ports::{ConfigPort, MonotonicClock};
use bindicator::app::service::Bindicator;
use bindicator::app::shared::SharedBindicator;
use bindicator::config::BindicatorConfig;
use bindicator::console::{self, ConsoleCommand};
use bindicator::drivers::button::{ButtonDriver, ButtonEvent};
use bindicator::drivers::watchdog::Watchdog;
use bindicator::error::Error;
use bindicator::pins;

type Shared =
    SharedBindicator<NvsAdapter, &'static CommandChannel, Esp32TimeAdapter, Esp32TimeAdapter>;

const MAIN_LOOP_MS: u64 = 20;
const POLL_TICK_MS: u64 = 5_000;
const WIFI_CONNECT_ATTEMPTS: u32 = 3;
/// TLS handshakes need a larger stack than the default pthread one.
const POLLER_STACK_BYTES: usize = 16 * 1024;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Bindicator v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), status will not persist this session", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            BindicatorConfig::default()
        }
    };

    // ── 3. Network + time sync ────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let mut esp_wifi = EspWifi::new(peripherals.modem, sys_loop.clone(), None)?;
    if config.has_wifi_credentials() {
        if let Err(e) = connect_wifi(&mut esp_wifi, sys_loop, &config) {
            // The poller reports ERROR_WIFI until the station comes up.
            warn!("WiFi unavailable: {:#}", e);
        }
    } else {
        warn!("No WiFi credentials stored; configure via setup mode");
    }
    let _sntp = EspSntp::new_default().context("failed to start SNTP")?;

    // ── 4. Core service ───────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let bindicator = Arc::new(Shared::new(Bindicator::new(
        &config,
        nvs,
        &COMMAND_CHANNEL,
        clock.clone(),
        clock.clone(),
    )));
    bindicator.initialize_from_storage();

    // ── 5. Worker threads ─────────────────────────────────────
    {
        let bindicator = Arc::clone(&bindicator);
        let mut calendar = CalendarClient::new(&config, clock.clone());
        let mut poller = CalendarPoller::new(config.calendar_check_interval_ms);
        let clock = clock.clone();
        thread::Builder::new()
            .name("poller".into())
            .stack_size(POLLER_STACK_BYTES)
            .spawn(move || {
                loop {
                    let outcome = poller.tick(clock.millis(), &*bindicator, &mut calendar);
                    log::debug!("Poller: {:?}", outcome);
                    thread::sleep(Duration::from_millis(POLL_TICK_MS));
                }
            })?;
    }
    {
        let bindicator = Arc::clone(&bindicator);
        let config = config.clone();
        thread::Builder::new()
            .name("console".into())
            .spawn(move || run_console(&bindicator, &config))?;
    }

    // ── 6. Button + display loop ──────────────────────────────
    let mut button_pin = PinDriver::input(peripherals.pins.gpio0)?;
    button_pin.set_pull(Pull::Up)?;
    let mut button = ButtonDriver::new(config.long_press_ms);
    info!(
        "Button on GPIO{}, matrix on GPIO{}",
        pins::BUTTON_GPIO,
        pins::MATRIX_DATA_GPIO
    );

    // Subscribed only now: WiFi association above may block for longer
    // than the watchdog timeout.
    let watchdog = Watchdog::default();

    info!("System ready. Entering main loop.");

    loop {
        match button.poll(&mut button_pin, clock.millis()) {
            Some(ButtonEvent::ShortPress) => bindicator.handle_button_press(),
            Some(ButtonEvent::LongPress) => {
                let entered = bindicator.toggle_setup_mode();
                info!("Long press: setup mode {}", if entered { "on" } else { "off" });
            }
            None => {}
        }

        // Rendering is external; it consumes these display intents.
        while let Ok(command) = COMMAND_CHANNEL.try_receive() {
            info!("Display <- {:?}", command);
        }

        watchdog.feed();
        thread::sleep(Duration::from_millis(MAIN_LOOP_MS));
    }
}

// ── WiFi ──────────────────────────────────────────────────────

fn connect_wifi(
    esp_wifi: &mut EspWifi<'static>,
    sys_loop: EspSystemEventLoop,
    config: &BindicatorConfig,
) -> Result<()> {
    let mut wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;

    let auth_method = if config.wifi_password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPAWPA2Personal
    };
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: config
            .wifi_ssid
            .as_str()
            .try_into()
            .map_err(|_| Error::Init("wifi ssid too long"))?,
        password: config
            .wifi_password
            .as_str()
            .try_into()
            .map_err(|_| Error::Init("wifi password too long"))?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("WiFi started, connecting to `{}`", config.wifi_ssid);

    let mut last_err = None;
    for attempt in 1..=WIFI_CONNECT_ATTEMPTS {
        match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
            Ok(()) => {
                info!("WiFi connected on attempt {}", attempt);
                return Ok(());
            }
            Err(e) => {
                warn!("WiFi attempt {}/{} failed: {}", attempt, WIFI_CONNECT_ATTEMPTS, e);
                last_err = Some(e);
                let _ = wifi.disconnect();
            }
        }
    }
    Err(last_err.map_or_else(|| anyhow!("WiFi connect failed"), anyhow::Error::from))
}

// ── Console ───────────────────────────────────────────────────

fn run_console(bindicator: &Shared, config: &BindicatorConfig) {
    println!("\nType 'help' for available commands");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            thread::sleep(Duration::from_millis(100));
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        match ConsoleCommand::parse(&line) {
            Some(command) => match console::execute(command, bindicator, config) {
                Ok(output) => print!("{}", output),
                Err(e) => error!("Console: {} failed: {}", line.trim(), e),
            },
            None => println!("Unknown command '{}', type 'help'", line.trim()),
        }
    }
}
