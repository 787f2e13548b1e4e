//! Door-lock firmware entry point.
//!
//! Hexagonal layout with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter (Lock+Input)          LogEventSink (EventSink)│
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  Scheduler · DoorMachine · HoldDetector                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  esp_timer 1 kHz ──▶ SYSTEM_CLOCK ──▶ loop                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use log::{info, warn};

use doorlock::adapters::hardware::HardwareAdapter;
use doorlock::adapters::log_sink::LogEventSink;
use doorlock::app::service::Controller;
use doorlock::clock::SYSTEM_CLOCK;
use doorlock::config::DoorConfig;
use doorlock::drivers::button::{ButtonInput, Polarity};
use doorlock::drivers::hw_timer;
use doorlock::drivers::indicator::{IndicatorEngine, IndicatorLeds};
use doorlock::drivers::relay::RelayOutput;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Doorlock v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = DoorConfig::default();
    // delay_ms rounds up to whole FreeRTOS ticks; relay edges inherit that.
    let tick_ms = 1_000 / esp_idf_svc::sys::CONFIG_FREERTOS_HZ;
    if tick_ms > config.loop_interval_ms {
        warn!(
            "FreeRTOS tick is {}ms; loop runs every {}ms instead of {}ms (set CONFIG_FREERTOS_HZ=1000)",
            tick_ms, tick_ms, config.loop_interval_ms
        );
    }
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config dump failed: {}", e),
    }
    let mut controller = Controller::new(config)?;

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let open_relay = RelayOutput::active_high(PinDriver::output(pins.gpio4)?, "open");
    let close_relay = RelayOutput::active_high(PinDriver::output(pins.gpio5)?, "close");

    let mut open_pin = PinDriver::input(pins.gpio6)?;
    open_pin.set_pull(Pull::Down)?;
    let mut service_pin = PinDriver::input(pins.gpio9)?;
    service_pin.set_pull(Pull::Up)?;

    let led_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default().frequency(5.kHz().into()),
    )?;
    let red = LedcDriver::new(peripherals.ledc.channel0, &led_timer, pins.gpio2)?;
    let green = LedcDriver::new(peripherals.ledc.channel1, &led_timer, pins.gpio3)?;

    let mut hw = HardwareAdapter::new(
        open_relay,
        close_relay,
        ButtonInput::new(open_pin, Polarity::ActiveHigh),
        ButtonInput::new(service_pin, Polarity::ActiveLow),
        IndicatorEngine::new(
            config.indicator_fade_ms,
            config.indicator_dead_ms,
            config.indicator_max_level,
        ),
        IndicatorLeds::new(red, green),
    );
    let mut sink = LogEventSink::new();

    // ── 4. Clock + start ──────────────────────────────────────
    hw_timer::start_tick_timer()?;
    let mut last = SYSTEM_CLOCK.now();
    controller.start(last, &mut hw, &mut sink);

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        let now = SYSTEM_CLOCK.now();
        controller.tick(now, &mut hw, &mut sink);
        hw.update_leds(now.millis_since(last));
        last = now;

        FreeRtos::delay_ms(config.loop_interval_ms);
    }
}
