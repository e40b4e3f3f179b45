//! Room-controller firmware — main entry point.
//!
//! Two tasks, one shared state block:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  core 0                          core 1                      │
//! │  ┌─────────────────┐             ┌──────────────────────┐    │
//! │  │ AcquisitionTask │             │ NetworkTask          │    │
//! │  │ DHT22 · ACS712  │             │ MQTT link · publish  │    │
//! │  └───────┬─────────┘             │ timer · dispatch     │    │
//! │          │ write sensors         └───────┬──────┬───────┘    │
//! │          ▼                 read snapshot │      │ commands   │
//! │  ┌───────────────────────────────────────▼─┐   ┌▼─────────┐  │
//! │  │ SharedState (bounded-timeout mutex)     │   │ FanDriver│  │
//! │  └─────────────────────────────────────────┘   └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The tasks never call each other; all coupling is the mutex-guarded
//! state block plus the fan driver owned by the network task's command
//! path.
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
mod adapters;
mod app;
mod bus;
mod config;
mod drivers;
mod error;
mod pins;
mod sensors;
mod state;
mod tasks;

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;

use anyhow::Result;
use log::info;

use adapters::device_id;
use adapters::hardware::SensorRig;
use adapters::mqtt::MqttAdapter;
use adapters::time::BootClock;
use config::SystemConfig;
use drivers::fan::FanDriver;
use drivers::watchdog::Watchdog;
use sensors::climate::ClimateSensor;
use sensors::current::CurrentSensor;
use state::SharedState;
use tasks::acquisition::AcquisitionTask;
use tasks::network::NetworkTask;

/// Stack size for both task threads (JSON encode dominates).
const TASK_STACK_BYTES: usize = 8 * 1024;

/// Pin the next spawned threads to `core` under FreeRTOS.
#[cfg(target_os = "espidf")]
fn pin_spawns_to_core(name: &'static [u8], core: esp_idf_hal::cpu::Core) -> Result<()> {
    use esp_idf_hal::task::thread::ThreadSpawnConfiguration;

    ThreadSpawnConfiguration {
        name: Some(name),
        stack_size: TASK_STACK_BYTES,
        priority: 5,
        pin_to_core: Some(core),
        ..Default::default()
    }
    .set()?;
    Ok(())
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("roomctl v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        // The watchdog reset fires after its timeout.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Configuration & identity ───────────────────────────
    let config = SystemConfig::default();
    let mac = device_id::read_mac();
    info!(
        "Device ID: {} (room '{}', broker {})",
        device_id::device_id(&mac),
        config.room_id,
        config.broker_url
    );

    // ── 4. Shared state ───────────────────────────────────────
    let shared = Arc::new(SharedState::new(config.lock_timeout_ms));

    // ── 5. Acquisition task → core 0 ──────────────────────────
    #[cfg(target_os = "espidf")]
    pin_spawns_to_core(b"acquisition\0", esp_idf_hal::cpu::Core::Core0)?;

    let acq = AcquisitionTask::new(Arc::clone(&shared), &config);
    let sensors = SensorRig::new(
        ClimateSensor::new(pins::DHT_DATA_GPIO),
        CurrentSensor::new(pins::CURRENT_ADC_GPIO),
    );
    std::thread::Builder::new()
        .name("acquisition".into())
        .stack_size(TASK_STACK_BYTES)
        .spawn(move || {
            let clock = BootClock::new();
            acq.run(sensors, &clock);
        })?;

    // ── 6. Network task → core 1 ──────────────────────────────
    #[cfg(target_os = "espidf")]
    pin_spawns_to_core(b"network\0", esp_idf_hal::cpu::Core::Core1)?;

    let net = NetworkTask::new(Arc::clone(&shared), &config, mac);
    let bus = MqttAdapter::new(&config.broker_url);
    let fans = FanDriver::new();
    let network_handle = std::thread::Builder::new()
        .name("network".into())
        .stack_size(TASK_STACK_BYTES)
        .spawn(move || {
            // The watchdog subscribes the calling task, so it must be
            // created on the network thread itself.
            let watchdog = Watchdog::new();
            let clock = BootClock::new();
            net.run(bus, fans, &clock, &watchdog);
        })?;

    info!("roomctl: tasks running");

    // Both tasks run for the device's whole powered lifetime; joining the
    // network handle parks the main task.
    network_handle
        .join()
        .map_err(|_| anyhow::anyhow!("network task panicked"))?;
    Ok(())
}
