//! Acquisition task — samples the room sensors on a fixed cadence.
//!
//! Every 5 s: read temperature, let the DHT22 settle, read humidity, read
//! current, then store the lot into shared state under one short lock.
//! A NaN climate read keeps the previous value (transient glitches are
//! normal for this sensor and must not disturb telemetry); current has no
//! distinguished failure mode and is always stored.  The sample timestamp
//! advances every cycle either way, so the supervisory side can tell "room
//! is quiet" from "controller stopped sampling".
//!
//! The cadence is drift-free: the next wake is computed from the previous
//! deadline, not from "now", so sensor I/O time does not stretch the
//! period.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::adapters::time::BootClock;
use crate::app::ports::SensorPort;
use crate::config::SystemConfig;
use crate::state::SharedState;

pub struct AcquisitionTask {
    shared: Arc<SharedState>,
    sample_period_ms: u64,
    warmup_ms: u64,
    settle_ms: u64,
}

impl AcquisitionTask {
    pub fn new(shared: Arc<SharedState>, config: &SystemConfig) -> Self {
        Self {
            shared,
            sample_period_ms: u64::from(config.sample_period_ms),
            warmup_ms: u64::from(config.sensor_warmup_ms),
            settle_ms: u64::from(config.sensor_settle_ms),
        }
    }

    /// Merge one sample into shared state.
    ///
    /// Returns `false` if the state lock timed out — the sample is dropped
    /// and the cycle counts as skipped.  NaN climate values leave the
    /// previous reading in place.
    pub fn store_sample(
        shared: &SharedState,
        temperature_c: f32,
        humidity_pct: f32,
        current_ma: f32,
        now_ms: u64,
    ) -> bool {
        shared
            .with_lock(|s| {
                if !temperature_c.is_nan() {
                    s.temperature_c = temperature_c;
                }
                if !humidity_pct.is_nan() {
                    s.humidity_pct = humidity_pct;
                }
                s.current_ma = current_ma;
                s.last_sample_ms = now_ms;
            })
            .is_some()
    }

    /// Run the sampling loop forever.  Never returns.
    pub fn run(self, mut sensors: impl SensorPort, clock: &BootClock) -> ! {
        info!(
            "acquisition: started (period {} ms, warm-up {} ms)",
            self.sample_period_ms, self.warmup_ms
        );

        // The DHT22 needs settling time after power-on before its first
        // valid transaction.
        std::thread::sleep(Duration::from_millis(self.warmup_ms));

        let mut next_deadline = clock.uptime_ms() + self.sample_period_ms;
        loop {
            let temperature_c = sensors.read_temperature_c();
            // Respect the sensor's minimum gap between transactions.
            std::thread::sleep(Duration::from_millis(self.settle_ms));
            let humidity_pct = sensors.read_humidity_pct();
            let current_ma = sensors.read_current_ma();

            let now = clock.uptime_ms();
            if !Self::store_sample(&self.shared, temperature_c, humidity_pct, current_ma, now) {
                warn!("acquisition: state lock timed out, sample dropped");
            }

            // Drift-free periodic wake.
            let now = clock.uptime_ms();
            if now < next_deadline {
                std::thread::sleep(Duration::from_millis(next_deadline - now));
            } else {
                // Overran the whole period (sensor stuck at its timeout
                // bound); re-anchor rather than firing a burst of cycles.
                warn!("acquisition: cycle overran by {} ms", now - next_deadline);
                next_deadline = now;
            }
            next_deadline += self.sample_period_ms;
        }
    }
}
