//! DHT22 temperature/humidity sensor (single-wire, open-drain data line).
//!
//! Each read is a full 40-bit transaction: the host pulls the line low to
//! wake the sensor, releases it, then times the sensor's reply pulses.
//! A timed-out or checksum-failed transaction yields `f32::NAN` — transient
//! glitches are expected on this sensor and the caller keeps its previous
//! value.
//!
//! The sensor needs ~2 s after power-on before its first valid reply, and
//! at least 100 ms between transactions; both waits are owned by the
//! acquisition task, not this driver.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the data line via hw_init helpers with
//! microsecond busy-waits.
//! On host/test: reads from static atomics for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::SensorError;

/// Serialises unit tests that touch the process-global injection points.
#[cfg(test)]
pub(crate) static SIM_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_HUM_BITS: AtomicU32 = AtomicU32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_FAIL: AtomicBool = AtomicBool::new(false);

/// Inject the values the next simulated transactions will return.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(temperature_c: f32, humidity_pct: f32) {
    SIM_TEMP_BITS.store(temperature_c.to_bits(), Ordering::Relaxed);
    SIM_HUM_BITS.store(humidity_pct.to_bits(), Ordering::Relaxed);
}

/// Make simulated transactions fail (checksum error) until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_climate(fail: bool) {
    SIM_FAIL.store(fail, Ordering::Relaxed);
}

pub struct ClimateSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    data_gpio: i32,
}

impl ClimateSensor {
    pub fn new(data_gpio: i32) -> Self {
        Self { data_gpio }
    }

    /// Temperature in °C, or NaN if the transaction failed.
    pub fn read_temperature_c(&mut self) -> f32 {
        match self.read_raw() {
            Ok((t, _)) => t,
            Err(e) => {
                log::debug!("climate: temperature read failed ({e})");
                f32::NAN
            }
        }
    }

    /// Relative humidity in %, or NaN if the transaction failed.
    pub fn read_humidity_pct(&mut self) -> f32 {
        match self.read_raw() {
            Ok((_, h)) => h,
            Err(e) => {
                log::debug!("climate: humidity read failed ({e})");
                f32::NAN
            }
        }
    }

    // ── Platform-specific transaction ─────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self) -> Result<(f32, f32), SensorError> {
        if SIM_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::ChecksumMismatch);
        }
        Ok((
            f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed)),
            f32::from_bits(SIM_HUM_BITS.load(Ordering::Relaxed)),
        ))
    }

    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self) -> Result<(f32, f32), SensorError> {
        use crate::drivers::hw_init;

        // Start signal: hold the line low ≥1 ms, then release.
        hw_init::gpio_write(self.data_gpio, false);
        busy_wait_us(1_100);
        hw_init::gpio_write(self.data_gpio, true);

        // Sensor reply preamble: ~80 µs low, ~80 µs high.
        self.wait_level(false, 100)?;
        self.wait_level(true, 120)?;
        self.wait_level(false, 120)?;

        // 40 data bits: 50 µs low, then 26–28 µs high (0) or ~70 µs high (1).
        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_level(true, 80)?;
            let t0 = now_us();
            self.wait_level(false, 100)?;
            if now_us() - t0 > 45 {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }

        let sum = frame[0]
            .wrapping_add(frame[1])
            .wrapping_add(frame[2])
            .wrapping_add(frame[3]);
        if sum != frame[4] {
            return Err(SensorError::ChecksumMismatch);
        }

        let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
        let raw_t = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
        let mut temperature = f32::from(raw_t) / 10.0;
        if frame[2] & 0x80 != 0 {
            temperature = -temperature;
        }
        if !(0.0..=100.0).contains(&humidity) {
            return Err(SensorError::OutOfRange);
        }
        Ok((temperature, humidity))
    }

    /// Spin until the line reads `level`, up to `timeout_us`.
    #[cfg(target_os = "espidf")]
    fn wait_level(&self, level: bool, timeout_us: u64) -> Result<(), SensorError> {
        use crate::drivers::hw_init;

        let deadline = now_us() + timeout_us;
        while hw_init::gpio_read(self.data_gpio) != level {
            if now_us() >= deadline {
                return Err(SensorError::Timeout);
            }
        }
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
fn now_us() -> u64 {
    // SAFETY: esp_timer_get_time is a monotonic counter read.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
}

#[cfg(target_os = "espidf")]
fn busy_wait_us(us: u32) {
    // SAFETY: esp_rom_delay_us spins the calling core; no shared state.
    unsafe { esp_idf_svc::sys::esp_rom_delay_us(us) };
}
