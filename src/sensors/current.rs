//! ACS712 hall-effect current sensor (analog, ADC1).
//!
//! The sensor outputs half-rail at zero current and swings 100 mV per
//! ampere.  Unlike the climate sensor it has no distinguished failure
//! mode: whatever the ADC reads converts to a current value.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the configured ADC1 channel via hw_init.
//! On host/test: reads from a static atomic for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_CURRENT_MA_BITS: AtomicU32 = AtomicU32::new(0);

/// Inject the current the next simulated reads will return.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_current_ma(ma: f32) {
    SIM_CURRENT_MA_BITS.store(ma.to_bits(), Ordering::Relaxed);
}

#[cfg(target_os = "espidf")]
const ADC_MAX: f32 = 4095.0;
#[cfg(target_os = "espidf")]
const V_REF_MV: f32 = 3300.0;
/// Sensor output at zero current, after the board's 2:1 divider (mV).
#[cfg(target_os = "espidf")]
const ZERO_OFFSET_MV: f32 = 1650.0;
/// ACS712-20A sensitivity through the divider (mV per A).
#[cfg(target_os = "espidf")]
const MV_PER_A: f32 = 50.0;

pub struct CurrentSensor {
    _adc_gpio: i32,
}

impl CurrentSensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self { _adc_gpio: adc_gpio }
    }

    /// Current draw in milliamps.  Always returns a value.
    pub fn read_ma(&mut self) -> f32 {
        #[cfg(target_os = "espidf")]
        {
            let raw = hw_init::adc1_read(hw_init::ADC1_CH_CURRENT);
            let mv = f32::from(raw) / ADC_MAX * V_REF_MV;
            (mv - ZERO_OFFSET_MV) / MV_PER_A * 1000.0
        }

        #[cfg(not(target_os = "espidf"))]
        {
            f32::from_bits(SIM_CURRENT_MA_BITS.load(Ordering::Relaxed))
        }
    }
}
