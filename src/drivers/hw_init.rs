//! One-shot hardware peripheral initialization.
//!
//! Configures the current-sensor ADC channel, the DHT data line, and the
//! fan LEDC timer/channels using raw ESP-IDF sys calls.  Called once from
//! `main()` before the tasks are spawned; afterwards only the thin read
//! and write shims below touch the registers.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{self, esp};

#[cfg(target_os = "espidf")]
use crate::pins;

// LEDC channel assignment, fixed at init.
pub const LEDC_CH_FAN_EXHAUST: u32 = 0;
pub const LEDC_CH_FAN_INTAKE: u32 = 1;

/// ADC1 channel wired to the ACS712 output (GPIO 34 on ESP32).
pub const ADC1_CH_CURRENT: u32 = 6;

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={rc})"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::LedcInitFailed(rc) => write!(f, "LEDC config failed (rc={rc})"),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the tasks spawn.
    unsafe {
        init_adc()?;
        init_dht_line()?;
        init_fan_pwm()?;
    }
    log::info!("hw_init: peripherals configured (ADC1 CH{ADC1_CH_CURRENT}, DHT GPIO{}, fans CH{LEDC_CH_FAN_EXHAUST}/CH{LEDC_CH_FAN_INTAKE})", pins::DHT_DATA_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot driver) ──────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let unit_cfg = sys::adc_oneshot_unit_init_cfg_t {
        unit_id: sys::adc_unit_t_ADC_UNIT_1,
        ulp_mode: sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is written only here, once at boot.
    unsafe { esp!(sys::adc_oneshot_new_unit(&unit_cfg, &raw mut ADC1_HANDLE)) }
        .map_err(|e| HwInitError::AdcInitFailed(e.code()))?;

    let chan_cfg = sys::adc_oneshot_chan_cfg_t {
        atten: sys::adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    unsafe {
        esp!(sys::adc_oneshot_config_channel(
            ADC1_HANDLE,
            ADC1_CH_CURRENT,
            &chan_cfg
        ))
    }
    .map_err(|e| HwInitError::AdcInitFailed(e.code()))
}

/// Raw 12-bit ADC sample, 0 on a failed read.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE was set during init_adc(); only the acquisition
    // task reads through it.
    if unsafe { esp!(sys::adc_oneshot_read(ADC1_HANDLE, channel, &mut raw)) }.is_err() {
        return 0;
    }
    raw.clamp(0, 4095) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    0
}

// ── DHT data line ─────────────────────────────────────────────
//
// Single open-drain line: the host pulls it low to start a transaction,
// then releases it and samples the sensor's reply.  The line idles high
// on the external pull-up.

#[cfg(target_os = "espidf")]
unsafe fn init_dht_line() -> Result<(), HwInitError> {
    let cfg = sys::gpio_config_t {
        pin_bit_mask: 1u64 << pins::DHT_DATA_GPIO,
        mode: sys::gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
        pull_up_en: sys::gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: sys::gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    unsafe { esp!(sys::gpio_config(&cfg)) }
        .map_err(|e| HwInitError::GpioConfigFailed(e.code()))?;
    // Idle released.
    gpio_write(pins::DHT_DATA_GPIO, true);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured pin.
    (unsafe { sys::gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: level write on a configured pin.
    unsafe {
        sys::gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── Fan PWM (LEDC) ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_fan_pwm() -> Result<(), HwInitError> {
    // One timer drives both fan channels: 25 kHz, 8-bit.
    let timer = sys::ledc_timer_config_t {
        speed_mode: sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: sys::ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: sys::ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::FAN_PWM_FREQ_HZ,
        clk_cfg: sys::soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    unsafe { esp!(sys::ledc_timer_config(&timer)) }
        .map_err(|e| HwInitError::LedcInitFailed(e.code()))?;

    for (channel, gpio) in [
        (LEDC_CH_FAN_EXHAUST, pins::FAN_EXHAUST_PWM_GPIO),
        (LEDC_CH_FAN_INTAKE, pins::FAN_INTAKE_PWM_GPIO),
    ] {
        let chan = sys::ledc_channel_config_t {
            speed_mode: sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: sys::ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        unsafe { esp!(sys::ledc_channel_config(&chan)) }
            .map_err(|e| HwInitError::LedcInitFailed(e.code()))?;
    }
    Ok(())
}

/// Write an 8-bit duty to a fan channel.  Takes effect immediately.
#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: channels were configured in init_fan_pwm(); only the network
    // task's command path writes duty registers.
    unsafe {
        sys::ledc_set_duty(sys::ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        sys::ledc_update_duty(sys::ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}
