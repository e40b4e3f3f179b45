//! Variable-speed fan driver (low-side MOSFET, LEDC PWM).
//!
//! Maps a percentage setpoint linearly onto the 8-bit LEDC duty range and
//! writes it out immediately.  No tachometer feedback is modelled — the
//! fans on this board are open-loop.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM via hw_init helpers.
//! On host/test: tracks duty state in-memory only.

use crate::app::ports::FanChannel;
use crate::drivers::hw_init;

/// Full-scale LEDC duty at 8-bit resolution.
pub const MAX_DUTY: u8 = 255;

/// Linear percentage → duty mapping with clamping.
///
/// A request of 150 % is treated as 100 %, −10 % as 0 % — out-of-range
/// input is clamped, never rejected.
pub fn percent_to_duty(pct: f32) -> u8 {
    let pct = pct.clamp(0.0, 100.0);
    (pct * f32::from(MAX_DUTY) / 100.0).round() as u8
}

pub struct FanDriver {
    /// Last duty written per channel, indexed [exhaust, intake].
    duty: [u8; 2],
}

impl FanDriver {
    pub fn new() -> Self {
        Self { duty: [0, 0] }
    }

    /// Apply a percentage setpoint to one fan.  Takes effect immediately.
    pub fn set_speed(&mut self, channel: FanChannel, pct: f32) {
        let duty = percent_to_duty(pct);
        hw_init::ledc_set(Self::ledc_channel(channel), duty);
        self.duty[Self::index(channel)] = duty;
    }

    /// Stop both fans.
    pub fn stop_all(&mut self) {
        self.set_speed(FanChannel::Exhaust, 0.0);
        self.set_speed(FanChannel::Intake, 0.0);
    }

    /// Last duty written to `channel`.
    pub fn duty(&self, channel: FanChannel) -> u8 {
        self.duty[Self::index(channel)]
    }

    fn index(channel: FanChannel) -> usize {
        match channel {
            FanChannel::Exhaust => 0,
            FanChannel::Intake => 1,
        }
    }

    fn ledc_channel(channel: FanChannel) -> u32 {
        match channel {
            FanChannel::Exhaust => hw_init::LEDC_CH_FAN_EXHAUST,
            FanChannel::Intake => hw_init::LEDC_CH_FAN_INTAKE,
        }
    }
}

impl Default for FanDriver {
    fn default() -> Self {
        Self::new()
    }
}
