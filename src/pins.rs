//! GPIO / peripheral pin assignments for the room-controller main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Fan drivers (IRLZ44N low-side MOSFET, PWM speed control)
// ---------------------------------------------------------------------------

/// LEDC PWM output for fan A — room exhaust.
pub const FAN_EXHAUST_PWM_GPIO: i32 = 25;
/// LEDC PWM output for fan B — AC intake.
pub const FAN_INTAKE_PWM_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT22 temperature/humidity sensor — single-wire data line with external
/// 10 kΩ pull-up.  The line is driven low to start a transaction, then
/// released and sampled as an input.
pub const DHT_DATA_GPIO: i32 = 4;

/// ACS712 hall-effect current sensor — analog voltage, ADC1 channel 6
/// (GPIO 34 on ESP32).
pub const CURRENT_ADC_GPIO: i32 = 34;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the fans (25 kHz — inaudible).
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;
