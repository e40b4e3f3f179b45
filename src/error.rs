#![allow(dead_code)] // Reserved for future typed port returns

//! Unified error types for the room-controller firmware.
//!
//! One `Error` enum that every subsystem converts into, keeping error
//! handling uniform across the two task loops.  All variants are `Copy`
//! and allocation-free.  Steady-state loops never propagate these fatally:
//! a degraded controller keeps sampling and keeps retrying connectivity.

use core::fmt;

/// Climate/current sensor failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The DHT22 did not answer the start pulse within its timing window.
    Timeout,
    /// The 40-bit DHT22 frame failed its checksum.
    ChecksumMismatch,
    /// ADC read returned an error.
    AdcReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

/// Fan actuator failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    PwmWriteFailed,
    GpioWriteFailed,
}

/// Message-bus failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    BrokerConnectFailed,
    BrokerDisconnected,
    SubscribeFailed,
    PublishFailed,
    MalformedCommand,
}

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Sensor(SensorError),
    Actuator(ActuatorError),
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Timeout => "sensor timed out",
            Self::ChecksumMismatch => "frame checksum mismatch",
            Self::AdcReadFailed => "ADC read failed",
            Self::OutOfRange => "reading out of range",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::PwmWriteFailed => "PWM write failed",
            Self::GpioWriteFailed => "GPIO write failed",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::BrokerConnectFailed => "broker connect failed",
            Self::BrokerDisconnected => "broker disconnected",
            Self::SubscribeFailed => "subscribe failed",
            Self::PublishFailed => "publish failed",
            Self::MalformedCommand => "malformed command payload",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}
