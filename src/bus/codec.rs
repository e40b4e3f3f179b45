//! Telemetry/command codec for the supervisory message bus.
//!
//! Encoding produces the compact seven-key JSON object the dashboard
//! ingests; decoding turns inbound JSON into typed commands and discards
//! anything malformed.
//!
//! ## Current conversion quirk
//!
//! `amps` is `current_ma / 100` rounded to one decimal — a factor of 10 off
//! from true amperes because the original conversion divides by 100 instead
//! of 1000.  The dashboard consumes the value as-is, so the literal
//! behaviour is load-bearing wire format.  Pinned by tests below; do not
//! correct it.

use serde::{Deserialize, Deserializer, Serialize};

use crate::app::ports::FanChannel;
use crate::state::RoomState;

// ───────────────────────────────────────────────────────────────
// Outbound: telemetry frame
// ───────────────────────────────────────────────────────────────

/// One telemetry publish.  Field order matches the dashboard's ingest
/// schema; `door` is reserved for a future door-position sensor and is
/// always 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Monotonic seconds since boot.
    pub ts: u64,
    pub temp: f32,
    pub hum: f32,
    pub fan_in: f32,
    pub fan_ex: f32,
    pub amps: f32,
    pub door: u8,
}

/// Round to one decimal place.
pub fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

impl TelemetryFrame {
    /// Build a frame from a lock-consistent state snapshot.
    pub fn from_state(s: &RoomState, ts_secs: u64) -> Self {
        Self {
            ts: ts_secs,
            temp: round1(s.temperature_c),
            hum: round1(s.humidity_pct),
            fan_in: round1(s.fan_intake_pct),
            fan_ex: round1(s.fan_exhaust_pct),
            amps: round1(s.current_ma / 100.0),
            door: 0,
        }
    }

    /// Compact JSON, exactly the seven wire keys.
    pub fn encode(&self) -> String {
        // Serializing a plain struct of rounded primitives cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound: fan command
// ───────────────────────────────────────────────────────────────

/// Command discriminator.  An unlisted `type` string is a decode error
/// and the message is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CommandKind {
    #[serde(rename = "SET_FAN")]
    SetFan,
}

/// Wire name for a fan actuator.  `"ac"` and `"intake"` are synonyms for
/// fan B.  An unknown target decodes successfully and dispatch treats it
/// as a defined no-op — the supervisory side may address hardware this
/// board doesn't carry.  A missing or non-string target is a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanTarget {
    Exhaust,
    Intake,
    Unknown,
}

impl<'de> Deserialize<'de> for FanTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(match name.as_str() {
            "exhaust" => Self::Exhaust,
            "ac" | "intake" => Self::Intake,
            _ => Self::Unknown,
        })
    }
}

impl FanTarget {
    /// The hardware channel this target addresses, if any.
    pub fn channel(self) -> Option<FanChannel> {
        match self {
            Self::Exhaust => Some(FanChannel::Exhaust),
            Self::Intake => Some(FanChannel::Intake),
            Self::Unknown => None,
        }
    }
}

/// A decoded actuation command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Command {
    /// Correlation ID assigned by the sender; informational only.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub target: FanTarget,
    pub value: f32,
}

/// Decode a command payload.  Fails (→ discard) if the payload is not a
/// JSON object, `type` is missing or unrecognized, `target` is missing or
/// not a string, or `value` is not numeric.
pub fn decode_command(payload: &[u8]) -> Result<Command, serde_json::Error> {
    serde_json::from_slice(payload)
}

// ───────────────────────────────────────────────────────────────
// Inbound: system emergency broadcast
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EmergencyFrame {
    command: String,
}

/// True if the payload is the supervisory `STOP_ALL` broadcast.
/// Anything else on the emergency topic is ignored.
pub fn is_stop_all(payload: &[u8]) -> bool {
    matches!(
        serde_json::from_slice::<EmergencyFrame>(payload),
        Ok(frame) if frame.command == "STOP_ALL"
    )
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
