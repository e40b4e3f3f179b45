//! System configuration parameters
//!
//! All tunable parameters for the room controller.  Provisioning and
//! persistence live outside this firmware; the values here are the
//! compiled-in operating point for a single containment room.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity / broker ---
    /// MQTT broker URL, e.g. `mqtt://10.0.0.2:1883`.
    pub broker_url: String,
    /// Room identifier used in topic paths.
    pub room_id: String,

    // --- Acquisition timing ---
    /// Sensor sampling period (milliseconds).
    pub sample_period_ms: u32,
    /// Settling time after power-on before the first DHT22 read (milliseconds).
    pub sensor_warmup_ms: u32,
    /// Minimum gap between the temperature and humidity reads (milliseconds).
    pub sensor_settle_ms: u32,

    // --- Network timing ---
    /// Telemetry publish period (milliseconds).
    pub publish_period_ms: u32,
    /// Fixed wait between broker connection attempts (milliseconds).
    pub reconnect_backoff_ms: u32,
    /// Idle delay between network-loop service iterations (milliseconds).
    pub service_poll_ms: u32,

    // --- Shared state ---
    /// Bound on shared-state mutex acquisition (milliseconds).
    pub lock_timeout_ms: u32,
}

impl SystemConfig {
    /// Topic the telemetry frame is published to.
    pub fn telemetry_topic(&self) -> String {
        format!("lab/room/{}/sensor/all", self.room_id)
    }

    /// Topic fan commands arrive on.
    pub fn command_topic(&self) -> String {
        format!("lab/room/{}/command", self.room_id)
    }

    /// Broadcast topic for the supervisory emergency stop.
    pub fn emergency_topic(&self) -> String {
        "lab/system/emergency".to_string()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            broker_url: "mqtt://10.0.0.2:1883".to_string(),
            room_id: "bsl-room-1".to_string(),

            sample_period_ms: 5_000,
            sensor_warmup_ms: 2_000,
            sensor_settle_ms: 100,

            publish_period_ms: 5_000,
            reconnect_backoff_ms: 5_000,
            service_poll_ms: 50,

            lock_timeout_ms: 100,
        }
    }
}
