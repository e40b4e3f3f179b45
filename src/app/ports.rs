//! Port traits — the hexagonal boundary between the task logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ task loop (domain)
//! ```
//!
//! Driven adapters (sensors, fans, the message bus) implement these traits.
//! The two task loops consume them via generics, so the domain core never
//! touches hardware or the network stack directly — and the whole control
//! path runs on the host under mock adapters.

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the acquisition task calls this to sample the room.
///
/// The climate reads return `f32::NAN` on a failed transaction; the caller
/// decides what a failed read means (for this firmware: keep the previous
/// value).  The current read has no distinguished failure mode.
pub trait SensorPort {
    fn read_temperature_c(&mut self) -> f32;
    fn read_humidity_pct(&mut self) -> f32;
    fn read_current_ma(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The two fan channels on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanChannel {
    /// Fan A — room exhaust.
    Exhaust,
    /// Fan B — AC intake.
    Intake,
}

/// Write-side port: the network task's command path calls this to drive
/// the fans.  `pct` is clamped to [0, 100] by the implementation before
/// it maps to a hardware duty cycle — out-of-range input is never an error.
pub trait ActuatorPort {
    fn set_fan(&mut self, channel: FanChannel, pct: f32);
}

// ───────────────────────────────────────────────────────────────
// Message bus port (driven adapter: domain ↔ broker)
// ───────────────────────────────────────────────────────────────

/// One message received from a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Publish/subscribe transport.  The network task owns the connection
/// lifecycle through this trait and never sees broker internals.
///
/// `connect` is a bounded attempt (the adapter enforces its own timeout);
/// `poll_inbound` must never block — it drains at most one queued message
/// per call.
pub trait MessageBusPort {
    fn is_connected(&self) -> bool;
    fn connect(&mut self, client_id: &str) -> bool;
    fn subscribe(&mut self, topic: &str) -> bool;
    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool;
    fn poll_inbound(&mut self) -> Option<InboundMessage>;
}
