//! Network task — owns the broker link, telemetry publishing, and command
//! dispatch.
//!
//! A two-state link machine (Disconnected ⇄ Connected) with a fixed 5 s
//! reconnect backoff, plus an independent 5 s publish timer.  Inbound
//! messages are drained synchronously each service iteration and routed
//! to the command handler — dispatch is a plain call, traceable in tests,
//! not an interrupt-style callback.
//!
//! The command path is the only place fan setpoints change and the only
//! caller of the fan actuator.  Telemetry is best-effort: while the link
//! is down, publishes are skipped outright, with no buffering and no
//! replay on reconnect.  The supervisory side tolerates gaps.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::adapters::device_id::{client_id, MacAddress};
use crate::adapters::time::BootClock;
use crate::app::ports::{ActuatorPort, FanChannel, MessageBusPort};
use crate::bus::codec::{self, Command, CommandKind, TelemetryFrame};
use crate::config::SystemConfig;
use crate::drivers::watchdog::Watchdog;
use crate::state::SharedState;

/// Broker link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

pub struct NetworkTask {
    shared: Arc<SharedState>,
    link: LinkState,

    publish_period_ms: u64,
    backoff_ms: u64,
    service_poll_ms: u64,
    /// Next publish-timer fire time; runs regardless of link state.
    next_publish_ms: u64,
    /// Earliest time the next connection attempt may start.
    next_connect_ms: u64,

    telemetry_topic: String,
    command_topic: String,
    emergency_topic: String,
    mac: MacAddress,
}

impl NetworkTask {
    pub fn new(shared: Arc<SharedState>, config: &SystemConfig, mac: MacAddress) -> Self {
        Self {
            shared,
            link: LinkState::Disconnected,
            publish_period_ms: u64::from(config.publish_period_ms),
            backoff_ms: u64::from(config.reconnect_backoff_ms),
            service_poll_ms: u64::from(config.service_poll_ms),
            next_publish_ms: u64::from(config.publish_period_ms),
            next_connect_ms: 0,
            telemetry_topic: config.telemetry_topic(),
            command_topic: config.command_topic(),
            emergency_topic: config.emergency_topic(),
            mac,
        }
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    /// One service iteration at monotonic time `now_ms`.
    ///
    /// Runs the link state machine, drains inbound messages, and fires the
    /// publish timer.  Pure with respect to time — tests drive it with a
    /// scripted clock.
    pub fn step(
        &mut self,
        bus: &mut impl MessageBusPort,
        fans: &mut impl ActuatorPort,
        now_ms: u64,
    ) {
        match self.link {
            LinkState::Disconnected => {
                if now_ms >= self.next_connect_ms {
                    self.try_connect(bus, now_ms);
                }
            }
            LinkState::Connected => {
                if bus.is_connected() {
                    self.service_inbound(bus, fans);
                } else {
                    // No teardown required — the next connect replaces the
                    // session wholesale.
                    warn!("network: broker link lost");
                    self.link = LinkState::Disconnected;
                    self.next_connect_ms = now_ms;
                }
            }
        }

        // Publish timer fires on its own cadence, independent of the state
        // machine; while disconnected the frame is skipped, not buffered.
        if now_ms >= self.next_publish_ms {
            if self.link == LinkState::Connected {
                self.publish_telemetry(bus, now_ms);
            }
            self.advance_publish_timer(now_ms);
        }
    }

    /// Run the service loop forever.  Never returns.
    pub fn run(
        mut self,
        mut bus: impl MessageBusPort,
        mut fans: impl ActuatorPort,
        clock: &BootClock,
        watchdog: &Watchdog,
    ) -> ! {
        info!(
            "network: started (publish every {} ms, reconnect backoff {} ms)",
            self.publish_period_ms, self.backoff_ms
        );
        loop {
            self.step(&mut bus, &mut fans, clock.uptime_ms());
            watchdog.feed();
            std::thread::sleep(Duration::from_millis(self.service_poll_ms));
        }
    }

    // ── Link management ───────────────────────────────────────

    fn try_connect(&mut self, bus: &mut impl MessageBusPort, now_ms: u64) {
        let id = client_id(&self.mac);
        if bus.connect(&id) {
            // Best-effort subscribes: a refused subscription leaves a
            // telemetry-only session rather than a dead device.
            if !bus.subscribe(&self.command_topic) {
                warn!("network: command subscription refused");
            }
            if !bus.subscribe(&self.emergency_topic) {
                warn!("network: emergency subscription refused");
            }
            self.link = LinkState::Connected;
            info!("network: connected as '{id}'");
        } else {
            self.next_connect_ms = now_ms + self.backoff_ms;
            warn!(
                "network: connect failed, retrying in {} ms",
                self.backoff_ms
            );
        }
    }

    // ── Publish path ──────────────────────────────────────────

    fn publish_telemetry(&mut self, bus: &mut impl MessageBusPort, now_ms: u64) {
        // Lock-consistent snapshot; on contention the frame is skipped
        // exactly like a disconnected cycle.
        let Some(snapshot) = self.shared.snapshot() else {
            warn!("network: state lock timed out, telemetry skipped");
            return;
        };
        let frame = TelemetryFrame::from_state(&snapshot, now_ms / 1_000);
        let payload = frame.encode();
        if bus.publish(&self.telemetry_topic, payload.as_bytes()) {
            debug!("network: telemetry published ({payload})");
        } else {
            warn!("network: telemetry publish failed");
        }
    }

    fn advance_publish_timer(&mut self, now_ms: u64) {
        self.next_publish_ms += self.publish_period_ms;
        if self.next_publish_ms <= now_ms {
            // Timer fell behind (long outage); re-anchor instead of
            // firing a burst.
            self.next_publish_ms = now_ms + self.publish_period_ms;
        }
    }

    // ── Command path ──────────────────────────────────────────

    fn service_inbound(&mut self, bus: &mut impl MessageBusPort, fans: &mut impl ActuatorPort) {
        // Commands apply in receipt order; no coalescing.
        while let Some(msg) = bus.poll_inbound() {
            self.dispatch(&msg.topic, &msg.payload, fans);
        }
    }

    fn dispatch(&mut self, topic: &str, payload: &[u8], fans: &mut impl ActuatorPort) {
        if topic == self.emergency_topic {
            if codec::is_stop_all(payload) {
                info!("network: emergency stop received, forcing both fans off");
                self.apply_setpoint(FanChannel::Exhaust, 0.0, fans);
                self.apply_setpoint(FanChannel::Intake, 0.0, fans);
            } else {
                debug!("network: non-STOP_ALL emergency payload ignored");
            }
            return;
        }

        match codec::decode_command(payload) {
            Ok(cmd) => self.handle_command(&cmd, fans),
            Err(e) => {
                // Malformed input is the sender's problem; log and move on.
                warn!("network: command discarded ({e})");
            }
        }
    }

    fn handle_command(&mut self, cmd: &Command, fans: &mut impl ActuatorPort) {
        match cmd.kind {
            CommandKind::SetFan => {
                let Some(channel) = cmd.target.channel() else {
                    // Defined no-op: the supervisory side may address
                    // hardware this board doesn't carry.
                    debug!("network: SET_FAN for unknown target ignored (id={})", cmd.id);
                    return;
                };
                let pct = cmd.value.clamp(0.0, 100.0);
                if self.apply_setpoint(channel, pct, fans) {
                    info!("network: SET_FAN {channel:?} -> {pct}% (id={})", cmd.id);
                }
            }
        }
    }

    /// Store a setpoint and drive the fan, or skip both on lock timeout —
    /// state and hardware must never diverge.
    fn apply_setpoint(
        &mut self,
        channel: FanChannel,
        pct: f32,
        fans: &mut impl ActuatorPort,
    ) -> bool {
        let stored = self
            .shared
            .with_lock(|s| match channel {
                FanChannel::Exhaust => s.fan_exhaust_pct = pct,
                FanChannel::Intake => s.fan_intake_pct = pct,
            })
            .is_some();
        if stored {
            fans.set_fan(channel, pct);
        } else {
            warn!("network: state lock timed out, {channel:?} setpoint dropped");
        }
        stored
    }
}
