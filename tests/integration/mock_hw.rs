//! Mock adapters for integration tests.
//!
//! Record every port call so tests can assert on the full history without
//! touching real GPIO/PWM registers or a live broker.  The observable
//! pieces (read/connect counters, publish log) sit behind `Arc` so tests
//! can keep a handle while the adapter is moved into a task thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use roomctl::app::ports::{
    ActuatorPort, FanChannel, InboundMessage, MessageBusPort, SensorPort,
};

// ── MockSensors ───────────────────────────────────────────────

/// Fixed-value sensor rig with an observable read counter.
pub struct MockSensors {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub current_ma: f32,
    pub reads: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl MockSensors {
    pub fn new(temperature_c: f32, humidity_pct: f32, current_ma: f32) -> Self {
        Self {
            temperature_c,
            humidity_pct,
            current_ma,
            reads: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn read_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.reads)
    }
}

impl SensorPort for MockSensors {
    fn read_temperature_c(&mut self) -> f32 {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.temperature_c
    }

    fn read_humidity_pct(&mut self) -> f32 {
        self.humidity_pct
    }

    fn read_current_ma(&mut self) -> f32 {
        self.current_ma
    }
}

// ── MockFans ──────────────────────────────────────────────────

/// Records every `set_fan` call verbatim (channel, requested percent).
#[derive(Default)]
pub struct MockFans {
    pub calls: Vec<(FanChannel, f32)>,
}

#[allow(dead_code)]
impl MockFans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls_for(&self, channel: FanChannel) -> Vec<f32> {
        self.calls
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, pct)| *pct)
            .collect()
    }
}

impl ActuatorPort for MockFans {
    fn set_fan(&mut self, channel: FanChannel, pct: f32) {
        self.calls.push((channel, pct));
    }
}

// ── MockBus ───────────────────────────────────────────────────

/// Scriptable broker double with cross-thread observability.
pub struct MockBus {
    connected: bool,
    /// When set, every connection attempt is refused.
    pub refuse_connects: bool,
    attempts: Arc<AtomicU32>,
    inbound: VecDeque<InboundMessage>,
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    pub subscriptions: Vec<String>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self {
            connected: false,
            refuse_connects: false,
            attempts: Arc::new(AtomicU32::new(0)),
            inbound: VecDeque::new(),
            published: Arc::new(Mutex::new(Vec::new())),
            subscriptions: Vec::new(),
        }
    }

    pub fn refusing_all_connects() -> Self {
        let mut bus = Self::new();
        bus.refuse_connects = true;
        bus
    }

    pub fn attempt_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.attempts)
    }

    pub fn publish_log(&self) -> Arc<Mutex<Vec<(String, Vec<u8>)>>> {
        Arc::clone(&self.published)
    }

    pub fn push_inbound(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back(InboundMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
    }

    pub fn drop_connection(&mut self) {
        self.connected = false;
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBusPort for MockBus {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self, _client_id: &str) -> bool {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.refuse_connects {
            return false;
        }
        self.connected = true;
        self.subscriptions.clear();
        true
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        if !self.connected {
            return false;
        }
        self.subscriptions.push(topic.to_string());
        true
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.connected {
            return false;
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec()));
        true
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        if !self.connected {
            return None;
        }
        self.inbound.pop_front()
    }
}
