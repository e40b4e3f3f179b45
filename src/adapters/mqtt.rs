//! MQTT message-bus adapter.
//!
//! Implements [`MessageBusPort`] — the hexagonal boundary between the
//! network task and the broker.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real broker connection via
//!   `esp_idf_svc::mqtt::client::EspMqttClient`.  The blocking event
//!   connection is drained by a helper thread into an mpsc channel so
//!   `poll_inbound` never blocks the network loop.
//! - **all other targets**: a scripted simulation for host-side tests —
//!   connect outcomes, inbound messages, and the publish log are all
//!   observable/injectable.
//!
//! ## Connection semantics
//!
//! `connect` is one bounded attempt; retry pacing belongs to the network
//! task's state machine, not this adapter.  A lost connection needs no
//! teardown call — dropping the old client on the next `connect` is enough.

use log::{info, warn};

use crate::app::ports::{InboundMessage, MessageBusPort};

#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "espidf")]
use std::sync::{mpsc, Arc};

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

/// Bound on one broker connection attempt.
#[cfg(target_os = "espidf")]
const CONNECT_TIMEOUT_MS: u64 = 10_000;

pub struct MqttAdapter {
    broker_url: String,

    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    inbound_rx: Option<mpsc::Receiver<InboundMessage>>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,

    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

impl MqttAdapter {
    pub fn new(broker_url: &str) -> Self {
        Self {
            broker_url: broker_url.to_string(),

            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            inbound_rx: None,
            #[cfg(target_os = "espidf")]
            connected: Arc::new(AtomicBool::new(false)),

            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    pub fn broker_url(&self) -> &str {
        &self.broker_url
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl MessageBusPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn connect(&mut self, client_id: &str) -> bool {
        use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};

        // Drop any stale session before dialing again.
        self.client = None;
        self.inbound_rx = None;
        self.connected.store(false, Ordering::Relaxed);

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            ..Default::default()
        };

        let (client, mut connection) = match EspMqttClient::new(&self.broker_url, &conf) {
            Ok(pair) => pair,
            Err(e) => {
                warn!("mqtt: client init failed — {e}");
                return false;
            }
        };

        let (tx, rx) = mpsc::channel();
        let connected = Arc::clone(&self.connected);

        // Drain the blocking event connection off the network loop.  The
        // thread exits when the connection closes (next() errors), which
        // happens when `client` is dropped on the following connect().
        std::thread::spawn(move || {
            while let Ok(event) = connection.next() {
                match event.payload() {
                    EventPayload::Connected(_) => connected.store(true, Ordering::Relaxed),
                    EventPayload::Disconnected => connected.store(false, Ordering::Relaxed),
                    EventPayload::Received {
                        topic: Some(topic),
                        data,
                        ..
                    } => {
                        let msg = InboundMessage {
                            topic: topic.to_string(),
                            payload: data.to_vec(),
                        };
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            connected.store(false, Ordering::Relaxed);
        });

        self.client = Some(client);
        self.inbound_rx = Some(rx);

        // Bounded wait for the broker handshake.
        let waited = std::time::Instant::now();
        while !self.connected.load(Ordering::Relaxed) {
            if waited.elapsed().as_millis() as u64 >= CONNECT_TIMEOUT_MS {
                warn!("mqtt: connect timed out after {CONNECT_TIMEOUT_MS} ms");
                self.client = None;
                self.inbound_rx = None;
                return false;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        info!("mqtt: connected to {} as '{client_id}'", self.broker_url);
        true
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        use esp_idf_svc::mqtt::client::QoS;

        let Some(client) = self.client.as_mut() else {
            return false;
        };
        match client.subscribe(topic, QoS::AtLeastOnce) {
            Ok(_) => {
                info!("mqtt: subscribed to {topic}");
                true
            }
            Err(e) => {
                warn!("mqtt: subscribe to {topic} failed — {e}");
                false
            }
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        use esp_idf_svc::mqtt::client::QoS;

        let Some(client) = self.client.as_mut() else {
            return false;
        };
        // enqueue() hands the payload to the MQTT task without blocking.
        client
            .enqueue(topic, QoS::AtMostOnce, false, payload)
            .is_ok()
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound_rx.as_ref()?.try_recv().ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// Scripted broker state for host-side tests.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimBroker {
    connected: bool,
    /// Connection attempts left that should fail before one succeeds.
    fail_connects: u32,
    connect_attempts: u32,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>)>,
    inbound: VecDeque<InboundMessage>,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    /// Script the next `n` connection attempts to fail.
    pub fn sim_fail_next_connects(&mut self, n: u32) {
        self.sim.fail_connects = n;
    }

    /// Drop the simulated connection, as a broker outage would.
    pub fn sim_drop_connection(&mut self) {
        self.sim.connected = false;
    }

    /// Queue a message as if it arrived on a subscribed topic.
    pub fn sim_push_inbound(&mut self, topic: &str, payload: &[u8]) {
        self.sim.inbound.push_back(InboundMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
    }

    pub fn sim_connect_attempts(&self) -> u32 {
        self.sim.connect_attempts
    }

    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim.subscriptions
    }

    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.sim.published
    }
}

#[cfg(not(target_os = "espidf"))]
impl MessageBusPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.sim.connected
    }

    fn connect(&mut self, client_id: &str) -> bool {
        self.sim.connect_attempts += 1;
        if self.sim.fail_connects > 0 {
            self.sim.fail_connects -= 1;
            warn!("mqtt(sim): connect refused (attempt {})", self.sim.connect_attempts);
            return false;
        }
        self.sim.connected = true;
        self.sim.subscriptions.clear();
        info!("mqtt(sim): connected to {} as '{client_id}'", self.broker_url);
        true
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        if !self.sim.connected {
            return false;
        }
        self.sim.subscriptions.push(topic.to_string());
        true
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.sim.connected {
            return false;
        }
        self.sim.published.push((topic.to_string(), payload.to_vec()));
        true
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        if !self.sim.connected {
            return None;
        }
        self.sim.inbound.pop_front()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
