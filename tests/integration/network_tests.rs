//! Integration tests for the network task: command dispatch down to the
//! actuator port, telemetry wire content, and the two-task liveness
//! property under broker loss.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use roomctl::adapters::device_id::read_mac;
use roomctl::adapters::time::BootClock;
use roomctl::app::ports::FanChannel;
use roomctl::config::SystemConfig;
use roomctl::drivers::watchdog::Watchdog;
use roomctl::state::SharedState;
use roomctl::tasks::acquisition::AcquisitionTask;
use roomctl::tasks::network::{LinkState, NetworkTask};

use crate::mock_hw::{MockBus, MockFans, MockSensors};

fn connected_setup() -> (NetworkTask, MockBus, MockFans, Arc<SharedState>) {
    let config = SystemConfig::default();
    let shared = Arc::new(SharedState::new(config.lock_timeout_ms));
    let mut task = NetworkTask::new(Arc::clone(&shared), &config, read_mac());
    let mut bus = MockBus::new();
    let mut fans = MockFans::new();
    task.step(&mut bus, &mut fans, 0);
    assert_eq!(task.link(), LinkState::Connected);
    (task, bus, fans, shared)
}

// ── Command pipeline ──────────────────────────────────────────

#[test]
fn set_fan_triggers_exactly_one_actuator_call() {
    let (mut task, mut bus, mut fans, shared) = connected_setup();

    bus.push_inbound(
        "lab/room/bsl-room-1/command",
        br#"{"id":"c1","type":"SET_FAN","target":"exhaust","value":60}"#,
    );
    task.step(&mut bus, &mut fans, 100);

    assert_eq!(fans.calls, vec![(FanChannel::Exhaust, 60.0)]);
    assert_eq!(shared.snapshot().unwrap().fan_exhaust_pct, 60.0);
}

#[test]
fn bogus_target_makes_no_call_and_no_mutation() {
    let (mut task, mut bus, mut fans, shared) = connected_setup();
    let before = shared.snapshot().unwrap();

    bus.push_inbound(
        "lab/room/bsl-room-1/command",
        br#"{"id":"c1","type":"SET_FAN","target":"bogus","value":60}"#,
    );
    task.step(&mut bus, &mut fans, 100);

    assert!(fans.calls.is_empty());
    assert_eq!(shared.snapshot().unwrap(), before);
}

#[test]
fn malformed_payloads_do_not_kill_the_task() {
    let (mut task, mut bus, mut fans, shared) = connected_setup();
    let before = shared.snapshot().unwrap();

    bus.push_inbound("lab/room/bsl-room-1/command", b"{{{{");
    bus.push_inbound("lab/room/bsl-room-1/command", br#"{"value":60}"#);
    task.step(&mut bus, &mut fans, 100);

    assert!(fans.calls.is_empty());
    assert_eq!(shared.snapshot().unwrap(), before);
    assert_eq!(task.link(), LinkState::Connected);

    // The task keeps dispatching after the garbage.
    bus.push_inbound(
        "lab/room/bsl-room-1/command",
        br#"{"id":"ok","type":"SET_FAN","target":"intake","value":25}"#,
    );
    task.step(&mut bus, &mut fans, 200);
    assert_eq!(fans.calls, vec![(FanChannel::Intake, 25.0)]);
}

#[test]
fn emergency_stop_calls_both_channels_once() {
    let (mut task, mut bus, mut fans, shared) = connected_setup();

    bus.push_inbound("lab/system/emergency", br#"{"command":"STOP_ALL"}"#);
    task.step(&mut bus, &mut fans, 100);

    assert_eq!(fans.calls_for(FanChannel::Exhaust), vec![0.0]);
    assert_eq!(fans.calls_for(FanChannel::Intake), vec![0.0]);
    let s = shared.snapshot().unwrap();
    assert_eq!(s.fan_exhaust_pct, 0.0);
    assert_eq!(s.fan_intake_pct, 0.0);
}

// ── Telemetry wire content ────────────────────────────────────

#[test]
fn published_telemetry_matches_wire_schema() {
    let (mut task, mut bus, mut fans, shared) = connected_setup();
    let log = bus.publish_log();

    shared
        .with_lock(|s| {
            s.temperature_c = 23.46;
            s.humidity_pct = 55.03;
            s.current_ma = 123.0;
            s.fan_exhaust_pct = 40.0;
            s.fan_intake_pct = 0.0;
        })
        .unwrap();

    for now in (0..5_050).step_by(50) {
        task.step(&mut bus, &mut fans, now);
    }

    let published = log.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "lab/room/bsl-room-1/sensor/all");

    let v: serde_json::Value = serde_json::from_slice(&published[0].1).unwrap();
    let obj = v.as_object().unwrap();
    assert_eq!(obj.len(), 7, "exactly the seven wire keys");
    assert_eq!(v["ts"].as_u64(), Some(5));
    assert_eq!(v["temp"].as_f64(), Some(23.5));
    assert_eq!(v["hum"].as_f64(), Some(55.0));
    assert_eq!(v["fan_ex"].as_f64(), Some(40.0));
    assert_eq!(v["fan_in"].as_f64(), Some(0.0));
    // 123 mA → /100 → 1.23 → 1.2 on the wire (the dashboard's expected
    // conversion; see bus::codec).
    assert!((v["amps"].as_f64().unwrap() - 1.2).abs() < 1e-6);
    assert_eq!(v["door"].as_i64(), Some(0), "door is reserved, always 0");
}

#[test]
fn reconnect_resubscribes_both_topics() {
    let (mut task, mut bus, mut fans, _shared) = connected_setup();
    assert_eq!(
        bus.subscriptions,
        vec!["lab/room/bsl-room-1/command", "lab/system/emergency"]
    );

    bus.drop_connection();
    task.step(&mut bus, &mut fans, 1_000);
    assert_eq!(task.link(), LinkState::Disconnected);

    task.step(&mut bus, &mut fans, 1_050);
    assert_eq!(task.link(), LinkState::Connected);
    assert_eq!(
        bus.subscriptions,
        vec!["lab/room/bsl-room-1/command", "lab/system/emergency"]
    );
}

// ── Liveness under broker loss ────────────────────────────────
//
// With every connection attempt refused, the network task must keep
// retrying on its fixed backoff while the acquisition task samples
// undisturbed — neither loop may starve the other.

#[test]
fn connect_failures_do_not_starve_acquisition() {
    let config = SystemConfig {
        sample_period_ms: 30,
        sensor_warmup_ms: 10,
        sensor_settle_ms: 1,
        publish_period_ms: 50,
        reconnect_backoff_ms: 40,
        service_poll_ms: 5,
        ..SystemConfig::default()
    };
    let shared = Arc::new(SharedState::new(config.lock_timeout_ms));

    let sensors = MockSensors::new(21.0, 45.0, 80.0);
    let reads = sensors.read_counter();
    let acq = AcquisitionTask::new(Arc::clone(&shared), &config);
    std::thread::spawn(move || {
        let clock = BootClock::new();
        acq.run(sensors, &clock);
    });

    let bus = MockBus::refusing_all_connects();
    let attempts = bus.attempt_counter();
    let net = NetworkTask::new(Arc::clone(&shared), &config, read_mac());
    std::thread::spawn(move || {
        let watchdog = Watchdog::new();
        let clock = BootClock::new();
        net.run(bus, MockFans::new(), &clock, &watchdog);
    });

    std::thread::sleep(Duration::from_millis(150));
    let s1 = shared.snapshot().unwrap();
    std::thread::sleep(Duration::from_millis(150));
    let s2 = shared.snapshot().unwrap();

    assert!(
        s2.last_sample_ms > s1.last_sample_ms,
        "acquisition cadence must advance during the outage"
    );
    assert!(reads.load(Ordering::Relaxed) >= 3);

    let tried = attempts.load(Ordering::Relaxed);
    assert!(tried >= 3, "network task must keep retrying (got {tried})");
    assert!(
        tried <= 12,
        "retries must follow the backoff, not spin (got {tried})"
    );
}
