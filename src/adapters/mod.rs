//! Driven adapters — implementations of the port traits over real
//! peripherals and the MQTT stack, with host simulations for testing.

pub mod device_id;
pub mod hardware;
pub mod mqtt;
pub mod time;
