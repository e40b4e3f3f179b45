//! Hardware adapters binding the port traits to the sensor and fan drivers.
//!
//! The two halves are deliberately separate structs: the acquisition task
//! owns the sensor rig on core 0 while the network task owns the fans on
//! core 1, so a combined adapter could never be moved into both threads.

use crate::app::ports::{ActuatorPort, FanChannel, SensorPort};
use crate::drivers::fan::FanDriver;
use crate::sensors::climate::ClimateSensor;
use crate::sensors::current::CurrentSensor;

/// Sensor half — owned by the acquisition task.
pub struct SensorRig {
    climate: ClimateSensor,
    current: CurrentSensor,
}

impl SensorRig {
    pub fn new(climate: ClimateSensor, current: CurrentSensor) -> Self {
        Self { climate, current }
    }
}

impl SensorPort for SensorRig {
    fn read_temperature_c(&mut self) -> f32 {
        self.climate.read_temperature_c()
    }

    fn read_humidity_pct(&mut self) -> f32 {
        self.climate.read_humidity_pct()
    }

    fn read_current_ma(&mut self) -> f32 {
        self.current.read_ma()
    }
}

/// Actuator half — the fan driver is the port implementation itself;
/// owned by the network task's command path.
impl ActuatorPort for FanDriver {
    fn set_fan(&mut self, channel: FanChannel, pct: f32) {
        self.set_speed(channel, pct);
    }
}
