//! [`ControlLoop`] – the sampling driver.
//!
//! Once per sample period the host calls [`ControlLoop::tick`], which reads
//! the [`Sensor`], feeds the sample to the controller, runs one compute step
//! and, when the controller is active, forwards the output to the
//! [`Actuator`].  The loop does not own a clock; pace calls to `tick` with
//! [`ControlLoop::period`].
//!
//! # Example
//!
//! ```rust
//! use pidloop_core::{ControllerSettings, PidController};
//! use pidloop_hal::{ControlLoop, SimPlant, SimPlantConfig};
//!
//! let settings = ControllerSettings {
//!     kp: 2.0,
//!     ki: 1.0,
//!     setpoint: 50.0,
//!     out_max: 100.0,
//!     ..ControllerSettings::default()
//! };
//! let mut control = ControlLoop::new(PidController::new(&settings).unwrap());
//! let plant = SimPlant::new(SimPlantConfig::default(), settings.sample_time_secs);
//! let (mut sensor, mut actuator) = plant.split();
//!
//! for _ in 0..300 {
//!     control.tick(&mut sensor, &mut actuator).unwrap();
//! }
//! assert!((plant.value() - 50.0).abs() < 0.5);
//! ```

use std::time::Duration;

use pidloop_core::PidController;
use pidloop_types::PidError;
use tracing::{trace, warn};

use crate::actuator::Actuator;
use crate::sensor::Sensor;

/// Drives a [`PidController`] from a [`Sensor`] into an [`Actuator`].
#[derive(Debug, Clone)]
pub struct ControlLoop {
    controller: PidController,
    ticks: u64,
}

impl ControlLoop {
    pub fn new(controller: PidController) -> Self {
        Self {
            controller,
            ticks: 0,
        }
    }

    /// Run one sample period.
    ///
    /// Returns `Ok(Some(output))` when the controller computed and the output
    /// was applied, `Ok(None)` when the controller is in manual mode (the
    /// actuator is left alone).
    ///
    /// # Errors
    ///
    /// Propagates sensor and actuator faults.  A failed read leaves the
    /// controller untouched.
    pub fn tick(
        &mut self,
        sensor: &mut dyn Sensor,
        actuator: &mut dyn Actuator,
    ) -> Result<Option<f32>, PidError> {
        let input = sensor
            .read()
            .inspect_err(|e| warn!(sensor = sensor.id(), error = %e, "sensor read failed"))?;
        self.controller.set_input(input);
        self.ticks += 1;

        if !self.controller.compute() {
            trace!(tick = self.ticks, input, "controller in manual, output not applied");
            return Ok(None);
        }

        let output = self.controller.output();
        actuator
            .apply(output)
            .inspect_err(|e| warn!(actuator = actuator.id(), error = %e, "actuator rejected output"))?;
        trace!(tick = self.ticks, input, output, "control tick");
        Ok(Some(output))
    }

    /// Nominal interval between ticks.  Saturates at [`Duration::MAX`] for a
    /// sample time too long to represent.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f32(self.controller.sample_time()).unwrap_or(Duration::MAX)
    }

    /// Number of sensor samples taken so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn controller(&self) -> &PidController {
        &self.controller
    }

    /// Mutable access for retuning between ticks.
    pub fn controller_mut(&mut self) -> &mut PidController {
        &mut self.controller
    }

    pub fn into_inner(self) -> PidController {
        self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimPlant, SimPlantConfig};
    use pidloop_types::{ControllerSettings, Direction, Mode};

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    struct FixedSensor {
        value: f32,
    }
    impl Sensor for FixedSensor {
        fn id(&self) -> &str {
            "fixed"
        }
        fn read(&mut self) -> Result<f32, PidError> {
            Ok(self.value)
        }
    }

    struct BrokenSensor;
    impl Sensor for BrokenSensor {
        fn id(&self) -> &str {
            "broken"
        }
        fn read(&mut self) -> Result<f32, PidError> {
            Err(PidError::SensorFault {
                sensor: "broken".to_string(),
                details: "open circuit".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingActuator {
        applied: Vec<f32>,
    }
    impl Actuator for RecordingActuator {
        fn id(&self) -> &str {
            "recorder"
        }
        fn apply(&mut self, output: f32) -> Result<(), PidError> {
            self.applied.push(output);
            Ok(())
        }
    }

    struct JammedActuator;
    impl Actuator for JammedActuator {
        fn id(&self) -> &str {
            "jammed"
        }
        fn apply(&mut self, _output: f32) -> Result<(), PidError> {
            Err(PidError::ActuatorFault {
                actuator: "jammed".to_string(),
                details: "driver fault".to_string(),
            })
        }
    }

    fn controller(settings: ControllerSettings) -> PidController {
        PidController::new(&settings).unwrap()
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[test]
    fn tick_applies_computed_output() {
        let mut control = ControlLoop::new(controller(ControllerSettings {
            kp: 2.0,
            setpoint: 10.0,
            ..ControllerSettings::default()
        }));
        let mut sensor = FixedSensor { value: 4.0 };
        let mut actuator = RecordingActuator::default();

        let out = control.tick(&mut sensor, &mut actuator).unwrap();
        assert_eq!(out, Some(12.0));
        assert_eq!(actuator.applied, vec![12.0]);
        assert_eq!(control.controller().input(), 4.0);
        assert_eq!(control.ticks(), 1);
    }

    #[test]
    fn manual_mode_leaves_actuator_alone() {
        let mut control = ControlLoop::new(controller(ControllerSettings {
            mode: Mode::Manual,
            setpoint: 10.0,
            ..ControllerSettings::default()
        }));
        let mut sensor = FixedSensor { value: 4.0 };
        let mut actuator = RecordingActuator::default();

        assert_eq!(control.tick(&mut sensor, &mut actuator).unwrap(), None);
        assert!(actuator.applied.is_empty());
        // The sample is still recorded for a later bump-less switch.
        assert_eq!(control.controller().input(), 4.0);
    }

    #[test]
    fn sensor_fault_propagates_and_leaves_controller_untouched() {
        let mut control = ControlLoop::new(controller(ControllerSettings {
            setpoint: 10.0,
            ..ControllerSettings::default()
        }));
        let before = control.controller().snapshot();
        let mut actuator = RecordingActuator::default();

        let result = control.tick(&mut BrokenSensor, &mut actuator);
        assert!(matches!(result, Err(PidError::SensorFault { .. })));
        assert_eq!(control.controller().snapshot(), before);
        assert!(actuator.applied.is_empty());
        assert_eq!(control.ticks(), 0);
    }

    #[test]
    fn actuator_fault_propagates() {
        let mut control = ControlLoop::new(controller(ControllerSettings {
            setpoint: 10.0,
            ..ControllerSettings::default()
        }));
        let mut sensor = FixedSensor { value: 0.0 };
        let result = control.tick(&mut sensor, &mut JammedActuator);
        assert!(matches!(result, Err(PidError::ActuatorFault { .. })));
    }

    #[test]
    fn period_follows_sample_time() {
        let mut control = ControlLoop::new(controller(ControllerSettings {
            sample_time_secs: 0.25,
            ..ControllerSettings::default()
        }));
        assert_eq!(control.period(), Duration::from_millis(250));
        control.controller_mut().set_sample_time(0.5).unwrap();
        assert_eq!(control.period(), Duration::from_millis(500));
    }

    #[test]
    fn period_saturates_for_huge_sample_time() {
        let control = ControlLoop::new(controller(ControllerSettings {
            sample_time_secs: 1e30,
            ..ControllerSettings::default()
        }));
        assert_eq!(control.period(), Duration::MAX);
    }

    #[test]
    fn heater_loop_settles_on_setpoint() {
        let settings = ControllerSettings {
            kp: 2.0,
            ki: 1.0,
            kd: 0.1,
            sample_time_secs: 0.1,
            out_min: 0.0,
            out_max: 100.0,
            setpoint: 50.0,
            ..ControllerSettings::default()
        };
        let mut control = ControlLoop::new(controller(settings.clone()));
        let plant = SimPlant::new(
            SimPlantConfig {
                gain: 1.0,
                time_constant_secs: 1.0,
                ambient: 0.0,
            },
            settings.sample_time_secs,
        );
        let (mut sensor, mut actuator) = plant.split();

        for _ in 0..300 {
            let out = control.tick(&mut sensor, &mut actuator).unwrap().unwrap();
            assert!((0.0..=100.0).contains(&out));
        }
        assert!((plant.value() - 50.0).abs() < 0.5);
    }

    #[test]
    fn cooler_loop_settles_with_reverse_direction() {
        let settings = ControllerSettings {
            kp: 2.0,
            ki: 1.0,
            sample_time_secs: 0.1,
            out_min: 0.0,
            out_max: 100.0,
            direction: Direction::Reverse,
            setpoint: 30.0,
            ..ControllerSettings::default()
        };
        let mut control = ControlLoop::new(controller(settings.clone()));
        let plant = SimPlant::new(
            SimPlantConfig {
                gain: -1.0,
                time_constant_secs: 1.0,
                ambient: 80.0,
            },
            settings.sample_time_secs,
        );
        let (mut sensor, mut actuator) = plant.split();

        for _ in 0..300 {
            control.tick(&mut sensor, &mut actuator).unwrap();
        }
        assert!((plant.value() - 30.0).abs() < 0.5);
        assert!((control.controller().output() - 50.0).abs() < 0.5);
    }

    #[test]
    fn retune_between_ticks() {
        let mut control = ControlLoop::new(controller(ControllerSettings {
            kp: 1.0,
            setpoint: 10.0,
            ..ControllerSettings::default()
        }));
        let mut sensor = FixedSensor { value: 0.0 };
        let mut actuator = RecordingActuator::default();

        control.tick(&mut sensor, &mut actuator).unwrap();
        control.controller_mut().set_kp(3.0).unwrap();
        control.tick(&mut sensor, &mut actuator).unwrap();
        assert_eq!(actuator.applied, vec![10.0, 30.0]);
    }
}
