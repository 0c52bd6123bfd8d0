//! Generic `Actuator` trait for heaters, motor drivers, valves and any other
//! device driven by the controller output.
//!
//! Drivers implement this trait and hand themselves to
//! [`ControlLoop::tick`][crate::control_loop::ControlLoop::tick].  The loop
//! only ever talks to the trait, so drivers can be swapped without touching
//! the controller.

use pidloop_types::PidError;

/// A device that consumes the controller output.
pub trait Actuator: Send + Sync {
    /// Stable identifier for this actuator, e.g. `"heater_ssr"` or
    /// `"spindle_pwm"`.
    fn id(&self) -> &str;

    /// Drive the device with `output`, already clamped to the controller's
    /// output range.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::ActuatorFault`] if the command cannot be applied
    /// (e.g. the driver is in a fault state).
    fn apply(&mut self, output: f32) -> Result<(), PidError>;
}
