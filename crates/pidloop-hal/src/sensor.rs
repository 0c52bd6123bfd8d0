//! Generic `Sensor` trait for anything that measures the controlled process
//! (thermocouples, encoders, tachometers, …).

use pidloop_types::PidError;

/// A source of process measurements.
///
/// The [`ControlLoop`][crate::control_loop::ControlLoop] reads one sample per
/// period and hands it to the controller as its input.
pub trait Sensor: Send + Sync {
    /// Stable identifier for this sensor, e.g. `"oven_thermocouple"`.
    fn id(&self) -> &str;

    /// Take a measurement.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::SensorFault`] if no valid sample is available
    /// (e.g. the device is disconnected or reports an open circuit).
    fn read(&mut self) -> Result<f32, PidError>;
}
