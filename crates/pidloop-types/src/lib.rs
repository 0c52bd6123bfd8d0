use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether the controller is allowed to drive its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The controller is off; the operator owns the output.
    Manual,
    /// The controller computes the output on every sample.
    #[default]
    Automatic,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Manual => write!(f, "manual"),
            Mode::Automatic => write!(f, "automatic"),
        }
    }
}

/// Sign relationship between a positive error and the resulting output.
///
/// `Direct` suits processes where raising the output raises the input
/// (a heater); `Reverse` suits the opposite (a cooler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Direct,
    Reverse,
}

impl Direction {
    /// `1.0` for [`Direction::Direct`], `-1.0` for [`Direction::Reverse`].
    pub fn sign(self) -> f32 {
        match self {
            Direction::Direct => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Direct => write!(f, "direct"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// Identifies one of the three gain terms in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GainTerm {
    Proportional,
    Integral,
    Derivative,
}

impl std::fmt::Display for GainTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainTerm::Proportional => write!(f, "Kp"),
            GainTerm::Integral => write!(f, "Ki"),
            GainTerm::Derivative => write!(f, "Kd"),
        }
    }
}

/// User-facing gain values.  Always non-negative; the controller applies
/// direction and sample-time scaling internally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tunings {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Tunings {
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }

    /// Return `Ok(())` when every gain is finite and `>= 0`, otherwise the
    /// first offending term.
    pub fn validate(&self) -> Result<(), PidError> {
        validate_gain(GainTerm::Proportional, self.kp)?;
        validate_gain(GainTerm::Integral, self.ki)?;
        validate_gain(GainTerm::Derivative, self.kd)
    }
}

/// Validate a single gain value.
pub fn validate_gain(term: GainTerm, value: f32) -> Result<(), PidError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PidError::NegativeGain { term, value })
    }
}

/// Validate an output range: both bounds finite and `min < max`.
pub fn validate_output_limits(min: f32, max: f32) -> Result<(), PidError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(PidError::InvalidOutputLimits { min, max })
    }
}

/// Validate a sample interval in seconds: finite and `> 0`.
pub fn validate_sample_time(secs: f32) -> Result<(), PidError> {
    if secs.is_finite() && secs > 0.0 {
        Ok(())
    } else {
        Err(PidError::InvalidSampleTime(secs))
    }
}

/// Everything needed to bring up a controller.
///
/// Deserializes from a TOML/JSON table; omitted fields take the values of
/// [`ControllerSettings::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Interval in seconds on which `compute` will be called.
    pub sample_time_secs: f32,
    pub out_min: f32,
    pub out_max: f32,
    pub mode: Mode,
    pub direction: Direction,
    pub setpoint: f32,
}

impl ControllerSettings {
    pub fn tunings(&self) -> Tunings {
        Tunings::new(self.kp, self.ki, self.kd)
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            sample_time_secs: 0.1,
            out_min: 0.0,
            out_max: 255.0,
            mode: Mode::Automatic,
            direction: Direction::Direct,
            setpoint: 0.0,
        }
    }
}

/// Observable controller state, for tuning front-ends and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub input: f32,
    pub setpoint: f32,
    pub output: f32,
    pub tunings: Tunings,
    pub mode: Mode,
    pub direction: Direction,
    pub out_min: f32,
    pub out_max: f32,
    pub sample_time_secs: f32,
}

/// Error type for rejected configuration and collaborator faults.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PidError {
    #[error("Invalid output limits: min {min} must be finite and below max {max}")]
    InvalidOutputLimits { min: f32, max: f32 },

    #[error("Invalid sample time: {0} s (must be finite and > 0)")]
    InvalidSampleTime(f32),

    #[error("Invalid gain {term} = {value} (must be finite and >= 0)")]
    NegativeGain { term: GainTerm, value: f32 },

    #[error("Gain {term} = {value} overflows at a sample time of {sample_time} s")]
    GainOverflow {
        term: GainTerm,
        value: f32,
        sample_time: f32,
    },

    #[error("Output can only be written while the controller is in manual mode")]
    NotManual,

    #[error("Sensor Fault on {sensor}: {details}")]
    SensorFault { sensor: String, details: String },

    #[error("Actuator Fault on {actuator}: {details}")]
    ActuatorFault { actuator: String, details: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Manual).unwrap(), "\"manual\"");
        assert_eq!(
            serde_json::to_string(&Direction::Reverse).unwrap(),
            "\"reverse\""
        );
        let back: Mode = serde_json::from_str("\"automatic\"").unwrap();
        assert_eq!(back, Mode::Automatic);
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Direct.sign(), 1.0);
        assert_eq!(Direction::Reverse.sign(), -1.0);
    }

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let raw = r#"
            kp = 2.0
            ki = 0.5
            direction = "reverse"
        "#;
        let settings: ControllerSettings = toml::from_str(raw).unwrap();
        assert_eq!(settings.kp, 2.0);
        assert_eq!(settings.ki, 0.5);
        assert_eq!(settings.kd, 0.0);
        assert_eq!(settings.direction, Direction::Reverse);
        assert_eq!(settings.mode, Mode::Automatic);
        assert_eq!(settings.out_max, 255.0);
        assert!((settings.sample_time_secs - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn tunings_validation_reports_first_bad_term() {
        assert!(Tunings::new(1.0, 0.0, 0.0).validate().is_ok());
        assert_eq!(
            Tunings::new(1.0, -0.5, -1.0).validate(),
            Err(PidError::NegativeGain {
                term: GainTerm::Integral,
                value: -0.5
            })
        );
        assert!(Tunings::new(f32::NAN, 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn output_limits_validation() {
        assert!(validate_output_limits(0.0, 1.0).is_ok());
        assert!(validate_output_limits(1.0, 1.0).is_err());
        assert!(validate_output_limits(2.0, 1.0).is_err());
        assert!(validate_output_limits(f32::NEG_INFINITY, 1.0).is_err());
    }

    #[test]
    fn sample_time_validation() {
        assert!(validate_sample_time(0.01).is_ok());
        assert_eq!(validate_sample_time(0.0), Err(PidError::InvalidSampleTime(0.0)));
        assert!(validate_sample_time(-1.0).is_err());
        assert!(validate_sample_time(f32::INFINITY).is_err());
    }

    #[test]
    fn pid_error_display() {
        let err = PidError::InvalidOutputLimits { min: 5.0, max: 1.0 };
        assert!(err.to_string().contains("Invalid output limits"));

        let err2 = PidError::SensorFault {
            sensor: "thermocouple".to_string(),
            details: "open circuit".to_string(),
        };
        assert!(err2.to_string().contains("thermocouple"));

        let err3 = PidError::NegativeGain {
            term: GainTerm::Derivative,
            value: -1.0,
        };
        assert!(err3.to_string().contains("Kd"));

        let err4 = PidError::GainOverflow {
            term: GainTerm::Derivative,
            value: f32::MAX,
            sample_time: 0.5,
        };
        assert!(err4.to_string().contains("Kd"));
        assert!(err4.to_string().contains("overflows"));
    }
}
