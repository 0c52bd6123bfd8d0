//! Discrete-time PID (Proportional–Integral–Derivative) controller.
//!
//! The controller drives a measured process input toward a set-point.  It is
//! hardware-agnostic and has no clock: the caller promises to invoke
//! [`PidController::compute`] once every `sample_time_secs`, and the integral
//! and derivative gains are pre-scaled by that interval.
//!
//! Properties of the update step:
//!
//! - the integral accumulator is clamped to the output range (anti-windup);
//! - the derivative acts on the change in input, not in error, so a set-point
//!   step does not kick the output;
//! - the output is clamped to `[out_min, out_max]` after every compute;
//! - switching from manual to automatic seeds the integral from the current
//!   output, so control resumes without a bump.
//!
//! # Example
//!
//! ```rust
//! use pidloop_core::{ControllerSettings, Direction, Mode, PidController};
//!
//! let mut pid = PidController::new(&ControllerSettings {
//!     kp: 2.0,
//!     ki: 0.5,
//!     kd: 1.0,
//!     sample_time_secs: 1.0,
//!     out_min: 0.0,
//!     out_max: 255.0,
//!     mode: Mode::Automatic,
//!     direction: Direction::Direct,
//!     setpoint: 100.0,
//! })
//! .expect("valid settings");
//!
//! pid.set_input(0.0);
//! assert!(pid.compute());
//! assert!((pid.output() - 250.0).abs() < 1e-4);
//! ```

use pidloop_types::{
    validate_gain, validate_output_limits, validate_sample_time, ControllerSettings,
    ControllerSnapshot, Direction, GainTerm, Mode, PidError, Tunings,
};
use tracing::{debug, warn};

/// A PID controller with bump-less mode switching and online retuning.
///
/// Construct with [`PidController::new`].  Every mutator validates its
/// arguments; a rejected call leaves the controller untouched and returns the
/// reason as a [`PidError`].
#[derive(Debug, Clone)]
pub struct PidController {
    input: f32,
    last_input: f32,
    output: f32,

    /// Gains as the user entered them.
    tunings: Tunings,

    // Working gains: direction sign applied, ki scaled by dt, kd divided by dt.
    kp: f32,
    ki: f32,
    kd: f32,

    i_term: f32,
    sample_time: f32,
    out_min: f32,
    out_max: f32,
    setpoint: f32,
    direction: Direction,
    mode: Mode,
}

impl PidController {
    /// Create a controller from `settings`.
    ///
    /// Input and last input start at `0`; the output starts at `0` pulled into
    /// the output range, and the integral term is seeded from it so the first
    /// automatic compute starts from a steady state.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::NegativeGain`], [`PidError::InvalidSampleTime`] or
    /// [`PidError::InvalidOutputLimits`] when the corresponding setting is
    /// out of range.  A sample time so small or large that a working gain
    /// overflows is an [`PidError::InvalidSampleTime`] too.
    pub fn new(settings: &ControllerSettings) -> Result<Self, PidError> {
        let tunings = settings.tunings();
        tunings.validate()?;
        validate_sample_time(settings.sample_time_secs)?;
        validate_output_limits(settings.out_min, settings.out_max)?;
        let (kp, ki, kd) = working_gains(tunings, settings.direction, settings.sample_time_secs)
            .map_err(|_| PidError::InvalidSampleTime(settings.sample_time_secs))?;

        let output = 0.0_f32.clamp(settings.out_min, settings.out_max);
        Ok(Self {
            input: 0.0,
            last_input: 0.0,
            output,
            tunings,
            kp,
            ki,
            kd,
            i_term: output,
            sample_time: settings.sample_time_secs,
            out_min: settings.out_min,
            out_max: settings.out_max,
            setpoint: settings.setpoint,
            direction: settings.direction,
            mode: settings.mode,
        })
    }

    /// Run one control step.
    ///
    /// Returns `false` without touching any state when the controller is in
    /// [`Mode::Manual`]; otherwise updates the integral term and the output
    /// and returns `true`.
    pub fn compute(&mut self) -> bool {
        if self.mode == Mode::Manual {
            return false;
        }

        let error = self.setpoint - self.input;

        self.i_term = (self.i_term + self.ki * error).clamp(self.out_min, self.out_max);

        let d_input = self.input - self.last_input;

        self.output =
            (self.kp * error + self.i_term - self.kd * d_input).clamp(self.out_min, self.out_max);

        self.last_input = self.input;
        true
    }

    /// Switch between [`Mode::Manual`] and [`Mode::Automatic`].
    ///
    /// Going from manual to automatic re-seeds the integral term with the
    /// current output and forgets derivative history, so the next compute
    /// continues from whatever the output was under manual control.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == Mode::Automatic && self.mode == Mode::Manual {
            self.initialize();
            debug!(output = self.output, input = self.input, "bump-less switch to automatic");
        } else if mode != self.mode {
            debug!(from = %self.mode, to = %mode, "controller mode changed");
        }
        self.mode = mode;
    }

    /// Replace the output range and pull the current output and integral term
    /// into it.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidOutputLimits`] unless both bounds are finite
    /// and `min < max`.  Inverted ranges are rejected, never reordered.
    pub fn set_output_limits(&mut self, min: f32, max: f32) -> Result<(), PidError> {
        validate_output_limits(min, max)
            .inspect_err(|e| warn!(error = %e, "rejected output limits"))?;

        self.out_min = min;
        self.out_max = max;
        self.output = self.output.clamp(min, max);
        self.i_term = self.i_term.clamp(min, max);
        Ok(())
    }

    /// Replace all three gains at once.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::NegativeGain`] if any gain is negative or not
    /// finite, or [`PidError::GainOverflow`] if a working gain would not be
    /// finite at the current sample time; none of the gains is changed in
    /// either case.
    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) -> Result<(), PidError> {
        let tunings = Tunings::new(kp, ki, kd);
        tunings
            .validate()
            .inspect_err(|e| warn!(error = %e, "rejected tunings"))?;
        self.apply_tunings(tunings)
    }

    /// Replace the proportional gain.
    pub fn set_kp(&mut self, kp: f32) -> Result<(), PidError> {
        self.set_gain(GainTerm::Proportional, kp)
    }

    /// Replace the integral gain.
    pub fn set_ki(&mut self, ki: f32) -> Result<(), PidError> {
        self.set_gain(GainTerm::Integral, ki)
    }

    /// Replace the derivative gain.
    pub fn set_kd(&mut self, kd: f32) -> Result<(), PidError> {
        self.set_gain(GainTerm::Derivative, kd)
    }

    /// Change the controller direction.  Displayed gains are untouched; only
    /// the sign of the working gains follows the direction.
    pub fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction {
            debug!(from = %self.direction, to = %direction, "controller direction changed");
        }
        self.direction = direction;
        self.update_working_gains();
    }

    /// Change the interval on which [`compute`](Self::compute) is called.
    ///
    /// The working integral and derivative gains are recomputed from the
    /// displayed gains for the new interval, so the displayed gains keep
    /// their meaning.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidSampleTime`] unless `secs` is finite, `> 0`
    /// and keeps every working gain finite.
    pub fn set_sample_time(&mut self, secs: f32) -> Result<(), PidError> {
        let (kp, ki, kd) = validate_sample_time(secs)
            .and_then(|()| {
                working_gains(self.tunings, self.direction, secs)
                    .map_err(|_| PidError::InvalidSampleTime(secs))
            })
            .inspect_err(|e| warn!(error = %e, "rejected sample time"))?;

        debug!(from = self.sample_time, to = secs, "sample time rescaled");
        self.sample_time = secs;
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        Ok(())
    }

    /// Write the output directly while under manual control.
    ///
    /// The value is pulled into the output range.  It becomes the starting
    /// point of the bump-less transfer on the next switch to automatic.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::NotManual`] in [`Mode::Automatic`], where the
    /// output belongs to the controller.
    pub fn set_output(&mut self, output: f32) -> Result<(), PidError> {
        if self.mode == Mode::Automatic {
            warn!("rejected manual output while in automatic mode");
            return Err(PidError::NotManual);
        }
        self.output = output.clamp(self.out_min, self.out_max);
        Ok(())
    }

    /// Change the target the controller drives the input toward.
    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    /// Store the latest process measurement.  Call before
    /// [`compute`](Self::compute).
    pub fn set_input(&mut self, input: f32) {
        self.input = input;
    }

    /// Latest computed output, always within the output range.
    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn input(&self) -> f32 {
        self.input
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Displayed proportional gain.
    pub fn kp(&self) -> f32 {
        self.tunings.kp
    }

    /// Displayed integral gain.
    pub fn ki(&self) -> f32 {
        self.tunings.ki
    }

    /// Displayed derivative gain.
    pub fn kd(&self) -> f32 {
        self.tunings.kd
    }

    pub fn tunings(&self) -> Tunings {
        self.tunings
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Sample interval in seconds.
    pub fn sample_time(&self) -> f32 {
        self.sample_time
    }

    /// Current `(min, max)` output range.
    pub fn output_limits(&self) -> (f32, f32) {
        (self.out_min, self.out_max)
    }

    /// Copy of the observable state.
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            input: self.input,
            setpoint: self.setpoint,
            output: self.output,
            tunings: self.tunings,
            mode: self.mode,
            direction: self.direction,
            out_min: self.out_min,
            out_max: self.out_max,
            sample_time_secs: self.sample_time,
        }
    }

    fn set_gain(&mut self, term: GainTerm, value: f32) -> Result<(), PidError> {
        validate_gain(term, value).inspect_err(|e| warn!(error = %e, "rejected gain"))?;

        let mut tunings = self.tunings;
        match term {
            GainTerm::Proportional => tunings.kp = value,
            GainTerm::Integral => tunings.ki = value,
            GainTerm::Derivative => tunings.kd = value,
        }
        self.apply_tunings(tunings)
    }

    fn apply_tunings(&mut self, tunings: Tunings) -> Result<(), PidError> {
        let (kp, ki, kd) = working_gains(tunings, self.direction, self.sample_time)
            .map_err(|term| PidError::GainOverflow {
                term,
                value: match term {
                    GainTerm::Proportional => tunings.kp,
                    GainTerm::Integral => tunings.ki,
                    GainTerm::Derivative => tunings.kd,
                },
                sample_time: self.sample_time,
            })
            .inspect_err(|e| warn!(error = %e, "rejected gain"))?;

        self.tunings = tunings;
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        Ok(())
    }

    // The stored tunings and sample time always give finite working gains,
    // and a sign flip keeps them finite.
    fn update_working_gains(&mut self) {
        let sign = self.direction.sign();
        self.kp = sign * self.tunings.kp;
        self.ki = sign * self.tunings.ki * self.sample_time;
        self.kd = sign * self.tunings.kd / self.sample_time;
    }

    fn initialize(&mut self) {
        self.i_term = self.output.clamp(self.out_min, self.out_max);
        self.last_input = self.input;
    }
}

/// Working gains `(Kp', Ki', Kd')` for `tunings`, or the first term whose
/// scaled value is not finite.
fn working_gains(
    tunings: Tunings,
    direction: Direction,
    sample_time: f32,
) -> Result<(f32, f32, f32), GainTerm> {
    let sign = direction.sign();
    let kp = sign * tunings.kp;
    let ki = sign * tunings.ki * sample_time;
    let kd = sign * tunings.kd / sample_time;
    if !kp.is_finite() {
        Err(GainTerm::Proportional)
    } else if !ki.is_finite() {
        Err(GainTerm::Integral)
    } else if !kd.is_finite() {
        Err(GainTerm::Derivative)
    } else {
        Ok((kp, ki, kd))
    }
}
