//! `pidloop-core` – Controller State & Update Engine
//!
//! A discrete-time PID controller for loops where the caller owns the
//! sampling cadence.  The caller feeds the latest measurement with
//! [`PidController::set_input`], calls [`PidController::compute`] once per
//! sample interval and reads the clamped result with
//! [`PidController::output`].
//!
//! # Modules
//!
//! - [`pid`] – [`PidController`][pid::PidController]: integral accumulation
//!   with output-range anti-windup, derivative-on-input, direction-aware
//!   gain signs, and bump-less online reconfiguration.
//!
//! The controller holds no global state and never allocates, so any number of
//! independent instances can live side by side.  It has no internal locking:
//! when `compute` and a mutator may run from different execution contexts,
//! wrap the instance in the synchronization primitive of your choice.

pub mod pid;

pub use pid::PidController;
pub use pidloop_types::{ControllerSettings, ControllerSnapshot, Direction, Mode, PidError, Tunings};
