//! `pidloop-hal` – the controller's collaborators.
//!
//! The controller core knows nothing about hardware.  This crate defines the
//! seams a host plugs real devices into, a sampling driver that wires them to
//! a [`PidController`][pidloop_core::PidController], and an in-process plant
//! model for running closed loops without hardware.
//!
//! # Modules
//!
//! - [`sensor`] – [`Sensor`][sensor::Sensor]: produces process measurements.
//! - [`actuator`] – [`Actuator`][actuator::Actuator]: consumes control outputs.
//! - [`control_loop`] – [`ControlLoop`][control_loop::ControlLoop]: one
//!   read → compute → apply cycle per sample period.
//! - [`sim`] – [`SimPlant`][sim::SimPlant]: a first-order lag process split
//!   into a simulated sensor and actuator.

pub mod actuator;
pub mod control_loop;
pub mod sensor;
pub mod sim;

pub use actuator::Actuator;
pub use control_loop::ControlLoop;
pub use sensor::Sensor;
pub use sim::{SimActuator, SimPlant, SimPlantConfig, SimSensor};
