//! In-process plant simulation for testing control loops without hardware.
//!
//! [`SimPlant`] models a first-order lag process
//! (`y += (ambient + gain·u − y) · dt / τ`), the textbook stand-in for an
//! oven, a motor's speed or a tank level.  [`SimPlant::split`] hands out a
//! [`SimSensor`] that reads `y` and a [`SimActuator`] that advances the plant
//! by one sample period per applied output.  Both share state with the plant,
//! so the test can still observe it.
//!
//! # Example
//!
//! ```rust
//! use pidloop_hal::sim::{SimPlant, SimPlantConfig};
//! use pidloop_hal::{Actuator, Sensor};
//!
//! let plant = SimPlant::new(SimPlantConfig::default(), 0.1);
//! let (mut sensor, mut actuator) = plant.split();
//!
//! actuator.apply(10.0).expect("sim actuator never fails");
//! let y = sensor.read().expect("sim sensor never fails");
//! assert!(y > 0.0 && y < 10.0);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pidloop_types::PidError;
use serde::{Deserialize, Serialize};

use crate::actuator::Actuator;
use crate::sensor::Sensor;

// ────────────────────────────────────────────────────────────────────────────
// Plant model
// ────────────────────────────────────────────────────────────────────────────

/// Parameters of the simulated first-order process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimPlantConfig {
    /// Steady-state change in `y` per unit of output.  Negative for a
    /// process that falls when driven (a cooler).
    pub gain: f32,
    /// Time constant τ in seconds.  `0` makes the plant follow instantly.
    pub time_constant_secs: f32,
    /// Value the plant rests at with zero output; also the initial value.
    pub ambient: f32,
}

impl Default for SimPlantConfig {
    fn default() -> Self {
        Self {
            gain: 1.0,
            time_constant_secs: 1.0,
            ambient: 0.0,
        }
    }
}

#[derive(Debug)]
struct PlantState {
    value: f32,
    last_output: f32,
}

/// A simulated first-order process.
#[derive(Debug, Clone)]
pub struct SimPlant {
    config: SimPlantConfig,
    /// Fraction of the gap to equilibrium closed per sample.
    alpha: f32,
    state: Arc<Mutex<PlantState>>,
}

impl SimPlant {
    /// Create a plant at rest at `config.ambient`, stepped every `dt_secs`.
    pub fn new(config: SimPlantConfig, dt_secs: f32) -> Self {
        let alpha = if config.time_constant_secs > 0.0 {
            (dt_secs / config.time_constant_secs).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            config,
            alpha,
            state: Arc::new(Mutex::new(PlantState {
                value: config.ambient,
                last_output: 0.0,
            })),
        }
    }

    /// Current process value.
    pub fn value(&self) -> f32 {
        lock(&self.state).value
    }

    /// Output most recently applied through the [`SimActuator`].
    pub fn last_output(&self) -> f32 {
        lock(&self.state).last_output
    }

    pub fn config(&self) -> SimPlantConfig {
        self.config
    }

    /// Hand out a sensor and an actuator wired to this plant.
    pub fn split(&self) -> (SimSensor, SimActuator) {
        (
            SimSensor {
                id: "sim_sensor".to_string(),
                state: Arc::clone(&self.state),
            },
            SimActuator {
                id: "sim_actuator".to_string(),
                plant: self.clone(),
            },
        )
    }

    fn step(&self, output: f32) {
        let mut state = lock(&self.state);
        let target = self.config.ambient + self.config.gain * output;
        state.value += (target - state.value) * self.alpha;
        state.last_output = output;
    }
}

// Plant state is two plain floats, so a poisoned lock still holds usable data.
fn lock(state: &Mutex<PlantState>) -> MutexGuard<'_, PlantState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ────────────────────────────────────────────────────────────────────────────
// Stub sensor
// ────────────────────────────────────────────────────────────────────────────

/// Reads the simulated process value.  Always succeeds.
#[derive(Debug)]
pub struct SimSensor {
    id: String,
    state: Arc<Mutex<PlantState>>,
}

impl Sensor for SimSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&mut self) -> Result<f32, PidError> {
        Ok(lock(&self.state).value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub actuator
// ────────────────────────────────────────────────────────────────────────────

/// Applies an output to the simulated plant and advances it by one sample.
/// Always succeeds.
#[derive(Debug)]
pub struct SimActuator {
    id: String,
    plant: SimPlant,
}

impl Actuator for SimActuator {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, output: f32) -> Result<(), PidError> {
        self.plant.step(output);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
