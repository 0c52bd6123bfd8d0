//! Tuning file – reads `pidloop.toml`.
//!
//! ```toml
//! [controller]
//! kp = 2.0
//! ki = 1.0
//! kd = 0.1
//! sample_time_secs = 0.1
//! out_min = 0.0
//! out_max = 100.0
//! mode = "automatic"
//! direction = "direct"
//! setpoint = 50.0
//!
//! [plant]
//! gain = 1.0
//! time_constant_secs = 1.0
//! ambient = 20.0
//!
//! [run]
//! steps = 300
//! realtime = false
//! ```
//!
//! Every key is optional.  The file is only ever read.

use pidloop_hal::SimPlantConfig;
use pidloop_types::ControllerSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How the simulated run is driven.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of sample periods to simulate.
    pub steps: u32,
    /// Sleep one sample period between ticks instead of running flat out.
    pub realtime: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 200,
            realtime: false,
        }
    }
}

/// Contents of `pidloop.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerSettings,
    pub plant: SimPlantConfig,
    pub run: RunConfig,
}

/// Return the config path: `$PIDLOOP_CONFIG`, or `pidloop.toml` in the
/// working directory.
pub fn config_path() -> PathBuf {
    std::env::var("PIDLOOP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("pidloop.toml"))
}

/// Load the config from [`config_path`].
pub fn load() -> Result<Config, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.  A missing file yields the
/// defaults.  Environment overrides are applied on top.
pub(crate) fn load_from(path: &Path) -> Result<Config, String> {
    let mut cfg = if path.exists() {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
        parse(&raw)?
    } else {
        Config::default()
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Parse TOML text without consulting the environment.
pub(crate) fn parse(raw: &str) -> Result<Config, String> {
    toml::from_str(raw).map_err(|e| format!("Failed to parse config: {}", e))
}

/// Apply `PIDLOOP_*` environment variable overrides to `cfg`.
///
/// Values that do not parse are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `PIDLOOP_KP` | `controller.kp` |
/// | `PIDLOOP_KI` | `controller.ki` |
/// | `PIDLOOP_KD` | `controller.kd` |
/// | `PIDLOOP_SETPOINT` | `controller.setpoint` |
/// | `PIDLOOP_STEPS` | `run.steps` |
pub fn apply_env_overrides(cfg: &mut Config) {
    override_f32("PIDLOOP_KP", &mut cfg.controller.kp);
    override_f32("PIDLOOP_KI", &mut cfg.controller.ki);
    override_f32("PIDLOOP_KD", &mut cfg.controller.kd);
    override_f32("PIDLOOP_SETPOINT", &mut cfg.controller.setpoint);
    if let Ok(v) = std::env::var("PIDLOOP_STEPS")
        && let Ok(steps) = v.parse::<u32>() {
            cfg.run.steps = steps;
        }
}

fn override_f32(var: &str, field: &mut f32) {
    if let Ok(v) = std::env::var(var)
        && let Ok(value) = v.trim().parse::<f32>() {
            *field = value;
        }
}
