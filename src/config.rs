use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::control::pid::PidParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Regulator parameters: one group each for xy, z and yaw
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub xy: PidParams,
    pub z: PidParams,
    pub yaw: PidParams,
}

impl ControllerConfig {
    /// Gains that hold a small multirotor on station in the bundled simulator.
    pub fn hover() -> Self {
        Self {
            xy: PidParams::new(2.0, 0.0, 0.0).with_limit_output(5.0),
            z: PidParams::new(2.0, 0.0, 0.0).with_limit_output(5.0),
            yaw: PidParams::new(2.0, 0.0, 0.0).with_limit_output(2.0),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Control period (s).
    pub dt: f64,
    pub max_time: f64,
    /// First-order lag of the simulated velocity response (s).
    pub response_time: f64,
    /// Position error (m) below which the vehicle counts as settled.
    pub settle_tolerance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,          // 100 Hz
            max_time: 20.0,
            response_time: 0.2,
            settle_tolerance: 0.05,
        }
    }
}
