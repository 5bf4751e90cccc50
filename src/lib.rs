pub mod command;
pub mod config;
pub mod control;
pub mod interfaces;
pub mod io;
pub mod sim;

pub mod types {
    pub use crate::config::{ControllerConfig, SimConfig};
    pub use crate::control::pid::{AxisState, ClampBound, PidParams};
    pub use crate::interfaces::{Pose, Twist, VelocityCommand};
}
