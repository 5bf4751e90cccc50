pub mod controller;
pub mod frame;
pub mod pid;
pub mod regulator;

pub use controller::Controller;
pub use pid::{update_pid, AxisState, ClampBound, PidParams};
pub use regulator::{Axis, Mode, PoseRegulator, RegulatorError};
