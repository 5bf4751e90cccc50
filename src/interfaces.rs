use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// Position and orientation. `x` = north, `y` = west, `z` = up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn from_position_yaw(position: Vector3<f64>, yaw: f64) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        }
    }

    /// Heading about the world Z axis (rad).
    pub fn yaw(&self) -> f64 {
        self.orientation.euler_angles().2
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// Linear (m/s) and angular (rad/s) velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3<f64>,
    pub angular: Vector3<f64>,
}

/// Velocity command in body-fixed axes. Only `angular.z` is commanded.
pub type VelocityCommand = Twist;

// ---------------------------------------------------------------------------
// Capability interfaces toward the feedback source and actuator sink
// ---------------------------------------------------------------------------

pub trait HorizontalErrorSource {
    /// Horizontal position error in world axes: (north, west).
    fn horizontal_error(&self) -> (f64, f64);
}

pub trait HeightErrorSource {
    fn height_error(&self) -> f64;
}

pub trait HeadingErrorSource {
    fn heading_error(&self) -> f64;

    /// Current measured yaw, used for the body-frame rotation.
    fn yaw(&self) -> f64;
}

pub trait VelocitySource {
    /// Measured velocity, expressed in the same axes as the errors.
    fn twist(&self) -> Twist;
}

pub trait VelocityCommandSink {
    fn set_command(&mut self, command: VelocityCommand);
}

/// Everything the regulator reads during one update.
pub trait Feedback: HorizontalErrorSource + HeightErrorSource + HeadingErrorSource + VelocitySource {}

impl<T> Feedback for T where
    T: HorizontalErrorSource + HeightErrorSource + HeadingErrorSource + VelocitySource
{
}

impl VelocityCommandSink for Vec<VelocityCommand> {
    fn set_command(&mut self, command: VelocityCommand) {
        self.push(command);
    }
}
