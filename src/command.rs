use crate::control::frame::normalize_angle;
use crate::interfaces::{
    HeadingErrorSource, HeightErrorSource, HorizontalErrorSource, Pose, Twist, VelocitySource,
};

// ---------------------------------------------------------------------------
// Pose command handle: latest target + latest measurement -> errors
// ---------------------------------------------------------------------------

/// Holds the commanded pose and the most recent measured state.
///
/// Until a command arrives every error reads as zero.
#[derive(Debug, Clone, Default)]
pub struct PoseCommandHandle {
    command: Option<Pose>,
    measured: Pose,
    twist: Twist,
}

impl PoseCommandHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_command(&mut self, pose: Pose) {
        self.command = Some(pose);
    }

    pub fn command(&self) -> Option<&Pose> {
        self.command.as_ref()
    }

    pub fn has_command(&self) -> bool {
        self.command.is_some()
    }

    /// Latest measured pose and velocity (world axes).
    pub fn set_measured(&mut self, pose: Pose, twist: Twist) {
        self.measured = pose;
        self.twist = twist;
    }

    pub fn measured(&self) -> &Pose {
        &self.measured
    }

    fn target(&self) -> &Pose {
        self.command.as_ref().unwrap_or(&self.measured)
    }
}

impl HorizontalErrorSource for PoseCommandHandle {
    fn horizontal_error(&self) -> (f64, f64) {
        let d = self.target().position - self.measured.position;
        (d.x, d.y)
    }
}

impl HeightErrorSource for PoseCommandHandle {
    fn height_error(&self) -> f64 {
        self.target().position.z - self.measured.position.z
    }
}

impl HeadingErrorSource for PoseCommandHandle {
    fn heading_error(&self) -> f64 {
        normalize_angle(self.target().yaw() - self.measured.yaw())
    }

    fn yaw(&self) -> f64 {
        self.measured.yaw()
    }
}

impl VelocitySource for PoseCommandHandle {
    fn twist(&self) -> Twist {
        self.twist
    }
}
