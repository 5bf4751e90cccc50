use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::ControllerConfig;
use crate::interfaces::{Feedback, Twist, VelocityCommand, VelocityCommandSink};

use super::controller::Controller;
use super::frame::world_to_body;
use super::pid::{update_pid, AxisState};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegulatorError {
    #[error("update called while the regulator is not running")]
    NotRunning,
    #[error("negative time step {0} s")]
    NegativeTimeStep(f64),
    #[error("control period must be positive and finite, got {0} s")]
    InvalidPeriod(f64),
    #[error("run duration must be finite, got {0} s")]
    InvalidDuration(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Running,
    /// Transitional: only held inside [`PoseRegulator::stopping`] while the
    /// run is wound down, never observable between calls.
    Stopping,
}

impl Mode {
    pub fn is_running(self) -> bool {
        self == Mode::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
    Yaw,
}

// ---------------------------------------------------------------------------
// Pose regulator: four PID axes + yaw-frame rotation
// ---------------------------------------------------------------------------

/// Drives position and heading error to zero with a body-frame velocity
/// command.
///
/// Horizontal errors are regulated in world axes (north/west) and the two
/// outputs rotated into body axes by the current yaw. Regulating directly
/// in body axes would couple the loops through the yaw rate.
#[derive(Debug, Clone)]
pub struct PoseRegulator {
    config: ControllerConfig,
    x: AxisState,
    y: AxisState,
    z: AxisState,
    yaw: AxisState,
    mode: Mode,
    start_time: Option<f64>,
}

impl PoseRegulator {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            x: AxisState::new(),
            y: AxisState::new(),
            z: AxisState::new(),
            yaw: AxisState::new(),
            mode: Mode::Idle,
            start_time: None,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Time of the last Idle -> Running transition.
    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn state(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::Yaw => &self.yaw,
        }
    }

    fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
        self.yaw.reset();
    }

    pub fn starting(&mut self, time: f64) {
        self.reset();
        self.start_time = Some(time);
        self.mode = Mode::Running;
        info!(time, "pose regulator started");
    }

    pub fn stopping(&mut self, time: f64) {
        if !self.mode.is_running() {
            debug!(time, mode = ?self.mode, "stop requested while not running");
            return;
        }
        self.mode = Mode::Stopping;
        let elapsed = self.start_time.map(|t0| time - t0).unwrap_or(0.0);
        debug!(time, mode = ?self.mode, x_i = self.x.i, y_i = self.y.i, z_i = self.z.i,
               yaw_i = self.yaw.i, "winding down");
        self.mode = Mode::Idle;
        info!(time, elapsed, "pose regulator stopped");
    }

    /// Command-arrival hook. Starts the regulator when idle; a running
    /// regulator keeps its state and just tracks the new target.
    pub fn on_command(&mut self, time: f64) -> bool {
        if self.mode.is_running() {
            return false;
        }
        debug!(time, "pose command received while idle");
        self.starting(time);
        true
    }

    pub fn update(
        &mut self,
        time: f64,
        dt: f64,
        feedback: &dyn Feedback,
        sink: &mut dyn VelocityCommandSink,
    ) -> Result<VelocityCommand, RegulatorError> {
        if !self.mode.is_running() {
            warn!(time, mode = ?self.mode, "update rejected");
            return Err(RegulatorError::NotRunning);
        }
        if dt < 0.0 {
            warn!(time, dt, "update rejected");
            return Err(RegulatorError::NegativeTimeStep(dt));
        }

        let twist = feedback.twist();
        let mut command = Twist::default();

        // horizontal position, regulated in world axes
        let (error_n, error_w) = feedback.horizontal_error();
        let command_n = update_pid(error_n, twist.linear.x, &mut self.x, &self.config.xy, dt);
        let command_w = update_pid(error_w, twist.linear.y, &mut self.y, &self.config.xy, dt);

        let (body_x, body_y) = world_to_body(command_n, command_w, feedback.yaw());
        command.linear.x = body_x;
        command.linear.y = body_y;

        command.linear.z =
            update_pid(feedback.height_error(), twist.linear.z, &mut self.z, &self.config.z, dt);

        command.angular.z = update_pid(
            feedback.heading_error(),
            twist.angular.z,
            &mut self.yaw,
            &self.config.yaw,
            dt,
        );

        trace!(
            time,
            vx = command.linear.x,
            vy = command.linear.y,
            vz = command.linear.z,
            wz = command.angular.z,
            "velocity command"
        );
        sink.set_command(command);
        Ok(command)
    }
}

impl Controller for PoseRegulator {
    fn starting(&mut self, time: f64) {
        PoseRegulator::starting(self, time);
    }

    fn stopping(&mut self, time: f64) {
        PoseRegulator::stopping(self, time);
    }

    fn on_command(&mut self, time: f64) -> bool {
        PoseRegulator::on_command(self, time)
    }

    fn update(
        &mut self,
        time: f64,
        dt: f64,
        feedback: &dyn Feedback,
        sink: &mut dyn VelocityCommandSink,
    ) -> Result<VelocityCommand, RegulatorError> {
        PoseRegulator::update(self, time, dt, feedback, sink)
    }

    fn is_running(&self) -> bool {
        self.mode.is_running()
    }

    fn name(&self) -> &str {
        "PoseRegulator"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
