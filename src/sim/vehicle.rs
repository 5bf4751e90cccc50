use nalgebra::Vector3;

use crate::control::frame::{body_to_world, normalize_angle};
use crate::interfaces::{Pose, Twist, VelocityCommand, VelocityCommandSink, VelocitySource};
use super::integrator::rk4_step;

// ---------------------------------------------------------------------------
// Kinematic multirotor state: position, heading and their rates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct VehicleState {
    pub time: f64,
    pub pos: Vector3<f64>,   // m, world (north, west, up)
    pub yaw: f64,            // rad
    pub vel: Vector3<f64>,   // m/s, world
    pub yaw_rate: f64,       // rad/s
}

impl VehicleState {
    pub fn at_rest(pos: Vector3<f64>, yaw: f64) -> Self {
        Self { time: 0.0, pos, yaw, vel: Vector3::zeros(), yaw_rate: 0.0 }
    }

    pub fn apply(&self, d: &Deriv, dt: f64) -> VehicleState {
        VehicleState {
            time: self.time + dt,
            pos: self.pos + d.dpos * dt,
            yaw: self.yaw + d.dyaw * dt,
            vel: self.vel + d.dvel * dt,
            yaw_rate: self.yaw_rate + d.dyaw_rate * dt,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::from_position_yaw(self.pos, self.yaw)
    }

    /// Velocity in world axes, matching the world-axis position errors.
    pub fn twist(&self) -> Twist {
        Twist {
            linear: self.vel,
            angular: Vector3::new(0.0, 0.0, self.yaw_rate),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Deriv {
    pub dpos: Vector3<f64>,
    pub dyaw: f64,
    pub dvel: Vector3<f64>,
    pub dyaw_rate: f64,
}

/// Velocities track the body-frame command with a first-order lag.
pub fn derivatives(state: &VehicleState, cmd: &VelocityCommand, response_time: f64) -> Deriv {
    let (north, west) = body_to_world(cmd.linear.x, cmd.linear.y, state.yaw);
    let target = Vector3::new(north, west, cmd.linear.z);
    let tau = response_time.max(1e-6);
    Deriv {
        dpos: state.vel,
        dyaw: state.yaw_rate,
        dvel: (target - state.vel) / tau,
        dyaw_rate: (cmd.angular.z - state.yaw_rate) / tau,
    }
}

// ---------------------------------------------------------------------------
// Simulated vehicle: actuator sink + velocity source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimVehicle {
    state: VehicleState,
    command: VelocityCommand,
    response_time: f64,
}

impl SimVehicle {
    pub fn new(initial: VehicleState, response_time: f64) -> Self {
        Self { state: initial, command: Twist::default(), response_time }
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn pose(&self) -> Pose {
        self.state.pose()
    }

    pub fn command(&self) -> &VelocityCommand {
        &self.command
    }

    /// Advance by `dt` holding the last command.
    pub fn step(&mut self, dt: f64) {
        let mut next = rk4_step(&self.state, &self.command, self.response_time, dt);
        next.yaw = normalize_angle(next.yaw);
        self.state = next;
    }
}

impl VelocitySource for SimVehicle {
    fn twist(&self) -> Twist {
        self.state.twist()
    }
}

impl VelocityCommandSink for SimVehicle {
    fn set_command(&mut self, command: VelocityCommand) {
        self.command = command;
    }
}
