use tracing::{debug, info, warn};

use crate::command::PoseCommandHandle;
use crate::config::{ControllerConfig, SimConfig};
use crate::control::{Controller, PoseRegulator, RegulatorError};
use crate::interfaces::{Pose, VelocityCommand};
use super::vehicle::{SimVehicle, VehicleState};

// ---------------------------------------------------------------------------
// Fixed-rate scheduler loop around a simulated vehicle
// ---------------------------------------------------------------------------

/// Fly `vehicle` to `target` under `controller` for `config.max_time`.
///
/// The target is delivered as a pose command, which starts the controller.
/// Each period the handle is refreshed from the vehicle, the controller
/// writes its command into the vehicle, and the vehicle is integrated.
/// Returns the trajectory and the command issued at each step.
///
/// The controller is always stopped before returning, including when an
/// update fails.
pub fn simulate_with(
    target: Pose,
    config: &SimConfig,
    controller: &mut dyn Controller,
    vehicle: &mut SimVehicle,
) -> Result<(Vec<VehicleState>, Vec<VelocityCommand>), RegulatorError> {
    if !(config.dt.is_finite() && config.dt > 0.0) {
        return Err(RegulatorError::InvalidPeriod(config.dt));
    }
    if !config.max_time.is_finite() {
        return Err(RegulatorError::InvalidDuration(config.max_time));
    }

    let mut handle = PoseCommandHandle::new();
    let mut time = vehicle.state().time;
    handle.set_measured(vehicle.pose(), vehicle.state().twist());
    handle.set_command(target);
    if controller.on_command(time) {
        debug!(controller = controller.name(), "started by pose command");
    }

    let capacity = ((config.max_time / config.dt) as usize).saturating_add(1);
    let cap = capacity.min(200_000);
    let mut trajectory = Vec::with_capacity(cap);
    let mut commands = Vec::with_capacity(cap);

    trajectory.push(*vehicle.state());
    commands.push(VelocityCommand::default());

    while time < config.max_time {
        handle.set_measured(vehicle.pose(), vehicle.state().twist());
        let cmd = match controller.update(time, config.dt, &handle, vehicle) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!(controller = controller.name(), time, %err, "simulation aborted");
                controller.stopping(time);
                return Err(err);
            }
        };

        vehicle.step(config.dt);
        time = vehicle.state().time;

        trajectory.push(*vehicle.state());
        commands.push(cmd);
    }

    controller.stopping(time);
    info!(
        controller = controller.name(),
        steps = trajectory.len() - 1,
        "simulation finished"
    );
    Ok((trajectory, commands))
}

/// Simulate a [`PoseRegulator`] from rest at the origin (convenience wrapper).
pub fn simulate(
    target: Pose,
    config: &SimConfig,
    controller_config: ControllerConfig,
) -> Result<(Vec<VehicleState>, Vec<VelocityCommand>), RegulatorError> {
    let mut regulator = PoseRegulator::new(controller_config);
    let mut vehicle = SimVehicle::new(
        VehicleState::at_rest(nalgebra::Vector3::zeros(), 0.0),
        config.response_time,
    );
    simulate_with(target, config, &mut regulator, &mut vehicle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::pid::PidParams;
    use crate::control::regulator::Mode;
    use crate::interfaces::{Feedback, VelocityCommandSink};
    use nalgebra::Vector3;

    fn short_run() -> SimConfig {
        SimConfig { dt: 0.01, max_time: 10.0, ..SimConfig::default() }
    }

    fn vehicle_at_origin() -> SimVehicle {
        SimVehicle::new(VehicleState::at_rest(Vector3::zeros(), 0.0), 0.2)
    }

    /// Delegates to a regulator but fails once its update budget runs out.
    struct FailsAfter {
        inner: PoseRegulator,
        updates_left: usize,
    }

    impl Controller for FailsAfter {
        fn starting(&mut self, time: f64) {
            self.inner.starting(time);
        }

        fn stopping(&mut self, time: f64) {
            self.inner.stopping(time);
        }

        fn on_command(&mut self, time: f64) -> bool {
            self.inner.on_command(time)
        }

        fn update(
            &mut self,
            time: f64,
            dt: f64,
            feedback: &dyn Feedback,
            sink: &mut dyn VelocityCommandSink,
        ) -> Result<VelocityCommand, RegulatorError> {
            if self.updates_left == 0 {
                return Err(RegulatorError::NegativeTimeStep(-dt));
            }
            self.updates_left -= 1;
            self.inner.update(time, dt, feedback, sink)
        }

        fn is_running(&self) -> bool {
            self.inner.mode().is_running()
        }
    }

    #[test]
    fn rejects_degenerate_period() {
        let target = Pose::from_position_yaw(Vector3::new(1.0, 0.0, 0.0), 0.0);
        for dt in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let mut reg = PoseRegulator::new(ControllerConfig::hover());
            let config = SimConfig { dt, max_time: 1.0, ..SimConfig::default() };
            let err = simulate_with(target, &config, &mut reg, &mut vehicle_at_origin()).unwrap_err();
            assert!(matches!(err, RegulatorError::InvalidPeriod(_)), "dt={} gave {:?}", dt, err);
            assert_eq!(reg.mode(), Mode::Idle);
            assert_eq!(reg.start_time(), None);
        }
    }

    #[test]
    fn rejects_unbounded_duration() {
        let config = SimConfig { max_time: f64::INFINITY, ..short_run() };
        let err = simulate(Pose::default(), &config, ControllerConfig::hover()).unwrap_err();
        assert_eq!(err, RegulatorError::InvalidDuration(f64::INFINITY));
    }

    #[test]
    fn failed_update_still_stops_controller() {
        let mut controller = FailsAfter {
            inner: PoseRegulator::new(ControllerConfig::hover()),
            updates_left: 3,
        };
        let mut vehicle = vehicle_at_origin();
        let err = simulate_with(Pose::default(), &short_run(), &mut controller, &mut vehicle)
            .unwrap_err();
        assert_eq!(err, RegulatorError::NegativeTimeStep(-0.01));
        assert_eq!(controller.inner.mode(), Mode::Idle);
        assert!(!controller.is_running());
        assert!((vehicle.state().time - 0.03).abs() < 1e-9);
    }

    #[test]
    fn reaches_target_pose() {
        let target = Pose::from_position_yaw(Vector3::new(3.0, -2.0, 1.5), 1.0);
        let (traj, _) = simulate(target, &short_run(), ControllerConfig::hover()).unwrap();
        let last = traj.last().unwrap();
        assert!((last.pos - target.position).norm() < 0.01, "ended at {:?}", last.pos);
        assert!((last.yaw - 1.0).abs() < 0.01);
    }

    #[test]
    fn commands_respect_output_limit() {
        let target = Pose::from_position_yaw(Vector3::new(100.0, 0.0, 0.0), 0.0);
        let (_, cmds) = simulate(target, &short_run(), ControllerConfig::hover()).unwrap();
        for c in &cmds {
            assert!(c.linear.x.abs() <= 5.0 + 1e-12);
            assert!(c.linear.z.abs() <= 5.0 + 1e-12);
        }
        assert!(cmds.iter().any(|c| (c.linear.x - 5.0).abs() < 1e-12));
    }

    #[test]
    fn heading_change_keeps_world_track() {
        // The horizontal loops run in world axes, so turning en route only
        // bends the path by the heading change within one control period.
        let target = Pose::from_position_yaw(Vector3::new(4.0, 0.0, 0.0), 2.5);
        let (traj, _) = simulate(target, &short_run(), ControllerConfig::hover()).unwrap();
        for s in &traj {
            assert!(s.pos.y.abs() < 0.1, "drifted west {} at t={:.2}", s.pos.y, s.time);
        }
        assert!(traj.last().unwrap().pos.y.abs() < 0.01);
    }

    #[test]
    fn controller_is_stopped_afterwards() {
        let mut reg = PoseRegulator::new(ControllerConfig::hover());
        let mut vehicle = SimVehicle::new(VehicleState::at_rest(Vector3::zeros(), 0.0), 0.2);
        let config = SimConfig { max_time: 1.0, ..short_run() };
        let (traj, cmds) =
            simulate_with(Pose::default(), &config, &mut reg, &mut vehicle).unwrap();
        assert_eq!(reg.mode(), Mode::Idle);
        assert_eq!(reg.start_time(), Some(0.0));
        assert_eq!(traj.len(), cmds.len());
        assert!(traj.len() >= 100);
    }

    #[test]
    fn disabled_height_group_holds_altitude() {
        let cfg = ControllerConfig { z: PidParams::disabled(), ..ControllerConfig::hover() };
        let target = Pose::from_position_yaw(Vector3::new(1.0, 1.0, 5.0), 0.0);
        let (traj, _) = simulate(target, &short_run(), cfg).unwrap();
        assert!(traj.iter().all(|s| s.pos.z == 0.0));
    }
}
