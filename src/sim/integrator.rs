use crate::interfaces::VelocityCommand;
use super::vehicle::{derivatives, VehicleState};

// ---------------------------------------------------------------------------
// RK4 integrator with constant velocity command over the step
// ---------------------------------------------------------------------------

/// Single RK4 step with constant command over the step.
pub fn rk4_step(
    state: &VehicleState,
    cmd: &VelocityCommand,
    response_time: f64,
    dt: f64,
) -> VehicleState {
    let k1 = derivatives(state, cmd, response_time);
    let k2 = derivatives(&state.apply(&k1, dt * 0.5), cmd, response_time);
    let k3 = derivatives(&state.apply(&k2, dt * 0.5), cmd, response_time);
    let k4 = derivatives(&state.apply(&k3, dt), cmd, response_time);

    VehicleState {
        time: state.time + dt,
        pos: state.pos + (k1.dpos + 2.0 * k2.dpos + 2.0 * k3.dpos + k4.dpos) * (dt / 6.0),
        yaw: state.yaw + (k1.dyaw + 2.0 * k2.dyaw + 2.0 * k3.dyaw + k4.dyaw) * (dt / 6.0),
        vel: state.vel + (k1.dvel + 2.0 * k2.dvel + 2.0 * k3.dvel + k4.dvel) * (dt / 6.0),
        yaw_rate: state.yaw_rate
            + (k1.dyaw_rate + 2.0 * k2.dyaw_rate + 2.0 * k3.dyaw_rate + k4.dyaw_rate)
                * (dt / 6.0),
    }
}
