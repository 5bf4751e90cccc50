pub mod event;
pub mod integrator;
pub mod runner;
pub mod vehicle;

pub use integrator::rk4_step;
pub use runner::{simulate, simulate_with};
pub use vehicle::{SimVehicle, VehicleState};
