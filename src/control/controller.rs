use crate::interfaces::{Feedback, VelocityCommand, VelocityCommandSink};

use super::regulator::RegulatorError;

/// Trait for velocity-command controllers driven by a fixed-rate scheduler.
///
/// The scheduler calls `starting`, then `update` once per period, then
/// `stopping`. `update` is never called outside that bracket.
pub trait Controller {
    fn starting(&mut self, time: f64);

    fn stopping(&mut self, time: f64);

    /// A new target arrived. Returns true if this started the controller.
    fn on_command(&mut self, time: f64) -> bool;

    /// Run one control cycle and hand the command to `sink`.
    fn update(
        &mut self,
        time: f64,
        dt: f64,
        feedback: &dyn Feedback,
        sink: &mut dyn VelocityCommandSink,
    ) -> Result<VelocityCommand, RegulatorError>;

    fn is_running(&self) -> bool;

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
