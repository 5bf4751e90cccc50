use crate::control::frame::normalize_angle;
use crate::interfaces::Pose;
use super::vehicle::VehicleState;

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Position error dropped below the tolerance.
    Settled,
    /// Heading error dropped below the tolerance.
    HeadingAligned,
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub state: VehicleState,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive states and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &VehicleState, current: &VehicleState) -> Option<EventKind>;
}

/// Fires once when the distance to the target falls below `tolerance`.
pub struct SettleDetector {
    pub target: Pose,
    pub tolerance: f64,
    fired: bool,
}

impl SettleDetector {
    pub fn new(target: Pose, tolerance: f64) -> Self {
        Self { target, tolerance, fired: false }
    }
}

impl EventDetector for SettleDetector {
    fn check(&mut self, _prev: &VehicleState, current: &VehicleState) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        if (self.target.position - current.pos).norm() < self.tolerance {
            self.fired = true;
            Some(EventKind::Settled)
        } else {
            None
        }
    }
}

/// Fires once when the heading error falls below `tolerance` (rad).
pub struct HeadingDetector {
    pub target_yaw: f64,
    pub tolerance: f64,
    fired: bool,
}

impl HeadingDetector {
    pub fn new(target_yaw: f64, tolerance: f64) -> Self {
        Self { target_yaw, tolerance, fired: false }
    }
}

impl EventDetector for HeadingDetector {
    fn check(&mut self, _prev: &VehicleState, current: &VehicleState) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        if normalize_angle(self.target_yaw - current.yaw).abs() < self.tolerance {
            self.fired = true;
            Some(EventKind::HeadingAligned)
        } else {
            None
        }
    }
}

/// Run every detector over consecutive trajectory pairs.
pub fn scan_events(
    trajectory: &[VehicleState],
    detectors: &mut [Box<dyn EventDetector>],
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for pair in trajectory.windows(2) {
        for det in detectors.iter_mut() {
            if let Some(kind) = det.check(&pair[0], &pair[1]) {
                events.push(SimEvent { time: pair[1].time, kind, state: pair[1] });
            }
        }
    }
    events
}
