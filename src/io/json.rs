use std::io::{self, Write};

use serde::Serialize;

use crate::control::frame::normalize_angle;
use crate::interfaces::{Pose, VelocityCommand};
use crate::sim::VehicleState;

/// Summary statistics of a regulated run toward a fixed target.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSummary {
    pub duration_s: f64,
    pub final_position_error_m: f64,
    pub final_heading_error_rad: f64,
    /// First time after which the position error stays inside tolerance.
    pub settle_time_s: Option<f64>,
    pub max_overshoot_m: f64,
    pub max_speed_ms: f64,
    pub peak_command_ms: f64,
}

impl ResponseSummary {
    pub fn from_run(
        trajectory: &[VehicleState],
        commands: &[VelocityCommand],
        target: &Pose,
        tolerance: f64,
    ) -> Self {
        let error = |s: &VehicleState| (target.position - s.pos).norm();

        let (final_position_error_m, final_heading_error_rad, duration_s) = match trajectory.last() {
            Some(last) => (
                error(last),
                normalize_angle(target.yaw() - last.yaw),
                last.time - trajectory[0].time,
            ),
            None => (0.0, 0.0, 0.0),
        };

        let settle_time_s = match trajectory.iter().rposition(|s| error(s) >= tolerance) {
            None => trajectory.first().map(|s| s.time),
            Some(i) => trajectory.get(i + 1).map(|s| s.time),
        };

        // Distance travelled past the target along the initial approach
        let max_overshoot_m = match trajectory.first() {
            Some(first) if error(first) > 0.0 => {
                let approach = (target.position - first.pos).normalize();
                trajectory
                    .iter()
                    .map(|s| (s.pos - target.position).dot(&approach))
                    .fold(0.0_f64, f64::max)
            }
            _ => 0.0,
        };

        let max_speed_ms = trajectory
            .iter()
            .map(|s| s.vel.norm())
            .fold(0.0_f64, f64::max);

        let peak_command_ms = commands
            .iter()
            .map(|c| c.linear.norm())
            .fold(0.0_f64, f64::max);

        ResponseSummary {
            duration_s,
            final_position_error_m,
            final_heading_error_rad,
            settle_time_s,
            max_overshoot_m,
            max_speed_ms,
            peak_command_ms,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    controller: &'a str,
    target: &'a Pose,
    performance: &'a ResponseSummary,
}

/// Write the summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(
    writer: &mut W,
    controller: &str,
    target: &Pose,
    summary: &ResponseSummary,
) -> io::Result<()> {
    let report = Report { controller, target, performance: summary };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)
}

/// Write the summary JSON to a file.
pub fn write_summary_file(
    path: &str,
    controller: &str,
    target: &Pose,
    summary: &ResponseSummary,
) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, controller, target, summary)
}
