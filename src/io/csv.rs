use std::io::{self, Write};

use crate::interfaces::VelocityCommand;
use crate::sim::VehicleState;

/// Write a regulated run to CSV format.
///
/// Columns: time, pos_x, pos_y, pos_z, yaw_deg, vel_x, vel_y, vel_z, yaw_rate,
///          cmd_x, cmd_y, cmd_z, cmd_yaw_rate
///
/// Commands are body-frame; the row's command is the one that produced it.
pub fn write_trajectory<W: Write>(
    writer: &mut W,
    trajectory: &[VehicleState],
    commands: &[VelocityCommand],
) -> io::Result<()> {
    writeln!(
        writer,
        "time,pos_x,pos_y,pos_z,yaw_deg,vel_x,vel_y,vel_z,yaw_rate,\
         cmd_x,cmd_y,cmd_z,cmd_yaw_rate"
    )?;

    for (s, c) in trajectory.iter().zip(commands) {
        writeln!(
            writer,
            "{:.4},{:.4},{:.4},{:.4},{:.2},{:.4},{:.4},{:.4},{:.4},\
             {:.4},{:.4},{:.4},{:.4}",
            s.time,
            s.pos.x, s.pos.y, s.pos.z,
            s.yaw.to_degrees(),
            s.vel.x, s.vel.y, s.vel.z,
            s.yaw_rate,
            c.linear.x, c.linear.y, c.linear.z,
            c.angular.z,
        )?;
    }

    Ok(())
}

/// Write a run to a CSV file at the given path.
pub fn write_trajectory_file(
    path: &str,
    trajectory: &[VehicleState],
    commands: &[VelocityCommand],
) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_trajectory(&mut file, trajectory, commands)
}
