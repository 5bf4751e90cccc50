use std::error::Error;

use clap::Parser;
use nalgebra::Vector3;
use tracing_subscriber::EnvFilter;

use pose_regulator::config::{ControllerConfig, SimConfig};
use pose_regulator::control::{Controller, PoseRegulator};
use pose_regulator::interfaces::Pose;
use pose_regulator::io::{csv, json};
use pose_regulator::sim::event::{scan_events, EventDetector, HeadingDetector, SettleDetector};
use pose_regulator::sim::{self, SimVehicle, VehicleState};

/// Fly the simulated multirotor from rest at the origin to a target pose.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Regulator gains as JSON ({"xy": {...}, "z": {...}, "yaw": {...}})
    #[arg(long)]
    config: Option<String>,

    /// Target pose: north west up yaw_deg
    #[arg(long, num_args = 4, value_names = ["N", "W", "U", "YAW_DEG"],
          default_values_t = [5.0, -3.0, 2.0, 90.0], allow_negative_numbers = true)]
    target: Vec<f64>,

    /// Control period (s)
    #[arg(long, default_value_t = 0.01)]
    dt: f64,

    /// Simulated duration (s)
    #[arg(long, default_value_t = 15.0)]
    duration: f64,

    /// Write the trajectory as CSV
    #[arg(long)]
    csv: Option<String>,

    /// Write the response summary as JSON
    #[arg(long)]
    summary: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let controller_config = match &args.config {
        Some(path) => ControllerConfig::from_file(path)?,
        None => ControllerConfig::hover(),
    };
    let config = SimConfig { dt: args.dt, max_time: args.duration, ..SimConfig::default() };
    let target = Pose::from_position_yaw(
        Vector3::new(args.target[0], args.target[1], args.target[2]),
        args.target[3].to_radians(),
    );

    // -----------------------------------------------------------------------
    // Run simulation
    // -----------------------------------------------------------------------
    let mut regulator = PoseRegulator::new(controller_config);
    let mut vehicle = SimVehicle::new(
        VehicleState::at_rest(Vector3::zeros(), 0.0),
        config.response_time,
    );
    let (trajectory, commands) = sim::simulate_with(target, &config, &mut regulator, &mut vehicle)?;

    let mut detectors: Vec<Box<dyn EventDetector>> = vec![
        Box::new(SettleDetector::new(target, config.settle_tolerance)),
        Box::new(HeadingDetector::new(target.yaw(), 1.0_f64.to_radians())),
    ];
    let events = scan_events(&trajectory, &mut detectors);
    let summary =
        json::ResponseSummary::from_run(&trajectory, &commands, &target, config.settle_tolerance);

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  POSE REGULATION — {}", regulator.name());
    println!("====================================================================");
    println!();
    println!("  Gains");
    println!("  ──────────────────────────────────────────────────────────────────");
    for (label, p) in [
        ("xy", &regulator.config().xy),
        ("z", &regulator.config().z),
        ("yaw", &regulator.config().yaw),
    ] {
        println!(
            "  {:<4} {:<8} kp={:<6.3} ki={:<6.3} kd={:<6.3} |i|<{:<6} |u|<{}",
            label,
            if p.enabled { "enabled" } else { "disabled" },
            p.k_p,
            p.k_i,
            p.k_d,
            limit_label(p.integral_clamp()),
            limit_label(p.output_clamp()),
        );
    }
    println!();

    println!("  Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    if events.is_empty() {
        println!("  (none)");
    }
    for e in &events {
        println!(
            "  {:<16} t={:>6.2}s   pos=({:>7.3}, {:>7.3}, {:>7.3})   yaw={:>7.2}°",
            format!("{:?}", e.kind),
            e.time,
            e.state.pos.x,
            e.state.pos.y,
            e.state.pos.z,
            e.state.yaw.to_degrees(),
        );
    }
    println!();

    println!("  Response Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Final pos error:  {:>8.4} m", summary.final_position_error_m);
    println!(
        "  Final yaw error:  {:>8.3} deg",
        summary.final_heading_error_rad.to_degrees()
    );
    match summary.settle_time_s {
        Some(t) => println!("  Settle time:      {:>8.2} s", t),
        None => println!("  Settle time:      not settled"),
    }
    println!("  Overshoot:        {:>8.3} m", summary.max_overshoot_m);
    println!("  Max speed:        {:>8.2} m/s", summary.max_speed_ms);
    println!("  Peak command:     {:>8.2} m/s", summary.peak_command_ms);
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled)
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}",
        "t (s)", "n (m)", "w (m)", "u (m)", "yaw(deg)", "|cmd|"
    );
    println!("  {}", "─".repeat(58));

    let sample_interval = (trajectory.len() / 30).max(1);
    for (i, (s, c)) in trajectory.iter().zip(&commands).enumerate() {
        if i % sample_interval != 0 && i != trajectory.len() - 1 {
            continue;
        }
        println!(
            "  {:>7.2}  {:>8.3}  {:>8.3}  {:>8.3}  {:>8.2}  {:>8.3}",
            s.time,
            s.pos.x,
            s.pos.y,
            s.pos.z,
            s.yaw.to_degrees(),
            c.linear.norm()
        );
    }

    println!();
    println!("  Simulation: {} steps, dt={} s", trajectory.len(), config.dt);
    println!("====================================================================");
    println!();

    if let Some(path) = &args.csv {
        csv::write_trajectory_file(path, &trajectory, &commands)?;
        println!("  Trajectory written to {}", path);
    }
    if let Some(path) = &args.summary {
        json::write_summary_file(path, regulator.name(), &target, &summary)?;
        println!("  Summary written to {}", path);
    }

    Ok(())
}

fn limit_label(limit: Option<f64>) -> String {
    match limit {
        Some(l) => format!("{:.2}", l),
        None => "off".into(),
    }
}
