//! f1-insights CLI - telemetry analysis over exported sessions
//!
//! Usage:
//!   f1-insights breakdown <session.json> [--segments <n>] [--output <file.csv>]
//!   f1-insights slipstream <session.json> --section "Turn 1:Turn 2" [--drivers VER,LEC]
//!   f1-insights delta <session.json> --reference VER --drivers LEC,NOR [--lap fastest]
//!   f1-insights speed <session.json> --drivers VER,LEC [--window 5]
//!   f1-insights envelope <session.json> [--resolution 10] [--output <file.csv>]
//!   f1-insights corners <session.json>
//!
//! Sessions are JSON exports with laps, per-lap telemetry and, optionally,
//! circuit information.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use f1_insights::analysis::{
    EnvelopePoint, SectionOutcome, TrackSection, delta_to_reference, lap_time_gaps,
    slipstream_survey, speed_envelope, speed_traces,
};
use f1_insights::segments::export_segments_csv;
use f1_insights::session::select_lap;
use f1_insights::{
    AnalysisConfig, DriverObservation, LapSelector, NearestSearch, Session, TelemetryProvider,
    track_breakdown,
};

/// Margin around the track layout in the reported extent (meters)
const PLOT_MARGIN_M: f64 = 200.0;

#[derive(Parser)]
#[command(name = "f1-insights")]
#[command(about = "Formula 1 telemetry analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with analysis settings (missing fields use defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the track into segments and find the fastest driver in each
    Breakdown {
        /// Session export (JSON)
        session: PathBuf,

        /// Number of segments
        #[arg(short, long)]
        segments: Option<usize>,

        /// Nearest-sample search: "rtree" or "linear"
        #[arg(long)]
        search: Option<NearestSearch>,

        /// Write per-segment results to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect slipstream benefit on straights between corners
    Slipstream {
        /// Session export (JSON)
        session: PathBuf,

        /// Section as "START:END", e.g. "Turn 13:Turn 14" (repeatable)
        #[arg(long = "section", required = true)]
        sections: Vec<String>,

        /// Comma separated driver abbreviations (default: all drivers)
        #[arg(short, long, value_delimiter = ',')]
        drivers: Vec<String>,

        /// Gap to the car ahead must drop below this (meters)
        #[arg(long)]
        max_gap: Option<f64>,

        /// Speed must exceed this (km/h)
        #[arg(long)]
        min_speed: Option<f64>,
    },

    /// Time delta of drivers against a reference lap
    Delta {
        /// Session export (JSON)
        session: PathBuf,

        /// Reference driver
        #[arg(short, long)]
        reference: String,

        /// Comma separated drivers to compare
        #[arg(short, long, value_delimiter = ',', required = true)]
        drivers: Vec<String>,

        /// Lap to compare: "fastest", a lap number, or "-1" for the last lap
        #[arg(short, long, default_value = "fastest", allow_hyphen_values = true)]
        lap: LapSelector,

        /// Number of distance samples
        #[arg(long)]
        samples: Option<usize>,

        /// Write the delta traces to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Smoothed speed traces with sector boundaries
    Speed {
        /// Session export (JSON)
        session: PathBuf,

        /// Comma separated drivers to compare
        #[arg(short, long, value_delimiter = ',', required = true)]
        drivers: Vec<String>,

        /// Lap to compare: "fastest", a lap number, or "-1" for the last lap
        #[arg(short, long, default_value = "fastest", allow_hyphen_values = true)]
        lap: LapSelector,

        /// Rolling mean window in samples
        #[arg(short, long, default_value = "5")]
        window: usize,

        /// Write the smoothed traces to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Min, max and median speed across all drivers by distance
    Envelope {
        /// Session export (JSON)
        session: PathBuf,

        /// Distance bucket width (meters)
        #[arg(long)]
        resolution: Option<f64>,

        /// Write the envelope to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the circuit's corners
    Corners {
        /// Session export (JSON)
        session: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Breakdown {
            session,
            segments,
            search,
            output,
        } => {
            if let Some(n) = segments {
                config.segments.target_segments = n;
            }
            if let Some(search) = search {
                config.attribution.search = search;
            }
            run_breakdown(&load_session(&session)?, &config, output.as_deref())
        }
        Commands::Slipstream {
            session,
            sections,
            drivers,
            max_gap,
            min_speed,
        } => {
            if let Some(gap) = max_gap {
                config.slipstream.max_gap_m = gap;
            }
            if let Some(speed) = min_speed {
                config.slipstream.min_speed_kph = speed;
            }
            let sections = sections
                .iter()
                .map(|s| parse_section(s))
                .collect::<Result<Vec<_>>>()?;
            run_slipstream(&load_session(&session)?, &config, drivers, &sections)
        }
        Commands::Delta {
            session,
            reference,
            drivers,
            lap,
            samples,
            output,
        } => {
            if let Some(n) = samples {
                config.delta.samples = n;
            }
            run_delta(
                &load_session(&session)?,
                &config,
                &reference,
                &drivers,
                lap,
                output.as_deref(),
            )
        }
        Commands::Speed {
            session,
            drivers,
            lap,
            window,
            output,
        } => run_speed(
            &load_session(&session)?,
            &drivers,
            lap,
            window,
            output.as_deref(),
        ),
        Commands::Envelope {
            session,
            resolution,
            output,
        } => {
            if let Some(r) = resolution {
                config.envelope.resolution_m = r;
            }
            run_envelope(&load_session(&session)?, &config, output.as_deref())
        }
        Commands::Corners { session } => run_corners(&load_session(&session)?),
    }
}

fn load_session(path: &Path) -> Result<Session> {
    Session::from_json_file(path)
        .with_context(|| format!("failed to load session {}", path.display()))
}

/// Parse "Turn 1:Turn 2" into a section.
fn parse_section(text: &str) -> Result<TrackSection> {
    match text.split_once(':') {
        Some((start, end)) if !start.trim().is_empty() && !end.trim().is_empty() => {
            Ok(TrackSection::new(start.trim(), end.trim()))
        }
        _ => bail!("section must look like \"Turn 1:Turn 2\", got \"{}\"", text),
    }
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

fn lap_observation(
    session: &Session,
    driver: &str,
    lap: LapSelector,
) -> Result<(DriverObservation, Option<f64>)> {
    let lap = select_lap(session, driver, lap)?;
    Ok((
        DriverObservation::new(driver, lap.telemetry.clone()),
        lap.lap_time,
    ))
}

fn run_breakdown(session: &Session, config: &AnalysisConfig, output: Option<&Path>) -> Result<()> {
    banner(&format!("TRACK BREAKDOWN - {}", session.info));

    let breakdown = track_breakdown(session, &config.segments, &config.attribution)?;

    println!("\n[Layout] {:?}", breakdown.centerline_source);
    println!("  Centerline points: {}", breakdown.centerline.len());
    println!("  Segments: {}", breakdown.segments.len());
    if let Some(extent) = breakdown.plot_extent(PLOT_MARGIN_M) {
        let center = extent.center();
        println!(
            "  Extent: x {:.0}..{:.0}, y {:.0}..{:.0} (center {:.0}, {:.0})",
            extent.min_x, extent.max_x, extent.min_y, extent.max_y, center.x, center.y
        );
    }
    if let Some((start, dir)) = breakdown.race_direction() {
        println!(
            "  Race direction at ({:.0}, {:.0}): ({:+.2}, {:+.2})",
            start.x, start.y, dir.x, dir.y
        );
    }

    println!("\n{}", "-".repeat(60));
    println!("FASTEST DRIVER BY SEGMENT");
    println!("{}", "-".repeat(60));
    for share in breakdown.report.leader_shares() {
        println!(
            "  {:<4} {:>3} segments ({:.1}%)",
            share.driver, share.segments, share.percent
        );
    }
    let unattributed = breakdown.report.unattributed_count();
    if unattributed > 0 {
        println!("  (unattributed: {})", unattributed);
    }
    if let Some((lo, hi)) = breakdown.report.speed_range() {
        println!("\n  Speed range: {:.1} - {:.1} km/h", lo, hi);
    }
    for skipped in breakdown.report.skipped() {
        println!("  Skipped: {:?}", skipped);
    }

    if let Some(path) = output {
        export_segments_csv(path, &breakdown.rows())?;
        println!("\n[Export] Written: {}", path.display());
    }
    Ok(())
}

fn run_slipstream(
    session: &Session,
    config: &AnalysisConfig,
    drivers: Vec<String>,
    sections: &[TrackSection],
) -> Result<()> {
    banner(&format!("SLIPSTREAM - {}", session.info));

    let drivers = if drivers.is_empty() {
        session.drivers()
    } else {
        drivers
    };
    let outcomes = slipstream_survey(session, &drivers, sections, &config.slipstream)?;

    for outcome in &outcomes {
        match outcome {
            SectionOutcome::Analysed {
                driver,
                section,
                result,
            } => {
                let gap = result
                    .min_gap
                    .map_or_else(|| "-".to_string(), |g| format!("{:.1}m", g));
                let speed = result
                    .max_speed
                    .map_or_else(|| "-".to_string(), |v| format!("{:.1}km/h", v));
                println!(
                    "  {:<4} {:<28} min gap {:>8}  max speed {:>11}  {}",
                    driver,
                    section.to_string(),
                    gap,
                    speed,
                    if result.detected { "SLIPSTREAM" } else { "-" }
                );
            }
            SectionOutcome::DriverSkipped { driver, reason } => {
                println!("  {:<4} skipped ({})", driver, reason);
            }
            SectionOutcome::SectionSkipped {
                driver,
                section,
                reason,
            } => {
                println!("  {:<4} {:<28} skipped ({})", driver, section.to_string(), reason);
            }
        }
    }
    Ok(())
}

fn run_delta(
    session: &Session,
    config: &AnalysisConfig,
    reference: &str,
    drivers: &[String],
    lap: LapSelector,
    output: Option<&Path>,
) -> Result<()> {
    banner(&format!("LAP DELTA vs {} ({} lap)", reference, lap));

    let (reference_obs, reference_time) = lap_observation(session, reference, lap)?;
    let mut others = Vec::with_capacity(drivers.len());
    let mut lap_times = Vec::with_capacity(drivers.len());
    for driver in drivers {
        let (obs, time) = match lap_observation(session, driver, lap) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("[Delta] Skipping {}: {}", driver, e);
                continue;
            }
        };
        if let Some(t) = time {
            lap_times.push((driver.clone(), t));
        }
        others.push(obs);
    }

    let trace = delta_to_reference(&reference_obs, &others, &config.delta)?;
    for (driver, deltas) in &trace.deltas {
        let finish = deltas.last().copied().unwrap_or(0.0);
        let worst = deltas.iter().copied().fold(f64::MIN, f64::max);
        println!(
            "  {:<4} delta at finish {:+.3}s, largest deficit {:+.3}s",
            driver, finish, worst
        );
    }

    if let Some(reference_time) = reference_time {
        println!("\n  Lap times (reference {:.3}s):", reference_time);
        for gap in lap_time_gaps(reference_time, &lap_times) {
            println!("    {:<4} {:.3}s ({:+.3}s)", gap.driver, gap.lap_time, gap.gap);
        }
    }

    if let Some(path) = output {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        let mut header = vec!["distance".to_string()];
        header.extend(trace.deltas.iter().map(|(d, _)| d.clone()));
        writer.write_record(&header)?;
        for (i, distance) in trace.distance.iter().enumerate() {
            let mut record = vec![format!("{:.3}", distance)];
            record.extend(trace.deltas.iter().map(|(_, d)| format!("{:.4}", d[i])));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        println!("\n[Export] Written: {}", path.display());
    }
    Ok(())
}

fn run_speed(
    session: &Session,
    drivers: &[String],
    lap: LapSelector,
    window: usize,
    output: Option<&Path>,
) -> Result<()> {
    banner(&format!("SPEED TRACES ({} lap)", lap));

    let comparison = speed_traces(session, drivers, lap, window);
    for speed in &comparison.traces {
        let top = speed.top_speed().unwrap_or(0.0);
        match speed.sectors {
            Some([s1, s2]) => println!(
                "  {:<4} lap {:>2}: top speed {:.1} km/h, sectors at {:.0}m / {:.0}m",
                speed.driver, speed.lap_number, top, s1, s2
            ),
            None => println!(
                "  {:<4} lap {:>2}: top speed {:.1} km/h",
                speed.driver, speed.lap_number, top
            ),
        }
    }
    for (driver, reason) in &comparison.skipped {
        println!("  {:<4} skipped ({})", driver, reason);
    }

    if let Some(path) = output {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["driver", "distance", "speed"])?;
        for speed in &comparison.traces {
            for (distance, value) in &speed.trace {
                writer.write_record([
                    speed.driver.clone(),
                    format!("{:.2}", distance),
                    format!("{:.2}", value),
                ])?;
            }
        }
        writer.flush()?;
        println!("\n[Export] Written: {}", path.display());
    }
    Ok(())
}

fn run_envelope(session: &Session, config: &AnalysisConfig, output: Option<&Path>) -> Result<()> {
    banner(&format!("SPEED ENVELOPE - {}", session.info));

    let mut traces = Vec::new();
    for driver in session.drivers() {
        match lap_observation(session, &driver, LapSelector::Fastest) {
            Ok((obs, _)) if !obs.is_empty() => traces.push(obs),
            Ok(_) => log::warn!("[Envelope] No telemetry for {}", driver),
            Err(e) => log::warn!("[Envelope] Skipping {}: {}", driver, e),
        }
    }

    let envelope = speed_envelope(&traces, &config.envelope)?;
    println!(
        "  {} drivers, {} buckets of {} m",
        traces.len(),
        envelope.len(),
        config.envelope.resolution_m
    );
    if let Some(widest) = envelope
        .iter()
        .max_by(|a, b| (a.max_speed - a.min_speed).total_cmp(&(b.max_speed - b.min_speed)))
    {
        println!(
            "  Widest spread at {:.0}m: {:.1} - {:.1} km/h",
            widest.distance, widest.min_speed, widest.max_speed
        );
    }

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_envelope(csv::Writer::from_writer(file), &envelope)?;
            println!("\n[Export] Written: {}", path.display());
        }
        None => write_envelope(csv::Writer::from_writer(io::stdout().lock()), &envelope)?,
    }
    Ok(())
}

fn write_envelope<W: Write>(mut writer: csv::Writer<W>, envelope: &[EnvelopePoint]) -> Result<()> {
    writer.write_record(["distance", "min_speed", "max_speed", "median_speed", "count"])?;
    for point in envelope {
        writer.write_record([
            format!("{:.1}", point.distance),
            format!("{:.2}", point.min_speed),
            format!("{:.2}", point.max_speed),
            format!("{:.2}", point.median_speed),
            point.count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn run_corners(session: &Session) -> Result<()> {
    let Some(circuit) = session.circuit_info() else {
        bail!("session has no circuit information");
    };

    banner(&format!("CORNERS - {}", session.info));
    for corner in &circuit.corners {
        println!(
            "  {:<10} {:>7.0}m  ({:.0}, {:.0})",
            corner.label(),
            corner.distance,
            corner.x,
            corner.y
        );
    }
    Ok(())
}
