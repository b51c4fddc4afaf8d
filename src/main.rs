//! Killcam replay runner
//!
//! Plays a JSON event script through the director with in-memory host
//! doubles and prints every frame that changed something. Used to tune
//! presets without launching the game.

use std::path::PathBuf;

use clap::Parser;
use killcam::core::config::{load_config, KillcamConfig};
use killcam::core::error::Result;
use killcam::director::FrameReport;
use killcam::replay::{run_script, ReplayScript};
use killcam::trigger::FixedRoll;
use killcam::world::{RecordingSink, ScriptedWorld};
use killcam::Director;

#[derive(Parser, Debug)]
#[command(name = "killcam")]
#[command(about = "Replay a gameplay event script through the killcam director")]
struct Args {
    /// Event script (JSON)
    script: PathBuf,

    /// Settings file (TOML); defaults apply when omitted
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Pin every chance roll to this value (0-100) instead of rolling
    #[arg(long)]
    roll: Option<f32>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    /// Print every frame, not just frames with transitions
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => KillcamConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let script = ReplayScript::from_json(&std::fs::read_to_string(&args.script)?)?;
    tracing::info!(
        "Replaying {} steps from {}",
        script.steps.len(),
        args.script.display()
    );

    let mut director = Director::new(config, RecordingSink::new(), ScriptedWorld::new(), script.player)?;
    if let Some(roll) = args.roll {
        director = director.with_roller(Box::new(FixedRoll(roll)));
    }

    let json = args.format == "json";
    let summary = run_script(&mut director, &script, |report| {
        if args.verbose || has_transitions(report) {
            print_report(report, json);
        }
    });

    director.shutdown()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        println!("{}", serde_json::to_string_pretty(director.stats())?);
    } else {
        println!();
        println!("Frames: {}", summary.frames);
        println!("Fatal frames: {}", summary.fatal_errors);
        for (at, kind) in &summary.fired {
            println!("  {:>8.3}s  {}", at, kind.display_name());
        }
        println!("Results:");
        for (result, count) in &director.stats().results {
            println!("  {:<24} {}", result.describe(), count);
        }
        println!("Sink writes: {}", director.sink().calls().len());
    }

    Ok(())
}

fn has_transitions(report: &FrameReport) -> bool {
    !report.session_events.is_empty() || !report.camera_transitions.is_empty() || report.absorbed_faults > 0
}

fn print_report(report: &FrameReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(err) => tracing::warn!("Could not serialize frame report: {}", err),
        }
        return;
    }

    println!(
        "{:>8.3}s  {:<10} {:<20} x{:.2}  weapon {}",
        report.now,
        format!("{:?}", report.effect_state),
        format!("{:?}", report.camera_mode),
        report.time_scale,
        if report.weapon_blocked { "blocked" } else { "free" }
    );
    for event in &report.session_events {
        println!("            session {:?}", event);
    }
    for transition in &report.camera_transitions {
        println!(
            "            camera {:?} -> {:?} {}",
            transition.from,
            transition.to,
            transition.reason.map(|r| format!("({:?})", r)).unwrap_or_default()
        );
    }
}
