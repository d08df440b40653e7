//! # Stage Engine CLI
//!
//! Headless driver for the scroll-stage engine. Runs stages against an
//! in-process host and prints what each act would render.
//!
//! ## Commands
//! - `sweep`: scroll a stage from top to bottom and trace every act
//! - `validate`: check an authoring file
//! - `counter`: play one spring counter into view
//! - `preset`: print the built-in homepage stage as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stage_core::counter::{CounterSpec, InView, SpringCounter};
use stage_core::lifecycle::HeadlessHost;
use stage_core::{presets, CompositionRoot, EngineConfig, Rect, SharedHost};
use stage_data::model::StageJson;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "stage-engine")]
#[command(about = "Headless driver for scroll-driven multi-act stages")]
#[command(version)]
struct Cli {
    /// Log lifecycle detail (phase changes, listener churn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll a stage from top to bottom and print each act per step
    Sweep {
        /// Stage JSON file (defaults to the built-in homepage)
        #[arg(short, long)]
        stage: Option<PathBuf>,

        /// Engine config JSON, overriding any config embedded in the stage
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of scroll steps between top and bottom
        #[arg(long, default_value_t = 20)]
        steps: u32,
    },

    /// Load and validate a stage file
    Validate {
        /// Stage JSON file
        file: PathBuf,
    },

    /// Scroll a counter into view and print every value it displays
    Counter {
        #[arg(long)]
        value: u32,

        /// Seconds for the eased approach
        #[arg(short, long, default_value_t = 2.0)]
        duration: f32,

        #[arg(long, default_value = "")]
        prefix: String,

        #[arg(long, default_value = "")]
        suffix: String,
    },

    /// Print the built-in homepage stage
    Preset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "stage_engine=debug,stage_core=debug"
    } else {
        "stage_engine=info,stage_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Sweep {
            stage,
            config,
            steps,
        } => cmd_sweep(stage.as_deref(), config.as_deref(), steps),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Counter {
            value,
            duration,
            prefix,
            suffix,
        } => cmd_counter(value, duration, prefix, suffix),
        Commands::Preset => cmd_preset(),
    }
}

fn load_stage(path: &Path) -> Result<StageJson> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read stage file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse stage file {}", path.display()))
}

fn load_config(path: Option<&Path>, stage: &StageJson) -> Result<EngineConfig> {
    if let Some(path) = path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        return EngineConfig::from_json_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()));
    }
    match &stage.config {
        Some(value) => EngineConfig::from_value(value).context("invalid embedded config"),
        None => Ok(EngineConfig::default()),
    }
}

fn cmd_sweep(stage: Option<&Path>, config: Option<&Path>, steps: u32) -> Result<()> {
    let stage = match stage {
        Some(path) => load_stage(path)?,
        None => presets::homepage(),
    };
    let config = load_config(config, &stage)?;
    let dt = config.frame_dt();
    let steps = steps.max(1);

    let host: SharedHost = HeadlessHost::new();
    let mut root = CompositionRoot::mount(&host, &stage, config).context("failed to mount stage")?;
    root.attach_track(0.0);
    let scrollable = root.track_height() - root.source().viewport_height();
    info!(track_height = root.track_height(), steps, "sweeping");

    for step in 0..=steps {
        let target = step as f32 / steps as f32;
        root.on_scroll(target * scrollable);
        let progress = root.frame(dt);

        let acts: Vec<String> = root
            .acts()
            .iter()
            .map(|act| {
                let render = act.render();
                format!("#{} {:?} {:.2}", act.index(), render.phase, render.opacity)
            })
            .collect();
        println!(
            "p={:.3}  {}  -> {:?}",
            progress.value(),
            acts.join("  "),
            root.pointer_target()
        );
    }

    if let Some(links) = root.navigation_surface() {
        println!("navigation:");
        for nav in links {
            println!("  • {} ({})", nav.label, nav.href);
        }
    }
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let stage = load_stage(file)?;
    let config = load_config(None, &stage)?;
    let host: SharedHost = HeadlessHost::new();
    let root = CompositionRoot::mount(&host, &stage, config)
        .with_context(|| format!("{} is not a valid stage", file.display()))?;
    println!(
        "ok: {} acts, track height {}px",
        root.acts().len(),
        root.track_height()
    );
    Ok(())
}

fn cmd_counter(value: u32, duration: f32, prefix: String, suffix: String) -> Result<()> {
    let config = EngineConfig::default();
    let dt = config.frame_dt();
    let viewport = config.viewport_height;
    let in_view = InView::new(config.in_view_margin);

    let host: SharedHost = HeadlessHost::new();
    let spec = CounterSpec::new(value, duration)
        .with_prefix(prefix)
        .with_suffix(suffix);
    let mut counter = SpringCounter::mount(&host, spec, &config.counter)?;

    // The element scrolls up from below the fold and comes to rest mid-screen.
    let mut top = viewport + 100.0;
    let rest = viewport / 2.0;
    let max_frames = ((duration + 15.0) / dt) as u32;
    let mut last = counter.text();
    println!("{:>7.3}s  {}", 0.0, last);

    for frame in 1..=max_frames {
        let visible = in_view.check(Rect::new(0.0, top, 240.0, 80.0), viewport);
        if counter.observe_visibility(visible) {
            debug!(frame, top, "counter entered view");
        }
        counter.tick(dt);
        top = (top - 12.0).max(rest);

        let text = counter.text();
        if text != last {
            println!("{:>7.3}s  {}", frame as f32 * dt, text);
            last = text;
        }
        if counter.fired() && !counter.is_animating() {
            break;
        }
    }
    println!("{} writes", counter.display().writes());
    Ok(())
}

fn cmd_preset() -> Result<()> {
    let json = serde_json::to_string_pretty(&presets::homepage())?;
    println!("{json}");
    Ok(())
}
