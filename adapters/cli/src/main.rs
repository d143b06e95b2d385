#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that autoplays a Hexstack session headlessly.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use hexstack_core::{ColorCategory, ColorPalette, Effect, SessionConfig, SessionOutcome};
use hexstack_system_session::{Notification, Session};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Parser)]
#[command(name = "hexstack", about = "Autoplay a hex stack merging session")]
struct Cli {
    /// TOML session configuration; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Stops after this many placements if the session has not ended.
    #[arg(long, default_value_t = 200)]
    max_placements: u32,
    /// Resolves cascades immediately instead of stepping frame by frame.
    #[arg(long)]
    instant: bool,
    /// Enables debug logging when `RUST_LOG` is unset.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Hexstack command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut session = Session::new(config);
    let mut report = Report::default();
    let notifications = session.drain_notifications();
    report.record(session.palette(), notifications);

    while report.placements < cli.max_placements && session.outcome().is_none() {
        let Some(hint) = session.hint() else {
            info!("no placement available");
            break;
        };
        session
            .place_stack(hint.stack, hint.cell)
            .with_context(|| {
                format!(
                    "placing stack {} on cell {}",
                    hint.stack.get(),
                    hint.cell.get()
                )
            })?;
        report.placements += 1;

        if cli.instant {
            session.resolve_cascade();
        } else {
            while session.is_cascading() {
                session.tick(FRAME);
                report.simulated += FRAME;
            }
        }
        let notifications = session.drain_notifications();
        report.record(session.palette(), notifications);
    }

    report.print(session.outcome());
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("reading session config {}", path.display()))?;
    toml::from_str(&source).with_context(|| format!("parsing session config {}", path.display()))
}

#[derive(Debug, Default)]
struct Report {
    placements: u32,
    waves: u32,
    transitions: u32,
    pieces_moved: usize,
    clears: u32,
    pieces_cleared: usize,
    simulated: Duration,
}

impl Report {
    fn record(&mut self, palette: &ColorPalette, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::Effect(Effect::Transition {
                    pieces, duration, ..
                }) => {
                    self.transitions += 1;
                    self.pieces_moved += pieces.len();
                    debug!(pieces = pieces.len(), ?duration, "transition");
                }
                Notification::Effect(Effect::Clear { pieces, .. }) => {
                    self.clears += 1;
                    self.pieces_cleared += pieces.len();
                    info!(pieces = pieces.len(), "run cleared");
                }
                Notification::WaveSpawned { wave, stacks } => {
                    self.waves += 1;
                    for stack in &stacks {
                        info!(
                            wave = wave.get(),
                            slot = stack.slot.get(),
                            colors = %describe(palette, &stack.colors),
                            "stack spawned"
                        );
                    }
                }
                Notification::SessionEnded(outcome) => info!(?outcome, "session ended"),
            }
        }
    }

    fn print(&self, outcome: Option<SessionOutcome>) {
        match outcome {
            Some(SessionOutcome::Win) => println!("result: win"),
            Some(SessionOutcome::Loss) => println!("result: loss"),
            None => println!("result: stopped after {} placements", self.placements),
        }
        println!("placements: {}", self.placements);
        println!("waves: {}", self.waves);
        println!(
            "transitions: {} ({} pieces moved)",
            self.transitions, self.pieces_moved
        );
        println!("clears: {} ({} pieces)", self.clears, self.pieces_cleared);
        if !self.simulated.is_zero() {
            println!("simulated time: {:.2}s", self.simulated.as_secs_f32());
        }
    }
}

fn describe(palette: &ColorPalette, colors: &[ColorCategory]) -> String {
    colors
        .iter()
        .map(|category| {
            let color = palette.color(*category);
            format!(
                "#{:02x}{:02x}{:02x}",
                color.red(),
                color.green(),
                color.blue()
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}
