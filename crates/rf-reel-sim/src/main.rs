//! ReelForge reel simulator
//!
//! Runs the reel widget's spin timeline headless, on a virtual clock.
//!
//! Usage:
//!   rf-reel-sim run --spins 100 --seed 7      - Simulate spins, print a summary
//!   rf-reel-sim run --profile turbo --trace   - Also dump each spin's timeline
//!   rf-reel-sim config --format yaml          - Print the classic config

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rf_reel::{HeadlessController, ReelConfig, TimingProfile, WinOutcome};

#[derive(Parser)]
#[command(name = "rf-reel-sim", about = "ReelForge reel widget simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate spins
    Run {
        /// Widget config (.json, .yaml or .yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 10)]
        spins: u64,
        /// RNG seed
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        /// Override the config's timing profile
        #[arg(short, long)]
        profile: Option<ProfileArg>,
        /// Print each spin's timeline as JSON
        #[arg(long)]
        trace: bool,
    },
    /// Print the classic config
    Config {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Normal,
    Turbo,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            spins,
            seed,
            profile,
            trace,
        } => run(config.as_deref(), spins, seed, profile, trace),
        Commands::Config { format } => print_config(format),
    }
}

fn load_config(path: Option<&Path>) -> Result<ReelConfig> {
    let Some(path) = path else {
        return Ok(ReelConfig::classic());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => ReelConfig::from_json(&text),
        Some("yaml" | "yml") => ReelConfig::from_yaml(&text),
        _ => bail!("Unsupported config extension: {}", path.display()),
    };
    config.with_context(|| format!("Invalid config {}", path.display()))
}

fn run(
    config: Option<&Path>,
    spins: u64,
    seed: u64,
    profile: Option<ProfileArg>,
    trace: bool,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(profile) = profile {
        let profile = match profile {
            ProfileArg::Normal => TimingProfile::Normal,
            ProfileArg::Turbo => TimingProfile::Turbo,
        };
        config.timing = rf_reel::TimingConfig::from_profile(profile);
        config.validate().context("Profile does not fit the reel count")?;
    }

    log::info!(
        "Simulating {} spins ({} reels, seed {}, {:?} timing)",
        spins,
        config.reel_count,
        seed,
        config.timing.profile
    );

    let mut controller = HeadlessController::headless(config, seed)?;
    controller.initialize_reels();

    for _ in 0..spins {
        if !controller.spin() {
            bail!("Spin rejected while idle");
        }
        controller.run_until_idle();

        let spin = controller.trace();
        let centers: Vec<&str> = controller
            .last_evaluation()
            .map(|e| e.centers.iter().map(|c| c.as_deref().unwrap_or("-")).collect())
            .unwrap_or_default();
        let label = match spin.outcome() {
            Some(WinOutcome::Jackpot { .. }) => "JACKPOT",
            Some(WinOutcome::ThreeOfAKind { .. }) => "WIN",
            Some(WinOutcome::NoWin) => "-",
            None => "?",
        };
        println!(
            "#{:<4} {:<8} {:>7.0} ms  {}",
            spin.spin_index,
            label,
            spin.duration_ms(),
            centers.join(" | ")
        );
        if trace {
            println!("{}", spin.to_json()?);
        }
    }

    let stats = controller.stats();
    println!();
    println!("Spins:     {}", stats.total_spins);
    println!("Completed: {}", stats.completed_spins);
    println!("Wins:      {}", stats.wins);
    println!("Jackpots:  {}", stats.jackpots);
    println!("Hit rate:  {:.2}%", stats.hit_rate());
    Ok(())
}

fn print_config(format: Format) -> Result<()> {
    let config = ReelConfig::classic();
    let text = match format {
        Format::Json => config.to_json()?,
        Format::Yaml => serde_yml::to_string(&config).context("YAML encoding failed")?,
    };
    println!("{}", text);
    Ok(())
}
