//! BiteWise Narrator - read recipes aloud from the terminal

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use narrator::config::Config;
use narrator::narration::{narration_text, MealPlan, NarrationController};
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Synthesis backend (proxy or gemini)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Stay silent instead of using system speech when synthesis fails
    #[arg(long, global = true)]
    no_fallback: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Narrate the given text
    Speak { text: String },
    /// Narrate every course of a meal plan JSON file
    Recipe { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("Failed to load config")?;
    if let Some(backend) = args.backend {
        config.synthesis_backend = backend;
    }
    if args.no_fallback {
        config.fallback_engine = "none".to_string();
    }

    // Setup logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🍳 BiteWise Narrator v{} starting...", env!("CARGO_PKG_VERSION"));

    let text = match args.command {
        Command::Speak { text } => text,
        Command::Recipe { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let plan = MealPlan::from_json(&json).context("Invalid meal plan JSON")?;
            info!("📖 Narrating '{}' ({} courses)", plan.title, plan.courses.len());
            narration_text(&plan)
        }
    };

    if text.trim().is_empty() {
        warn!("Nothing to narrate");
        return Ok(());
    }

    let controller = NarrationController::from_config(&config)?;
    let mut states = controller.subscribe();
    let (done_tx, done_rx) = oneshot::channel();

    controller.speak(
        text,
        Some(Box::new(move || {
            let _ = done_tx.send(());
        })),
    );

    let idle = async {
        loop {
            if states.changed().await.is_err() {
                return;
            }
            let state = *states.borrow();
            if !state.is_active() {
                return;
            }
        }
    };

    tokio::select! {
        _ = done_rx => info!("✅ Narration finished"),
        _ = idle => info!("Narration ended: {:?}", controller.state()),
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Interrupted");
            controller.stop();
        }
    }

    Ok(())
}
