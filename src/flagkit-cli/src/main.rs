//! FlagKit CLI — resolve a campaign catalog file against a visitor context
//! and print the resulting modification table.

use anyhow::Context as _;
use clap::Parser;
use flagkit_allocation::{FixedDraw, InMemoryAllocationStore, VisitorIdentity};
use flagkit_core::events::noop_sink;
use flagkit_core::{DecisionMode, FlagValue, SdkConfig};
use flagkit_engine::FlagEngine;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "flagkit")]
#[command(about = "Resolve a campaign catalog against a visitor context")]
#[command(version)]
struct Cli {
    /// Path to a catalog JSON file
    #[arg(long)]
    catalog: std::path::PathBuf,

    /// Visitor id the decision runs for
    #[arg(long, env = "FLAGKIT__VISITOR_ID", default_value = "anonymous")]
    visitor_id: String,

    /// Secondary visitor id, e.g. a CRM identifier
    #[arg(long)]
    custom_visitor_id: Option<String>,

    /// Decision mode (overrides config)
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Context entries as key=value; values parse as bool, number, or string
    #[arg(long = "context", value_name = "KEY=VALUE")]
    context: Vec<String>,

    /// Fixed allocation draw in [0, 100) for reproducible runs
    #[arg(long)]
    draw: Option<f64>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Server,
    Client,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flagkit=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = SdkConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        SdkConfig::default()
    });
    if let Some(mode) = cli.mode {
        config.decision_mode = match mode {
            Mode::Server => DecisionMode::Server,
            Mode::Client => DecisionMode::Client,
        };
    }

    let raw = std::fs::read_to_string(&cli.catalog)
        .with_context(|| format!("reading catalog file {}", cli.catalog.display()))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("catalog file is not valid JSON")?;

    let engine = FlagEngine::new(
        config,
        VisitorIdentity::new(cli.visitor_id.clone(), cli.custom_visitor_id.clone()),
        Arc::new(InMemoryAllocationStore::new()),
        noop_sink(),
    );
    let engine = match cli.draw {
        Some(value) => engine.with_draw_source(Arc::new(FixedDraw(value))),
        None => engine,
    };

    for entry in &cli.context {
        let Some((key, value)) = entry.split_once('=') else {
            warn!(entry = %entry, "context entry is not key=value, skipped");
            continue;
        };
        engine.update_context(key, parse_context_value(value));
    }

    let outcome = engine.synchronize(&payload)?;
    info!(?outcome, visitor = %cli.visitor_id, "catalog resolved");

    let snapshot = engine.active_modifications();
    let mut keys: Vec<_> = snapshot.keys().collect();
    keys.sort();
    for key in keys {
        let modification = &snapshot[key];
        println!(
            "{key} = {}  (group {}, variation {})",
            modification.value, modification.variation_group_id, modification.variation_id
        );
    }
    Ok(())
}

fn parse_context_value(raw: &str) -> FlagValue {
    if let Ok(b) = raw.parse::<bool>() {
        return FlagValue::Bool(b);
    }
    if let Ok(n) = raw.parse::<f64>() {
        return FlagValue::Number(n);
    }
    FlagValue::from(raw)
}
