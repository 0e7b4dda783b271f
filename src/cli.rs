//! CLI module for Metron
//!
//! Provides commands:
//! - `resolve`: Print the namespace a name resolves to
//! - `emit`: Emit one metric through the configured backends
//! - `backends`: List the configured backends

use anyhow::Result;
use clap::{Parser, Subcommand};
use metron_backends::configure;
use metron_core::{resolve, BackendRegistry, MetricKind};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::loader::{load_config, AppConfig};

/// Metron metrics CLI
#[derive(Parser, Debug)]
#[command(name = "metron")]
#[command(about = "Resolve metric names and emit metrics through configured backends")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the namespace a name resolves to
    Resolve {
        /// Name to resolve
        name: String,
        /// Extra segment appended to the name
        #[arg(long, default_value = "")]
        extra: String,
    },
    /// Emit one metric through the configured backends
    Emit(EmitArgs),
    /// List the configured backends
    Backends,
}

/// Arguments of `metron emit`
#[derive(clap::Args, Debug, Clone)]
pub struct EmitArgs {
    /// Metric kind: incr, gauge, timing or histogram
    pub kind: MetricKind,
    /// Stat name, appended to the namespace
    pub stat: String,
    /// Value to record
    #[arg(long, default_value_t = 1.0)]
    pub value: f64,
    /// Tag in key:value form (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Namespace (defaults to the configured one)
    #[arg(long)]
    pub namespace: Option<String>,
}

/// Run the CLI command
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Resolve { name, extra }) => {
            println!("{}", resolve(name.as_str(), &extra));
            Ok(())
        }
        Some(Commands::Emit(args)) => {
            let config = load_config(cli.config.as_deref())?;
            emit(&BackendRegistry::current(), &config, &args);
            Ok(())
        }
        Some(Commands::Backends) => {
            let config = load_config(cli.config.as_deref())?;
            for backend in &config.backends {
                if backend.options.is_empty() {
                    println!("{}", backend.class);
                } else {
                    println!("{} {}", backend.class, serde_json::to_string(&backend.options)?);
                }
            }
            Ok(())
        }
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Install the configured backends into `registry` and emit one metric
pub fn emit(registry: &BackendRegistry, config: &AppConfig, args: &EmitArgs) {
    let backends = configure(registry, &config.backends);
    if backends.is_empty() {
        warn!("No metrics backend could be configured; nothing will be recorded");
    }

    let namespace = args.namespace.as_deref().unwrap_or(&config.namespace);
    let metrics = registry
        .get_metrics(namespace, "")
        .with_tags(args.tags.iter().cloned());
    let value = metric_value(args.value);

    match args.kind {
        MetricKind::Incr => metrics.incr_by(&args.stat, value),
        MetricKind::Gauge => metrics.gauge(&args.stat, value),
        MetricKind::Timing => metrics.timing(&args.stat, value),
        MetricKind::Histogram => metrics.histogram(&args.stat, value),
    }

    debug!(
        kind = %args.kind,
        stat = %metrics.full_stat(&args.stat),
        backends = backends.len(),
        "Metric emitted"
    );
}

/// Whole numbers are emitted as integers, everything else as floats.
fn metric_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
