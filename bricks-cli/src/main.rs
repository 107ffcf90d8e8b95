//! # Bricks
//!
//! Convert HTML into Bricks element graphs, check them and compose templates.

use bricks_cli::{run, CliArgs, CliConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing on stderr with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,bricks_core=info).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bricks_core=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from(&args);
    tracing::debug!("Config dir: {}", config.config_dir.display());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&config, args.command, &mut out)
}
