use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod format;
mod tui;

use commands::Cli;

#[tokio::main]
async fn main() -> miette::Result<()> {
    miette::set_panic_hook();

    // Initialize rustls crypto provider for the Azure and storage clients
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    // Handle --no-color flag
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    // Log lines would tear through the alternate screen, so the TUI stays
    // quiet unless asked for with --verbose or RUST_LOG
    let default_filter = if cli.verbose {
        "adls_meta=debug,adls_meta_core=debug".to_string()
    } else if cli.is_tui() {
        "off".to_string()
    } else {
        "adls_meta=info,adls_meta_core=info".to_string()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Using config file: {}", cli.config.display());

    cli.resolved_command()
        .run(&cli)
        .await
        .map_err(miette::Report::new)
}
