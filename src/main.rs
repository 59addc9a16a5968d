//! showdeck - browse the TVmaze catalog from the terminal
//!
//! # Usage
//!
//! ```bash
//! showdeck search "twin peaks"
//! showdeck cast 1337 --json
//! RUST_LOG=showdeck=debug showdeck genres Drama
//! ```

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use showdeck::catalog::Catalog;
use showdeck::cli::{Cli, Command, ExitCode, Output};
use showdeck::commands;
use showdeck::config::Config;

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await.into()
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let catalog = Catalog::from_config(&config);

    match cli.command {
        Command::Search(cmd) => commands::search_cmd(cmd, &catalog, &output).await,
        Command::Show(cmd) => commands::show_cmd(cmd, &catalog, &output).await,
        Command::Cast(cmd) => commands::cast_cmd(cmd, &catalog, &output).await,
        Command::Crew(cmd) => commands::crew_cmd(cmd, &catalog, &output).await,
        Command::Seasons(cmd) => commands::seasons_cmd(cmd, &catalog, &output).await,
        Command::Episodes(cmd) => commands::episodes_cmd(cmd, &catalog, &output).await,
        Command::Page(cmd) => commands::page_cmd(cmd, &catalog, &output).await,
        Command::Genres(cmd) => commands::genres_cmd(cmd, &catalog, &output).await,
        Command::Top(cmd) => commands::top_cmd(cmd, &catalog, &output).await,
        Command::GenreList => commands::genre_list_cmd(&output),
    }
}
