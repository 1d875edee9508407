// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use khmerzoon::tui::App;
use khmerzoon::{Config, SystemClock, UpcomingSection};

mod cli;
use cli::{CommandContext, CountdownCommand, OutputFormat, UpcomingCommand};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "khmerzoon")]
#[command(about = "Terminal client for the KHMERZOON streaming catalog")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (khmerzoon_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serve rows from a JSON file instead of the remote backend
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default if no command given)
    Tui,

    /// List upcoming releases with their countdowns
    Upcoming {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Count down to a timestamp
    Countdown {
        /// Target time, e.g. 2026-12-24T18:00:00Z
        target: String,
        /// Print the current value and exit
        #[arg(long)]
        once: bool,
    },

    /// Configure the backend interactively
    Setup,
}

fn init_logging(cli: &Cli) -> Result<()> {
    if cli.debug_log {
        let file = File::create("khmerzoon_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("khmerzoon=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };
    config.apply_env();

    if let Some(Commands::Setup) = &cli.command {
        khmerzoon::setup::interactive_backend_setup(&config_path).await?;
        return Ok(());
    }

    // Only the TUI offers first-run setup; other commands just report
    if cli.fixture.is_none() && khmerzoon::setup::should_run_setup(&config_path, &config) {
        match &cli.command {
            Some(Commands::Tui) | None if config.backend.is_placeholder() => {
                config = khmerzoon::setup::interactive_backend_setup(&config_path).await?;
                config.apply_env();
            }
            _ => {}
        }
    }

    let countdown_period = Duration::from_millis(config.ui.countdown_ms.max(1));
    let context = CommandContext::new(config.clone(), cli.fixture.clone());

    match cli.command {
        Some(Commands::Tui) | None => {
            let store = context.store(false)?;
            let section = UpcomingSection::new(
                store,
                Arc::new(SystemClock),
                context.table(),
                countdown_period,
            );
            let app = App::new(section, config.ui.card_columns);
            khmerzoon::run_tui(app, config.ui.tick_ms.max(1)).await?;
        }

        Some(Commands::Upcoming { format }) => {
            let cmd = UpcomingCommand {
                format: OutputFormat::from_str(&format)?,
            };
            cmd.execute(context).await?;
        }

        Some(Commands::Countdown { target, once }) => {
            let cmd = CountdownCommand {
                target,
                once,
                period: countdown_period,
            };
            cmd.execute().await?;
        }

        Some(Commands::Setup) => {}
    }

    Ok(())
}
