//! Missive CLI — the main entry point.
//!
//! Commands:
//! - `check`   — Validate a configuration and bind every contract
//! - `keys`    — List the message key of every contract method
//! - `render`  — Render (or send) one message

use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, Subcommand};

use missive_config::{LoggingConfig, MissiveConfig};

mod assembly;
mod commands;

#[derive(Parser)]
#[command(
    name = "missive",
    about = "Missive — templated messages from declared contracts",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration and bind every contract
    Check {
        /// Path to the configuration file
        config: PathBuf,
    },

    /// List the message key of every contract method
    Keys {
        /// Path to the configuration file
        config: PathBuf,
    },

    /// Render one contract method
    Render {
        /// Path to the configuration file
        config: PathBuf,

        /// Contract name
        contract: String,

        /// Method name
        method: String,

        /// Argument as name=value; repeatable
        #[arg(short, long = "arg", value_parser = assembly::parse_pair)]
        args: Vec<(String, String)>,

        /// Viewer for methods without a viewer parameter
        #[arg(long)]
        to: Option<String>,

        /// Send the message instead of printing it
        #[arg(long)]
        send: bool,

        /// Print the resolved replacements as JSON
        #[arg(long, conflicts_with = "send")]
        json: bool,
    },
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Commands::Check { config } | Commands::Keys { config } | Commands::Render { config, .. } => config,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = cli.command.config_path();
    if !path.exists() {
        bail!("config file {} does not exist", path.display());
    }
    let config = MissiveConfig::load(path)?;

    init_tracing(cli.verbose, &config.logging);

    match cli.command {
        Commands::Check { .. } => commands::check::run(&config)?,
        Commands::Keys { .. } => commands::keys::run(&config)?,
        Commands::Render {
            contract,
            method,
            args,
            to,
            send,
            json,
            ..
        } => {
            let request = commands::render::RenderRequest {
                contract,
                method,
                args,
                to,
                send,
                json,
            };
            commands::render::run(&config, &request)?
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, logging: &LoggingConfig) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
