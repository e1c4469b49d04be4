mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pagepilot")]
#[command(about = "Drive a headless browser by describing pages and clicking targets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.pagepilot/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a page as JSON
    Describe {
        /// Navigate here first
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Click a target and print the resulting page
    Act {
        /// Selector, id, visible text, href or button name
        target: String,

        /// Load this URL before acting
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Interactive session over a single browser
    Shell,

    /// Inspect and run tools
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ToolsCommands {
    /// List registered tools
    List,

    /// Run a tool with JSON parameters
    Run {
        /// Tool name
        name: String,

        /// Parameters as a JSON object
        #[arg(default_value = "{}")]
        params: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries JSON results; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Describe { url } => {
            commands::page::describe(config_path, url.as_deref()).await?;
        }
        Commands::Act { target, url } => {
            commands::page::act(config_path, &target, url.as_deref()).await?;
        }
        Commands::Shell => {
            commands::page::shell(config_path).await?;
        }
        Commands::Tools { command } => match command {
            ToolsCommands::List => {
                commands::tools_cmd::list().await?;
            }
            ToolsCommands::Run { name, params } => {
                commands::tools_cmd::run(config_path, &name, &params).await?;
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                commands::config_cmd::show(config_path).await?;
            }
            ConfigCommands::Init { force } => {
                commands::config_cmd::init(config_path, force).await?;
            }
        },
    }

    Ok(())
}
