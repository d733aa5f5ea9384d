//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// contactmgr - Manage your Google contacts from the browser
#[derive(Debug, Parser)]
#[command(name = "contactmgr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CONTACTMGR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server (the default)
    Serve {
        /// Address to listen on, overriding `[server] bind`
        #[arg(long)]
        bind: Option<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Dump,
    /// Check the configuration, including credentials
    Validate,
    /// Print the configuration file path
    Path,
}
