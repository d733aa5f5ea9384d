//! contactmgr entry point.

use std::process::ExitCode;

use clap::Parser;

use contactmgr_core::init_tracing;
use contactmgr_server::cli::{Cli, Command, ConfigAction};
use contactmgr_server::{ServerConfig, ServerResult, commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    let bind = match cli.command {
        Some(Command::Config { action }) => {
            return match action {
                ConfigAction::Dump => commands::config_dump(&config),
                ConfigAction::Validate => commands::config_validate(&config),
                ConfigAction::Path => commands::config_path(),
            };
        }
        Some(Command::Serve { bind }) => bind,
        None => None,
    };

    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    init_tracing(config.logging.to_tracing_config(cli.debug)?)?;
    commands::serve(&config).await
}
