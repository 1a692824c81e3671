pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod models;

use cli::output::print_error;
use config::RuntimeConfig;
use error::AppError;

pub async fn run(cli_args: cli::Cli) -> i32 {
    let config = RuntimeConfig {
        host: cli_args.host,
        charger_id: cli_args.charger_id,
        charger_position: cli_args.charger_position,
        token_file: cli_args.token_file,
    };

    let result = dispatch(cli_args.command, &config).await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            print_error(&err);
            err.exit_code()
        }
    }
}

async fn dispatch(command: cli::Commands, config: &RuntimeConfig) -> Result<(), AppError> {
    match command {
        cli::Commands::Login => cli::auth::handle_login(config).await,
        cli::Commands::Logout => cli::auth::handle_logout(config).await,
        cli::Commands::Status => cli::auth::handle_status(config).await,
        cli::Commands::Refresh => cli::auth::handle_refresh(config).await,
        cli::Commands::Mode { mode } => cli::control::handle_mode(&mode, config).await,
        cli::Commands::Limit { percentage } => {
            cli::control::handle_limit(percentage, config).await
        }
    }
}
