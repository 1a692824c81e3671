pub mod auth;
pub mod control;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::api::client::ChargerApi;
use crate::auth::credentials::Credentials;
use crate::auth::manager::CredentialManager;
use crate::config::RuntimeConfig;
use crate::error::AppError;

#[derive(Parser)]
#[command(
    name = "chargectl",
    version,
    about = "Charging-station cloud CLI - set charge mode and charge limit"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cloud API host, e.g. api.example.com
    #[arg(long, env = "CHARGECTL_HOST", global = true)]
    pub host: Option<String>,

    /// Charging station id
    #[arg(long, env = "CHARGECTL_CHARGER_ID", global = true)]
    pub charger_id: Option<u32>,

    /// Connector position on the charging station
    #[arg(long, env = "CHARGECTL_CHARGER_POSITION", global = true)]
    pub charger_position: Option<u32>,

    /// Path of the persisted token record
    #[arg(long, env = "CHARGECTL_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate with the charging-station cloud
    Login,

    /// Clear the stored token record
    Logout,

    /// Show authentication status
    Status,

    /// Force a token refresh now
    Refresh,

    /// Set the charge mode
    Mode {
        /// Target mode: NORMAL, SMART or PAUSED
        mode: String,
    },

    /// Set the charge limit
    Limit {
        /// Target limit in percent (0-100)
        percentage: u8,
    },
}

pub(crate) fn build_manager(
    config: &RuntimeConfig,
    credentials: Credentials,
) -> Result<(ChargerApi, Arc<CredentialManager>), AppError> {
    let api = ChargerApi::new(config.require_host()?)?;
    let manager = CredentialManager::new(
        api.clone(),
        credentials,
        Arc::new(config.token_store()),
    );
    Ok((api, Arc::new(manager)))
}
