use serde_json::json;

use crate::auth::credentials::require_credentials_from_env;
use crate::cli::build_manager;
use crate::cli::output::print_json;
use crate::config::RuntimeConfig;
use crate::control::{LimitController, ModeController};
use crate::error::AppError;
use crate::models::ChargeMode;

pub async fn handle_mode(mode: &str, config: &RuntimeConfig) -> Result<(), AppError> {
    let mode: ChargeMode = mode.parse()?;
    let (charger_id, charger_position) = config.require_charger()?;
    let credentials = require_credentials_from_env()?;

    let (api, manager) = build_manager(config, credentials)?;
    let mut controller = ModeController::new(api, manager, charger_id, charger_position);
    controller.set_mode(mode).await?;

    print_json(&json!({
        "charger_id": charger_id,
        "connector": charger_position,
        "mode": mode.as_str(),
    }));
    Ok(())
}

pub async fn handle_limit(percentage: u8, config: &RuntimeConfig) -> Result<(), AppError> {
    let (charger_id, charger_position) = config.require_charger()?;
    let credentials = require_credentials_from_env()?;

    let (api, manager) = build_manager(config, credentials)?;
    let mut controller = LimitController::new(api, manager, charger_id, charger_position);
    controller.set_limit(percentage).await?;

    print_json(&json!({
        "charger_id": charger_id,
        "connector": charger_position,
        "limit_percentage": percentage,
    }));
    Ok(())
}
