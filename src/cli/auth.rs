use dialoguer::{Input, Password};
use serde_json::json;

use crate::auth::credentials::{credentials_from_env, require_credentials_from_env, Credentials};
use crate::auth::store::TokenStore;
use crate::cli::build_manager;
use crate::cli::output::print_json;
use crate::config::RuntimeConfig;
use crate::error::AppError;

pub async fn handle_login(config: &RuntimeConfig) -> Result<(), AppError> {
    let credentials = match credentials_from_env() {
        Some(credentials) => credentials,
        None => prompt_credentials()?,
    };

    let (_, manager) = build_manager(config, credentials)?;

    if manager.authenticate().await? {
        print_json(&json!({
            "status": "authenticated",
            "host": config.require_host()?,
        }));
        Ok(())
    } else {
        Err(AppError::Auth {
            message: "login rejected by the token endpoint".into(),
            status: None,
        })
    }
}

pub async fn handle_logout(config: &RuntimeConfig) -> Result<(), AppError> {
    config.token_store().clear().await?;
    print_json(&json!({"status": "logged_out"}));
    Ok(())
}

pub async fn handle_status(config: &RuntimeConfig) -> Result<(), AppError> {
    match config.token_store().load().await? {
        Some(record) => {
            let has_access_token = record
                .get("access_token")
                .and_then(|v| v.as_str())
                .is_some_and(|t| !t.is_empty());
            let has_refresh_token = record
                .get("refresh_token")
                .and_then(|v| v.as_str())
                .is_some_and(|t| !t.is_empty());
            print_json(&json!({
                "status": if has_access_token { "authenticated" } else { "invalid_record" },
                "has_refresh_token": has_refresh_token,
            }));
        }
        None => {
            print_json(&json!({"status": "not_authenticated"}));
        }
    }
    Ok(())
}

pub async fn handle_refresh(config: &RuntimeConfig) -> Result<(), AppError> {
    let credentials = require_credentials_from_env()?;
    let (_, manager) = build_manager(config, credentials)?;

    // Pull the stored pair into memory first so the refresh grant can use
    // the persisted refresh token.
    match manager.get_access_token().await {
        Ok(_) | Err(AppError::NotAuthenticated) => {}
        Err(err) => return Err(err),
    }

    if manager.refresh_access_token().await? {
        print_json(&json!({"status": "refreshed"}));
        Ok(())
    } else {
        Err(AppError::Auth {
            message: "token refresh failed".into(),
            status: None,
        })
    }
}

fn prompt_credentials() -> Result<Credentials, AppError> {
    let username: String = Input::new()
        .with_prompt("Account email")
        .interact_text()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let password: String = Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let client_id: String = Input::new()
        .with_prompt("Client id")
        .interact_text()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let client_secret: String = Password::new()
        .with_prompt("Client secret")
        .interact()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    Ok(Credentials {
        username,
        password,
        client_id,
        client_secret,
    })
}
