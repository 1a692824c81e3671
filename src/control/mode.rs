use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::put_with_reauth;
use crate::api::client::ChargerApi;
use crate::auth::manager::CredentialManager;
use crate::error::AppError;
use crate::models::ChargeMode;

/// Sets the charge mode on one connector and tracks the last applied value.
pub struct ModeController {
    api: ChargerApi,
    auth: Arc<CredentialManager>,
    charger_id: u32,
    charger_position: u32,
    current: Option<ChargeMode>,
}

impl ModeController {
    pub fn new(
        api: ChargerApi,
        auth: Arc<CredentialManager>,
        charger_id: u32,
        charger_position: u32,
    ) -> Self {
        Self {
            api,
            auth,
            charger_id,
            charger_position,
            current: None,
        }
    }

    /// Last mode the server acknowledged, if any.
    pub fn current_mode(&self) -> Option<ChargeMode> {
        self.current
    }

    pub async fn set_mode(&mut self, mode: ChargeMode) -> Result<(), AppError> {
        let body = json!({"mode": mode.as_str()});
        put_with_reauth(
            &self.api,
            &self.auth,
            self.charger_id,
            self.charger_position,
            &body,
        )
        .await?;
        self.current = Some(mode);
        info!(mode = mode.as_str(), "charge mode set");
        Ok(())
    }
}
