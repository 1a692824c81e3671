use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::put_with_reauth;
use crate::api::client::ChargerApi;
use crate::auth::manager::CredentialManager;
use crate::error::AppError;

/// Sets the charge limit percentage on one connector and tracks the last
/// applied value.
pub struct LimitController {
    api: ChargerApi,
    auth: Arc<CredentialManager>,
    charger_id: u32,
    charger_position: u32,
    current: Option<u8>,
}

impl LimitController {
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

    /// Last limit the server acknowledged, if any.
    pub fn current_limit(&self) -> Option<u8> {
        self.current
    }

    pub async fn set_limit(&mut self, percentage: u8) -> Result<(), AppError> {
        if percentage > 100 {
            return Err(AppError::InvalidInput(format!(
                "charge limit must be within 0-100, got {percentage}"
            )));
        }

        let body = json!({
            "mode": "NORMAL",
            "limit": {"unit": "PERCENTAGE", "value": percentage},
        });
        put_with_reauth(
            &self.api,
            &self.auth,
            self.charger_id,
            self.charger_position,
            &body,
        )
        .await?;
        self.current = Some(percentage);
        info!(percentage, "charge limit set");
        Ok(())
    }
}
