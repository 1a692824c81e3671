pub mod limit;
pub mod mode;

pub use limit::LimitController;
pub use mode::ModeController;

use serde_json::Value;
use tracing::warn;

use crate::api::client::ChargerApi;
use crate::auth::manager::CredentialManager;
use crate::error::AppError;

/// One authorized PUT against the connector mode endpoint, with a single
/// refresh-and-retry cycle when the server rejects the bearer token.
///
/// The retry cap is 1: a second 401 after a reported-successful refresh is
/// a hard failure rather than another refresh round.
pub(crate) async fn put_with_reauth(
    api: &ChargerApi,
    auth: &CredentialManager,
    charger_id: u32,
    charger_position: u32,
    body: &Value,
) -> Result<(), AppError> {
    let mut token = auth.get_access_token().await?;
    let mut retried = false;
    loop {
        match api
            .put_connector_mode(charger_id, charger_position, &token, body)
            .await
        {
            Ok(()) => return Ok(()),
            Err(AppError::TokenExpired { .. }) if !retried => {
                retried = true;
                warn!("control request rejected with 401, refreshing token");
                if !auth.refresh_after_unauthorized(&token).await? {
                    return Err(AppError::NotAuthenticated);
                }
                token = auth.get_access_token().await?;
            }
            Err(err) => return Err(err),
        }
    }
}
