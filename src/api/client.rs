use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::response::TokenResponse;
use crate::auth::credentials::Credentials;
use crate::error::AppError;

const PATH_TOKEN: &str = "/v3/oauth2/token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OAuth2 grant to request from the token endpoint.
pub enum TokenGrant<'a> {
    Password(&'a Credentials),
    Refresh {
        refresh_token: &'a str,
        credentials: &'a Credentials,
    },
}

/// Thin HTTP client for the charging-station cloud API.
///
/// Every request carries an independent 10-second timeout.
#[derive(Debug, Clone)]
pub struct ChargerApi {
    client: reqwest::Client,
    base_url: String,
}

fn base_url_for(host: &str) -> String {
    if host.contains("://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{host}")
    }
}

impl ChargerApi {
    pub fn new(host: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url_for(host),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request a token pair with a password or refresh-token grant.
    ///
    /// Any non-200 status is an [`AppError::Auth`] (rejected grant); transport
    /// failures surface as [`AppError::Http`].
    pub async fn request_token(&self, grant: TokenGrant<'_>) -> Result<TokenResponse, AppError> {
        let url = format!("{}{}", self.base_url, PATH_TOKEN);

        let form: Vec<(&str, &str)> = match grant {
            TokenGrant::Password(credentials) => vec![
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ],
            TokenGrant::Refresh {
                refresh_token,
                credentials,
            } => vec![
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ],
        };

        debug!(url = %url, grant_type = form[0].1, "requesting token");

        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();
        if status == StatusCode::OK {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Auth {
                message: format!("token request rejected: {body}"),
                status: Some(status.as_u16()),
            })
        }
    }

    /// PUT a mode payload to a charging-station connector.
    ///
    /// 200 is success, 401 maps to [`AppError::TokenExpired`] so callers can
    /// run their refresh-and-retry cycle, anything else is [`AppError::Api`].
    pub async fn put_connector_mode(
        &self,
        charger_id: u32,
        charger_position: u32,
        token: &str,
        body: &Value,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/v3/chargingstations/{}/connectors/{}/mode",
            self.base_url, charger_id, charger_position
        );

        debug!(url = %url, "sending connector mode request");

        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::UNAUTHORIZED => Err(AppError::TokenExpired {
                message: "control request rejected with 401".into(),
            }),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Api {
                    message: format!("{status}: {body}"),
                    status: Some(status.as_u16()),
                })
            }
        }
    }
}
