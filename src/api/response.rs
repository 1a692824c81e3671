use serde::Deserialize;

/// Body of a successful `/v3/oauth2/token` response.
///
/// The server is not guaranteed to return a refresh token with every grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
