use serde::{Deserialize, Serialize};

/// Access/refresh token pair as persisted for the configured account.
///
/// A usable pair always carries a non-empty access token; the refresh token
/// may be absent, which forces a full password-grant login on the next
/// refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
