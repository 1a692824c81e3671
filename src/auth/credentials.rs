use std::env;

use crate::error::AppError;

/// Account credentials supplied at configuration time.
///
/// Used only to perform the password grant; never persisted alongside tokens.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Get credentials from env vars, or None if any are missing.
pub fn credentials_from_env() -> Option<Credentials> {
    let username = env::var("CHARGECTL_USERNAME").ok()?;
    let password = env::var("CHARGECTL_PASSWORD").ok()?;
    let client_id = env::var("CHARGECTL_CLIENT_ID").ok()?;
    let client_secret = env::var("CHARGECTL_CLIENT_SECRET").ok()?;
    if username.is_empty() || password.is_empty() || client_id.is_empty() || client_secret.is_empty()
    {
        return None;
    }
    Some(Credentials {
        username,
        password,
        client_id,
        client_secret,
    })
}

pub fn require_credentials_from_env() -> Result<Credentials, AppError> {
    credentials_from_env().ok_or_else(|| {
        AppError::InvalidInput(
            "set CHARGECTL_USERNAME, CHARGECTL_PASSWORD, CHARGECTL_CLIENT_ID and \
             CHARGECTL_CLIENT_SECRET"
                .into(),
        )
    })
}
