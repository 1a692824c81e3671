use std::path::PathBuf;

use crate::auth::store::FileTokenStore;
use crate::error::AppError;

/// Global settings shared by every command, resolved from CLI flags and
/// `CHARGECTL_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub host: Option<String>,
    pub charger_id: Option<u32>,
    pub charger_position: Option<u32>,
    pub token_file: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn require_host(&self) -> Result<&str, AppError> {
        self.host.as_deref().ok_or_else(|| {
            AppError::InvalidInput("--host (or CHARGECTL_HOST) is required".into())
        })
    }

    pub fn require_charger(&self) -> Result<(u32, u32), AppError> {
        match (self.charger_id, self.charger_position) {
            (Some(id), Some(position)) => Ok((id, position)),
            _ => Err(AppError::InvalidInput(
                "--charger-id and --charger-position (or CHARGECTL_CHARGER_ID and \
                 CHARGECTL_CHARGER_POSITION) are required"
                    .into(),
            )),
        }
    }

    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(
            self.token_file
                .clone()
                .unwrap_or_else(FileTokenStore::default_path),
        )
    }
}
