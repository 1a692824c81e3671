use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;

/// Storage abstraction for the persisted token record.
///
/// Records are raw JSON values: interpreting (and rejecting malformed)
/// records is the credential manager's job, so a corrupt record leads to
/// re-authentication instead of a hard failure. Only faults in the storage
/// subsystem itself are reported as errors.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<Value>, AppError>;
    async fn save(&self, record: &Value) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

/// File-backed token store holding one JSON record per configured account.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("chargectl").join("tokens.json"))
            .unwrap_or_else(|| PathBuf::from("tokens.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<Value>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AppError::Storage(err.to_string())),
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                // Unparseable records surface as a non-mapping value so the
                // manager treats them as unauthenticated rather than fatal.
                warn!(path = %self.path.display(), error = %err, "token record is not valid JSON");
                Ok(Some(Value::Null))
            }
        }
    }

    async fn save(&self, record: &Value) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| AppError::Storage(err.to_string()))?;
        }

        // Write-then-rename so a crash mid-save never truncates the record.
        let tmp = self.path.with_extension("json.tmp");
        let serialized =
            serde_json::to_vec_pretty(record).map_err(|err| AppError::Storage(err.to_string()))?;
        tokio::fs::write(&tmp, serialized)
            .await
            .map_err(|err| AppError::Storage(err.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|err| AppError::Storage(err.to_string()))?;
        }
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| AppError::Storage(err.to_string()))
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Storage(err.to_string())),
        }
    }
}
