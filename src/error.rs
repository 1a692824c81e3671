#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication failed: {message}")]
    Auth {
        message: String,
        status: Option<u16>,
    },

    #[error("Token rejected: {message}")]
    TokenExpired { message: String },

    #[error("Not authenticated. Run 'chargectl login' first.")]
    NotAuthenticated,

    #[error("{0}")]
    InvalidInput(String),

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Auth { .. } | AppError::TokenExpired { .. } | AppError::NotAuthenticated => 2,
            _ => 1,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Auth { .. } => "auth",
            AppError::TokenExpired { .. } => "token_expired",
            AppError::NotAuthenticated => "not_authenticated",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Api { .. } => "api",
            AppError::Storage(_) => "storage",
            AppError::Http(_) => "http",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "error": self.error_type(),
            "message": self.to_string(),
        });
        if let Some(status) = self.http_status() {
            obj["http_status"] = serde_json::json!(status);
        }
        obj
    }

    fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Auth { status, .. } | AppError::Api { status, .. } => *status,
            _ => None,
        }
    }
}
