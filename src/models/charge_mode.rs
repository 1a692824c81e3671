use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Charging behavior selectable on a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeMode {
    Normal,
    Smart,
    Paused,
}

impl ChargeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeMode::Normal => "NORMAL",
            ChargeMode::Smart => "SMART",
            ChargeMode::Paused => "PAUSED",
        }
    }
}

impl FromStr for ChargeMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(ChargeMode::Normal),
            "SMART" => Ok(ChargeMode::Smart),
            "PAUSED" => Ok(ChargeMode::Paused),
            other => Err(AppError::InvalidInput(format!(
                "invalid charge mode: {other} (expected NORMAL, SMART or PAUSED)"
            ))),
        }
    }
}

impl fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
