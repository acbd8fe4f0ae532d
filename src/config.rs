use crate::domain::Decimal;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Decimal places of money presented in reports and rankings.
    pub money_scale: u32,
    /// Reject snapshots that break an advisory invariant.
    pub strict_validation: bool,
    /// Allowed distance of a table's split sum from 100.
    pub split_tolerance: Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            money_scale: 2,
            strict_validation: false,
            split_tolerance: Decimal::from_str_canonical("0.01").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let money_scale = match env_map.get("HAKEDIS_MONEY_SCALE") {
            None => defaults.money_scale,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|scale| *scale <= 28)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "HAKEDIS_MONEY_SCALE".to_string(),
                        "must be an integer between 0 and 28".to_string(),
                    )
                })?,
        };

        let strict_validation = match env_map
            .get("HAKEDIS_STRICT_VALIDATION")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "HAKEDIS_STRICT_VALIDATION".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let split_tolerance = match env_map.get("HAKEDIS_SPLIT_TOLERANCE") {
            None => defaults.split_tolerance,
            Some(raw) => Decimal::from_str_canonical(raw)
                .ok()
                .filter(|d| !d.is_negative())
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "HAKEDIS_SPLIT_TOLERANCE".to_string(),
                        "must be a non-negative decimal".to_string(),
                    )
                })?,
        };

        Ok(Config {
            money_scale,
            strict_validation,
            split_tolerance,
        })
    }
}
