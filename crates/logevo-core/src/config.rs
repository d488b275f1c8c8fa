//! Detector configuration and its validation.

use serde::{Deserialize, Serialize};

use crate::errors::{LogEvoError, LogEvoResult};

/// Candidate admission threshold for call matching.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Environment variable overriding [`DEFAULT_SIMILARITY_THRESHOLD`].
pub const SIMILARITY_THRESHOLD_ENV: &str = "LOGEVO_SIMILARITY_THRESHOLD";

/// Tunables recognized by the evolution engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Only call pairs whose similarity ratio is strictly greater than this
    /// value are considered match candidates. Must lie in `(0, 1]`.
    pub similarity_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl DetectorConfig {
    pub fn with_threshold(similarity_threshold: f64) -> LogEvoResult<Self> {
        let config = Self {
            similarity_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LogEvoResult<()> {
        let t = self.similarity_threshold;
        if !t.is_finite() || t <= 0.0 || t > 1.0 {
            return Err(LogEvoError::Config(format!(
                "similarity_threshold must be in (0, 1], got {t}"
            )));
        }
        Ok(())
    }

    /// Build a config from the process environment.
    ///
    /// An unset or blank variable keeps the default; anything else must parse
    /// as a float inside the valid range.
    pub fn from_env() -> LogEvoResult<Self> {
        match std::env::var(SIMILARITY_THRESHOLD_ENV) {
            Ok(raw) => Self::from_threshold_str(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_json_str(payload: &str) -> LogEvoResult<Self> {
        let config: Self = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    fn from_threshold_str(raw: &str) -> LogEvoResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let value: f64 = trimmed.parse().map_err(|_| {
            LogEvoError::Config(format!(
                "{SIMILARITY_THRESHOLD_ENV} is not a number: {trimmed:?}"
            ))
        })?;
        Self::with_threshold(value)
    }
}
