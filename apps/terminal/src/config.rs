//! Environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use quiz_core::{GradingMode, SessionSettings, DEFAULT_ADVANCE_DELAY, DEFAULT_THRESHOLD};

use crate::error::ConfigError;

/// Terminal client configuration, read from `QUIZ_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub questions: PathBuf,
    pub grading: GradingMode,
    pub threshold: f64,
    pub advance_delay: Duration,
    pub backend_url: Option<String>,
    pub user: Option<String>,
    pub device_name: Option<String>,
    pub data_dir: PathBuf,
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a key to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let questions = get("QUIZ_QUESTIONS")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("QUIZ_QUESTIONS"))?;

        let grading = match get("QUIZ_GRADING") {
            Some(value) => GradingMode::from_str(value.trim()).ok_or(ConfigError::Invalid {
                key: "QUIZ_GRADING",
                value,
            })?,
            None => GradingMode::default(),
        };

        let threshold = match get("QUIZ_THRESHOLD") {
            Some(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| (0.0..=1.0).contains(t))
                .ok_or(ConfigError::Invalid {
                    key: "QUIZ_THRESHOLD",
                    value,
                })?,
            None => DEFAULT_THRESHOLD,
        };

        let advance_delay = match get("QUIZ_ADVANCE_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Invalid {
                    key: "QUIZ_ADVANCE_MS",
                    value,
                })?,
            None => DEFAULT_ADVANCE_DELAY,
        };

        let data_dir = get("QUIZ_DATA_DIR").map(PathBuf::from).unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("quiz")
        });

        Ok(Self {
            questions,
            grading,
            threshold,
            advance_delay,
            backend_url: get("QUIZ_BACKEND_URL").map(|url| url.trim().to_string()),
            user: get("QUIZ_USER").map(|user| user.trim().to_string()),
            device_name: get("QUIZ_DEVICE_NAME"),
            data_dir,
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            grading: self.grading,
            threshold: self.threshold,
            advance_delay: self.advance_delay,
        }
    }
}
