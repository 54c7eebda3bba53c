//! Configuration types.

use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Base URL of the triage backend API.
    pub api_base_url: String,
    /// Cosmetic pause before each bot message (0 disables it).
    pub typing_delay: Duration,
    /// How many inconclusive free-text interpretation rounds are allowed
    /// before the bot falls back to professional-referral guidance.
    pub max_disambiguation_attempts: u32,
    /// Per-request timeout for gateway calls.
    pub request_timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            typing_delay: Duration::from_millis(900),
            max_disambiguation_attempts: 3,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl BotConfig {
    /// Build a config from environment variables, falling back to defaults.
    /// A variable that is set but unparseable is an error, not a silent
    /// fallback.
    ///
    /// Recognized variables: `TRIAGE_API_URL`, `TRIAGE_TYPING_DELAY_MS`,
    /// `TRIAGE_MAX_DISAMBIGUATION`, `TRIAGE_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let api_base_url = std::env::var("TRIAGE_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let typing_delay = env_number("TRIAGE_TYPING_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.typing_delay);

        let max_disambiguation_attempts = env_number("TRIAGE_MAX_DISAMBIGUATION")?
            .unwrap_or(defaults.max_disambiguation_attempts);

        let request_timeout = env_number("TRIAGE_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Ok(Self {
            api_base_url,
            typing_delay,
            max_disambiguation_attempts,
            request_timeout,
        })
    }

    /// A config with no typing delay, for tests and scripted runs.
    pub fn instant() -> Self {
        Self {
            typing_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => {
            let value = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a number, got {raw:?}"),
            })?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = BotConfig::default();
        assert_eq!(cfg.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.max_disambiguation_attempts, 3);
        assert!(cfg.typing_delay > Duration::ZERO);
    }

    #[test]
    fn instant_config_has_no_delay() {
        let cfg = BotConfig::instant();
        assert_eq!(cfg.typing_delay, Duration::ZERO);
    }
}
