use serde::Deserialize;

use psbthub_crypto::{
    DEFAULT_PASSWORD_DERIVATION_ITERATIONS, MAX_PASSWORD_DERIVATION_ITERATIONS,
    MIN_PASSWORD_DERIVATION_ITERATIONS,
};

use crate::error::ConfigError;
use crate::payload::PAYLOAD_VERSION;

pub const DEFAULT_MAX_ARTIFACT_BYTES: usize = 1024 * 1024;
pub const DEFAULT_SHARE_BASE_URL: &str = "https://psbthub.app";

/// Runtime settings for share creation and retrieval.
///
/// Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShareConfig {
    /// Upper bound for artifacts, shared by the validator and size obfuscation.
    pub max_artifact_bytes: usize,
    /// PBKDF2 iterations for new password-protected shares.
    pub password_iterations: u32,
    /// Origin used to build share links (`{base}/p/{id}`).
    pub share_base_url: String,
    /// Version number written to storage records.
    pub payload_version: u32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            password_iterations: DEFAULT_PASSWORD_DERIVATION_ITERATIONS,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            payload_version: PAYLOAD_VERSION as u32,
        }
    }
}

impl ShareConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_artifact_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_artifact_bytes must be positive".into(),
            ));
        }
        if !(MIN_PASSWORD_DERIVATION_ITERATIONS..=MAX_PASSWORD_DERIVATION_ITERATIONS)
            .contains(&self.password_iterations)
        {
            return Err(ConfigError::Invalid(format!(
                "password_iterations must be between {MIN_PASSWORD_DERIVATION_ITERATIONS} and {MAX_PASSWORD_DERIVATION_ITERATIONS}"
            )));
        }
        if self.share_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("share_base_url must not be empty".into()));
        }
        Ok(())
    }

    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.share_base_url.trim().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ShareConfig::default();
        assert_eq!(config.max_artifact_bytes, 1_048_576);
        assert_eq!(config.password_iterations, 310_000);
        assert_eq!(config.share_base_url, "https://psbthub.app");
        assert_eq!(config.payload_version, 1);
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ShareConfig::from_json(r#"{"password_iterations": 150000}"#).unwrap();
        assert_eq!(config.password_iterations, 150_000);
        assert_eq!(config.max_artifact_bytes, DEFAULT_MAX_ARTIFACT_BYTES);
    }

    #[test]
    fn invalid_values_rejected() {
        for json in [
            r#"{"max_artifact_bytes": 0}"#,
            r#"{"password_iterations": 1000}"#,
            r#"{"share_base_url": "  "}"#,
            r#"{"unknown": true}"#,
            "not json",
        ] {
            let err = ShareConfig::from_json(json).unwrap_err();
            assert_eq!(err.code(), "INVALID_CONFIG", "{json}");
        }
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let config = ShareConfig {
            share_base_url: "https://example.test/ ".into(),
            ..ShareConfig::default()
        };
        assert_eq!(config.base_url(), "https://example.test");
    }
}
