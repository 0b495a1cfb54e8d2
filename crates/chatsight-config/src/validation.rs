// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: URL shapes, non-zero intervals, and sampling-parameter
//! ranges.

use crate::diagnostic::ConfigError;
use crate::model::ChatsightConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ChatsightConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    for (key, url) in [
        ("inference.host", config.inference.host.as_str()),
        ("projects.base_url", config.projects.base_url.as_str()),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be an http(s) URL, got `{url}`"),
            });
        }
    }

    if config.inference.timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "inference.timeout_ms must be greater than zero".to_string(),
        });
    }

    if !(0.0..=2.0).contains(&config.inference.temperature) {
        errors.push(ConfigError::Validation {
            message: format!(
                "inference.temperature must be within [0.0, 2.0], got {}",
                config.inference.temperature
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.inference.top_p) {
        errors.push(ConfigError::Validation {
            message: format!(
                "inference.top_p must be within [0.0, 1.0], got {}",
                config.inference.top_p
            ),
        });
    }

    if config.analysis.interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "analysis.interval_secs must be greater than zero".to_string(),
        });
    }

    if config.analysis.batch_size < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "analysis.batch_size must be at least 1, got {}",
                config.analysis.batch_size
            ),
        });
    }

    if config.analysis.concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "analysis.concurrency must be at least 1".to_string(),
        });
    }

    if config.analysis.max_messages < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "analysis.max_messages must be at least 1, got {}",
                config.analysis.max_messages
            ),
        });
    }

    // A refreshing credential provider needs the full auth triple.
    if config.projects.token.is_none() {
        let triple = [
            ("projects.auth_url", config.projects.auth_url.is_some()),
            ("projects.client_id", config.projects.client_id.is_some()),
            (
                "projects.client_secret",
                config.projects.client_secret.is_some(),
            ),
        ];
        if triple.iter().any(|(_, set)| *set) && !triple.iter().all(|(_, set)| *set) {
            let missing: Vec<&str> = triple
                .iter()
                .filter(|(_, set)| !set)
                .map(|(name, _)| *name)
                .collect();
            errors.push(ConfigError::Validation {
                message: format!(
                    "token refresh requires auth_url, client_id, and client_secret; missing: {}",
                    missing.join(", ")
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ChatsightConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ChatsightConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn non_http_inference_host_fails_validation() {
        let mut config = ChatsightConfig::default();
        config.inference.host = "localhost:11434".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("inference.host"))));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = ChatsightConfig::default();
        config.inference.timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("timeout_ms"))));
    }

    #[test]
    fn partial_auth_triple_fails_validation() {
        let mut config = ChatsightConfig::default();
        config.projects.auth_url = Some("http://auth.local/token".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("client_id"))));
    }

    #[test]
    fn static_token_without_auth_triple_passes() {
        let mut config = ChatsightConfig::default();
        config.projects.token = Some("tok".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn full_auth_triple_passes() {
        let mut config = ChatsightConfig::default();
        config.projects.auth_url = Some("http://auth.local/token".to_string());
        config.projects.client_id = Some("id".to_string());
        config.projects.client_secret = Some("secret".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_concurrency_fails_validation() {
        let mut config = ChatsightConfig::default();
        config.analysis.concurrency = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("concurrency"))));
    }
}
