//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use fancy_regex::Regex;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Placeholder shipped in the sample config.
const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Telegram
    if config.telegram.token.is_empty() {
        errors.push("telegram.token is required (or set TEXTRELAY_BOT_TOKEN)".to_string());
    }
    if config.telegram.token == TOKEN_PLACEHOLDER {
        errors.push("telegram.token has not been configured (still using placeholder)".to_string());
    }
    if config.telegram.api_url.is_empty() {
        errors.push("telegram.api_url must not be empty".to_string());
    }
    if config.telegram.poll_timeout_secs == 0 {
        errors.push("telegram.poll_timeout_secs must be non-zero".to_string());
    }

    // Owner
    if config.owner.id == 0 {
        errors.push("owner.id is required (or set TEXTRELAY_OWNER_ID)".to_string());
    }

    // Storage and relay
    if config.storage.settings_path.trim().is_empty() {
        errors.push("storage.settings_path must not be empty".to_string());
    }
    if config.relay.send_timeout_secs == 0 {
        errors.push("relay.send_timeout_secs must be non-zero".to_string());
    }

    // Filter patterns (try to compile them)
    if let Some(patterns) = config.block_patterns() {
        for (i, pattern) in patterns.iter().enumerate() {
            if Regex::new(pattern).is_err() {
                errors.push(format!(
                    "filters.patterns[{}] is not a valid regex: '{}'",
                    i, pattern
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_valid_config() -> Config {
        let mut config = Config::default();
        config.telegram.token = "123456:valid_token".to_string();
        config.owner.id = 123456789;
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&make_valid_config()).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.telegram.token = String::new();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("telegram.token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.telegram.token = TOKEN_PLACEHOLDER.to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_missing_owner_fails() {
        let mut config = make_valid_config();
        config.owner.id = 0;

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("owner.id"));
    }

    #[test]
    fn test_zero_timeouts_fail() {
        let mut config = make_valid_config();
        config.relay.send_timeout_secs = 0;
        config.telegram.poll_timeout_secs = 0;

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("relay.send_timeout_secs"));
        assert!(message.contains("telegram.poll_timeout_secs"));
    }

    #[test]
    fn test_invalid_regex_filter_fails() {
        let mut config = make_valid_config();
        config.filters = Some(FiltersConfig {
            enabled: true,
            patterns: Some(vec!["[invalid".to_string()]),
        });

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("not a valid regex"));
    }

    #[test]
    fn test_disabled_filter_not_validated() {
        let mut config = make_valid_config();
        config.filters = Some(FiltersConfig {
            enabled: false,
            patterns: Some(vec!["[invalid".to_string()]),
        });

        assert!(validate_config(&config).is_ok());
    }
}
