//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `TEXTRELAY_BOT_TOKEN` - Telegram bot token (falls back to `BOT_TOKEN`)
//! - `TEXTRELAY_OWNER_ID` - Owner user id
//! - `TEXTRELAY_SETTINGS_PATH` - Settings file location
//! - `TEXTRELAY_API_URL` - Bot API base URL

use std::env;

use tracing::warn;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "TEXTRELAY";

/// Unprefixed token variable kept for existing deployments.
const LEGACY_TOKEN_VAR: &str = "BOT_TOKEN";

/// Apply environment variable overrides to a config.
///
/// This allows the bot token to be provided via the environment instead of
/// the config file.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |name| env::var(name).ok())
}

/// Apply overrides using an arbitrary variable lookup.
fn apply_overrides_from(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(token) =
        lookup(&format!("{}_BOT_TOKEN", ENV_PREFIX)).or_else(|| lookup(LEGACY_TOKEN_VAR))
    {
        config.telegram.token = token;
    }

    if let Some(owner) = lookup(&format!("{}_OWNER_ID", ENV_PREFIX)) {
        match owner.trim().parse() {
            Ok(id) => config.owner.id = id,
            Err(_) => warn!("Ignoring {}_OWNER_ID: '{}' is not a number", ENV_PREFIX, owner),
        }
    }

    if let Some(path) = lookup(&format!("{}_SETTINGS_PATH", ENV_PREFIX)) {
        config.storage.settings_path = path;
    }

    if let Some(url) = lookup(&format!("{}_API_URL", ENV_PREFIX)) {
        config.telegram.api_url = url;
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `TEXTRELAY_CONFIG` environment variable, otherwise returns "textrelay.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "textrelay.conf".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "TEXTRELAY");
    }

    #[test]
    fn test_no_vars_leaves_config_unchanged() {
        let mut config = Config::default();
        config.telegram.token = "original_token".to_string();
        config.owner.id = 5;

        let result = apply_overrides_from(config, lookup(&[]));
        assert_eq!(result.telegram.token, "original_token");
        assert_eq!(result.owner.id, 5);
    }

    #[test]
    fn test_prefixed_token_wins_over_legacy() {
        let result = apply_overrides_from(
            Config::default(),
            lookup(&[("TEXTRELAY_BOT_TOKEN", "new"), ("BOT_TOKEN", "old")]),
        );
        assert_eq!(result.telegram.token, "new");
    }

    #[test]
    fn test_legacy_token_used_as_fallback() {
        let result = apply_overrides_from(Config::default(), lookup(&[("BOT_TOKEN", "old")]));
        assert_eq!(result.telegram.token, "old");
    }

    #[test]
    fn test_owner_and_paths() {
        let result = apply_overrides_from(
            Config::default(),
            lookup(&[
                ("TEXTRELAY_OWNER_ID", " 123456789 "),
                ("TEXTRELAY_SETTINGS_PATH", "/data/settings.json"),
                ("TEXTRELAY_API_URL", "http://localhost:8081"),
            ]),
        );
        assert_eq!(result.owner.id, 123456789);
        assert_eq!(result.storage.settings_path, "/data/settings.json");
        assert_eq!(result.telegram.api_url, "http://localhost:8081");
    }

    #[test]
    fn test_invalid_owner_ignored() {
        let mut config = Config::default();
        config.owner.id = 9;
        let result = apply_overrides_from(config, lookup(&[("TEXTRELAY_OWNER_ID", "abc")]));
        assert_eq!(result.owner.id, 9);
    }
}
