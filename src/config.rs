//! Composer configuration with environment overrides.

use std::env;
use std::time::Duration;

pub const DEFAULT_SUGGESTION_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const DEFAULT_MENTIONS_SYMBOL: &str = "@";
pub const DEFAULT_INSTANT_COMMANDS_SYMBOL: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Resolve mentions against the whole app's users instead of the
    /// channel's loaded members and watchers.
    pub mention_all_app_users: bool,
    /// Quiet period before a suggestion request is issued.
    pub suggestion_debounce: Duration,
    pub mentions_symbol: String,
    pub instant_commands_symbol: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            mention_all_app_users: false,
            suggestion_debounce: DEFAULT_SUGGESTION_DEBOUNCE,
            mentions_symbol: DEFAULT_MENTIONS_SYMBOL.to_string(),
            instant_commands_symbol: DEFAULT_INSTANT_COMMANDS_SYMBOL.to_string(),
        }
    }
}

impl ComposerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mention_all_app_users: env_flag("CHAT_COMPOSER_MENTION_ALL_USERS"),
            suggestion_debounce: env_millis("CHAT_COMPOSER_DEBOUNCE_MS")
                .unwrap_or(defaults.suggestion_debounce),
            mentions_symbol: env_string_opt("CHAT_COMPOSER_MENTION_SYMBOL")
                .unwrap_or(defaults.mentions_symbol),
            instant_commands_symbol: env_string_opt("CHAT_COMPOSER_COMMAND_SYMBOL")
                .unwrap_or(defaults.instant_commands_symbol),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_millis(key: &str) -> Option<Duration> {
    env_string_opt(key)
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
}
