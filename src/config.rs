//! Environment-sourced configuration.
//!
//! Built once at startup and passed by reference into the scoring and policy
//! layers. Nothing re-reads the environment after `Config::from_env`.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Bot configuration.
///
/// Thresholds are expected to satisfy `thresh_temp_mute <= thresh_escalate
/// <= thresh_auto_ban` by operator convention; this is not enforced.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram Bot API token. The only hard startup requirement.
    pub bot_token: SecretString,
    /// User allowed to run admin commands regardless of chat role.
    pub owner_user_id: i64,
    /// Chat that receives escalation reports. 0 = unconfigured.
    pub mod_queue_chat_id: i64,

    /// Score at or above which the warn/temp-mute branch fires.
    pub thresh_temp_mute: f64,
    /// Score at or above which a human moderator review is requested.
    pub thresh_escalate: f64,
    /// Score at or above which an automatic ban is attempted.
    pub thresh_auto_ban: f64,

    /// Delete the offending message after any action.
    pub delete_message: bool,
    /// DM the author a warning on the temp-mute branch.
    pub warn_user: bool,
    /// Apply a timed mute on the temp-mute and escalate branches.
    pub temp_mute: bool,
    /// Allow the auto-ban branch at all.
    pub auto_ban: bool,

    /// Mute duration in seconds.
    pub temp_mute_seconds: i64,
    /// How many preceding messages to send as classifier context.
    pub context_window: usize,

    /// OpenAI API key for the Tier A moderation endpoint. Absent = Tier A
    /// returns neutral verdicts.
    pub openai_api_key: Option<SecretString>,
    /// Optional Tier B classifier endpoint. Absent = Tier B disabled.
    pub tier_b_endpoint: Option<String>,
    /// Optional bearer token for the Tier B endpoint.
    pub tier_b_token: Option<SecretString>,

    /// Path of the append-only audit log.
    pub audit_log_path: PathBuf,
}

impl Config {
    /// Build configuration from environment variables.
    ///
    /// Only `TELEGRAM_BOT_TOKEN` is required; everything else falls back to
    /// the defaults below. Malformed numeric values also fall back rather
    /// than aborting.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".into()))?;

        let defaults = Self::default();
        Ok(Self {
            bot_token: SecretString::from(bot_token),
            owner_user_id: env_i64("OWNER_USER_ID", defaults.owner_user_id),
            mod_queue_chat_id: env_i64("MOD_QUEUE_CHAT_ID", defaults.mod_queue_chat_id),
            thresh_temp_mute: env_f64("THRESH_TEMP_MUTE", defaults.thresh_temp_mute),
            thresh_escalate: env_f64("THRESH_ESCALATE", defaults.thresh_escalate),
            thresh_auto_ban: env_f64("THRESH_AUTO_BAN", defaults.thresh_auto_ban),
            delete_message: env_bool("ACTION_DELETE_MESSAGE", defaults.delete_message),
            warn_user: env_bool("ACTION_WARN_USER", defaults.warn_user),
            temp_mute: env_bool("ACTION_TEMP_MUTE", defaults.temp_mute),
            auto_ban: env_bool("ACTION_AUTO_BAN", defaults.auto_ban),
            temp_mute_seconds: env_i64("TEMP_MUTE_SECONDS", defaults.temp_mute_seconds),
            context_window: env_i64("CONTEXT_WINDOW", defaults.context_window as i64).max(0)
                as usize,
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            tier_b_endpoint: std::env::var("TIER_B_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty()),
            tier_b_token: std::env::var("TIER_B_TOKEN")
                .ok()
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            audit_log_path: std::env::var("AUDIT_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_log_path),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: SecretString::from(String::new()),
            owner_user_id: 0,
            mod_queue_chat_id: 0,
            thresh_temp_mute: 0.65,
            thresh_escalate: 0.85,
            thresh_auto_ban: 0.95,
            delete_message: true,
            warn_user: true,
            temp_mute: true,
            auto_ban: false,
            temp_mute_seconds: 1800,
            context_window: 2,
            openai_api_key: None,
            tier_b_endpoint: None,
            tier_b_token: None,
            audit_log_path: PathBuf::from("audit_incitement.jsonl"),
        }
    }
}

// ── Env parsing helpers ─────────────────────────────────────────────

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|s| parse_f64(&s))
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| parse_bool(&s))
        .unwrap_or(default)
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

/// `"true"` (any case) is true; everything else is false.
fn parse_bool(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_thresholds() {
        let config = Config::default();
        assert_eq!(config.thresh_temp_mute, 0.65);
        assert_eq!(config.thresh_escalate, 0.85);
        assert_eq!(config.thresh_auto_ban, 0.95);
        assert_eq!(config.temp_mute_seconds, 1800);
        assert_eq!(config.context_window, 2);
        assert!(config.delete_message);
        assert!(config.warn_user);
        assert!(config.temp_mute);
        assert!(!config.auto_ban);
    }

    #[test]
    fn parse_bool_accepts_true_case_insensitive() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" True "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("1"));
        assert!(!parse_bool("yes"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn parse_f64_rejects_garbage() {
        assert_eq!(parse_f64("0.85"), Some(0.85));
        assert_eq!(parse_f64(" 0.5 "), Some(0.5));
        assert_eq!(parse_f64("not-a-number"), None);
    }

    #[test]
    fn tier_b_disabled_by_default() {
        let config = Config::default();
        assert!(config.tier_b_endpoint.is_none());
        assert!(config.tier_b_token.is_none());
    }
}
