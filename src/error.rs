//! Error types for Vigil.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Chat-platform errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Moderation action {action} failed: {reason}")]
    ActionFailed { action: String, reason: String },
}

/// Classifier adapter errors.
///
/// These never escape the adapters — both tiers fail open, folding any of
/// these into a neutral verdict before returning to the scoring layer.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Missing credentials for {tier} classifier")]
    MissingCredentials { tier: String },

    #[error("{tier} classifier request failed: {reason}")]
    RequestFailed { tier: String, reason: String },

    #[error("Invalid response from {tier} classifier: {reason}")]
    InvalidResponse { tier: String, reason: String },
}

/// Audit log errors.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
