//! Shared types for the moderation pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::channels::IncomingMessage;
use crate::error::ChannelError;

// ── Scored message ──────────────────────────────────────────────────

/// A message after scoring: the three text forms, the context snippet, and
/// the fused classifier result. Transient — built per message, dropped
/// after the audit write.
#[derive(Debug, Clone)]
pub struct ScoredMessage {
    /// Text as typed.
    pub raw: String,
    /// Quote/whitespace-normalized form.
    pub normalized: String,
    /// Arabizi-to-Arabic transliterated form.
    pub transliterated: String,
    /// Preceding conversation lines, oldest first, newline-joined.
    pub context: String,
    /// Fused score in [0, 1].
    pub score: f64,
    /// Classifier detail payload (category labels and flags).
    pub details: serde_json::Value,
}

// ── Policy decision ─────────────────────────────────────────────────

/// Intended action chosen by the threshold policy, before enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    /// Attempt an automatic ban.
    AutoBan,
    /// Hand the message to human moderators.
    Escalate,
    /// Warn the author and apply a timed mute.
    WarnAndTimeout,
}

/// What actually happened after enforcement. `EscalatedBanFailed` is the
/// fallback label when a ban attempt fails and the message is escalated
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTaken {
    AutoBan,
    EscalatedBanFailed,
    Escalate,
    WarnAndTimeout,
}

impl ActionTaken {
    /// Stable label used in the audit log.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AutoBan => "auto_ban",
            Self::EscalatedBanFailed => "escalated_ban_failed",
            Self::Escalate => "escalate",
            Self::WarnAndTimeout => "warn_and_timeout",
        }
    }
}

// ── Escalation report ───────────────────────────────────────────────

/// Everything a human moderator needs to review a flagged message.
#[derive(Debug, Clone)]
pub struct EscalationReport {
    pub chat_id: i64,
    pub message_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub score: f64,
    pub categories: serde_json::Value,
    pub text: String,
    pub jump_url: String,
}

impl EscalationReport {
    pub fn new(message: &IncomingMessage, scored: &ScoredMessage) -> Self {
        Self {
            chat_id: message.chat_id,
            message_id: message.message_id,
            author_id: message.author_id,
            author_name: message.author_name.clone(),
            score: scored.score,
            categories: scored.details["categories"].clone(),
            text: scored.raw.clone(),
            jump_url: message.jump_url(),
        }
    }
}

// ── Moderator API seam ──────────────────────────────────────────────

/// Platform-side moderation actions — pure I/O, no policy.
///
/// The enforcement step talks to the chat platform only through this trait,
/// so policy behavior is testable against a recording mock.
#[async_trait]
pub trait ModeratorApi: Send + Sync {
    /// DM a warning to a user. Fails when the user never opened a DM with
    /// the bot; callers treat that as best-effort.
    async fn warn_user(&self, user_id: i64, text: &str) -> Result<(), ChannelError>;

    /// Mute a member in a chat until the given instant.
    async fn mute_member(
        &self,
        chat_id: i64,
        user_id: i64,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), ChannelError>;

    /// Ban a member from a chat.
    async fn ban_member(&self, chat_id: i64, user_id: i64, reason: &str)
    -> Result<(), ChannelError>;

    /// Delete a message.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), ChannelError>;

    /// Post an escalation report to the moderation queue.
    async fn escalate(&self, report: &EscalationReport) -> Result<(), ChannelError>;
}
