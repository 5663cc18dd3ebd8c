//! Telegram channel — long-polls the Bot API for updates.
//!
//! Raw Bot API over reqwest: getUpdates long-polling for the inbound
//! stream, plus the moderation calls (restrictChatMember, banChatMember,
//! deleteMessage) behind the `ModeratorApi` trait.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use secrecy::{ExposeSecret, SecretString};

use crate::error::ChannelError;
use crate::pipeline::types::{EscalationReport, ModeratorApi};

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Characters of the offending message shown in an escalation report.
const REPORT_PREVIEW_CHARS: usize = 800;

/// Stream of parsed incoming messages.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

// ── Incoming message ────────────────────────────────────────────────

/// A group-chat message as parsed from a Bot API update.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat_id: i64,
    /// "private", "group", "supergroup", or "channel".
    pub chat_type: String,
    pub author_id: i64,
    /// Display name: first/last name, falling back to the username.
    pub author_name: String,
    pub author_username: Option<String>,
    pub author_is_bot: bool,
    pub text: String,
}

impl IncomingMessage {
    /// Whether this message came from a group or supergroup.
    pub fn is_group(&self) -> bool {
        matches!(self.chat_type.as_str(), "group" | "supergroup")
    }

    /// Deep link to this message.
    pub fn jump_url(&self) -> String {
        jump_url(self.chat_id, self.message_id)
    }
}

// ── Channel ─────────────────────────────────────────────────────────

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    mod_queue_chat_id: i64,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString, mod_queue_chat_id: i64) -> Self {
        Self {
            bot_token,
            mod_queue_chat_id,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token.expose_secret()
        )
    }

    /// Start long-polling and return the stream of incoming messages.
    pub fn start(&self) -> MessageStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let url = format!(
                    "https://api.telegram.org/bot{}/getUpdates",
                    bot_token.expose_secret()
                );
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                    for update in results {
                        // Advance offset past this update
                        if let Some(uid) =
                            update.get("update_id").and_then(serde_json::Value::as_i64)
                        {
                            offset = uid + 1;
                        }

                        let Some(incoming) = parse_update(update) else {
                            continue;
                        };

                        if tx.send(incoming).is_err() {
                            tracing::info!("Telegram listener channel closed");
                            return;
                        }
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Box::pin(stream)
    }

    /// Send a text message, trying Markdown first with plain text fallback.
    /// Splits long messages that exceed Telegram's 4096 char limit.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);

        for chunk in &chunks {
            self.send_message_chunk(chat_id, chunk).await?;
        }
        Ok(())
    }

    /// Send a single message chunk (≤4096 chars), Markdown-first with fallback.
    async fn send_message_chunk(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let markdown_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown"
        });

        let markdown_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&markdown_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if markdown_resp.status().is_success() {
            return Ok(());
        }

        let markdown_status = markdown_resp.status();
        tracing::warn!(
            status = ?markdown_status,
            "Telegram sendMessage with Markdown failed; retrying without parse_mode"
        );

        let plain_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        let plain_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!(
                    "sendMessage failed (markdown: {}, plain: {})",
                    markdown_status, plain_err
                ),
            });
        }

        Ok(())
    }

    /// Invoke a Bot API method and check both the HTTP status and the
    /// `ok` field of the envelope.
    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::ActionFailed {
                action: method.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let data: serde_json::Value =
            resp.json()
                .await
                .map_err(|e| ChannelError::ActionFailed {
                    action: method.to_string(),
                    reason: e.to_string(),
                })?;

        let ok = data.get("ok").and_then(serde_json::Value::as_bool) == Some(true);
        if !status.is_success() || !ok {
            let description = data
                .get("description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("no description");
            return Err(ChannelError::ActionFailed {
                action: method.to_string(),
                reason: format!("{status}: {description}"),
            });
        }

        Ok(data)
    }

    /// Whether the user is the chat's creator or an administrator.
    /// Lookup failures count as "not an admin".
    pub async fn is_chat_admin(&self, chat_id: i64, user_id: i64) -> bool {
        let body = serde_json::json!({ "chat_id": chat_id, "user_id": user_id });
        match self.call("getChatMember", body).await {
            Ok(data) => {
                let status = data["result"]["status"].as_str().unwrap_or("");
                matches!(status, "creator" | "administrator")
            }
            Err(e) => {
                tracing::debug!(error = %e, user_id, "getChatMember failed");
                false
            }
        }
    }

    /// Register the admin command so it shows up in the client UI.
    pub async fn register_commands(&self) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "commands": [{
                "command": "incitement",
                "description": "Admin tools for incitement moderation"
            }]
        });
        self.call("setMyCommands", body).await.map(|_| ())
    }
}

// ── Moderation actions ──────────────────────────────────────────────

#[async_trait]
impl ModeratorApi for TelegramChannel {
    async fn warn_user(&self, user_id: i64, text: &str) -> Result<(), ChannelError> {
        // DMs share the user's id as chat id. Only works if the user has
        // started the bot; callers treat failure as best-effort.
        self.send_message(user_id, text).await
    }

    async fn mute_member(
        &self,
        chat_id: i64,
        user_id: i64,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), ChannelError> {
        tracing::debug!(chat_id, user_id, reason, "Muting member");
        let body = serde_json::json!({
            "chat_id": chat_id,
            "user_id": user_id,
            "permissions": { "can_send_messages": false },
            "until_date": until.timestamp(),
        });
        self.call("restrictChatMember", body).await.map(|_| ())
    }

    async fn ban_member(
        &self,
        chat_id: i64,
        user_id: i64,
        reason: &str,
    ) -> Result<(), ChannelError> {
        tracing::debug!(chat_id, user_id, reason, "Banning member");
        let body = serde_json::json!({ "chat_id": chat_id, "user_id": user_id });
        self.call("banChatMember", body).await.map(|_| ())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), ChannelError> {
        let body = serde_json::json!({ "chat_id": chat_id, "message_id": message_id });
        self.call("deleteMessage", body).await.map(|_| ())
    }

    /// Post the report to the moderation queue. On any failure (queue
    /// unconfigured, missing permissions), drop a best-effort notice in
    /// the origin chat instead so moderators notice the misconfiguration.
    async fn escalate(&self, report: &EscalationReport) -> Result<(), ChannelError> {
        let outcome = if self.mod_queue_chat_id == 0 {
            Err(ChannelError::ActionFailed {
                action: "escalate".into(),
                reason: "MOD_QUEUE_CHAT_ID is not configured".into(),
            })
        } else {
            self.send_message(self.mod_queue_chat_id, &format_report(report))
                .await
        };

        if let Err(ref e) = outcome {
            let notice = format!(
                "🛡️ I couldn't post to the mod queue ({e}). \
                 Please check MOD_QUEUE_CHAT_ID and channel permissions."
            );
            if let Err(notice_err) = self.send_message(report.chat_id, &notice).await {
                tracing::warn!(error = %notice_err, "In-channel escalation notice failed too");
            }
        }

        outcome
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Parse one getUpdates entry into an `IncomingMessage`.
/// Returns `None` for non-message updates and messages without text.
fn parse_update(update: &serde_json::Value) -> Option<IncomingMessage> {
    let message = update.get("message")?;
    let text = message.get("text").and_then(serde_json::Value::as_str)?;

    let from = message.get("from")?;
    let author_id = from.get("id").and_then(serde_json::Value::as_i64)?;
    let author_is_bot = from
        .get("is_bot")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    let author_username = from
        .get("username")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    let first_name = from.get("first_name").and_then(serde_json::Value::as_str);
    let last_name = from.get("last_name").and_then(serde_json::Value::as_str);
    let author_name = match (first_name, last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.to_string(),
        _ => author_username.clone().unwrap_or_else(|| "unknown".into()),
    };

    let chat = message.get("chat")?;
    let chat_id = chat.get("id").and_then(serde_json::Value::as_i64)?;
    let chat_type = chat
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("private")
        .to_string();

    let message_id = message
        .get("message_id")
        .and_then(serde_json::Value::as_i64)?;

    Some(IncomingMessage {
        message_id,
        chat_id,
        chat_type,
        author_id,
        author_name,
        author_username,
        author_is_bot,
        text: text.to_string(),
    })
}

/// Deep link to a message. Supergroup chat ids carry a `-100` prefix that
/// the t.me/c/ form drops.
fn jump_url(chat_id: i64, message_id: i64) -> String {
    let raw = chat_id.to_string();
    let slug = raw
        .strip_prefix("-100")
        .map(String::from)
        .unwrap_or_else(|| raw.trim_start_matches('-').to_string());
    format!("https://t.me/c/{slug}/{message_id}")
}

/// Render an escalation report for the moderation queue.
fn format_report(report: &EscalationReport) -> String {
    let mut preview: String = report.text.chars().take(REPORT_PREVIEW_CHARS).collect();
    if report.text.chars().count() > REPORT_PREVIEW_CHARS {
        preview.push('…');
    }
    if preview.is_empty() {
        preview.push_str("<no text>");
    }

    format!(
        "⚠️ *Incitement review needed*\n\
         *Score:* {:.2}\n\
         *Author:* {} (ID: {})\n\
         *Message:* {}\n\
         *Categories:* {}\n\
         *Jump:* {}",
        report.score, report.author_name, report.author_id, preview, report.categories,
        report.jump_url
    )
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts. Cuts land on
/// char boundaries so Arabic text never splits mid-codepoint.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.chars().count() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        // Byte offset of the max_len-th char — the hard cut point.
        let hard_cut = remaining
            .char_indices()
            .nth(max_len)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());

        // Find a good split point
        let window = &remaining[..hard_cut];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .unwrap_or(hard_cut);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { hard_cut } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> TelegramChannel {
        TelegramChannel::new(SecretString::from("123:ABC"), -1009999)
    }

    // ── API URL tests ───────────────────────────────────────────────

    #[test]
    fn telegram_api_url() {
        let ch = channel();
        assert_eq!(
            ch.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
        assert_eq!(
            ch.api_url("banChatMember"),
            "https://api.telegram.org/bot123:ABC/banChatMember"
        );
    }

    // ── Update parsing tests ────────────────────────────────────────

    fn sample_update(text: Option<&str>) -> serde_json::Value {
        let mut message = serde_json::json!({
            "message_id": 77,
            "from": {
                "id": 42,
                "is_bot": false,
                "first_name": "Amine",
                "last_name": "B",
                "username": "amine_b"
            },
            "chat": { "id": -1001234567890i64, "type": "supergroup", "title": "Town Square" },
            "date": 1700000000
        });
        if let Some(t) = text {
            message["text"] = serde_json::Value::String(t.to_string());
        }
        serde_json::json!({ "update_id": 1, "message": message })
    }

    #[test]
    fn parses_group_text_message() {
        let msg = parse_update(&sample_update(Some("salam"))).unwrap();
        assert_eq!(msg.message_id, 77);
        assert_eq!(msg.chat_id, -1001234567890);
        assert_eq!(msg.author_id, 42);
        assert_eq!(msg.author_name, "Amine B");
        assert_eq!(msg.author_username.as_deref(), Some("amine_b"));
        assert!(!msg.author_is_bot);
        assert!(msg.is_group());
        assert_eq!(msg.text, "salam");
    }

    #[test]
    fn skips_updates_without_text() {
        assert!(parse_update(&sample_update(None)).is_none());
        assert!(parse_update(&serde_json::json!({ "update_id": 2 })).is_none());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let update = serde_json::json!({
            "update_id": 3,
            "message": {
                "message_id": 5,
                "from": { "id": 9, "is_bot": false, "username": "ghost" },
                "chat": { "id": -55, "type": "group" },
                "text": "hi"
            }
        });
        let msg = parse_update(&update).unwrap();
        assert_eq!(msg.author_name, "ghost");
    }

    #[test]
    fn private_chat_is_not_group() {
        let update = serde_json::json!({
            "update_id": 4,
            "message": {
                "message_id": 6,
                "from": { "id": 9, "is_bot": false, "first_name": "A" },
                "chat": { "id": 9, "type": "private" },
                "text": "hi"
            }
        });
        assert!(!parse_update(&update).unwrap().is_group());
    }

    // ── Jump URL tests ──────────────────────────────────────────────

    #[test]
    fn jump_url_strips_supergroup_prefix() {
        assert_eq!(
            jump_url(-1001234567890, 77),
            "https://t.me/c/1234567890/77"
        );
    }

    #[test]
    fn jump_url_for_basic_group() {
        assert_eq!(jump_url(-4567, 3), "https://t.me/c/4567/3");
    }

    // ── Report formatting tests ─────────────────────────────────────

    fn sample_report(text: &str) -> EscalationReport {
        EscalationReport {
            chat_id: -1001234567890,
            message_id: 77,
            author_id: 42,
            author_name: "Amine B".into(),
            score: 0.92,
            categories: serde_json::json!({ "violence": true }),
            text: text.into(),
            jump_url: "https://t.me/c/1234567890/77".into(),
        }
    }

    #[test]
    fn report_includes_author_score_and_jump() {
        let rendered = format_report(&sample_report("nqtlhom kamlin"));
        assert!(rendered.contains("0.92"));
        assert!(rendered.contains("Amine B (ID: 42)"));
        assert!(rendered.contains("nqtlhom kamlin"));
        assert!(rendered.contains("https://t.me/c/1234567890/77"));
    }

    #[test]
    fn report_truncates_long_messages() {
        let long = "ع".repeat(900);
        let rendered = format_report(&sample_report(&long));
        assert!(rendered.contains('…'));
        assert!(!rendered.contains(&long));
    }

    #[test]
    fn report_handles_empty_text() {
        let rendered = format_report(&sample_report(""));
        assert!(rendered.contains("<no text>"));
    }

    // ── Message splitting tests ─────────────────────────────────────

    #[test]
    fn split_message_short() {
        let chunks = split_message("Hello", 4096);
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn split_message_exact_limit() {
        let msg = "a".repeat(4096);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 4096);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(2000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn split_message_multibyte_safe() {
        // 5000 Arabic chars; a byte-indexed cut would panic mid-codepoint.
        let msg = "ع".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 4096);
        assert_eq!(chunks[1].chars().count(), 904);
    }

    // ── Network error tests (no server listening) ───────────────────

    #[tokio::test]
    async fn mute_member_surfaces_action_failure() {
        let ch = channel();
        let result = ch
            .mute_member(-55, 42, Utc::now() + chrono::Duration::seconds(60), "test")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn escalate_without_queue_reports_misconfiguration() {
        let ch = TelegramChannel::new(SecretString::from("123:ABC"), 0);
        let result = ch.escalate(&sample_report("text")).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("MOD_QUEUE_CHAT_ID"), "got: {err}");
    }
}
