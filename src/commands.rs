//! Administrative command handling.
//!
//! One command, `/incitement`, restricted to the configured owner or a chat
//! administrator. `review` lists the newest audit entries; anything else
//! gets a generic error reply.

use crate::audit::{AuditLog, AuditRecord};
use crate::channels::{IncomingMessage, TelegramChannel};
use crate::config::Config;

/// Command name as registered with the platform.
pub const COMMAND: &str = "incitement";

/// Entries shown by `review` when no count is given.
const DEFAULT_REVIEW_COUNT: usize = 5;

/// Characters of each entry's text shown in the review listing.
const SNIPPET_CHARS: usize = 120;

pub const UNAUTHORIZED_REPLY: &str = "Unauthorized.";
pub const UNKNOWN_ACTION_REPLY: &str = "Unknown action.";
pub const EMPTY_LOG_REPLY: &str = "No audit entries yet.";

/// A parsed admin command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCommand {
    pub action: String,
    pub count: usize,
}

/// Parse `/incitement <action> [n]`. Accepts the `/incitement@BotName`
/// mention form. Returns `None` for anything that isn't this command.
pub fn parse(text: &str) -> Option<AdminCommand> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;

    let command = head.strip_prefix('/')?;
    let command = command.split('@').next().unwrap_or(command);
    if command != COMMAND {
        return None;
    }

    let action = parts.next().unwrap_or("").to_lowercase();
    let count = parts
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_REVIEW_COUNT);

    Some(AdminCommand { action, count })
}

/// Handle a parsed admin command, replying in the chat it came from.
pub async fn handle(
    command: &AdminCommand,
    message: &IncomingMessage,
    channel: &TelegramChannel,
    audit: &AuditLog,
    config: &Config,
) {
    let authorized = message.author_id == config.owner_user_id
        || channel.is_chat_admin(message.chat_id, message.author_id).await;

    let reply = if !authorized {
        UNAUTHORIZED_REPLY.to_string()
    } else if command.action == "review" {
        match audit.last(command.count).await {
            Ok(entries) => format_review(&entries),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read audit log for review");
                EMPTY_LOG_REPLY.to_string()
            }
        }
    } else {
        UNKNOWN_ACTION_REPLY.to_string()
    };

    if let Err(e) = channel.send_message(message.chat_id, &reply).await {
        tracing::warn!(error = %e, "Failed to reply to admin command");
    }
}

/// Render review entries, newest first, one bullet per entry.
pub fn format_review(entries: &[AuditRecord]) -> String {
    if entries.is_empty() {
        return EMPTY_LOG_REPLY.to_string();
    }

    entries
        .iter()
        .map(|entry| {
            format!(
                "- *{}* in chat {} — score `{:.2}` — [jump]({})\n  `{}`",
                entry.author_name,
                entry.chat_id,
                entry.score,
                entry.jump_url,
                snippet(&entry.text),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text preview: backticks stripped (they would break the code span),
/// bounded length, ellipsis when truncated.
fn snippet(text: &str) -> String {
    let clean = text.replace('`', "");
    let mut out: String = clean.chars().take(SNIPPET_CHARS).collect();
    if clean.chars().count() > SNIPPET_CHARS {
        out.push('…');
    }
    out
}
