//! Moderation pipeline — scores messages and enforces the action policy.
//!
//! Flow:
//! 1. Normalize + transliterate the text
//! 2. Tier A / Tier B classifiers + lexical heuristic → fused score
//! 3. Threshold policy → intended action
//! 4. Enforcement through the `ModeratorApi` seam
//! 5. Audit record for every actioned message
//!
//! Nothing in here is fatal: classifier failures score neutral, platform
//! action failures are logged and the pipeline moves on. The one deliberate
//! fallback is ban failure → escalate with a distinct audit label.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::audit::{AuditLog, AuditRecord};
use crate::channels::IncomingMessage;
use crate::classifier::{OpenAiModeration, TierBClassifier};
use crate::config::Config;
use crate::pipeline::policy;
use crate::pipeline::types::{
    ActionTaken, EscalationReport, ModeratorApi, PolicyAction, ScoredMessage,
};
use crate::scoring::fuse;
use crate::text::{Lexicon, arabizi_to_arabic, normalize};

/// Reason string attached to mutes and bans.
const MODERATION_REASON: &str = "suspected incitement to violence";

/// Moderation pipeline.
pub struct ModerationPipeline {
    config: Arc<Config>,
    lexicon: Lexicon,
    tier_a: OpenAiModeration,
    tier_b: TierBClassifier,
    audit: AuditLog,
    api: Arc<dyn ModeratorApi>,
}

impl ModerationPipeline {
    pub fn new(config: Arc<Config>, api: Arc<dyn ModeratorApi>, audit: AuditLog) -> Self {
        let tier_a = OpenAiModeration::new(config.openai_api_key.clone());
        let tier_b = TierBClassifier::new(
            config.tier_b_endpoint.clone(),
            config.tier_b_token.clone(),
        );
        Self {
            config,
            lexicon: Lexicon::new(),
            tier_a,
            tier_b,
            audit,
            api,
        }
    }

    /// Run one message through scoring, policy, enforcement, and audit.
    ///
    /// `context` is the preceding conversation snippet, oldest first.
    /// Returns the action taken, if any.
    pub async fn handle_message(
        &self,
        message: &IncomingMessage,
        context: &[String],
    ) -> Option<ActionTaken> {
        let normalized = normalize(&message.text);
        if normalized.is_empty() {
            return None;
        }

        let scored = self.score(&message.text, normalized, context).await;
        debug!(
            chat_id = message.chat_id,
            message_id = message.message_id,
            score = scored.score,
            "Message scored"
        );

        let decision = policy::decide(scored.score, &self.config)?;
        let action = self.enforce(decision, message, &scored).await;

        info!(
            chat_id = message.chat_id,
            message_id = message.message_id,
            author = %message.author_name,
            score = scored.score,
            action = action.label(),
            "Moderation action taken"
        );

        let record = AuditRecord {
            ts: Utc::now(),
            chat_id: message.chat_id,
            message_id: message.message_id,
            author_id: message.author_id,
            author_name: message.author_name.clone(),
            score: scored.score,
            details: scored.details.clone(),
            text: scored.raw.clone(),
            transliterated: scored.transliterated.clone(),
            ctx: scored.context.clone(),
            action: action.label().to_string(),
            jump_url: message.jump_url(),
        };
        if let Err(e) = self.audit.append(&record).await {
            warn!(error = %e, "Failed to write audit record");
        }

        Some(action)
    }

    /// Score a message without taking any action.
    pub async fn score(&self, raw: &str, normalized: String, context: &[String]) -> ScoredMessage {
        let transliterated = arabizi_to_arabic(&normalized);
        let ctx = context.join("\n");

        // Tier A sees the transliterated text plus the context block.
        let payload = if ctx.is_empty() {
            transliterated.clone()
        } else {
            format!("{transliterated}\n\nCONTEXT:\n{ctx}")
        };
        let verdict = self.tier_a.classify(&payload).await;
        let tier_b = self.tier_b.classify(&transliterated, &ctx).await;

        let bonus_translit = self.lexicon.bonus(&transliterated);
        let bonus_norm = self.lexicon.bonus(&normalized);

        let fused = fuse(verdict, tier_b, bonus_translit, bonus_norm);

        ScoredMessage {
            raw: raw.to_string(),
            normalized,
            transliterated,
            context: ctx,
            score: fused.score,
            details: fused.details,
        }
    }

    /// Carry out an intended action. Platform failures downgrade, they
    /// never abort: a failed ban becomes an escalation, everything else is
    /// logged and skipped.
    pub async fn enforce(
        &self,
        decision: PolicyAction,
        message: &IncomingMessage,
        scored: &ScoredMessage,
    ) -> ActionTaken {
        let action = match decision {
            PolicyAction::AutoBan => {
                match self
                    .api
                    .ban_member(message.chat_id, message.author_id, MODERATION_REASON)
                    .await
                {
                    Ok(()) => ActionTaken::AutoBan,
                    Err(e) => {
                        warn!(error = %e, author_id = message.author_id, "Ban failed, escalating instead");
                        self.escalate(message, scored).await;
                        ActionTaken::EscalatedBanFailed
                    }
                }
            }
            PolicyAction::Escalate => {
                self.escalate(message, scored).await;
                if self.config.temp_mute {
                    self.mute(message).await;
                }
                ActionTaken::Escalate
            }
            PolicyAction::WarnAndTimeout => {
                if self.config.warn_user {
                    let text = warning_text(&message.jump_url());
                    if let Err(e) = self.api.warn_user(message.author_id, &text).await {
                        // User may have DMs closed; that's fine.
                        debug!(error = %e, author_id = message.author_id, "Could not DM warning");
                    }
                }
                if self.config.temp_mute {
                    self.mute(message).await;
                }
                ActionTaken::WarnAndTimeout
            }
        };

        if self.config.delete_message {
            if let Err(e) = self
                .api
                .delete_message(message.chat_id, message.message_id)
                .await
            {
                debug!(error = %e, message_id = message.message_id, "Could not delete message");
            }
        }

        action
    }

    async fn escalate(&self, message: &IncomingMessage, scored: &ScoredMessage) {
        let report = EscalationReport::new(message, scored);
        if let Err(e) = self.api.escalate(&report).await {
            warn!(error = %e, "Escalation failed");
        }
    }

    async fn mute(&self, message: &IncomingMessage) {
        let until = Utc::now() + chrono::Duration::seconds(self.config.temp_mute_seconds);
        if let Err(e) = self
            .api
            .mute_member(message.chat_id, message.author_id, until, MODERATION_REASON)
            .await
        {
            warn!(error = %e, author_id = message.author_id, "Failed to mute member");
        }
    }
}

/// Bilingual warning sent by DM on the warn branch.
pub fn warning_text(jump_url: &str) -> String {
    format!(
        "⚠️ **Warning / تحذير**\n\
         Please keep it peaceful and don't incite violence or war.\n\
         من فضلك خليك مسالم، وما تحرضش على العنف ولا الحرب.\n\
         Reference / المرجع: {jump_url}"
    )
}
