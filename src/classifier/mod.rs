//! Classifier tier adapters.
//!
//! Both tiers fail open: any transport or parse failure folds into a neutral
//! signal before it reaches the scoring layer. Moderation being down must
//! never block normal message flow.

pub mod openai;
pub mod tier_b;

pub use openai::{ModerationVerdict, OpenAiModeration};
pub use tier_b::TierBClassifier;
