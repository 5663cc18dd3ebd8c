//! Moderation pipeline: scoring, action policy, enforcement.

pub mod policy;
pub mod processor;
pub mod types;

pub use processor::ModerationPipeline;
pub use types::{ActionTaken, EscalationReport, ModeratorApi, PolicyAction, ScoredMessage};
