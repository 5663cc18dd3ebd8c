//! Append-only audit log.
//!
//! One JSON object per line, one line per actioned message. The read path
//! loads the whole file and takes a suffix — fine at moderation volumes,
//! not a general storage design.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::AuditError;

/// One actioned message, as written to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub ts: DateTime<Utc>,
    pub chat_id: i64,
    pub message_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub score: f64,
    /// Classifier detail payload (category labels/flags).
    pub details: serde_json::Value,
    /// Text as typed.
    pub text: String,
    /// Arabic-normalized form sent to the classifiers.
    pub transliterated: String,
    /// Context snippet used for scoring.
    pub ctx: String,
    /// Action label: auto_ban, escalated_ban_failed, escalate, warn_and_timeout.
    pub action: String,
    pub jump_url: String,
}

/// Append-only JSON-lines audit log.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one record. Atomicity of the line write is delegated to the
    /// platform's append semantics.
    pub async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// The newest `n` records, newest first. A missing file is an empty
    /// log, not an error. Unparseable lines are skipped with a warning.
    pub async fn last(&self, n: usize) -> Result<Vec<AuditRecord>, AuditError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::with_capacity(n);
        for line in contents.lines().rev() {
            if records.len() >= n {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed audit line"),
            }
        }
        Ok(records)
    }
}
