//! Tier A — OpenAI moderation endpoint.

use secrecy::{ExposeSecret, SecretString};

use crate::error::ClassifierError;

const MODERATION_URL: &str = "https://api.openai.com/v1/moderations";
const MODERATION_MODEL: &str = "omni-moderation-latest";

/// Maximum characters sent to the moderation endpoint.
pub const MAX_INPUT_CHARS: usize = 20_000;

/// Category scores treated as violence-adjacent; the verdict score is their
/// maximum.
const VIOLENCE_CATEGORIES: &[&str] = &["violence", "harassment/threatening", "illicit/violent"];

/// Tier A verdict: a violence score plus the raw category flag map.
#[derive(Debug, Clone)]
pub struct ModerationVerdict {
    pub violence_score: f64,
    pub categories: serde_json::Value,
}

impl ModerationVerdict {
    /// Verdict used when the classifier is unavailable.
    pub fn neutral() -> Self {
        Self {
            violence_score: 0.0,
            categories: serde_json::json!({ "violence": false }),
        }
    }
}

/// Tier A classifier adapter.
pub struct OpenAiModeration {
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl OpenAiModeration {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Classify `text`, returning a neutral verdict on any failure.
    pub async fn classify(&self, text: &str) -> ModerationVerdict {
        match self.request(text).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "Tier A moderation unavailable, treating as neutral");
                ModerationVerdict::neutral()
            }
        }
    }

    async fn request(&self, text: &str) -> Result<ModerationVerdict, ClassifierError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ClassifierError::MissingCredentials { tier: "A".into() })?;

        let payload: String = text.chars().take(MAX_INPUT_CHARS).collect();
        let body = serde_json::json!({
            "model": MODERATION_MODEL,
            "input": payload,
        });

        let resp = self
            .client
            .post(MODERATION_URL)
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::RequestFailed {
                tier: "A".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ClassifierError::RequestFailed {
                tier: "A".into(),
                reason: format!("moderation endpoint returned {}", resp.status()),
            });
        }

        let data: ModerationResponse =
            resp.json()
                .await
                .map_err(|e| ClassifierError::InvalidResponse {
                    tier: "A".into(),
                    reason: e.to_string(),
                })?;

        let result = data
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::InvalidResponse {
                tier: "A".into(),
                reason: "empty results array".into(),
            })?;

        Ok(ModerationVerdict {
            violence_score: max_violence_score(&result.category_scores),
            categories: serde_json::Value::Object(result.categories),
        })
    }
}

/// Maximum of the violence-adjacent category scores; missing or non-numeric
/// entries count as zero.
fn max_violence_score(scores: &serde_json::Map<String, serde_json::Value>) -> f64 {
    VIOLENCE_CATEGORIES
        .iter()
        .filter_map(|cat| scores.get(*cat).and_then(serde_json::Value::as_f64))
        .fold(0.0, f64::max)
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct ModerationResponse {
    #[serde(default)]
    results: Vec<ModerationResult>,
}

#[derive(Debug, serde::Deserialize)]
struct ModerationResult {
    #[serde(default)]
    categories: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    category_scores: serde_json::Map<String, serde_json::Value>,
}
