//! Tier B — optional user-configured incitement classifier.
//!
//! A second opinion from a custom HTTP endpoint, typically a fine-tuned
//! Darija model. Entirely optional: without an endpoint the adapter reports
//! "absent" and no call is made.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ClassifierError;

/// Hard timeout on the Tier B call.
const TIER_B_TIMEOUT: Duration = Duration::from_secs(8);

/// Tier B classifier adapter.
pub struct TierBClassifier {
    endpoint: Option<String>,
    token: Option<SecretString>,
    client: reqwest::Client,
}

impl TierBClassifier {
    pub fn new(endpoint: Option<String>, token: Option<SecretString>) -> Self {
        Self {
            endpoint,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Whether an endpoint is configured at all.
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Score `text` with `context`, in [0, 1].
    ///
    /// Returns `None` when the tier is unconfigured or on any failure
    /// (timeout, non-2xx, malformed body) — absent, not zero, so the fusion
    /// step can tell "no signal" from "signal says clean".
    pub async fn classify(&self, text: &str, context: &str) -> Option<f64> {
        let endpoint = self.endpoint.as_deref()?;
        match self.request(endpoint, text, context).await {
            Ok(score) => Some(score.clamp(0.0, 1.0)),
            Err(e) => {
                tracing::warn!(error = %e, "Tier B classifier unavailable, skipping");
                None
            }
        }
    }

    async fn request(
        &self,
        endpoint: &str,
        text: &str,
        context: &str,
    ) -> Result<f64, ClassifierError> {
        let body = serde_json::json!({
            "text": text,
            "context": context,
        });

        let mut req = self.client.post(endpoint).timeout(TIER_B_TIMEOUT).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose_secret());
        }

        let resp = req.send().await.map_err(|e| ClassifierError::RequestFailed {
            tier: "B".into(),
            reason: e.to_string(),
        })?;

        if !resp.status().is_success() {
            return Err(ClassifierError::RequestFailed {
                tier: "B".into(),
                reason: format!("endpoint returned {}", resp.status()),
            });
        }

        let data: TierBResponse =
            resp.json()
                .await
                .map_err(|e| ClassifierError::InvalidResponse {
                    tier: "B".into(),
                    reason: e.to_string(),
                })?;

        data.incitement_score
            .or(data.score)
            .ok_or_else(|| ClassifierError::InvalidResponse {
                tier: "B".into(),
                reason: "no incitement_score or score field".into(),
            })
    }
}

/// Accepts either field name for the score.
#[derive(Debug, serde::Deserialize)]
struct TierBResponse {
    #[serde(default)]
    incitement_score: Option<f64>,
    #[serde(default)]
    score: Option<f64>,
}
