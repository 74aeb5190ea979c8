// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Classifier backed by a local Ollama vision model

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{AnalysisResultSet, Classifier, ClassificationEntry, Severity};
use crate::config::EngineConfig;
use crate::ollama::OllamaClient;
use crate::upload::SelectedInput;
use crate::{PulmoError, Result};

/// Sends the image to a vision model and parses the JSON findings it returns
pub struct OllamaClassifier {
    client: OllamaClient,
    model: String,
    prompt: String,
    retries: u32,
}

impl OllamaClassifier {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            client: OllamaClient::new(&config.url, Duration::from_secs(config.timeout_secs))?,
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            retries: config.retries,
        })
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Deserialize)]
struct RawFinding {
    label: String,
    #[serde(alias = "confidence_score")]
    confidence: f64,
    severity: Severity,
    #[serde(default, alias = "description")]
    note: String,
}

/// Pull the findings array out of a model reply.
///
/// Models like to wrap JSON in prose or code fences, so everything between
/// the first `[` and the last `]` is parsed. Confidences given as fractions
/// (`0.85`) are scaled to percent.
pub fn parse_findings(reply: &str) -> Result<Vec<ClassificationEntry>> {
    let start = reply.find('[');
    let end = reply.rfind(']');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => {
            return Err(PulmoError::AnalysisFailed(
                "model reply contains no findings array".to_string(),
            ))
        }
    };

    let raw: Vec<RawFinding> = serde_json::from_str(json)
        .map_err(|e| PulmoError::AnalysisFailed(format!("unreadable findings: {}", e)))?;

    if raw.is_empty() {
        return Err(PulmoError::AnalysisFailed("model reported no findings".to_string()));
    }

    Ok(raw
        .into_iter()
        .map(|f| {
            let percent = if f.confidence > 0.0 && f.confidence < 1.0 {
                f.confidence * 100.0
            } else {
                f.confidence
            };
            let score = percent.round().clamp(0.0, 100.0) as u8;
            ClassificationEntry::new(f.label.trim(), score, f.severity, f.note.trim())
        })
        .collect())
}

#[async_trait]
impl Classifier for OllamaClassifier {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn analyze(&self, input: &SelectedInput) -> Result<AnalysisResultSet> {
        info!("Analyzing {} with {}", input.name(), self.model);

        let image_data = general_purpose::STANDARD.encode(input.data());
        let reply = self
            .client
            .generate_with_image_retry(&self.model, &self.prompt, &image_data, self.retries)
            .await
            .map_err(|e| {
                warn!("Vision model failed: {}", e);
                PulmoError::AnalysisFailed(e.to_string())
            })?;

        debug!("Model reply: {}", reply);
        let entries = parse_findings(&reply)?;
        Ok(AnalysisResultSet::new(self.name(), entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let reply = r#"[{"label": "Normal", "confidence": 91, "severity": "normal", "note": "Clear fields."}]"#;
        let entries = parse_findings(reply).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "Normal");
        assert_eq!(entries[0].confidence_score, 91);
        assert_eq!(entries[0].note, "Clear fields.");
    }

    #[test]
    fn test_parse_wrapped_in_prose() {
        let reply = "Here are the findings:\n```json\n[\n  {\"label\": \"Pneumonia\", \"confidence\": 0.42, \"severity\": \"moderate\", \"description\": \"Right lower lobe opacity\"}\n]\n```";
        let entries = parse_findings(reply).unwrap();
        assert_eq!(entries[0].confidence_score, 42);
        assert_eq!(entries[0].severity, Severity::Moderate);
        assert_eq!(entries[0].note, "Right lower lobe opacity");
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        let reply = r#"[{"label": "X", "confidence": 180, "severity": "severe"}]"#;
        assert_eq!(parse_findings(reply).unwrap()[0].confidence_score, 100);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_findings("I cannot help with that."), Err(PulmoError::AnalysisFailed(_))));
        assert!(matches!(parse_findings("[]"), Err(PulmoError::AnalysisFailed(_))));
        assert!(matches!(
            parse_findings(r#"[{"label": "X", "confidence": 5, "severity": "grim"}]"#),
            Err(PulmoError::AnalysisFailed(_))
        ));
    }
}
