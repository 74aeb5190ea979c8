// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Stand-in classifier with fixed findings

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use super::{AnalysisResultSet, Classifier, ClassificationEntry, Severity};
use crate::upload::SelectedInput;
use crate::Result;

/// Waits for a fixed delay, then reports the same three findings for every
/// image. Nothing about the image is inspected.
pub struct MockClassifier {
    delay: Duration,
}

impl MockClassifier {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

/// The fixed findings
pub fn mock_findings() -> Vec<ClassificationEntry> {
    vec![
        ClassificationEntry::new(
            "Normal",
            85,
            Severity::Normal,
            "No signs of abnormality in the lungs. Lung structure appears normal.",
        ),
        ClassificationEntry::new(
            "Pneumonia",
            12,
            Severity::Mild,
            "Small chance of a mild lung infection.",
        ),
        ClassificationEntry::new(
            "Tuberculosis",
            3,
            Severity::Mild,
            "Very small chance of TB infection, low confidence.",
        ),
    ]
}

#[async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn analyze(&self, input: &SelectedInput) -> Result<AnalysisResultSet> {
        info!("Simulating analysis of {} ({:?})", input.name(), self.delay);
        tokio::time::sleep(self.delay).await;
        Ok(AnalysisResultSet::new(self.name(), mock_findings()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_waits_then_reports_fixed_findings() {
        let classifier = MockClassifier::new(Duration::from_secs(3));
        let input = SelectedInput::new("chest.png", "image/png", vec![0u8; 4]);

        let started = tokio::time::Instant::now();
        let results = classifier.analyze(&input).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));

        assert_eq!(results.len(), 3);
        assert_eq!(results.classifier, "mock");
        let first = &results.entries[0];
        assert_eq!(first.label, "Normal");
        assert_eq!(first.confidence_score, 85);
        assert_eq!(first.severity, Severity::Normal);
    }
}
