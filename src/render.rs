// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Result renderer: maps controller state to the panel to display

use serde::Serialize;

use crate::analysis::{AnalysisResultSet, Severity};
use crate::controller::Snapshot;
use crate::preview::PreviewId;

/// Icon shown next to a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Check,
    Info,
    Warning,
}

impl Icon {
    /// Text glyph for terminals and plain HTML
    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::Check => "✓",
            Icon::Info => "ℹ",
            Icon::Warning => "⚠",
        }
    }
}

/// Presentation of one severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityStyle {
    pub color: &'static str,
    pub icon: Icon,
}

pub fn severity_style(severity: Severity) -> SeverityStyle {
    let (color, icon) = match severity {
        Severity::Normal => ("green", Icon::Check),
        Severity::Mild => ("amber", Icon::Info),
        Severity::Moderate => ("orange", Icon::Warning),
        Severity::Severe => ("red", Icon::Warning),
    };
    SeverityStyle { color, icon }
}

/// A finding ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedEntry {
    pub label: String,
    pub confidence_score: u8,
    pub severity: Severity,
    pub style: SeverityStyle,
    pub note: String,
}

/// What the results area shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "lowercase")]
pub enum Panel {
    /// Indeterminate progress with a fixed cosmetic percentage
    Progress {
        percent: u8,
        preview: Option<PreviewId>,
    },
    /// Findings plus a reset affordance
    Results {
        entries: Vec<RenderedEntry>,
        classifier: String,
        preview: Option<PreviewId>,
    },
}

/// Pick the panel for the given state. `None` means the caller should show
/// the upload surface instead.
pub fn render(
    busy: bool,
    results: Option<&AnalysisResultSet>,
    preview: Option<PreviewId>,
    progress_percent: u8,
) -> Option<Panel> {
    if busy {
        return Some(Panel::Progress {
            percent: progress_percent.min(100),
            preview,
        });
    }

    let results = results?;
    let entries = results
        .entries
        .iter()
        .map(|e| RenderedEntry {
            label: e.label.clone(),
            confidence_score: e.confidence_score,
            severity: e.severity,
            style: severity_style(e.severity),
            note: e.note.clone(),
        })
        .collect();

    Some(Panel::Results {
        entries,
        classifier: results.classifier.clone(),
        preview,
    })
}

/// [`render`] for a controller snapshot
pub fn render_snapshot(snapshot: &Snapshot, progress_percent: u8) -> Option<Panel> {
    render(
        snapshot.busy,
        snapshot.results.as_ref(),
        snapshot.preview,
        progress_percent,
    )
}

/// Plain-text report of a result set, one line per finding
pub fn render_text(results: &AnalysisResultSet) -> String {
    results
        .entries
        .iter()
        .map(|e| {
            let style = severity_style(e.severity);
            format!(
                "{} {:<16} {:>3}%  {:<8}  {}",
                style.icon.glyph(),
                e.label,
                e.confidence_score,
                e.severity.as_str().to_uppercase(),
                e.note
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
