// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Pulmo

use thiserror::Error;

/// Result type alias for Pulmo operations
pub type Result<T> = std::result::Result<T, PulmoError>;

/// Pulmo error types
#[derive(Error, Debug)]
pub enum PulmoError {
    #[error("Not an image: {name} ({content_type})")]
    InvalidInputType { name: String, content_type: String },

    #[error("File too large: {name}{} (limit {limit} bytes)", size_note(.size))]
    InputTooLarge {
        name: String,
        /// Unknown when the body was cut off before the file was read
        size: Option<usize>,
        limit: usize,
    },

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Preview unavailable: {0}")]
    PreviewUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Ollama not available: {0}")]
    OllamaUnavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn size_note(size: &Option<usize>) -> String {
    size.map(|s| format!(" is {} bytes", s)).unwrap_or_default()
}

impl PulmoError {
    /// Whether this error was caused by what the user picked, as opposed to
    /// a failure on our side.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PulmoError::InvalidInputType { .. } | PulmoError::InputTooLarge { .. }
        )
    }
}
