// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Pulmo

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Which classifier runs and how the demo paces itself
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// AI engine configuration (only used by the `ollama` backend)
    #[serde(default)]
    pub ai_engine: EngineConfig,

    /// Upload limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Preview rendering
    #[serde(default)]
    pub preview: PreviewConfig,

    /// Web UI settings
    #[serde(default)]
    pub web: WebConfig,
}

/// Classifier backend selection
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Fixed findings after a simulated delay
    #[default]
    Mock,
    /// Local vision model served by Ollama
    Ollama,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Simulated analysis time for the mock backend
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Cosmetic percentage shown while analyzing
    #[serde(default = "default_progress_percent")]
    pub progress_percent: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_engine_url")]
    pub url: String,
    #[serde(default = "default_vision_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PreviewConfig {
    /// Longest side of the stored preview, in pixels
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

// Default value functions
fn default_delay_ms() -> u64 { 3000 }
fn default_progress_percent() -> u8 { 78 }
fn default_engine_url() -> String { "http://localhost:11434".to_string() }
fn default_vision_model() -> String { "llava".to_string() }
fn default_timeout() -> u64 { 120 }
fn default_retries() -> u32 { 2 }
fn default_max_bytes() -> usize { 10 * 1024 * 1024 }
fn default_max_dimension() -> u32 { 512 }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }

fn default_prompt() -> String {
    "You are screening a chest X-ray. Reply ONLY with a JSON array of findings. \
     Each finding is an object with keys \"label\" (string), \"confidence\" \
     (integer 0-100), \"severity\" (one of normal, mild, moderate, severe) and \
     \"note\" (one sentence).".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            delay_ms: default_delay_ms(),
            progress_percent: default_progress_percent(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            model: default_vision_model(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
            prompt: default_prompt(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { max_bytes: default_max_bytes() }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { max_dimension: default_max_dimension() }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl AnalysisConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::PulmoError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the rest of the program cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if self.analysis.progress_percent > 100 {
            return Err(crate::PulmoError::Config(format!(
                "analysis.progress_percent must be 0-100, got {}",
                self.analysis.progress_percent
            )));
        }
        if self.upload.max_bytes == 0 {
            return Err(crate::PulmoError::Config("upload.max_bytes must be positive".to_string()));
        }
        if self.preview.max_dimension == 0 {
            return Err(crate::PulmoError::Config("preview.max_dimension must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.analysis.backend, Backend::Mock);
        assert_eq!(config.analysis.delay_ms, 3000);
        assert_eq!(config.upload.max_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.analysis.backend = Backend::Ollama;
        config.web.port = 9191;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.analysis.backend, Backend::Ollama);
        assert_eq!(loaded.web.port, 9191);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"analysis": {"delay_ms": 10}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.analysis.delay_ms, 10);
        assert_eq!(config.analysis.progress_percent, 78);
        assert_eq!(config.web.host, "127.0.0.1");
    }

    #[test]
    fn test_rejects_bad_percent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"analysis": {"progress_percent": 150}}"#).unwrap();

        assert!(matches!(AppConfig::load(&path), Err(crate::PulmoError::Config(_))));
    }
}
