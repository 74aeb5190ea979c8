// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ollama API client for local vision inference

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{PulmoError, Result};

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    images: [&'a str; 1],
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

/// An installed model name matches `wanted` with or without its tag, so
/// `llava` finds `llava:latest` and `llava:13b`.
fn model_matches(installed: &str, wanted: &str) -> bool {
    match installed.split_once(':') {
        Some((base, _)) if !wanted.contains(':') => base == wanted,
        _ => installed == wanted,
    }
}

/// Strip trailing slashes and endpoint paths so `url` can be given either as
/// the server root or as a full endpoint.
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/')
        .replace("/api/generate", "")
        .replace("/api/chat", "")
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PulmoError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn unreachable(&self, e: reqwest::Error) -> PulmoError {
        PulmoError::OllamaUnavailable(format!("No Ollama server at {}: {}", self.base_url, e))
    }

    async fn tags(&self, timeout: Option<Duration>) -> Result<TagsResponse> {
        let mut request = self.client.get(self.endpoint("tags"));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|e| self.unreachable(e))?;
        Ok(response.error_for_status()?.json().await?)
    }

    /// Fail fast when the server cannot be reached
    pub async fn health_check(&self) -> Result<()> {
        self.tags(Some(Duration::from_secs(10))).await.map(|_| ())
    }

    /// Names of the installed models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let tags = self.tags(None).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    pub async fn model_available(&self, model: &str) -> Result<bool> {
        let installed = self.list_models().await?;
        Ok(installed.iter().any(|name| model_matches(name, model)))
    }

    /// One non-streamed completion for a prompt plus a single image
    pub async fn generate_with_image(
        &self,
        model: &str,
        prompt: &str,
        image_base64: &str,
    ) -> Result<String> {
        debug!("Vision request: model={}, image {} base64 chars", model, image_base64.len());

        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            images: [image_base64],
        };
        let response = self
            .client
            .post(self.endpoint("generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PulmoError::OllamaUnavailable(format!("generate answered {}", status)));
        }

        let reply: GenerateResponse = response.json().await?;
        Ok(reply.response)
    }

    /// Vision generation with exponential backoff between attempts
    pub async fn generate_with_image_retry(
        &self,
        model: &str,
        prompt: &str,
        image_base64: &str,
        retries: u32,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                warn!("Retrying Ollama request in {:?} (attempt {})", delay, attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match self.generate_with_image(model, prompt, image_base64).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            PulmoError::OllamaUnavailable("Unknown error".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
        assert_eq!(normalize_base_url("http://localhost:11434/api/generate"), "http://localhost:11434");
        assert_eq!(normalize_base_url("http://gpu-box:11434/api/chat"), "http://gpu-box:11434");
    }

    #[test]
    fn test_model_matches() {
        assert!(model_matches("llava:latest", "llava"));
        assert!(model_matches("llava:13b", "llava"));
        assert!(model_matches("llava:13b", "llava:13b"));
        assert!(!model_matches("llava:13b", "llava:7b"));
        assert!(!model_matches("llava-phi3:latest", "llava"));
        assert!(model_matches("bakllava", "bakllava"));
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            model: "llava",
            prompt: "describe",
            stream: false,
            images: ["aGVsbG8="],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llava");
        assert_eq!(json["stream"], false);
        assert_eq!(json["images"][0], "aGVsbG8=");
    }
}
