// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Upload surface: turns a list of incoming files into one accepted image

use image::ImageFormat;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::UploadConfig;
use crate::{PulmoError, Result};

/// An image the user picked, ready to hand to the controller.
///
/// The bytes are shared, so cloning is cheap and the analysis task can hold
/// its own copy while the controller moves on.
#[derive(Clone)]
pub struct SelectedInput {
    name: String,
    content_type: String,
    data: Arc<[u8]>,
}

impl SelectedInput {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Display name (the original filename)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for SelectedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedInput")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A file as delivered by a drop target, file picker or the CLI
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    /// Type reported by the sender, if any
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl IncomingFile {
    /// Read a file from disk; the content type is left for the surface to infer
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, content_type: None, data })
    }
}

/// Loose MIME check: anything under `image/`
pub fn is_image_type(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("image/")
}

/// Resolve the content type of a file, guessing from the extension when the
/// sender did not say or only said `application/octet-stream`.
pub fn resolve_content_type(name: &str, reported: Option<&str>) -> Option<String> {
    match reported.map(str::trim) {
        Some(t) if !t.is_empty() && !t.eq_ignore_ascii_case("application/octet-stream") => {
            Some(t.to_string())
        }
        _ => ImageFormat::from_path(name)
            .ok()
            .map(|f| f.to_mime_type().to_string()),
    }
}

/// Validates selections before they reach the controller
#[derive(Debug, Clone)]
pub struct UploadSurface {
    max_bytes: usize,
}

impl UploadSurface {
    pub fn new(config: &UploadConfig) -> Self {
        Self { max_bytes: config.max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Take the first file of a selection.
    ///
    /// Returns `Ok(None)` for an empty selection. Files beyond the first are
    /// ignored.
    pub fn accept(&self, files: impl IntoIterator<Item = IncomingFile>) -> Result<Option<SelectedInput>> {
        let Some(file) = files.into_iter().next() else {
            debug!("Empty selection, nothing to do");
            return Ok(None);
        };

        let content_type = resolve_content_type(&file.name, file.content_type.as_deref());
        let content_type = match content_type {
            Some(t) if is_image_type(&t) => t,
            other => {
                return Err(PulmoError::InvalidInputType {
                    name: file.name,
                    content_type: other.unwrap_or_else(|| "unknown".to_string()),
                });
            }
        };

        if file.data.len() > self.max_bytes {
            return Err(PulmoError::InputTooLarge {
                name: file.name,
                size: Some(file.data.len()),
                limit: self.max_bytes,
            });
        }

        info!("Accepted {} ({}, {} bytes)", file.name, content_type, file.data.len());
        Ok(Some(SelectedInput::new(file.name, content_type, file.data)))
    }
}

impl Default for UploadSurface {
    fn default() -> Self {
        Self::new(&UploadConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content_type: Option<&str>, len: usize) -> IncomingFile {
        IncomingFile {
            name: name.to_string(),
            content_type: content_type.map(String::from),
            data: vec![0u8; len],
        }
    }

    #[test]
    fn test_accepts_image() {
        let surface = UploadSurface::default();
        let input = surface
            .accept([file("chest.png", Some("image/png"), 16)])
            .unwrap()
            .unwrap();
        assert_eq!(input.name(), "chest.png");
        assert_eq!(input.content_type(), "image/png");
        assert_eq!(input.len(), 16);
    }

    #[test]
    fn test_only_first_file_counts() {
        let surface = UploadSurface::default();
        let input = surface
            .accept([
                file("a.jpg", Some("image/jpeg"), 4),
                file("b.png", Some("image/png"), 4),
            ])
            .unwrap()
            .unwrap();
        assert_eq!(input.name(), "a.jpg");

        let err = surface
            .accept([
                file("notes.txt", Some("text/plain"), 4),
                file("b.png", Some("image/png"), 4),
            ])
            .unwrap_err();
        assert!(matches!(err, PulmoError::InvalidInputType { .. }));
    }

    #[test]
    fn test_rejects_non_image() {
        let surface = UploadSurface::default();
        let err = surface
            .accept([file("report.pdf", Some("application/pdf"), 4)])
            .unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("report.pdf"));
    }

    #[test]
    fn test_empty_selection() {
        let surface = UploadSurface::default();
        assert!(surface.accept(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn test_infers_type_from_extension() {
        assert_eq!(resolve_content_type("scan.JPG", None).as_deref(), Some("image/jpeg"));
        assert_eq!(
            resolve_content_type("scan.png", Some("application/octet-stream")).as_deref(),
            Some("image/png")
        );
        assert_eq!(resolve_content_type("scan", None), None);
        assert_eq!(resolve_content_type("scan.png", Some("text/plain")).as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_size_limit() {
        let surface = UploadSurface::new(&UploadConfig { max_bytes: 8 });
        assert!(surface.accept([file("x.png", Some("image/png"), 8)]).is_ok());
        let err = surface.accept([file("x.png", Some("image/png"), 9)]).unwrap_err();
        assert!(matches!(err, PulmoError::InputTooLarge { size: Some(9), limit: 8, .. }));
    }

    #[test]
    fn test_mime_check_is_loose() {
        assert!(is_image_type("image/png"));
        assert!(is_image_type("IMAGE/x-portable-anymap"));
        assert!(is_image_type(" image/webp"));
        assert!(!is_image_type("application/octet-stream"));
        assert!(!is_image_type(""));
    }
}
