// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Preview resources for the selected image
//!
//! A [`PreviewHandle`] owns one live preview and releases it when dropped, so
//! replacing or clearing the handle in the controller frees the preview
//! exactly once.

use image::imageops::FilterType;
use image::ImageFormat;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::PreviewConfig;
use crate::upload::SelectedInput;
use crate::{PulmoError, Result};

/// Identifier of a live preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewId(Uuid);

impl PreviewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for PreviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Platform side of previews: something that can create and free them
pub trait PreviewHost: Send + Sync {
    fn create(&self, input: &SelectedInput) -> Result<PreviewId>;

    fn release(&self, id: PreviewId);
}

/// Owned preview; releases itself on drop
pub struct PreviewHandle {
    id: PreviewId,
    host: Arc<dyn PreviewHost>,
}

impl PreviewHandle {
    /// Create a preview for `input` on `host`
    pub fn acquire(host: Arc<dyn PreviewHost>, input: &SelectedInput) -> Result<Self> {
        let id = host.create(input)?;
        Ok(Self { id, host })
    }

    pub fn id(&self) -> PreviewId {
        self.id
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.host.release(self.id);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.id).finish()
    }
}

/// Creation/release bookkeeping, mostly for leak checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreviewStats {
    pub created: u64,
    pub released: u64,
    /// Releases of ids that were not live
    pub stray_releases: u64,
}

impl PreviewStats {
    pub fn live(&self) -> u64 {
        self.created - self.released
    }
}

#[derive(Default)]
struct StoreInner {
    images: HashMap<PreviewId, Arc<[u8]>>,
    stats: PreviewStats,
}

/// In-memory preview host.
///
/// Decodes the selected image, scales it down and keeps a PNG copy that the
/// web UI serves while the preview is live.
pub struct PreviewStore {
    max_dimension: u32,
    inner: Mutex<StoreInner>,
}

impl PreviewStore {
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// PNG bytes of a live preview
    pub fn get(&self, id: PreviewId) -> Option<Arc<[u8]>> {
        self.inner.lock().images.get(&id).cloned()
    }

    pub fn stats(&self) -> PreviewStats {
        self.inner.lock().stats
    }

    fn render(&self, input: &SelectedInput) -> Result<Vec<u8>> {
        let img = image::load_from_memory(input.data())
            .map_err(|e| PulmoError::PreviewUnavailable(format!("{}: {}", input.name(), e)))?;

        let img = if img.width() > self.max_dimension || img.height() > self.max_dimension {
            img.resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
        } else {
            img
        };

        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| PulmoError::PreviewUnavailable(format!("{}: {}", input.name(), e)))?;
        Ok(buffer)
    }
}

impl Default for PreviewStore {
    fn default() -> Self {
        Self::new(&PreviewConfig::default())
    }
}

impl PreviewHost for PreviewStore {
    fn create(&self, input: &SelectedInput) -> Result<PreviewId> {
        let png = self.render(input)?;
        let id = PreviewId::new();

        let mut inner = self.inner.lock();
        inner.images.insert(id, png.into());
        inner.stats.created += 1;
        debug!("Created preview {} for {}", id, input.name());
        Ok(id)
    }

    fn release(&self, id: PreviewId) {
        let mut inner = self.inner.lock();
        if inner.images.remove(&id).is_some() {
            inner.stats.released += 1;
            debug!("Released preview {}", id);
        } else {
            inner.stats.stray_releases += 1;
            warn!("Release of unknown preview {}", id);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Encode a solid-colour PNG of the given size
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([40, 40, 40]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png).unwrap();
        buffer
    }

    pub(crate) fn png_input(name: &str) -> SelectedInput {
        SelectedInput::new(name, "image/png", png_bytes(8, 8))
    }

    #[test]
    fn test_handle_releases_on_drop() {
        let store = Arc::new(PreviewStore::default());
        let handle = PreviewHandle::acquire(store.clone(), &png_input("chest.png")).unwrap();
        let id = handle.id();
        assert!(store.get(id).is_some());

        drop(handle);
        assert!(store.get(id).is_none());
        assert_eq!(store.stats(), PreviewStats { created: 1, released: 1, stray_releases: 0 });
    }

    #[test]
    fn test_large_images_are_scaled_down() {
        let store = PreviewStore::new(&PreviewConfig { max_dimension: 16 });
        let input = SelectedInput::new("big.png", "image/png", png_bytes(64, 32));
        let id = store.create(&input).unwrap();

        let png = store.get(id).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (16, 8));
    }

    #[test]
    fn test_undecodable_input() {
        let store = PreviewStore::default();
        let input = SelectedInput::new("broken.png", "image/png", vec![1u8, 2, 3]);
        let err = store.create(&input).unwrap_err();
        assert!(matches!(err, PulmoError::PreviewUnavailable(_)));
        assert_eq!(store.stats().created, 0);
    }

    #[test]
    fn test_stray_release_is_counted() {
        let store = PreviewStore::default();
        store.release(PreviewId::new());
        assert_eq!(store.stats().stray_releases, 1);
        assert_eq!(store.stats().released, 0);
    }
}
