use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;

use crate::foundation::error::{PressPlayResult, ValidationError};

/// Where a background image comes from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Image file on disk.
    Path(PathBuf),
    /// Encoded image bytes already in memory (e.g. an upload).
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    /// Read the encoded bytes behind this source.
    pub fn load_bytes(&self) -> PressPlayResult<Arc<[u8]>> {
        match self {
            Self::Path(p) => {
                let bytes = std::fs::read(p)
                    .with_context(|| format!("read image '{}'", p.display()))?;
                Ok(Arc::from(bytes))
            }
            Self::Bytes(b) => Ok(b.clone()),
        }
    }

    /// Short human-readable label for logs.
    pub fn label(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(Arc::from(b))
    }
}

/// Ordered, non-empty set of background images for one run.
#[derive(Clone, Debug)]
pub struct ImagePool {
    images: Vec<ImageSource>,
}

impl ImagePool {
    /// Build a pool; an empty list is rejected with [`ValidationError::NoImages`].
    pub fn new(images: Vec<ImageSource>) -> Result<Self, ValidationError> {
        if images.is_empty() {
            return Err(ValidationError::NoImages);
        }
        Ok(Self { images })
    }

    /// Number of images in the pool (always >= 1).
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Always `false`; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image for scene `scene_index`, cycling through the pool.
    pub fn pick(&self, scene_index: usize) -> &ImageSource {
        &self.images[pool_index(scene_index, self.images.len())]
    }

    /// Borrow the images in order.
    pub fn as_slice(&self) -> &[ImageSource] {
        &self.images
    }
}

/// Round-robin selection: `pool[scene_index mod len]`, `None` only for an empty pool.
pub fn pick_image<T>(scene_index: usize, pool: &[T]) -> Option<&T> {
    if pool.is_empty() {
        return None;
    }
    pool.get(pool_index(scene_index, pool.len()))
}

pub(crate) fn pool_index(scene_index: usize, len: usize) -> usize {
    scene_index % len
}

#[cfg(test)]
#[path = "../../tests/unit/assets/pool.rs"]
mod tests;
