//! The ordered image batch carried through every pipeline stage.
//!
//! The request payload, the class names in the stylesheet and the heights
//! returned by the renderer are all indexed against one `SpriteBatch`, so
//! the order is fixed once, when the batch is built.

use std::path::{Path, PathBuf};

/// One source image and its base64 transport encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    /// Path the image was read from.
    pub path: PathBuf,

    /// Base64 (standard alphabet, padded) encoding of the file contents.
    pub data: String,
}

impl SpriteImage {
    pub fn new(path: impl Into<PathBuf>, data: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }
}

/// Encoded images in collection order plus the packing margin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteBatch {
    images: Vec<SpriteImage>,
    spacing: u32,
}

impl SpriteBatch {
    /// Create a batch. `images` must already be in collection order.
    pub fn new(images: Vec<SpriteImage>, spacing: u32) -> Self {
        Self { images, spacing }
    }

    pub fn images(&self) -> &[SpriteImage] {
        &self.images
    }

    /// Pixel margin between packed images.
    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Source paths in batch order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.images.iter().map(|image| image.path.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_preserves_order() {
        let batch = SpriteBatch::new(
            vec![
                SpriteImage::new("icons/b.png", "Yg=="),
                SpriteImage::new("icons/a.png", "YQ=="),
            ],
            4,
        );

        let paths: Vec<&Path> = batch.paths().collect();
        assert_eq!(paths, vec![Path::new("icons/b.png"), Path::new("icons/a.png")]);
        assert_eq!(batch.spacing(), 4);
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let batch = SpriteBatch::new(vec![], 0);
        assert!(batch.is_empty());
        assert_eq!(batch.paths().count(), 0);
    }
}
