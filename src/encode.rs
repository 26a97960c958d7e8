//! Image encoding.
//!
//! Reads every collected image concurrently and base64 encodes it for the
//! renderer payload. Reads may finish in any order; the batch keeps the
//! collection order.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::try_join_all;

use crate::error::{Result, SpriteError};
use crate::types::{SpriteBatch, SpriteImage};

/// Read and encode `paths` into a batch.
///
/// Fails with [`SpriteError::AssetRead`] on the first unreadable file; no
/// partial batch is returned.
pub async fn encode_assets(paths: &[PathBuf], spacing: u32) -> Result<SpriteBatch> {
    let images = try_join_all(paths.iter().map(|path| encode_asset(path))).await?;
    log::debug!("encoded {} image(s)", images.len());
    Ok(SpriteBatch::new(images, spacing))
}

async fn encode_asset(path: &Path) -> Result<SpriteImage> {
    let bytes = tokio::fs::read(path).await.map_err(|source| SpriteError::AssetRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SpriteImage::new(path, encode_base64(&bytes)))
}

/// Base64 encode with the standard padded alphabet.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Inverse of [`encode_base64`].
pub fn decode_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fixture_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_base64_round_trip_fixture() {
        let png = fixture_png(4, 6);
        let encoded = encode_base64(&png);
        assert_eq!(decode_base64(&encoded).unwrap(), png);
    }

    #[test]
    fn test_encode_known_bytes() {
        assert_eq!(encode_base64(b"png"), "cG5n");
        assert!(decode_base64("not base64!").is_err());
    }

    #[tokio::test]
    async fn test_encode_assets_keeps_collection_order() {
        let dir = tempdir().unwrap();
        let large = dir.path().join("large.png");
        let small = dir.path().join("small.png");
        fs::write(&large, fixture_png(64, 64)).unwrap();
        fs::write(&small, fixture_png(1, 1)).unwrap();

        let paths = vec![large.clone(), small.clone()];
        let batch = encode_assets(&paths, 3).await.unwrap();

        assert_eq!(batch.spacing(), 3);
        let got: Vec<&Path> = batch.paths().collect();
        assert_eq!(got, vec![large.as_path(), small.as_path()]);
        assert_eq!(
            decode_base64(&batch.images()[1].data).unwrap(),
            fs::read(&small).unwrap()
        );
    }

    #[tokio::test]
    async fn test_encode_assets_fails_on_missing_file() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.png");
        fs::write(&present, fixture_png(1, 1)).unwrap();
        let missing = dir.path().join("missing.png");

        let err = encode_assets(&[present, missing.clone()], 0)
            .await
            .unwrap_err();

        match err {
            SpriteError::AssetRead { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_encode_no_assets() {
        let batch = encode_assets(&[], 0).await.unwrap();
        assert!(batch.is_empty());
    }
}
