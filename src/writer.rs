//! Output writing.
//!
//! The sprite map and the stylesheet are written concurrently and joined:
//! the caller sees one success after both land, or the first failure.
//! Nothing is rolled back on failure.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Result, SpriteError};
use crate::stylesheet::PathPair;

/// Write the composite image and the stylesheet to their destinations.
pub async fn write_outputs(paths: &PathPair, image: &[u8], stylesheet: &str) -> Result<()> {
    tokio::try_join!(
        write_file(&paths.sprite_map, image),
        write_file(&paths.stylesheet, stylesheet.as_bytes()),
    )?;
    Ok(())
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent(path).await?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| SpriteError::FilesystemWrite {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Create the parent directory of `path` if it is missing.
///
/// Only one level is created; a missing grandparent is an error.
async fn ensure_parent(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    match tokio::fs::create_dir(parent).await {
        Ok(()) => Ok(()),
        // Both writes may target the same directory.
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(SpriteError::FilesystemWrite {
            path: parent.to_path_buf(),
            source,
        }),
    }
}
