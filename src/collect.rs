//! Source image collection.
//!
//! Expands the task's glob patterns into the ordered list of PNG files to
//! sprite. The order produced here is the order of every later stage.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{Result, SpriteError};

/// The only raster extension the renderer is fed.
pub const IMAGE_EXTENSION: &str = "png";

/// Expand `patterns` into matching PNG paths.
///
/// Patterns are applied in order and each pattern's matches come out in
/// glob order. A path matched twice keeps its first position. A pattern
/// starting with `!` removes already matched paths that match the rest of
/// it. No matches at all is not an error.
pub fn collect_assets(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut matched: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for pattern in patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            let exclude = Pattern::new(negated).map_err(|e| invalid_pattern(pattern, e))?;
            matched.retain(|path| {
                let keep = !exclude.matches_path(path);
                if !keep {
                    seen.remove(path);
                }
                keep
            });
            continue;
        }

        let entries = glob::glob(pattern).map_err(|e| invalid_pattern(pattern, e))?;
        for path in entries.filter_map(|entry| entry.ok()) {
            if seen.insert(path.clone()) {
                matched.push(path);
            }
        }
    }

    matched.retain(|path| is_image(path));
    Ok(matched)
}

/// Check whether a path has the sprited image extension (case-sensitive).
pub fn is_image(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(IMAGE_EXTENSION)
}

fn invalid_pattern(pattern: &str, err: glob::PatternError) -> SpriteError {
    SpriteError::Config {
        message: format!("invalid source pattern `{}`: {}", pattern, err),
        help: Some("Patterns use glob syntax, e.g. `images/**/*.png`".to_string()),
    }
}
