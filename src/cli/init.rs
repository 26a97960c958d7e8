//! Init command implementation.
//!
//! Generates a `sprites.yaml` manifest with one `src` pattern per
//! directory that holds PNG files.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use walkdir::{DirEntry, WalkDir};

use crate::collect::is_image;
use crate::config::MANIFEST_FILENAME;
use crate::error::{Result, SpriteError};
use crate::output::{display_path, plural, Printer};

/// Default output locations. Sibling directories, so the stylesheet
/// reaches the sprite map through `../`.
const DEFAULT_CSS: &str = "css/sprites.css";
const DEFAULT_MAP: &str = "sprites/sprites.png";

/// Directories never scanned for source images.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "sprites"];

/// Write a starter sprites.yaml
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to scan (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing sprites.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(SpriteError::Config {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    printer.status("Scanning", &display_path(&args.path));
    let (source_dirs, total) = scan_image_dirs(&args.path);

    let mut yaml = String::new();
    yaml.push_str("src:\n");
    if source_dirs.is_empty() {
        yaml.push_str("  - \"*.png\"\n");
    } else {
        for dir in &source_dirs {
            yaml.push_str(&format!("  - \"{}*.png\"\n", dir));
        }
    }
    yaml.push_str(&format!("css: {}\n", DEFAULT_CSS));
    yaml.push_str(&format!("map: {}\n", DEFAULT_MAP));
    yaml.push_str("margin: 0\n");
    yaml.push_str("output: css\n");

    fs::write(&manifest_path, &yaml).map_err(|e| SpriteError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    if !source_dirs.is_empty() {
        let dirs: Vec<&str> = source_dirs.iter().map(|s| s.as_str()).collect();
        printer.info("Discovered", &dirs.join(", "));
    }

    printer.success(
        "Created",
        &format!("{} ({} found)", MANIFEST_FILENAME, plural(total, "image", "images")),
    );

    Ok(())
}

/// Directories under `root` holding PNG files, as `dir/` prefixes relative
/// to `root` (empty string for `root` itself), plus the image count.
fn scan_image_dirs(root: &Path) -> (BTreeSet<String>, usize) {
    let mut dirs = BTreeSet::new();
    let mut total = 0;

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_image(path) {
            continue;
        }
        total += 1;

        if let Some(parent) = path.parent() {
            let relative = parent.strip_prefix(root).unwrap_or(parent);
            if relative.as_os_str().is_empty() {
                dirs.insert(String::new());
            } else {
                let prefix = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                dirs.insert(format!("{}/", prefix));
            }
        }
    }

    (dirs, total)
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Manifest;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_manifest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), b"").unwrap();

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        run(args, &Printer::new()).unwrap();

        let content = fs::read_to_string(dir.path().join(MANIFEST_FILENAME)).unwrap();
        assert!(content.contains("  - \"*.png\"\n"));
        assert!(content.contains("css: css/sprites.css"));
    }

    #[test]
    fn test_init_manifest_is_loadable() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("icons")).unwrap();
        fs::write(dir.path().join("icons/home.png"), b"").unwrap();

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        run(args, &Printer::new()).unwrap();

        let manifest = Manifest::load(&dir.path().join(MANIFEST_FILENAME)).unwrap();
        assert_eq!(manifest.src, vec!["icons/*.png"]);

        let task = manifest.into_task().unwrap();
        assert_eq!(task.paths.relative_reference(), "../sprites/sprites.png");
    }

    #[test]
    fn test_init_errors_if_manifest_exists() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), "src: a.png").unwrap();

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        assert!(run(args, &Printer::new()).is_err());
    }

    #[test]
    fn test_init_force_overwrites() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), "src: a.png").unwrap();

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: true,
        };
        run(args, &Printer::new()).unwrap();

        let content = fs::read_to_string(dir.path().join(MANIFEST_FILENAME)).unwrap();
        assert!(content.contains("map: sprites/sprites.png"));
    }

    #[test]
    fn test_scan_skips_outputs_and_hidden_dirs() {
        let dir = tempdir().unwrap();
        for sub in ["icons/social", "sprites", ".cache", "node_modules/pkg"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
            fs::write(dir.path().join(sub).join("x.png"), b"").unwrap();
        }
        fs::write(dir.path().join("icons/readme.md"), b"").unwrap();

        let (dirs, total) = scan_image_dirs(dir.path());

        assert_eq!(dirs.into_iter().collect::<Vec<_>>(), vec!["icons/social/"]);
        assert_eq!(total, 1);
    }
}
