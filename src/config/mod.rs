//! Task options (`sprites.yaml`) parsing.
//!
//! The manifest holds the options of one sprite task: source patterns,
//! the two output paths, margin, class prefix, stylesheet dialect and
//! renderer settings. CLI flags are layered on top before the manifest is
//! validated into a [`SpriteTask`].

mod margin;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::bridge::{ProcessConfig, DEFAULT_TIMEOUT_SECS};
use crate::error::{Result, SpriteError};
use crate::stylesheet::{Dialect, PathPair};

pub use margin::{parse_margin, Margin};

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "sprites.yaml";

/// Raw task options as written in `sprites.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Manifest {
    /// Glob patterns selecting the source images. A single string is
    /// accepted as a one-element list.
    #[serde(deserialize_with = "one_or_many")]
    pub src: Vec<String>,

    /// Stylesheet output path.
    pub css: Option<PathBuf>,

    /// Composite image output path.
    pub map: Option<PathBuf>,

    /// Pixel margin between packed images.
    pub margin: Margin,

    /// Prefix joined to every generated class name with a hyphen.
    pub class_prefix: String,

    /// Stylesheet dialect.
    pub output: Dialect,

    /// External renderer settings.
    pub renderer: RendererSettings,
}

/// Renderer section of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Renderer binary; a bare name is looked up on PATH.
    pub path: Option<PathBuf>,

    /// Compositing script handed to the renderer before the payload.
    pub script: Option<PathBuf>,

    /// Upper bound on one renderer exchange.
    pub timeout_secs: u64,

    /// Keep the renderer's same-origin checks on. Off by default, since the
    /// renderer loads the images from local data URLs.
    pub web_security: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            path: None,
            script: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            web_security: false,
        }
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(pattern)) => vec![pattern],
        Some(OneOrMany::Many(patterns)) => patterns,
        None => vec![],
    })
}

impl Manifest {
    /// Load manifest from a sprites.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SpriteError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| SpriteError::Config {
            message: format!("Invalid manifest: {}", e),
            help: Some(format!("Check {} syntax", MANIFEST_FILENAME)),
        })
    }

    /// Validate required options and produce a runnable task.
    pub fn into_task(self) -> Result<SpriteTask> {
        if self.src.is_empty() {
            return Err(missing("src", "a list of glob patterns, e.g. `images/*.png`"));
        }
        let stylesheet = self
            .css
            .ok_or_else(|| missing("css", "the stylesheet path, e.g. `dist/css/sprites.css`"))?;
        let sprite_map = self
            .map
            .ok_or_else(|| missing("map", "the sprite image path, e.g. `dist/img/sprites.png`"))?;

        Ok(SpriteTask {
            src: self.src,
            paths: PathPair::new(sprite_map, stylesheet),
            spacing: self.margin.pixels(),
            class_prefix: self.class_prefix,
            dialect: self.output,
            renderer: self.renderer,
        })
    }
}

fn missing(option: &str, expected: &str) -> SpriteError {
    SpriteError::Config {
        message: format!("missing required option `{}`", option),
        help: Some(format!("Set `{}` to {}", option, expected)),
    }
}

/// A validated sprite task, ready to run.
#[derive(Debug, Clone)]
pub struct SpriteTask {
    pub src: Vec<String>,
    pub paths: PathPair,
    pub spacing: u32,
    pub class_prefix: String,
    pub dialect: Dialect,
    pub renderer: RendererSettings,
}

impl SpriteTask {
    /// Process settings for the renderer bridge.
    pub fn process_config(&self) -> ProcessConfig {
        ProcessConfig {
            renderer: self.renderer.path.clone(),
            script: self.renderer.script.clone(),
            timeout: Duration::from_secs(self.renderer.timeout_secs.max(1)),
            web_security: self.renderer.web_security,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
src:
  - icons/*.png
  - "!icons/skip-*.png"
css: build/css/app.css
map: build/img/sprite.png
margin: 4
classPrefix: icon
output: scss
renderer:
  path: /opt/phantomjs/bin/phantomjs
  script: lib/spriter.js
  timeout_secs: 30
"#;
        let manifest = Manifest::parse(yaml).unwrap();

        assert_eq!(manifest.src, vec!["icons/*.png", "!icons/skip-*.png"]);
        assert_eq!(manifest.css, Some(PathBuf::from("build/css/app.css")));
        assert_eq!(manifest.map, Some(PathBuf::from("build/img/sprite.png")));
        assert_eq!(manifest.margin, Margin(4));
        assert_eq!(manifest.class_prefix, "icon");
        assert_eq!(manifest.output, Dialect::Scss);
        assert_eq!(
            manifest.renderer.path,
            Some(PathBuf::from("/opt/phantomjs/bin/phantomjs"))
        );
        assert_eq!(manifest.renderer.script, Some(PathBuf::from("lib/spriter.js")));
        assert_eq!(manifest.renderer.timeout_secs, 30);
        assert!(!manifest.renderer.web_security);
    }

    #[test]
    fn test_parse_single_src_string() {
        let manifest = Manifest::parse("src: icons/*.png").unwrap();
        assert_eq!(manifest.src, vec!["icons/*.png"]);
    }

    #[test]
    fn test_defaults() {
        let manifest = Manifest::parse("").unwrap();

        assert!(manifest.src.is_empty());
        assert_eq!(manifest.margin, Margin(0));
        assert_eq!(manifest.class_prefix, "");
        assert_eq!(manifest.output, Dialect::Css);
        assert_eq!(manifest.renderer.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_non_numeric_margin_defaults_to_zero() {
        let manifest = Manifest::parse("margin: abc").unwrap();
        assert_eq!(manifest.margin, Margin(0));
    }

    #[test]
    fn test_unknown_output_falls_back_to_css() {
        let manifest = Manifest::parse("output: less").unwrap();
        assert_eq!(manifest.output, Dialect::Css);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = Manifest::parse("src: [unclosed");
        assert!(matches!(result, Err(SpriteError::Config { .. })));
    }

    #[test]
    fn test_into_task() {
        let manifest = Manifest {
            src: vec!["icons/*.png".to_string()],
            css: Some(PathBuf::from("out/app.css")),
            map: Some(PathBuf::from("out/app.png")),
            margin: Margin(2),
            ..Default::default()
        };

        let task = manifest.into_task().unwrap();
        assert_eq!(task.paths.sprite_map, PathBuf::from("out/app.png"));
        assert_eq!(task.paths.stylesheet, PathBuf::from("out/app.css"));
        assert_eq!(task.spacing, 2);
        assert_eq!(task.dialect, Dialect::Css);
    }

    #[test]
    fn test_into_task_requires_outputs() {
        let manifest = Manifest {
            src: vec!["icons/*.png".to_string()],
            css: Some(PathBuf::from("out/app.css")),
            ..Default::default()
        };

        let err = manifest.into_task().unwrap_err();
        assert!(err.to_string().contains("`map`"));
    }

    #[test]
    fn test_into_task_requires_src() {
        let err = Manifest::default().into_task().unwrap_err();
        assert!(err.to_string().contains("`src`"));
    }

    #[test]
    fn test_process_config_timeout() {
        let manifest = Manifest {
            src: vec!["*.png".to_string()],
            css: Some(PathBuf::from("a.css")),
            map: Some(PathBuf::from("a.png")),
            renderer: RendererSettings {
                timeout_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        let config = manifest.into_task().unwrap().process_config();
        assert_eq!(config.timeout, Duration::from_secs(1));
    }
}
