//! Stylesheet generation.
//!
//! Renders one rule per sprited image, positioning the shared sprite map
//! with a vertical `background-position` offset. Two dialects are
//! supported: a flat CSS rule set and an SCSS placeholder/`@extend` form.

use std::fmt::Write as _;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use serde::{Deserialize, Serialize};

use crate::types::{CompositeResult, SpriteBatch};

/// Stylesheet dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Css,
    Scss,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Css => "css",
            Dialect::Scss => "scss",
        }
    }
}

/// Unknown dialect names fall back to plain CSS.
impl From<String> for Dialect {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("scss") {
            Dialect::Scss
        } else {
            Dialect::Css
        }
    }
}

/// The two destination paths of a sprite task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    /// Composite image path.
    pub sprite_map: PathBuf,
    /// Stylesheet path.
    pub stylesheet: PathBuf,
}

impl PathPair {
    pub fn new(sprite_map: impl Into<PathBuf>, stylesheet: impl Into<PathBuf>) -> Self {
        Self {
            sprite_map: sprite_map.into(),
            stylesheet: stylesheet.into(),
        }
    }

    /// URL of the sprite map as referenced from the stylesheet.
    ///
    /// This is a positional diff of the path segments, not a filesystem
    /// relativization: every sprite-map segment that differs from the
    /// stylesheet segment at the same index is kept, and the result is
    /// prefixed with `../`. Paths of different depth or with shuffled
    /// segments are not resolved properly; existing stylesheets depend on
    /// this exact output.
    pub fn relative_reference(&self) -> String {
        let sprite_text = self.sprite_map.to_string_lossy();
        let css_text = self.stylesheet.to_string_lossy();
        let css_parts: Vec<&str> = split_segments(&css_text).collect();

        let parts: Vec<&str> = split_segments(&sprite_text)
            .enumerate()
            .filter(|(idx, part)| css_parts.get(*idx) != Some(part))
            .map(|(_, part)| part)
            .collect();

        format!("../{}", parts.join("/"))
    }

    /// File name of the stylesheet; names the SCSS base placeholder.
    fn stylesheet_name(&self) -> String {
        self.stylesheet
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(|c| c == '/' || c == MAIN_SEPARATOR)
}

/// Class name for an image: its file name without `.png`, optionally
/// prefixed with `<prefix>-`.
pub fn class_name(prefix: &str, path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(".png").unwrap_or(&file_name);

    if prefix.is_empty() {
        stem.to_string()
    } else {
        format!("{}-{}", prefix, stem)
    }
}

/// Renders the stylesheet for one sprite task.
pub struct StylesheetGenerator<'a> {
    paths: &'a PathPair,
    class_prefix: &'a str,
    dialect: Dialect,
}

impl<'a> StylesheetGenerator<'a> {
    pub fn new(paths: &'a PathPair, class_prefix: &'a str, dialect: Dialect) -> Self {
        Self {
            paths,
            class_prefix,
            dialect,
        }
    }

    /// Render the stylesheet text.
    ///
    /// `composite` must come from rendering `batch`: the i-th height belongs
    /// to the i-th image.
    pub fn render(&self, batch: &SpriteBatch, composite: &CompositeResult) -> String {
        let classes: Vec<String> = batch
            .paths()
            .map(|path| class_name(self.class_prefix, path))
            .collect();
        let reference = self.paths.relative_reference();

        let rules: Vec<(&str, i64)> = classes
            .iter()
            .map(String::as_str)
            .zip(composite.offsets())
            .collect();
        match self.dialect {
            Dialect::Css => render_css(&reference, &rules),
            Dialect::Scss => render_scss(&reference, &self.paths.stylesheet_name(), &rules),
        }
    }
}

fn render_css(reference: &str, rules: &[(&str, i64)]) -> String {
    let selector = rules
        .iter()
        .map(|(class, _)| format!(".{}", class))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::new();
    let _ = write!(
        out,
        "{} {{\n    background: url(\"{}\") no-repeat;\n}}\n\n",
        selector, reference
    );
    for (class, offset) in rules {
        let _ = write!(
            out,
            ".{} {{\n    background-position: 0 {}px;\n}}\n\n",
            class, offset
        );
    }
    out
}

fn render_scss(reference: &str, placeholder: &str, rules: &[(&str, i64)]) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "%{} {{\n    background: url(\"{}\") no-repeat;\n}}\n\n",
        placeholder, reference
    );
    for (class, offset) in rules {
        let _ = write!(
            out,
            "%{} {{\n    @extend %{};\n    background-position: 0 {}px;\n}}\n\n",
            class, placeholder, offset
        );
    }
    out
}
