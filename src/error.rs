use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for cssprite operations
#[derive(Error, Diagnostic, Debug)]
pub enum SpriteError {
    #[error("Failed to read source image {path}: {source}")]
    #[diagnostic(code(cssprite::asset_read))]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer not available: {reason}")]
    #[diagnostic(
        code(cssprite::renderer_unavailable),
        help(
            "cssprite composites images with an external renderer (PhantomJS by default). \
             It must be installed and in your PATH: if you can run \"phantomjs\" at the \
             command line, this tool should work. Otherwise set `renderer.path` in \
             sprites.yaml, pass --renderer, or export CSSPRITE_RENDERER. \
             See https://phantomjs.org/download.html for installation instructions."
        )
    )]
    RendererUnavailable { reason: String },

    #[error("Renderer did not finish within {secs} seconds")]
    #[diagnostic(
        code(cssprite::renderer_timeout),
        help("Increase `renderer.timeout_secs` or pass --timeout")
    )]
    RendererTimeout { secs: u64 },

    #[error("Malformed renderer output: {message}")]
    #[diagnostic(code(cssprite::malformed_output))]
    MalformedRendererOutput { message: String },

    #[error("Failed to write {path}: {source}")]
    #[diagnostic(code(cssprite::write))]
    FilesystemWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No PNG images matched {patterns}")]
    #[diagnostic(
        code(cssprite::no_images),
        help("Check the `src` patterns; only files ending in .png are sprited")
    )]
    NoImages { patterns: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(cssprite::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(cssprite::io))]
    Io { path: PathBuf, message: String },
}

impl SpriteError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRendererOutput {
            message: message.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::RendererUnavailable {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpriteError>;
