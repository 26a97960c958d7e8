//! cssprite - PNG sprite map and stylesheet generator
//!
//! Collects PNG files from glob patterns, hands them to an external
//! headless renderer that stacks them into one vertical sprite map, and
//! writes the map together with a CSS or SCSS stylesheet of per-image
//! background offsets.

pub mod bridge;
pub mod cli;
pub mod collect;
pub mod config;
pub mod encode;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod stylesheet;
pub mod types;
pub mod writer;

pub use bridge::{Compositor, ProcessCompositor, ProcessConfig};
pub use collect::collect_assets;
pub use config::{Manifest, Margin, SpriteTask};
pub use encode::encode_assets;
pub use error::{Result, SpriteError};
pub use pipeline::{generate, SpriteReport};
pub use stylesheet::{Dialect, PathPair, StylesheetGenerator};
pub use types::{CompositeResult, SpriteBatch, SpriteImage};
pub use writer::write_outputs;
