//! Compositor bridge.
//!
//! The composite image is produced by an external renderer. This module
//! hides it behind the [`Compositor`] trait: [`ProcessCompositor`] drives
//! the real subprocess, tests plug in canned implementations.
//!
//! # Protocol
//!
//! The request `{"images": [...], "spacing": n}` is passed as the last
//! process argument. The renderer writes one JSON response to stdout
//! followed by the [`SENTINEL`]; the bridge kills the renderer as soon as
//! the sentinel shows up, since the renderer may never exit on its own.

mod process;
mod protocol;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CompositeResult, SpriteBatch};

pub use process::{
    ProcessCompositor, ProcessConfig, DEFAULT_RENDERER, DEFAULT_TIMEOUT_SECS,
    EXIT_COMMAND_NOT_FOUND, RENDERER_ENV, WEB_SECURITY_FLAG,
};
pub use protocol::{decode_output, OutputBuffer, RenderRequest, DATA_URL_PREFIX, SENTINEL};

/// Packs a batch of images into one composite.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Render `batch`. The result's heights are in batch order.
    async fn compose(&self, batch: &SpriteBatch) -> Result<CompositeResult>;
}
