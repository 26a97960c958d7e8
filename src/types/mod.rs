//! Core data passed between pipeline stages.
//!
//! - `SpriteBatch` - ordered encoded images plus spacing
//! - `CompositeResult` - the renderer's composite and per-image heights

mod batch;
mod composite;

pub use batch::{SpriteBatch, SpriteImage};
pub use composite::{offset, CompositeResult};
