//! Clipbin Media Bin Engine
//!
//! Client-side media bin controller for a browser video editor.
//! Handles metadata probing, remote asset storage and analysis, the local
//! item catalog, and the ingestion/deletion pipelines that tie them together.

pub mod animation;
pub mod catalog;
pub mod gateway;
pub mod media;
pub mod pipeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

mod logging;
pub use logging::init_logging;
