//! Media Module
//!
//! Data model for media bin entries, local preview handles, and the
//! metadata prober.

mod models;
mod preview;
pub mod probe;

pub use models::{
    MediaBinItem, MediaKind, TextAlignment, TextProperties, TransitionLinks, UploadState,
};
pub use preview::{LocalPreview, MediaBlob};
pub use probe::{FfprobeProber, MetadataProber, ProbedMetadata};
