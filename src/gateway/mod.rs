//! Remote Asset Gateway
//!
//! Contract for the remote services the pipeline depends on: storing
//! a new asset, uploading the same bytes for AI analysis, cloning an
//! existing asset under a new name, and deleting an asset by stored name.
//!
//! The gateway performs no retries; a failure must never leave the remote
//! store believing the operation partially succeeded. Retry policy, if any,
//! belongs to the transport layer behind the endpoints.

mod http;

pub use http::HttpAssetGateway;

use std::sync::Arc;

use async_trait::async_trait;

use crate::media::MediaBlob;
use crate::MediaResult;

// =============================================================================
// Progress Callback
// =============================================================================

/// Callback invoked with whole-percent (0-100) upload progress as the
/// transport consumes the body. Percentages are forwarded as computed, with
/// no smoothing, and are non-decreasing within one upload.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Progress callback that drops all updates
pub fn no_progress() -> ProgressFn {
    Arc::new(|_| {})
}

// =============================================================================
// Gateway Results
// =============================================================================

/// Result of storing a new asset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAsset {
    /// Resolved location of the asset in the store
    pub remote_ref: String,
    /// Size the store accounted for, in bytes
    pub size_bytes: u64,
}

/// Result of uploading an asset for AI analysis
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisHandle {
    /// Identifier assigned by the analysis service
    pub analysis_ref: String,
}

/// Result of cloning an existing asset server-side
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClonedAsset {
    /// Resolved location of the clone
    pub remote_ref: String,
    /// Stored name assigned to the clone
    pub stored_name: String,
}

// =============================================================================
// Gateway Configuration
// =============================================================================

/// Configuration for the HTTP gateway
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL of the asset store (e.g. "http://localhost:3000")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl GatewayConfig {
    /// Creates a config for the given base URL with default timeouts
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: None,
        }
    }
}

// =============================================================================
// Asset Gateway Trait
// =============================================================================

/// The remote operations the ingestion pipeline depends on.
#[async_trait]
pub trait AssetGateway: Send + Sync {
    /// Stores a new asset, reporting upload progress through `on_progress`.
    async fn store(&self, blob: &MediaBlob, on_progress: ProgressFn) -> MediaResult<StoredAsset>;

    /// Uploads the original bytes to the AI analysis service.
    async fn analyze(&self, blob: &MediaBlob) -> MediaResult<AnalysisHandle>;

    /// Asks the store to duplicate an existing asset under a new name
    /// derived from `display_name` and `suffix`.
    async fn clone_asset(
        &self,
        stored_name: &str,
        display_name: &str,
        suffix: &str,
    ) -> MediaResult<ClonedAsset>;

    /// Deletes an asset by its stored name.
    async fn remove(&self, stored_name: &str) -> MediaResult<()>;
}

// =============================================================================
// Remote Ref Helpers
// =============================================================================

/// Extracts the store-assigned name from a remote ref URL.
///
/// The store addresses assets by the last path segment of the URL it
/// returned at upload time (e.g. "http://host/media/abc.mp4" → "abc.mp4").
pub fn stored_name_from_ref(remote_ref: &str) -> MediaResult<String> {
    // A ref ending in '/' has no final segment; resolving it to the parent
    // segment would address a remote call at the wrong name.
    let name = remote_ref
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            // Drop any query string the store may have appended.
            segment.split('?').next().unwrap_or(segment)
        })
        .filter(|segment| !segment.is_empty());

    match name {
        Some(name) => Ok(name.to_string()),
        None => Err(crate::MediaError::Internal(format!(
            "Remote ref has no addressable name: {}",
            remote_ref
        ))),
    }
}
