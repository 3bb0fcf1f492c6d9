//! Ingestion Pipeline
//!
//! Orchestrates the prober, gateway, and catalog to bring one imported file
//! from "selected" to "ready". The catalog entry is inserted optimistically
//! before the upload starts; any later stage failure removes it again
//! (compensating action) before the error is surfaced, so the UI never shows
//! a dangling "uploading" item after a failure is reported.
//!
//! There are no retries and no cancellation here: an in-flight ingestion
//! ends only by completing or failing. Retrying is a caller-level decision.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::{CatalogEvent, CatalogStore, ItemPatch};
use crate::gateway::{stored_name_from_ref, AssetGateway, ProgressFn};
use crate::media::{
    LocalPreview, MediaBinItem, MediaBlob, MediaKind, MetadataProber, TextProperties,
};
use crate::{ItemId, MediaError, MediaResult};

/// Display-name suffix for audio tracks split out of a video
const SPLIT_AUDIO_SUFFIX: &str = "(Audio)";

// =============================================================================
// Media Bin Controller
// =============================================================================

/// The client-side controller of the media bin.
///
/// Exposes the narrow surface the UI/timeline collaborator consumes:
/// importing media, inserting text entries, splitting audio out of uploaded
/// videos, deleting entries, and reading the catalog.
pub struct MediaBinController {
    catalog: Arc<CatalogStore>,
    gateway: Arc<dyn AssetGateway>,
    prober: Arc<dyn MetadataProber>,
}

impl MediaBinController {
    /// Creates a controller with an empty catalog
    pub fn new(gateway: Arc<dyn AssetGateway>, prober: Arc<dyn MetadataProber>) -> Self {
        Self {
            catalog: Arc::new(CatalogStore::new()),
            gateway,
            prober,
        }
    }

    /// Shared handle to the catalog, for rendering reads
    pub fn catalog(&self) -> Arc<CatalogStore> {
        Arc::clone(&self.catalog)
    }

    /// Snapshot of all entries in insertion order
    pub fn items(&self) -> Vec<MediaBinItem> {
        self.catalog.list()
    }

    /// Takes the destruction-event receiver (once); the timeline collaborator
    /// uses it to purge placements referencing removed entries.
    pub fn take_event_receiver(&self) -> Option<tokio::sync::mpsc::UnboundedReceiver<CatalogEvent>> {
        self.catalog.take_event_receiver()
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Ingests one user-selected file: probe metadata, insert an optimistic
    /// catalog entry, upload with progress, upload for AI analysis, finalize.
    ///
    /// On any failure after the optimistic insert, the entry is removed
    /// before the classified error is returned. Each invocation owns its own
    /// entry id, so concurrent ingestions never contend on a single row.
    pub async fn add_media(&self, blob: MediaBlob) -> MediaResult<ItemId> {
        let kind = MediaKind::from_content_type(&blob.content_type)
            .ok_or_else(|| MediaError::UnsupportedKind(blob.content_type.clone()))?;

        // One handle serves both probing and the catalog entry, so the file
        // is held in memory exactly once.
        let preview = LocalPreview::from(&blob);

        // Metadata failures never create a catalog entry.
        let metadata = self.prober.probe(preview.bytes(), kind).await?;

        let item = MediaBinItem::new_uploading(kind, &blob.file_name, preview, &metadata);
        let id = item.id.clone();
        debug!(item_id = %id, file_name = %blob.file_name, ?kind, "Starting ingestion");
        self.catalog.insert(item);

        let progress_catalog = Arc::clone(&self.catalog);
        let progress_id = id.clone();
        let on_progress: ProgressFn = Arc::new(move |percent| {
            // A late callback after rollback hits the catalog's no-op path.
            progress_catalog.patch(&progress_id, ItemPatch::progress(percent));
        });

        let stored = match self.gateway.store(&blob, on_progress).await {
            Ok(stored) => stored,
            Err(err) => return Err(self.rollback(&id, err)),
        };

        // Analysis uses the original bytes, not the stored copy, so it does
        // not depend on the store's round trip.
        let analysis = match self.gateway.analyze(&blob).await {
            Ok(analysis) => analysis,
            Err(err) => return Err(self.rollback(&id, err)),
        };

        self.catalog
            .patch(&id, ItemPatch::uploaded(&stored.remote_ref, &analysis.analysis_ref));

        info!(
            item_id = %id,
            remote_ref = %stored.remote_ref,
            analysis_ref = %analysis.analysis_ref,
            size_bytes = stored.size_bytes,
            "Ingestion complete"
        );
        Ok(id)
    }

    /// Removes the optimistic entry and passes the stage error through.
    /// Dropping the entry releases its preview handle.
    fn rollback(&self, id: &str, err: MediaError) -> MediaError {
        warn!(item_id = %id, error = %err, "Ingestion failed, rolling back optimistic entry");
        self.catalog.remove(id);
        err
    }

    // =========================================================================
    // Text Entries
    // =========================================================================

    /// Inserts a text entry. Text never uploads and never fails.
    pub fn add_text(&self, text: TextProperties) -> ItemId {
        let item = MediaBinItem::new_text(text);
        let id = item.id.clone();
        self.catalog.insert(item);
        id
    }

    // =========================================================================
    // Derived Assets
    // =========================================================================

    /// Splits the audio track out of an uploaded video by asking the store
    /// to clone the underlying file, then registers a new audio entry that
    /// points at the clone.
    ///
    /// The derived entry shares the source's preview handle and duration; it
    /// is not sent for analysis. On gateway failure no entry is created and
    /// the source entry is untouched.
    pub async fn split_audio(&self, id: &str) -> MediaResult<ItemId> {
        let source = self
            .catalog
            .get(id)
            .ok_or_else(|| MediaError::ItemNotFound(id.to_string()))?;

        if source.kind != MediaKind::Video {
            return Err(MediaError::Validation(format!(
                "Only video entries can be split, not {:?}",
                source.kind
            )));
        }

        let remote_ref = source
            .remote_ref
            .as_deref()
            .ok_or_else(|| MediaError::MissingRemoteRef(id.to_string()))?;
        let stored_name = stored_name_from_ref(remote_ref)?;

        let cloned = self
            .gateway
            .clone_asset(&stored_name, &source.display_name, SPLIT_AUDIO_SUFFIX)
            .await?;

        let item = MediaBinItem::new_derived_audio(
            &format!("{} {}", source.display_name, SPLIT_AUDIO_SUFFIX),
            source.local_preview.clone(),
            source.duration_sec,
            &cloned.remote_ref,
        );
        let new_id = item.id.clone();

        info!(
            source_id = %id,
            item_id = %new_id,
            remote_ref = %cloned.remote_ref,
            "Split audio from video"
        );
        self.catalog.insert(item);
        Ok(new_id)
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Deletes an entry, remote copy first.
    ///
    /// Text and element entries (and anything that never uploaded) are
    /// removed locally with no remote call. For uploaded entries the remote
    /// deletion happens before the catalog removal: deletion is not
    /// optimistic, because removing a still-referenced asset prematurely is
    /// worse than a stale UI state. On gateway failure the entry is left
    /// intact and the failure is reported.
    pub async fn delete_media(&self, id: &str) -> MediaResult<()> {
        let entry = self
            .catalog
            .get(id)
            .ok_or_else(|| MediaError::ItemNotFound(id.to_string()))?;

        if let Some(remote_ref) = entry.remote_ref.as_deref() {
            let stored_name = stored_name_from_ref(remote_ref)?;
            self.gateway.remove(&stored_name).await?;
        }

        self.catalog.remove(id);
        info!(item_id = %id, kind = ?entry.kind, "Deleted media bin entry");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
