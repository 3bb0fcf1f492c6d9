//! Catalog Store
//!
//! The ordered in-memory collection of media bin entries and the mutation
//! API the ingestion pipeline drives. All mutations are applied atomically
//! with respect to reads: `list()` never observes a half-applied patch.
//!
//! `patch` on a non-existent id is a silent no-op. Progress callbacks may
//! arrive after a rollback has already removed the entry, and the existence
//! check here is what makes that race safe without cancellation plumbing.

use std::sync::{Mutex, RwLock};

use tokio::sync::mpsc;
use tracing::debug;

use crate::media::{MediaBinItem, TextProperties, TransitionLinks};
use crate::ItemId;

// =============================================================================
// Catalog Events
// =============================================================================

/// Events emitted by the catalog for the UI/timeline collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogEvent {
    /// An entry was destroyed; the timeline must purge dependent placements.
    Removed { id: ItemId },
}

// =============================================================================
// Item Patch
// =============================================================================

/// Partial update applied to one catalog entry.
///
/// Nullable entry fields use `Option<Option<..>>` so a patch can distinguish
/// "leave the field alone" (`None`) from "set the field to null"
/// (`Some(None)`).
#[derive(Clone, Debug, Default)]
pub struct ItemPatch {
    /// Upload progress percentage
    pub progress_percent: Option<Option<u8>>,
    /// Whether the upload is still in flight
    pub is_uploading: Option<bool>,
    /// Resolved asset-store location
    pub remote_ref: Option<Option<String>>,
    /// AI analysis identifier
    pub analysis_ref: Option<Option<String>>,
    /// Timeline-owned transition references
    pub transitions: Option<TransitionLinks>,
    /// Text styling (text entries only)
    pub text: Option<TextProperties>,
}

impl ItemPatch {
    /// Patch carrying a new upload progress percentage
    pub fn progress(percent: u8) -> Self {
        Self {
            progress_percent: Some(Some(percent)),
            ..Default::default()
        }
    }

    /// Patch that finalizes a successful ingestion: both remote identifiers
    /// are set, the upload flag clears, and progress becomes null.
    pub fn uploaded(remote_ref: &str, analysis_ref: &str) -> Self {
        Self {
            progress_percent: Some(None),
            is_uploading: Some(false),
            remote_ref: Some(Some(remote_ref.to_string())),
            analysis_ref: Some(Some(analysis_ref.to_string())),
            ..Default::default()
        }
    }

    /// Patch replacing the timeline-owned transition references
    pub fn transitions(links: TransitionLinks) -> Self {
        Self {
            transitions: Some(links),
            ..Default::default()
        }
    }

    /// Patch replacing a text entry's styling
    pub fn text(text: TextProperties) -> Self {
        Self {
            text: Some(text),
            ..Default::default()
        }
    }

    fn apply(self, item: &mut MediaBinItem) {
        if let Some(percent) = self.progress_percent {
            item.upload.progress_percent = percent;
        }
        if let Some(is_uploading) = self.is_uploading {
            item.upload.is_uploading = is_uploading;
        }
        if let Some(remote_ref) = self.remote_ref {
            item.remote_ref = remote_ref;
        }
        if let Some(analysis_ref) = self.analysis_ref {
            item.analysis_ref = analysis_ref;
        }
        if let Some(transitions) = self.transitions {
            item.transitions = transitions;
        }
        if let Some(text) = self.text {
            if item.text.is_some() {
                item.display_name = text.content.clone();
                item.text = Some(text);
            }
        }
    }
}

// =============================================================================
// Catalog Store
// =============================================================================

/// Insertion-ordered store of media bin entries.
///
/// Concurrent ingestions each own their own entry id, so they never contend
/// on a single row; they serialize their mutations through this store's
/// single writer lock.
pub struct CatalogStore {
    items: RwLock<Vec<MediaBinItem>>,
    event_tx: mpsc::UnboundedSender<CatalogEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<CatalogEvent>>>,
}

impl CatalogStore {
    /// Creates an empty catalog
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            items: RwLock::new(Vec::new()),
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
        }
    }

    /// Takes the event receiver. Can only be called once; the UI/timeline
    /// collaborator subscribes through it to purge dependent placements.
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<CatalogEvent>> {
        self.event_rx.lock().ok()?.take()
    }

    /// Appends a new entry
    pub fn insert(&self, item: MediaBinItem) {
        debug!(item_id = %item.id, kind = ?item.kind, "Inserting catalog entry");
        self.items
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(item);
    }

    /// Applies a partial update to the entry with the given id.
    ///
    /// Returns `true` if the entry existed. A missing id is a no-op, never
    /// an error: the caller may be a progress callback racing a rollback.
    pub fn patch(&self, id: &str, patch: ItemPatch) -> bool {
        let mut items = self
            .items
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                patch.apply(item);
                true
            }
            None => {
                debug!(item_id = %id, "Dropping patch for missing catalog entry");
                false
            }
        }
    }

    /// Removes the entry with the given id and emits a `Removed` event.
    ///
    /// Returns the removed entry, or `None` if the id is unknown. Removal is
    /// immediate; there is no tombstone state.
    pub fn remove(&self, id: &str) -> Option<MediaBinItem> {
        let removed = {
            let mut items = self
                .items
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let index = items.iter().position(|item| item.id == id)?;
            Some(items.remove(index))
        };

        if removed.is_some() {
            debug!(item_id = %id, "Removed catalog entry");
            let _ = self.event_tx.send(CatalogEvent::Removed { id: id.to_string() });
        }
        removed
    }

    /// Returns a copy of the entry with the given id
    pub fn get(&self, id: &str) -> Option<MediaBinItem> {
        self.items
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// Returns a snapshot of all entries in insertion order
    pub fn list(&self) -> Vec<MediaBinItem> {
        self.items
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of entries in the catalog
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{LocalPreview, MediaKind, ProbedMetadata};
    use bytes::Bytes;

    fn video_item(name: &str) -> MediaBinItem {
        MediaBinItem::new_uploading(
            MediaKind::Video,
            name,
            LocalPreview::new(Bytes::from_static(b"bytes")),
            &ProbedMetadata {
                duration_sec: Some(10.0),
                width: 1920,
                height: 1080,
            },
        )
    }

    // ==========================================================================
    // Insertion Order Tests
    // ==========================================================================

    #[test]
    fn test_list_preserves_insertion_order() {
        let catalog = CatalogStore::new();
        let a = video_item("a.mp4");
        let b = video_item("b.mp4");
        let c = video_item("c.mp4");
        let ids = vec![a.id.clone(), b.id.clone(), c.id.clone()];

        catalog.insert(a);
        catalog.insert(b);
        catalog.insert(c);

        let listed: Vec<_> = catalog.list().into_iter().map(|i| i.id).collect();
        assert_eq!(listed, ids);
    }

    // ==========================================================================
    // Patch Tests
    // ==========================================================================

    #[test]
    fn test_patch_progress() {
        let catalog = CatalogStore::new();
        let item = video_item("a.mp4");
        let id = item.id.clone();
        catalog.insert(item);

        assert!(catalog.patch(&id, ItemPatch::progress(42)));

        let entry = catalog.get(&id).unwrap();
        assert_eq!(entry.upload.progress_percent, Some(42));
        assert!(entry.upload.is_uploading);
    }

    #[test]
    fn test_patch_uploaded_is_the_sole_success_terminal_state() {
        let catalog = CatalogStore::new();
        let item = video_item("a.mp4");
        let id = item.id.clone();
        catalog.insert(item);

        catalog.patch(&id, ItemPatch::uploaded("http://store/media/a.mp4", "gemini-1"));

        let entry = catalog.get(&id).unwrap();
        assert!(!entry.upload.is_uploading);
        assert_eq!(entry.upload.progress_percent, None);
        assert_eq!(entry.remote_ref.as_deref(), Some("http://store/media/a.mp4"));
        assert_eq!(entry.analysis_ref.as_deref(), Some("gemini-1"));
        assert!(entry.is_fully_ready());
    }

    #[test]
    fn test_patch_missing_id_is_a_no_op() {
        let catalog = CatalogStore::new();
        catalog.insert(video_item("a.mp4"));

        // A late progress callback racing a rollback must not error or mutate.
        assert!(!catalog.patch("01JUNKID", ItemPatch::progress(90)));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_patch_after_remove_is_a_no_op() {
        let catalog = CatalogStore::new();
        let item = video_item("a.mp4");
        let id = item.id.clone();
        catalog.insert(item);
        catalog.remove(&id);

        assert!(!catalog.patch(&id, ItemPatch::progress(90)));
        assert!(catalog.get(&id).is_none());
    }

    #[test]
    fn test_patch_text_ignored_for_non_text_entries() {
        let catalog = CatalogStore::new();
        let item = video_item("a.mp4");
        let id = item.id.clone();
        catalog.insert(item);

        catalog.patch(&id, ItemPatch::text(TextProperties::default()));
        assert!(catalog.get(&id).unwrap().text.is_none());
    }

    #[test]
    fn test_patch_updates_text_and_display_name() {
        let catalog = CatalogStore::new();
        let item = MediaBinItem::new_text(TextProperties {
            content: "Before".to_string(),
            ..Default::default()
        });
        let id = item.id.clone();
        catalog.insert(item);

        catalog.patch(
            &id,
            ItemPatch::text(TextProperties {
                content: "After".to_string(),
                ..Default::default()
            }),
        );

        let entry = catalog.get(&id).unwrap();
        assert_eq!(entry.display_name, "After");
        assert_eq!(entry.text.unwrap().content, "After");
    }

    // ==========================================================================
    // Removal / Event Tests
    // ==========================================================================

    #[test]
    fn test_remove_emits_event() {
        let catalog = CatalogStore::new();
        let mut events = catalog.take_event_receiver().unwrap();

        let item = video_item("a.mp4");
        let id = item.id.clone();
        catalog.insert(item);
        catalog.remove(&id);

        assert_eq!(events.try_recv().unwrap(), CatalogEvent::Removed { id });
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_remove_missing_id_emits_nothing() {
        let catalog = CatalogStore::new();
        let mut events = catalog.take_event_receiver().unwrap();

        assert!(catalog.remove("01JUNKID").is_none());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_event_receiver_can_only_be_taken_once() {
        let catalog = CatalogStore::new();
        assert!(catalog.take_event_receiver().is_some());
        assert!(catalog.take_event_receiver().is_none());
    }
}
