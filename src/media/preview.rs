//! Local Preview Handles
//!
//! An imported file lives in process memory for the duration of the tab
//! session so the UI can play it back instantly, before (and independent of)
//! any upload. `LocalPreview` is the ownership-scoped handle to those bytes:
//! clones share one allocation, and the allocation is released when the last
//! handle is dropped. Previews are never persisted or serialized.

use std::sync::Arc;

use bytes::Bytes;

// =============================================================================
// Media Blob
// =============================================================================

/// A raw media file as selected by the user, before any processing.
#[derive(Clone, Debug)]
pub struct MediaBlob {
    /// Original file name (e.g. "clip.mp4")
    pub file_name: String,
    /// Declared MIME content type (e.g. "video/mp4")
    pub content_type: String,
    /// Raw file bytes
    pub bytes: Bytes,
}

impl MediaBlob {
    /// Creates a new blob from raw bytes
    pub fn new(file_name: &str, content_type: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.into(),
        }
    }

    /// Size of the blob in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// =============================================================================
// Local Preview
// =============================================================================

/// Shared handle to the in-process bytes of an imported file.
///
/// The ingestion pipeline creates one handle per import and reuses it for
/// both probing and the catalog entry, so the file is held in memory exactly
/// once. The split operation clones the source video's handle for the
/// derived audio entry; audio playback piggybacks on the original bytes.
#[derive(Clone, Debug)]
pub struct LocalPreview {
    inner: Arc<Bytes>,
}

impl LocalPreview {
    /// Creates a new preview handle over the given bytes
    pub fn new(bytes: Bytes) -> Self {
        Self {
            inner: Arc::new(bytes),
        }
    }

    /// Returns a cheap reference-counted copy of the preview bytes
    pub fn bytes(&self) -> Bytes {
        self.inner.as_ref().clone()
    }

    /// Size of the previewed content in bytes
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the previewed content is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of live handles sharing this preview
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl PartialEq for LocalPreview {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl From<&MediaBlob> for LocalPreview {
    fn from(blob: &MediaBlob) -> Self {
        Self::new(blob.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_one_allocation() {
        let preview = LocalPreview::new(Bytes::from_static(b"frame data"));
        assert_eq!(preview.handle_count(), 1);

        let shared = preview.clone();
        assert_eq!(preview.handle_count(), 2);
        assert_eq!(shared.bytes(), preview.bytes());

        drop(shared);
        assert_eq!(preview.handle_count(), 1);
    }

    #[test]
    fn test_preview_from_blob() {
        let blob = MediaBlob::new("clip.mp4", "video/mp4", &b"abc"[..]);
        let preview = LocalPreview::from(&blob);

        assert_eq!(preview.len(), 3);
        assert!(!preview.is_empty());
    }
}
