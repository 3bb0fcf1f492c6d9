//! Media Bin Item Model Definitions
//!
//! Defines the catalog entry struct and related types. All serialized types
//! use camelCase so the browser UI can consume them directly.

use serde::{Deserialize, Serialize};

use crate::media::probe::ProbedMetadata;
use crate::media::LocalPreview;
use crate::{ItemId, TimeSec};

// =============================================================================
// Media Kind
// =============================================================================

/// Media bin entry kind.
///
/// Text and element entries are created locally and never enter the upload
/// pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Video,
    Image,
    Audio,
    Text,
    Element,
}

impl MediaKind {
    /// Maps a declared MIME content type onto a kind.
    ///
    /// Returns `None` for anything the upload pipeline does not support.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let major = content_type.split('/').next().unwrap_or_default();
        match major {
            "video" => Some(MediaKind::Video),
            "image" => Some(MediaKind::Image),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }

    /// Whether entries of this kind go through the upload pipeline
    pub fn is_uploadable(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Image | MediaKind::Audio)
    }
}

// =============================================================================
// Upload State
// =============================================================================

/// Upload progress state of a catalog entry.
///
/// `progress_percent` is meaningful only while `is_uploading` is true; it is
/// `None` once the upload finishes and for kinds that never upload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadState {
    /// Whether the primary upload is in flight
    pub is_uploading: bool,
    /// Upload progress, 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,
}

impl UploadState {
    /// State for an entry that is not uploading (text, finished, derived)
    pub fn idle() -> Self {
        Self {
            is_uploading: false,
            progress_percent: None,
        }
    }

    /// State for a freshly inserted optimistic entry
    pub fn started() -> Self {
        Self {
            is_uploading: true,
            progress_percent: Some(0),
        }
    }
}

// =============================================================================
// Text Properties
// =============================================================================

/// Text alignment options for horizontal text positioning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Styling of a text entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProperties {
    /// The literal text content
    pub content: String,
    /// Font size in points
    pub font_size: u32,
    /// Font family name (system font)
    pub font_family: String,
    /// Text color in hex format (#RRGGBB or #RRGGBBAA)
    pub color: String,
    /// Horizontal alignment
    #[serde(default)]
    pub alignment: TextAlignment,
    /// CSS-style numeric font weight (400 normal, 700 bold)
    pub font_weight: u32,
}

impl Default for TextProperties {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 48,
            font_family: "Arial".to_string(),
            color: "#FFFFFF".to_string(),
            alignment: TextAlignment::Center,
            font_weight: 400,
        }
    }
}

// =============================================================================
// Transition Links
// =============================================================================

/// References to transition entities applied when this item sits adjacent to
/// another on a timeline. Owned by the timeline collaborator; the catalog
/// merely stores them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

// =============================================================================
// Media Bin Item
// =============================================================================

/// One media bin entry tracked by the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBinItem {
    /// Unique identifier (ULID), stable for the entry's lifetime
    pub id: ItemId,
    /// Entry kind
    pub kind: MediaKind,
    /// Human-readable label; the literal content for text entries
    pub display_name: String,
    /// In-process preview handle; session-scoped, never serialized
    #[serde(skip)]
    pub local_preview: Option<LocalPreview>,
    /// Resolved asset-store location; set only after a successful upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<String>,
    /// AI analysis service identifier; set only after a successful analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_ref: Option<String>,
    /// Pixel width; 0 for kinds without visual dimensions
    pub width: u32,
    /// Pixel height; 0 for kinds without visual dimensions
    pub height: u32,
    /// Duration in seconds; 0.0 when unknown or not applicable
    pub duration_sec: TimeSec,
    /// Upload progress state
    pub upload: UploadState,
    /// Text styling; present only for text entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextProperties>,
    /// Timeline-owned transition references
    #[serde(default)]
    pub transitions: TransitionLinks,
    /// Import timestamp (ISO 8601)
    pub imported_at: String,
}

impl MediaBinItem {
    /// Creates the optimistic entry the ingestion pipeline inserts before the
    /// upload starts. Metadata comes from the prober; remote identifiers stay
    /// unset until the pipeline finalizes the entry.
    pub fn new_uploading(
        kind: MediaKind,
        display_name: &str,
        preview: LocalPreview,
        metadata: &ProbedMetadata,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            kind,
            display_name: display_name.to_string(),
            local_preview: Some(preview),
            remote_ref: None,
            analysis_ref: None,
            width: metadata.width,
            height: metadata.height,
            duration_sec: metadata.duration_sec.unwrap_or(0.0),
            upload: UploadState::started(),
            text: None,
            transitions: TransitionLinks::default(),
            imported_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates a text entry. Text entries never upload, never analyze, and
    /// carry no preview handle; the display name is the literal content.
    pub fn new_text(text: TextProperties) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            kind: MediaKind::Text,
            display_name: text.content.clone(),
            local_preview: None,
            remote_ref: None,
            analysis_ref: None,
            width: 0,
            height: 0,
            duration_sec: 0.0,
            upload: UploadState::idle(),
            text: Some(text),
            transitions: TransitionLinks::default(),
            imported_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates an element entry (sticker, shape). Like text, elements are
    /// local-only: they never upload and never analyze.
    pub fn new_element(display_name: &str) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            kind: MediaKind::Element,
            display_name: display_name.to_string(),
            local_preview: None,
            remote_ref: None,
            analysis_ref: None,
            width: 0,
            height: 0,
            duration_sec: 0.0,
            upload: UploadState::idle(),
            text: None,
            transitions: TransitionLinks::default(),
            imported_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates the derived audio entry produced by the split operation.
    ///
    /// The entry points at the server-side clone and shares the source
    /// video's preview handle; it is never analyzed in this path.
    pub fn new_derived_audio(
        display_name: &str,
        preview: Option<LocalPreview>,
        duration_sec: TimeSec,
        remote_ref: &str,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            kind: MediaKind::Audio,
            display_name: display_name.to_string(),
            local_preview: preview,
            remote_ref: Some(remote_ref.to_string()),
            analysis_ref: None,
            width: 0,
            height: 0,
            duration_sec,
            upload: UploadState::idle(),
            text: None,
            transitions: TransitionLinks::default(),
            imported_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether the entry has completed the full ingestion pipeline and is
    /// eligible for AI-driven composition use.
    pub fn is_fully_ready(&self) -> bool {
        !self.upload.is_uploading && self.remote_ref.is_some() && self.analysis_ref.is_some()
    }
}
