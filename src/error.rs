//! Clipbin Error Definitions
//!
//! Defines error types used throughout the crate. Every variant renders a
//! display-ready message; the UI shows these strings verbatim.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ItemId;

// =============================================================================
// Analysis Failure Classes
// =============================================================================

/// Classification of a failed AI-analysis upload.
///
/// The ingestion pipeline rolls the optimistic entry back regardless of
/// class; the class only changes the message shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisFailure {
    /// The analysis service refused the connection (likely not running)
    ConnectionRefused,
    /// The analysis service responded with a 5xx status
    ServerInternal,
    /// The analysis endpoint does not exist (404)
    EndpointNotFound,
    /// Any other transport-level failure
    Network,
}

impl std::fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisFailure::ConnectionRefused => write!(f, "connection refused"),
            AnalysisFailure::ServerInternal => write!(f, "server error"),
            AnalysisFailure::EndpointNotFound => write!(f, "endpoint not found"),
            AnalysisFailure::Network => write!(f, "network error"),
        }
    }
}

// =============================================================================
// Media Error
// =============================================================================

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum MediaError {
    // =========================================================================
    // Ingestion Errors
    // =========================================================================
    #[error("Unsupported media type: {0}")]
    UnsupportedKind(String),

    #[error("Failed to read media metadata: {0}")]
    Metadata(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("AI analysis upload failed ({class}): {message}")]
    Analysis {
        class: AnalysisFailure,
        message: String,
    },

    // =========================================================================
    // Derived-Asset Errors
    // =========================================================================
    #[error("Failed to clone media on the server: {0}")]
    CloneFailed(String),

    #[error("Media item has not finished uploading: {0}")]
    MissingRemoteRef(ItemId),

    // =========================================================================
    // Deletion Errors
    // =========================================================================
    #[error("Failed to delete media on the server: {0}")]
    DeleteFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Media item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Crate-wide result type
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Returns the analysis failure class, if this is an analysis error
    pub fn analysis_class(&self) -> Option<AnalysisFailure> {
        match self {
            MediaError::Analysis { class, .. } => Some(*class),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_display_ready() {
        let err = MediaError::UnsupportedKind("application/pdf".to_string());
        assert_eq!(err.to_string(), "Unsupported media type: application/pdf");

        let err = MediaError::Analysis {
            class: AnalysisFailure::ServerInternal,
            message: "HTTP 500".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "AI analysis upload failed (server error): HTTP 500"
        );
    }

    #[test]
    fn test_analysis_class_accessor() {
        let err = MediaError::Analysis {
            class: AnalysisFailure::EndpointNotFound,
            message: "HTTP 404".to_string(),
        };
        assert_eq!(err.analysis_class(), Some(AnalysisFailure::EndpointNotFound));

        let err = MediaError::Upload("timeout".to_string());
        assert_eq!(err.analysis_class(), None);
    }

    #[test]
    fn test_analysis_failure_serialization() {
        let json = serde_json::to_string(&AnalysisFailure::ConnectionRefused).unwrap();
        assert_eq!(json, "\"connectionRefused\"");
    }
}
