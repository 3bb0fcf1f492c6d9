//! HTTP Asset Gateway
//!
//! reqwest-backed implementation of the gateway contract against the asset
//! store's REST surface:
//!
//! - `POST /upload` (multipart) → `{ url, ... }`
//! - `POST /upload-to-gemini` (multipart) → `{ success, gemini_file_id, error_message? }`
//! - `POST /clone-media` (json) → `{ success, filename, url }`
//! - `DELETE /media/:filename` → `{ success, message?, error? }`

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AnalysisHandle, AssetGateway, ClonedAsset, GatewayConfig, ProgressFn, StoredAsset,
};
use crate::media::MediaBlob;
use crate::{AnalysisFailure, MediaError, MediaResult};

/// Default request timeout; uploads of large files can be slow.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Upload body chunk size (64 KiB)
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GeminiUploadResponse {
    success: bool,
    #[serde(default)]
    gemini_file_id: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct CloneRequest<'a> {
    filename: &'a str,
    #[serde(rename = "originalName")]
    original_name: &'a str,
    suffix: &'a str,
}

#[derive(Debug, Deserialize)]
struct CloneResponse {
    success: bool,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// =============================================================================
// HTTP Gateway
// =============================================================================

/// Asset gateway over HTTP.
pub struct HttpAssetGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAssetGateway {
    /// Creates a new gateway from configuration
    pub fn new(config: GatewayConfig) -> MediaResult<Self> {
        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MediaError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Builds a streaming request body that reports whole-percent progress
    /// as the transport consumes each chunk.
    fn progress_body(bytes: Bytes, on_progress: ProgressFn) -> reqwest::Body {
        reqwest::Body::wrap_stream(futures::stream::iter(progress_chunks(bytes, on_progress)))
    }

    /// Builds the multipart form for an upload endpoint
    fn upload_form(blob: &MediaBlob, on_progress: ProgressFn) -> MediaResult<multipart::Form> {
        let part = multipart::Part::stream_with_length(
            Self::progress_body(blob.bytes.clone(), on_progress),
            blob.bytes.len() as u64,
        )
        .file_name(blob.file_name.clone())
        .mime_str(&blob.content_type)
        .map_err(|e| MediaError::Upload(format!("Invalid content type: {}", e)))?;

        Ok(multipart::Form::new().part("file", part))
    }

    /// Builds the URL for an asset addressed by its stored name
    fn media_url(&self, stored_name: &str) -> MediaResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| MediaError::Internal(format!("Invalid gateway base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| MediaError::Internal("Gateway base URL cannot carry paths".to_string()))?
            .push("media")
            .push(stored_name);
        Ok(url)
    }
}

/// Splits the upload into chunks, reporting progress lazily as each chunk is
/// handed to the transport.
fn progress_chunks(
    bytes: Bytes,
    on_progress: ProgressFn,
) -> impl Iterator<Item = Result<Bytes, std::io::Error>> {
    let total = bytes.len();
    let mut sent = 0usize;

    (0..total.max(1))
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(move |start| {
            let end = (start + UPLOAD_CHUNK_SIZE).min(total);
            bytes.slice(start..end)
        })
        .map(move |chunk| {
            sent += chunk.len();
            on_progress(upload_percent(sent, total));
            Ok(chunk)
        })
}

/// Whole-percent progress for `sent` of `total` bytes
fn upload_percent(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent as u64 * 100) / total as u64).min(100) as u8
}

/// Classifies a transport-level analysis failure
fn classify_transport(err: &reqwest::Error) -> AnalysisFailure {
    if err.is_connect() {
        AnalysisFailure::ConnectionRefused
    } else {
        AnalysisFailure::Network
    }
}

/// Classifies an analysis failure from an HTTP status code
fn classify_status(status: StatusCode) -> AnalysisFailure {
    if status == StatusCode::NOT_FOUND {
        AnalysisFailure::EndpointNotFound
    } else if status.is_server_error() {
        AnalysisFailure::ServerInternal
    } else {
        AnalysisFailure::Network
    }
}

#[async_trait]
impl AssetGateway for HttpAssetGateway {
    async fn store(&self, blob: &MediaBlob, on_progress: ProgressFn) -> MediaResult<StoredAsset> {
        let size_bytes = blob.bytes.len() as u64;
        debug!(file_name = %blob.file_name, size_bytes, "Uploading asset");

        let form = Self::upload_form(blob, on_progress)?;
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upload(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Upload(format!("HTTP {}: {}", status, body)));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Upload(format!("Malformed upload response: {}", e)))?;

        Ok(StoredAsset {
            remote_ref: parsed.url,
            size_bytes: parsed.size.unwrap_or(size_bytes),
        })
    }

    async fn analyze(&self, blob: &MediaBlob) -> MediaResult<AnalysisHandle> {
        debug!(file_name = %blob.file_name, "Uploading asset for AI analysis");

        let form = Self::upload_form(blob, super::no_progress())?;
        let response = self
            .client
            .post(format!("{}/upload-to-gemini", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Analysis {
                class: classify_transport(&e),
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Analysis {
                class: classify_status(status),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: GeminiUploadResponse =
            response.json().await.map_err(|e| MediaError::Analysis {
                class: AnalysisFailure::Network,
                message: format!("Malformed analysis response: {}", e),
            })?;

        match (parsed.success, parsed.gemini_file_id) {
            (true, Some(analysis_ref)) => Ok(AnalysisHandle { analysis_ref }),
            _ => Err(MediaError::Analysis {
                class: AnalysisFailure::ServerInternal,
                message: parsed
                    .error_message
                    .unwrap_or_else(|| "Analysis service reported failure".to_string()),
            }),
        }
    }

    async fn clone_asset(
        &self,
        stored_name: &str,
        display_name: &str,
        suffix: &str,
    ) -> MediaResult<ClonedAsset> {
        debug!(stored_name, display_name, suffix, "Cloning asset");

        let request = CloneRequest {
            filename: stored_name,
            original_name: display_name,
            suffix,
        };

        let response = self
            .client
            .post(format!("{}/clone-media", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| MediaError::CloneFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::CloneFailed(format!("HTTP {}: {}", status, body)));
        }

        let parsed: CloneResponse = response
            .json()
            .await
            .map_err(|e| MediaError::CloneFailed(format!("Malformed clone response: {}", e)))?;

        match (parsed.success, parsed.url, parsed.filename) {
            (true, Some(remote_ref), Some(stored_name)) => Ok(ClonedAsset {
                remote_ref,
                stored_name,
            }),
            _ => Err(MediaError::CloneFailed(
                parsed
                    .error
                    .unwrap_or_else(|| "Store reported clone failure".to_string()),
            )),
        }
    }

    async fn remove(&self, stored_name: &str) -> MediaResult<()> {
        debug!(stored_name, "Deleting asset");

        let url = self.media_url(stored_name)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| MediaError::DeleteFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::DeleteFailed(format!("HTTP {}: {}", status, body)));
        }

        let parsed: DeleteResponse = response
            .json()
            .await
            .map_err(|e| MediaError::DeleteFailed(format!("Malformed delete response: {}", e)))?;

        delete_outcome(parsed)
    }
}

/// Maps the store's delete response envelope onto the gateway result
fn delete_outcome(parsed: DeleteResponse) -> MediaResult<()> {
    if parsed.success {
        Ok(())
    } else {
        Err(MediaError::DeleteFailed(
            parsed
                .error
                .or(parsed.message)
                .unwrap_or_else(|| "Store reported delete failure".to_string()),
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    // -------------------------------------------------------------------------
    // Progress Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_upload_percent_math() {
        assert_eq!(upload_percent(0, 200), 0);
        assert_eq!(upload_percent(100, 200), 50);
        assert_eq!(upload_percent(200, 200), 100);
        assert_eq!(upload_percent(1, 3), 33);
        // Empty uploads complete immediately.
        assert_eq!(upload_percent(0, 0), 100);
    }

    #[test]
    fn test_progress_chunks_report_monotonic_percentages() {
        let bytes = Bytes::from(vec![0u8; UPLOAD_CHUNK_SIZE * 3 + 17]);
        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let on_progress: ProgressFn = Arc::new(move |pct| sink.lock().unwrap().push(pct));

        // Drain the chunks the way the transport would.
        let drained: usize = progress_chunks(bytes, on_progress)
            .map(|chunk| chunk.unwrap().len())
            .sum();

        assert_eq!(drained, UPLOAD_CHUNK_SIZE * 3 + 17);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100);
    }

    #[test]
    fn test_progress_chunks_lazy_until_drained() {
        let bytes = Bytes::from(vec![0u8; UPLOAD_CHUNK_SIZE * 2]);
        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let on_progress: ProgressFn = Arc::new(move |pct| sink.lock().unwrap().push(pct));

        let mut chunks = progress_chunks(bytes, on_progress);
        assert!(seen.lock().unwrap().is_empty());

        chunks.next().unwrap().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![50]);
    }

    // -------------------------------------------------------------------------
    // Classification Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            AnalysisFailure::EndpointNotFound
        );
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            AnalysisFailure::ServerInternal
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            AnalysisFailure::ServerInternal
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST),
            AnalysisFailure::Network
        );
    }

    // -------------------------------------------------------------------------
    // Wire Format Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_upload_response_parses_with_extra_fields() {
        let parsed: UploadResponse = serde_json::from_str(
            r#"{ "url": "http://host/media/a.mp4", "size": 1024, "mimetype": "video/mp4" }"#,
        )
        .unwrap();

        assert_eq!(parsed.url, "http://host/media/a.mp4");
        assert_eq!(parsed.size, Some(1024));
    }

    #[test]
    fn test_gemini_response_parses_failure_payload() {
        let parsed: GeminiUploadResponse = serde_json::from_str(
            r#"{ "success": false, "error_message": "quota exceeded" }"#,
        )
        .unwrap();

        assert!(!parsed.success);
        assert!(parsed.gemini_file_id.is_none());
        assert_eq!(parsed.error_message.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_delete_failure_envelope_maps_to_delete_failed() {
        let parsed: DeleteResponse =
            serde_json::from_str(r#"{ "success": false, "error": "not found" }"#).unwrap();

        let err = delete_outcome(parsed).unwrap_err();
        assert!(matches!(err, MediaError::DeleteFailed(_)));
        assert_eq!(err.to_string(), "Failed to delete media on the server: not found");
    }

    #[test]
    fn test_delete_success_envelope_maps_to_ok() {
        let parsed: DeleteResponse =
            serde_json::from_str(r#"{ "success": true, "message": "deleted" }"#).unwrap();

        assert!(delete_outcome(parsed).is_ok());
    }

    #[test]
    fn test_clone_request_serializes_with_wire_names() {
        let json = serde_json::to_value(CloneRequest {
            filename: "abc.mp4",
            original_name: "clip.mp4",
            suffix: "(Audio)",
        })
        .unwrap();

        assert_eq!(json["filename"], "abc.mp4");
        assert_eq!(json["originalName"], "clip.mp4");
        assert_eq!(json["suffix"], "(Audio)");
    }

    #[test]
    fn test_media_url_encodes_stored_names() {
        let gateway =
            HttpAssetGateway::new(GatewayConfig::new("http://localhost:3000")).unwrap();
        let url = gateway.media_url("clip (Audio).mp4").unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:3000/media/clip%20(Audio).mp4"
        );
    }
}
