//! Metadata Prober
//!
//! Inspects a raw media blob and extracts playback metadata (duration,
//! spatial dimensions) without uploading it. The default implementation
//! shells out to FFprobe against a temp file; a decode failure surfaces as
//! `MediaError::Metadata`, never as silently-zeroed metadata.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::media::MediaKind;
use crate::{MediaError, MediaResult};

// =============================================================================
// Types
// =============================================================================

/// Metadata extracted from a media blob before upload.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbedMetadata {
    /// Duration in seconds; `None` when unknown or not applicable (images)
    pub duration_sec: Option<f64>,
    /// Pixel width; 0 for audio
    pub width: u32,
    /// Pixel height; 0 for audio
    pub height: u32,
}

/// Probes a raw blob for playback metadata.
#[async_trait]
pub trait MetadataProber: Send + Sync {
    /// Extracts metadata for a blob of the declared kind.
    ///
    /// - video: pixel dimensions; duration only when finite
    /// - image: pixel dimensions; duration always omitted
    /// - audio: duration; dimensions always 0
    async fn probe(&self, bytes: Bytes, kind: MediaKind) -> MediaResult<ProbedMetadata>;
}

// =============================================================================
// FFprobe JSON Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

// =============================================================================
// FFprobe Prober
// =============================================================================

/// Metadata prober backed by FFprobe.
///
/// The blob is written to a uniquely-named temp file for the duration of the
/// probe and removed afterwards on every path; the pipeline's retained
/// preview handle is separate, so nothing probe-local outlives the call.
pub struct FfprobeProber;

impl FfprobeProber {
    /// Runs FFprobe against a file and returns its raw JSON output
    async fn run_ffprobe(path: &PathBuf) -> MediaResult<String> {
        let output = tokio::process::Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| MediaError::Metadata(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Metadata(format!(
                "FFprobe could not decode the file: {}",
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Parses FFprobe JSON output according to the declared kind
    fn parse_output(json: &str, kind: MediaKind) -> MediaResult<ProbedMetadata> {
        let output: FFprobeOutput = serde_json::from_str(json)
            .map_err(|e| MediaError::Metadata(format!("Failed to parse ffprobe output: {}", e)))?;

        let duration_sec = output
            .format
            .as_ref()
            .and_then(|f| f.duration.as_ref())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0);

        let visual = output
            .streams
            .unwrap_or_default()
            .into_iter()
            .find(|s| s.codec_type == "video");

        match kind {
            MediaKind::Video => {
                let stream = visual.ok_or_else(|| {
                    MediaError::Metadata("File contains no decodable video stream".to_string())
                })?;
                let (width, height) = Self::dimensions(&stream)?;
                Ok(ProbedMetadata {
                    duration_sec,
                    width,
                    height,
                })
            }
            MediaKind::Image => {
                // Still images decode as a single video stream.
                let stream = visual.ok_or_else(|| {
                    MediaError::Metadata("File contains no decodable image data".to_string())
                })?;
                let (width, height) = Self::dimensions(&stream)?;
                Ok(ProbedMetadata {
                    duration_sec: None,
                    width,
                    height,
                })
            }
            MediaKind::Audio => {
                let duration_sec = duration_sec.ok_or_else(|| {
                    MediaError::Metadata("Audio duration could not be determined".to_string())
                })?;
                Ok(ProbedMetadata {
                    duration_sec: Some(duration_sec),
                    width: 0,
                    height: 0,
                })
            }
            MediaKind::Text | MediaKind::Element => Err(MediaError::Metadata(format!(
                "Kind {:?} has no probeable metadata",
                kind
            ))),
        }
    }

    fn dimensions(stream: &FFprobeStream) -> MediaResult<(u32, u32)> {
        match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(MediaError::Metadata(
                "Pixel dimensions could not be determined".to_string(),
            )),
        }
    }

    /// Check if FFprobe is available on the system
    pub fn is_available() -> bool {
        std::process::Command::new("ffprobe")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl MetadataProber for FfprobeProber {
    async fn probe(&self, bytes: Bytes, kind: MediaKind) -> MediaResult<ProbedMetadata> {
        let path = std::env::temp_dir().join(format!("clipbin-probe-{}", ulid::Ulid::new()));

        tokio::fs::write(&path, &bytes).await?;

        let result = Self::run_ffprobe(&path).await;

        // The temp file exists only for the probe; remove it on every path.
        let _ = tokio::fs::remove_file(&path).await;

        Self::parse_output(&result?, kind)
    }
}

// =============================================================================
// Tests
// =============================================================================
