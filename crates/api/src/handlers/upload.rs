//! Multipart upload parsing shared by the analysis handlers.

use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use poslyzer_core::AnalysisMode;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult};

pub const ALLOWED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

pub const FIELD_VIDEO: &str = "video";
pub const FIELD_FRAME: &str = "frame";
pub const FIELD_MODE: &str = "mode";

/// A single image upload.
pub struct FrameUpload {
    pub bytes: Bytes,
    pub mode: Option<String>,
}

/// A video upload spooled to a temporary file. The file is removed when the
/// upload is dropped.
pub struct VideoUpload {
    pub file: NamedTempFile,
    pub size: u64,
    pub mode: Option<String>,
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

/// Lowercased extension of `filename` if it is an accepted video type.
pub fn video_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_VIDEO_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Resolve the `mode` form field. Absent means squat; anything present must
/// name a known mode.
pub fn parse_mode(mode: Option<&str>) -> AppResult<AnalysisMode> {
    match mode {
        None => Ok(AnalysisMode::default()),
        Some(raw) => Ok(raw.parse()?),
    }
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(multipart_error)
}

/// Read a `frame` image and optional `mode` field.
pub async fn read_frame_upload(multipart: &mut Multipart) -> AppResult<FrameUpload> {
    let mut bytes = None;
    let mut mode = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FIELD_FRAME) => {
                bytes = Some(field.bytes().await.map_err(multipart_error)?);
            }
            Some(FIELD_MODE) => mode = Some(read_text(field).await?),
            _ => {}
        }
    }

    let bytes =
        bytes.ok_or_else(|| AppError::BadRequest(format!("No {FIELD_FRAME} file provided")))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }
    Ok(FrameUpload { bytes, mode })
}

/// Read a `video` file, spooling it to disk chunk by chunk, and an optional
/// `mode` field.
pub async fn read_video_upload(multipart: &mut Multipart) -> AppResult<VideoUpload> {
    let mut video = None;
    let mut mode = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FIELD_VIDEO) => video = Some(spool_video(field).await?),
            Some(FIELD_MODE) => mode = Some(read_text(field).await?),
            _ => {}
        }
    }

    let (file, size) =
        video.ok_or_else(|| AppError::BadRequest(format!("No {FIELD_VIDEO} file provided")))?;
    if size == 0 {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }
    Ok(VideoUpload { file, size, mode })
}

async fn spool_video(mut field: Field<'_>) -> AppResult<(NamedTempFile, u64)> {
    let filename = field.file_name().unwrap_or_default().to_string();
    if filename.is_empty() {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }
    let ext = video_extension(&filename).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_VIDEO_EXTENSIONS.join(", ")
        ))
    })?;

    let temp = tempfile::Builder::new()
        .prefix("poslyzer-")
        .suffix(&format!(".{ext}"))
        .tempfile()
        .map_err(|e| AppError::InternalError(format!("Failed to create temp file: {e}")))?;
    let handle = temp
        .reopen()
        .map_err(|e| AppError::InternalError(format!("Failed to open temp file: {e}")))?;
    let mut out = tokio::fs::File::from_std(handle);

    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        out.write_all(&chunk)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;
    }
    out.flush()
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;

    tracing::debug!(%filename, size, path = %temp.path().display(), "Video upload spooled");
    Ok((temp, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use poslyzer_core::CoreError;

    #[test]
    fn accepts_known_video_extensions() {
        assert_eq!(video_extension("clip.MP4").as_deref(), Some("mp4"));
        assert_eq!(video_extension("a.b.webm").as_deref(), Some("webm"));
        assert!(video_extension("clip.gif").is_none());
        assert!(video_extension("noext").is_none());
    }

    #[test]
    fn mode_defaults_to_squat() {
        assert_eq!(parse_mode(None).unwrap(), AnalysisMode::Squat);
        assert_eq!(parse_mode(Some("sitting")).unwrap(), AnalysisMode::Sitting);
        assert_matches!(
            parse_mode(Some("jumping")),
            Err(AppError::Core(CoreError::UnsupportedMode(_)))
        );
        assert_matches!(
            parse_mode(Some("")),
            Err(AppError::Core(CoreError::UnsupportedMode(_)))
        );
    }
}
