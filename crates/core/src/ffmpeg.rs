//! FFprobe/FFmpeg video probing and frame decoding.
//!
//! Decoding is delegated to the `ffmpeg` binary, which writes raw RGB24
//! frames to stdout. Frames are read one at a time, so memory stays bounded
//! by the frames currently in flight regardless of video length.

use std::path::Path;
use std::process::Stdio;

use futures::stream::{self, Stream};
use image::RgbImage;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::error::CoreError;

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("truncated frame {index}: got {read} of {expected} bytes")]
    TruncatedFrame {
        index: u64,
        read: usize,
        expected: usize,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

impl From<FfmpegError> for CoreError {
    fn from(err: FfmpegError) -> Self {
        match err {
            FfmpegError::NotFound(_) | FfmpegError::IoError(_) => {
                CoreError::Internal(err.to_string())
            }
            _ => CoreError::InvalidInput(format!("unreadable video: {err}")),
        }
    }
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    pub format: Option<FfprobeFormat>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// e.g. "30/1" or "24000/1001"
    pub r_frame_rate: Option<String>,
    pub avg_frame_rate: Option<String>,
    pub duration: Option<String>,
    pub nb_frames: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

/// What the session aggregator needs to know about a video up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Native frame rate; 0 when the container does not report one.
    pub fps: f64,
    /// Frame count reported by the container (estimated when absent).
    pub frame_count: u64,
    pub duration_secs: f64,
}

impl VideoInfo {
    pub fn from_probe(probe: &FfprobeOutput) -> Result<Self, FfmpegError> {
        let stream = first_video_stream(probe)
            .ok_or_else(|| FfmpegError::ParseError("no video stream".to_string()))?;
        let (width, height) = (stream.width.unwrap_or(0), stream.height.unwrap_or(0));
        if width == 0 || height == 0 {
            return Err(FfmpegError::ParseError(format!(
                "invalid video resolution {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            fps: parse_framerate(probe),
            frame_count: parse_total_frames(probe),
            duration_secs: parse_duration(probe),
        })
    }
}

/// One decoded video frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// 0-based position in the source.
    pub index: u64,
    pub image: RgbImage,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Probe a video and reduce the output to [`VideoInfo`].
pub async fn video_info(path: &Path) -> Result<VideoInfo, FfmpegError> {
    let probe = probe_video(path).await?;
    VideoInfo::from_probe(&probe)
}

/// Decode every frame of `path` as `width`x`height` RGB images, in order.
///
/// The `ffmpeg` child is killed if the stream is dropped early. A non-zero
/// exit status is reported as the final stream item, carrying the tail of
/// ffmpeg's stderr.
pub fn decode_frames(
    path: &Path,
    width: u32,
    height: u32,
) -> Result<impl Stream<Item = Result<VideoFrame, FfmpegError>>, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let mut child = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
        .arg(path)
        .args([
            "-s",
            &format!("{width}x{height}"),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(FfmpegError::NotFound)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| FfmpegError::ParseError("ffmpeg stdout not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| FfmpegError::ParseError("ffmpeg stderr not captured".to_string()))?;

    let process = DecodeProcess {
        child,
        frames: RawFrameReader::new(stdout, width, height),
        stderr: tokio::spawn(stderr_tail(stderr, STDERR_TAIL_BYTES)),
    };

    Ok(stream::try_unfold(process, |mut process| async move {
        match process.frames.next_frame().await? {
            Some(frame) => Ok::<_, FfmpegError>(Some((frame, process))),
            None => {
                process.finish().await?;
                Ok(None)
            }
        }
    }))
}

/// Bytes of ffmpeg stderr kept for error reports.
const STDERR_TAIL_BYTES: usize = 4096;

/// A running `ffmpeg` decode: frames from stdout, diagnostics from stderr.
struct DecodeProcess {
    child: Child,
    frames: RawFrameReader<ChildStdout>,
    stderr: JoinHandle<String>,
}

impl DecodeProcess {
    async fn finish(mut self) -> Result<(), FfmpegError> {
        let status = self.child.wait().await?;
        if status.success() {
            return Ok(());
        }
        let decoded = self.frames.next_index;
        let stderr = self.stderr.await.unwrap_or_default();
        Err(FfmpegError::ExecutionFailed {
            exit_code: status.code(),
            stderr: if stderr.is_empty() {
                format!("decoding stopped after {decoded} frames")
            } else {
                format!("{stderr} (after {decoded} frames)")
            },
        })
    }
}

/// Splits a raw RGB24 byte stream into fixed-size frames.
struct RawFrameReader<R> {
    reader: R,
    width: u32,
    height: u32,
    next_index: u64,
}

impl<R: AsyncRead + Unpin> RawFrameReader<R> {
    fn new(reader: R, width: u32, height: u32) -> Self {
        Self {
            reader,
            width,
            height,
            next_index: 0,
        }
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// The next full frame, `None` at a clean end of stream.
    async fn next_frame(&mut self) -> Result<Option<VideoFrame>, FfmpegError> {
        let expected = self.frame_len();
        let mut buf = vec![0u8; expected];
        let read = fill(&mut self.reader, &mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        if read < expected {
            return Err(FfmpegError::TruncatedFrame {
                index: self.next_index,
                read,
                expected,
            });
        }

        let image = RgbImage::from_raw(self.width, self.height, buf).ok_or_else(|| {
            FfmpegError::ParseError(format!("frame {} has wrong size", self.next_index))
        })?;
        let frame = VideoFrame {
            index: self.next_index,
            image,
        };
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Read until `buf` is full or EOF. Returns the number of bytes read.
async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FfmpegError> {
    let mut read = 0;
    while read < buf.len() {
        let n = reader.read(&mut buf[read..]).await?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(read)
}

/// Drain `reader` to EOF, keeping only the last `limit` bytes as text.
async fn stderr_tail<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> String {
    let mut tail = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend_from_slice(&chunk[..n]);
                if tail.len() > limit {
                    tail.drain(..tail.len() - limit);
                }
            }
        }
    }
    String::from_utf8_lossy(&tail).trim().to_string()
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Video duration in seconds; format-level first, then the video stream.
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    let format = probe.format.as_ref().and_then(|f| f.duration.as_deref());
    let stream = first_video_stream(probe).and_then(|s| s.duration.as_deref());
    format
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| stream.and_then(|d| d.parse::<f64>().ok()))
        .unwrap_or(0.0)
}

/// Native frame rate. Prefers `avg_frame_rate`, which is what variable-rate
/// phone recordings actually play at, and falls back to `r_frame_rate`.
pub fn parse_framerate(probe: &FfprobeOutput) -> f64 {
    let Some(stream) = first_video_stream(probe) else {
        return 0.0;
    };
    [stream.avg_frame_rate.as_deref(), stream.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .map(parse_fraction)
        .find(|fps| *fps > 0.0)
        .unwrap_or(0.0)
}

/// Parse a fraction string like `"30/1"` into a float.
fn parse_fraction(s: &str) -> f64 {
    match s.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f64>().unwrap_or(0.0);
            let den = den.parse::<f64>().unwrap_or(0.0);
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        }
        None => s.parse::<f64>().unwrap_or(0.0),
    }
}

/// Frame count from `nb_frames`, else estimated from duration and rate.
pub fn parse_total_frames(probe: &FfprobeOutput) -> u64 {
    if let Some(n) = first_video_stream(probe)
        .and_then(|s| s.nb_frames.as_deref())
        .and_then(|nb| nb.parse::<u64>().ok())
    {
        return n;
    }
    let duration = parse_duration(probe);
    let fps = parse_framerate(probe);
    if duration > 0.0 && fps > 0.0 {
        return (duration * fps).round() as u64;
    }
    0
}
