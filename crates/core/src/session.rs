//! Video session aggregation.
//!
//! A video is a lazy stream of decoded frames. Sampled frames are analyzed
//! with bounded, order-preserving parallelism and folded one at a time into
//! a [`SessionAccumulator`]; per-frame verdicts are dropped after folding.

use futures::future;
use futures::stream::{Stream, StreamExt, TryStreamExt};
use indexmap::IndexMap;
use serde::Serialize;

use crate::analyzer::FrameAnalyzer;
use crate::error::CoreError;
use crate::ffmpeg::VideoFrame;
use crate::mode::AnalysisMode;
use crate::verdict::{FrameSummary, FrameVerdict, PostureStatus, ScoringConfig, ISSUE_NO_POSE};

pub const NO_FRAMES_ANALYZED: &str = "No frames analyzed";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Aggregate result of analyzing one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub overall_analysis: FrameSummary,
    pub video_stats: VideoStats,
    pub most_common_issues: Vec<IssueCount>,
    /// Analyzed frames per status band, always listing every band.
    pub status_breakdown: IndexMap<PostureStatus, u64>,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoStats {
    /// Seconds, rounded to 2 decimals.
    pub duration: f64,
    pub total_frames: u64,
    pub analyzed_frames: u64,
    pub fps: f64,
    pub average_issues_per_frame: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undetected_frames: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueCount {
    pub issue: String,
    pub count: u64,
}

/// Compact per-frame record kept for the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub timestamp: f64,
    pub frame_number: u64,
    pub issues_count: usize,
    pub score: Option<u8>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// SessionAccumulator
// ---------------------------------------------------------------------------

/// Running totals over the analyzed frames of one video.
#[derive(Debug, Clone)]
pub struct SessionAccumulator {
    scoring: ScoringConfig,
    top_issues: usize,
    fps: f64,
    analyzed_frames: u64,
    detected_frames: u64,
    score_sum: u64,
    /// Issue occurrences on detected frames.
    issue_total: u64,
    /// Keyed by issue text, in first-seen order.
    issue_counts: IndexMap<String, u64>,
    status_counts: IndexMap<PostureStatus, u64>,
    timeline: Vec<TimelineEntry>,
}

impl SessionAccumulator {
    pub fn new(scoring: ScoringConfig, top_issues: usize, fps: f64) -> Self {
        let status_counts = [
            PostureStatus::GoodForm,
            PostureStatus::NeedsImprovement,
            PostureStatus::PoorForm,
            PostureStatus::AnalysisError,
        ]
        .into_iter()
        .map(|s| (s, 0))
        .collect();

        Self {
            scoring,
            top_issues,
            fps,
            analyzed_frames: 0,
            detected_frames: 0,
            score_sum: 0,
            issue_total: 0,
            issue_counts: IndexMap::new(),
            status_counts,
            timeline: Vec::new(),
        }
    }

    /// Fold one analyzed frame into the totals.
    ///
    /// Issues of undetected frames are not counted: they describe the
    /// detector, not the posture.
    pub fn record(&mut self, frame_index: u64, verdict: &FrameVerdict) {
        self.analyzed_frames += 1;
        *self.status_counts.entry(verdict.status()).or_insert(0) += 1;

        if let Some(score) = verdict.score() {
            self.detected_frames += 1;
            self.score_sum += u64::from(score);
            for issue in verdict.issues() {
                self.issue_total += 1;
                *self.issue_counts.entry(issue.message.clone()).or_insert(0) += 1;
            }
        }

        let timestamp = if self.fps > 0.0 {
            round2(frame_index as f64 / self.fps)
        } else {
            0.0
        };
        self.timeline.push(TimelineEntry {
            timestamp,
            frame_number: frame_index,
            issues_count: verdict.issues().len(),
            score: verdict.score(),
        });
    }

    pub fn analyzed_frames(&self) -> u64 {
        self.analyzed_frames
    }

    pub fn undetected_frames(&self) -> u64 {
        self.analyzed_frames - self.detected_frames
    }

    /// Issues by descending count; ties keep first-seen order.
    pub fn most_common_issues(&self) -> Vec<IssueCount> {
        let mut ranked: Vec<IssueCount> = self
            .issue_counts
            .iter()
            .map(|(issue, &count)| IssueCount {
                issue: issue.clone(),
                count,
            })
            .collect();
        // Stable sort, so equal counts stay in insertion order.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(self.top_issues);
        ranked
    }

    /// Mean score over detected frames, or `None` if nothing was detected.
    pub fn mean_score(&self) -> Option<u8> {
        if self.detected_frames == 0 {
            return None;
        }
        let mean = self.score_sum as f64 / self.detected_frames as f64;
        Some(mean.round().clamp(0.0, 100.0) as u8)
    }

    /// Build the report. `total_frames` is the number of frames in the
    /// source, sampled or not.
    pub fn finish(self, total_frames: u64) -> SessionReport {
        let most_common_issues = self.most_common_issues();
        let undetected = self.undetected_frames();

        let overall_analysis = match self.mean_score() {
            Some(score) => FrameSummary {
                status: self.scoring.status(score),
                score: Some(score),
                details: most_common_issues.iter().map(|i| i.issue.clone()).collect(),
            },
            None => FrameSummary {
                status: PostureStatus::AnalysisError,
                score: None,
                details: vec![if self.analyzed_frames == 0 {
                    NO_FRAMES_ANALYZED.to_string()
                } else {
                    ISSUE_NO_POSE.to_string()
                }],
            },
        };

        let average_issues_per_frame = if self.analyzed_frames > 0 {
            round2(self.issue_total as f64 / self.analyzed_frames as f64)
        } else {
            0.0
        };
        let (duration, fps) = if self.fps > 0.0 {
            (round2(total_frames as f64 / self.fps), round2(self.fps))
        } else {
            (0.0, 0.0)
        };

        SessionReport {
            overall_analysis,
            video_stats: VideoStats {
                duration,
                total_frames,
                analyzed_frames: self.analyzed_frames,
                fps,
                average_issues_per_frame,
                undetected_frames: (undetected > 0).then_some(undetected),
            },
            most_common_issues,
            status_breakdown: self.status_counts,
            timeline: self.timeline,
        }
    }
}

// ---------------------------------------------------------------------------
// analyze_video
// ---------------------------------------------------------------------------

/// Analyze a decoded video.
///
/// `frames` must yield frames in source order. Frames are sampled by the
/// analyzer's [`SamplingPolicy`](crate::config::SamplingPolicy) against
/// `fps`. The first stream error aborts the whole analysis.
pub async fn analyze_video<S, E>(
    analyzer: &FrameAnalyzer,
    frames: S,
    fps: f64,
    mode: AnalysisMode,
) -> Result<SessionReport, CoreError>
where
    S: Stream<Item = Result<VideoFrame, E>>,
    E: Into<CoreError>,
{
    let config = analyzer.config();
    let stride = config.sampling.stride(fps);
    tracing::info!(%mode, fps, stride, "Starting video analysis");

    let mut total_frames = 0u64;
    let accumulator = SessionAccumulator::new(config.scoring, config.top_issues, fps);

    let report = frames
        .inspect(|_| total_frames += 1)
        .map_err(Into::<CoreError>::into)
        .try_filter(|frame| future::ready(frame.index % stride == 0))
        .map_ok(|frame| async move {
            let verdict = analyzer.analyze_frame(&frame.image, mode).await;
            Ok::<_, CoreError>((frame.index, verdict))
        })
        .try_buffered(config.max_parallel_frames.max(1))
        .try_fold(accumulator, |mut acc, (index, verdict)| {
            tracing::debug!(
                frame = index,
                status = %verdict.status(),
                issues = verdict.issues().len(),
                "Frame analyzed",
            );
            acc.record(index, &verdict);
            future::ready(Ok(acc))
        })
        .await?;

    let report = report.finish(total_frames);
    tracing::info!(
        %mode,
        total_frames = report.video_stats.total_frames,
        analyzed_frames = report.video_stats.analyzed_frames,
        undetected_frames = report.video_stats.undetected_frames.unwrap_or(0),
        status = %report.overall_analysis.status,
        "Video analysis complete",
    );
    Ok(report)
}
