use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::asset::VideoAsset;
use crate::consts::{MAX_CONSECUTIVE_FRAME_FAILURES, SCORE_BATCH_SIZE};
use crate::decode::FrameStream;
use crate::error::{FocusError, Result};
use crate::frame::SharpnessRecord;
use crate::raster::rasterize;
use crate::sharpness::{LaplacianScorer, SharpnessScorer};

/// Pipeline stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum AnalysisStage {
    Opening,
    Scoring,
    Finalizing,
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opening => write!(f, "Opening video"),
            Self::Scoring => write!(f, "Scoring frames"),
            Self::Finalizing => write!(f, "Finalizing"),
        }
    }
}

/// Thread-safe progress reporting for an analysis run.
///
/// Implementors can drive progress bars, logging, or any other feedback.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items
    /// in this stage (the declared frame count for scoring), if known.
    fn begin_stage(&self, _stage: AnalysisStage, _total_items: Option<usize>) {}

    /// Called after each scored batch with the number of records so far.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `analyze` delegates.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Cooperative cancellation handle. Cloned freely; any clone can cancel.
///
/// The pipeline checks it between frames, never mid-frame, so cancellation
/// cannot corrupt an already-appended record.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

fn default_max_consecutive_failures() -> usize {
    MAX_CONSECUTIVE_FRAME_FAILURES
}

fn default_batch_size() -> usize {
    SCORE_BATCH_SIZE
}

/// Tunables for one analysis run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Frames in a row that may fail scoring before the run is abandoned.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: usize,
    /// Frames decoded and scored together. 1 disables batch parallelism.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_consecutive_failures: default_max_consecutive_failures(),
            batch_size: default_batch_size(),
        }
    }
}

/// Terminal status of an analysis run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AnalysisStatus {
    /// Every decodable frame was scored.
    Complete,
    /// The run stopped early (truncated stream or cancellation) but
    /// gathered at least one record.
    PartialComplete,
    /// No usable result.
    Failed,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::PartialComplete => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why a run ended short of `Complete`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    UnsupportedFormat,
    TruncatedStream,
    ProcessingFailed,
    ResourceExhausted,
    Cancelled,
}

/// Reason attached to a `PartialComplete` or `Failed` result. `message` is
/// human-readable and carries no internal fault codes.
#[derive(Clone, Debug, Serialize)]
pub struct RunFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RunFailure {
    fn from_error(err: &FocusError) -> Self {
        let kind = match err {
            FocusError::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            FocusError::TruncatedStream { .. } => FailureKind::TruncatedStream,
            FocusError::ResourceExhausted => FailureKind::ResourceExhausted,
            FocusError::ProcessingFailed { .. } => FailureKind::ProcessingFailed,
            // Rejected synchronously in `analyze_reported`; never folded
            // into a result.
            FocusError::AlreadyRunning => FailureKind::ProcessingFailed,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }

    fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            message: "analysis cancelled before the end of the video".into(),
        }
    }
}

/// Ordered sharpness time series plus the run's terminal status.
///
/// `records` is timestamp-ordered and only ever handed out as part of a
/// finished result; callers never observe it mid-run.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisResult {
    pub records: Vec<SharpnessRecord>,
    pub status: AnalysisStatus,
    pub failure: Option<RunFailure>,
}

impl AnalysisResult {
    fn failed(err: &FocusError) -> Self {
        Self {
            records: Vec::new(),
            status: AnalysisStatus::Failed,
            failure: Some(RunFailure::from_error(err)),
        }
    }
}

/// Drives one analysis run at a time: decode, rasterize, score, record.
///
/// The scorer backend is injectable (defaults to [`LaplacianScorer`]); the
/// orchestrator itself owns run exclusivity, frame-failure accounting,
/// cancellation, and error surfacing.
pub struct Analyzer {
    scorer: Arc<dyn SharpnessScorer>,
    running: AtomicBool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the running flag even if a run panics.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_scorer(Arc::new(LaplacianScorer))
    }

    pub fn with_scorer(scorer: Arc<dyn SharpnessScorer>) -> Self {
        Self {
            scorer,
            running: AtomicBool::new(false),
        }
    }

    /// Analyze an asset with default options and no progress reporting.
    pub fn analyze(&self, asset: &VideoAsset, cancel: &CancelFlag) -> Result<AnalysisResult> {
        self.analyze_reported(asset, cancel, &NoOpReporter, &AnalysisOptions::default())
    }

    /// Analyze an asset.
    ///
    /// Run-level errors are surfaced inside the returned `AnalysisResult`;
    /// the only `Err` here is `AlreadyRunning`, rejected synchronously when
    /// another run is active on this orchestrator. A rejected call does not
    /// disturb the in-flight run.
    pub fn analyze_reported(
        &self,
        asset: &VideoAsset,
        cancel: &CancelFlag,
        reporter: &dyn ProgressReporter,
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FocusError::AlreadyRunning);
        }
        let _guard = RunGuard {
            flag: &self.running,
        };
        Ok(self.run(asset, cancel, reporter, options))
    }

    fn run(
        &self,
        asset: &VideoAsset,
        cancel: &CancelFlag,
        reporter: &dyn ProgressReporter,
        options: &AnalysisOptions,
    ) -> AnalysisResult {
        reporter.begin_stage(AnalysisStage::Opening, None);
        let mut stream = match FrameStream::open(asset) {
            Ok(stream) => stream,
            Err(err) => {
                reporter.finish_stage();
                warn!(error = %err, "could not open video");
                return AnalysisResult::failed(&err);
            }
        };
        reporter.finish_stage();

        let declared = stream.frame_count();
        info!(
            frames = declared,
            media_type = asset.media_type(),
            "starting sharpness analysis"
        );
        reporter.begin_stage(AnalysisStage::Scoring, Some(declared));

        let batch_size = options.batch_size.max(1);
        let mut records: Vec<SharpnessRecord> = Vec::with_capacity(declared);
        let mut consecutive_failures = 0usize;
        let mut truncation: Option<FocusError> = None;
        let mut escalated: Option<FocusError> = None;
        let mut cancelled = false;
        let mut stream_done = false;

        while !stream_done && !cancelled && escalated.is_none() {
            // Pull the next batch. Cancellation is checked before each frame;
            // on cancel, frames already pulled but not yet scored are dropped.
            let mut batch = Vec::with_capacity(batch_size);
            while batch.len() < batch_size {
                if cancel.is_cancelled() {
                    cancelled = true;
                    batch.clear();
                    break;
                }
                match stream.next() {
                    Some(Ok(view)) => batch.push(view),
                    Some(Err(err)) => {
                        truncation = Some(err);
                        stream_done = true;
                        break;
                    }
                    None => {
                        stream_done = true;
                        break;
                    }
                }
            }
            if batch.is_empty() {
                continue;
            }

            // Score in parallel; collect preserves decode order, so records
            // stay timestamp-ordered without a re-sort.
            let scored: Vec<(i64, Result<f64>)> = batch
                .par_iter()
                .map(|view| {
                    let outcome = rasterize(view).and_then(|buffer| self.scorer.score(&buffer));
                    (view.timestamp_us, outcome)
                })
                .collect();

            for (timestamp_us, outcome) in scored {
                match outcome {
                    Ok(score) => {
                        consecutive_failures = 0;
                        records.push(SharpnessRecord::new(timestamp_us, score));
                    }
                    Err(err) => {
                        consecutive_failures += 1;
                        warn!(timestamp_us, error = %err, "frame skipped");
                        if consecutive_failures > options.max_consecutive_failures {
                            escalated = Some(err);
                            break;
                        }
                    }
                }
            }
            reporter.advance(records.len());
        }
        reporter.finish_stage();

        reporter.begin_stage(AnalysisStage::Finalizing, None);
        let result = finalize(records, truncation, escalated, cancelled);
        reporter.finish_stage();
        info!(
            status = %result.status,
            records = result.records.len(),
            "analysis finished"
        );
        result
    }
}

fn finalize(
    records: Vec<SharpnessRecord>,
    truncation: Option<FocusError>,
    escalated: Option<FocusError>,
    cancelled: bool,
) -> AnalysisResult {
    if let Some(err) = escalated {
        // A systematically failing stream makes the partial records
        // untrustworthy; the whole run fails.
        return AnalysisResult::failed(&err);
    }

    if cancelled {
        return if records.is_empty() {
            AnalysisResult {
                records,
                status: AnalysisStatus::Failed,
                failure: Some(RunFailure::cancelled()),
            }
        } else {
            AnalysisResult {
                records,
                status: AnalysisStatus::PartialComplete,
                failure: Some(RunFailure::cancelled()),
            }
        };
    }

    if let Some(err) = truncation {
        return if records.is_empty() {
            AnalysisResult::failed(&err)
        } else {
            AnalysisResult {
                records,
                status: AnalysisStatus::PartialComplete,
                failure: Some(RunFailure::from_error(&err)),
            }
        };
    }

    if records.is_empty() {
        // Clean end of stream but every frame was skipped.
        return AnalysisResult::failed(&FocusError::ProcessingFailed {
            detail: "every decoded frame failed scoring".into(),
        });
    }

    AnalysisResult {
        records,
        status: AnalysisStatus::Complete,
        failure: None,
    }
}
