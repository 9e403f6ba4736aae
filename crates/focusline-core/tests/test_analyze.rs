mod common;

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use common::{build_header, build_mono_video, checkerboard_frame, marked_frame, uniform_frame};
use focusline_core::analyze::{
    AnalysisOptions, AnalysisStage, AnalysisStatus, Analyzer, CancelFlag, FailureKind,
    ProgressReporter,
};
use focusline_core::asset::{AssetSlot, VideoAsset};
use focusline_core::error::FocusError;
use focusline_core::frame::PixelBuffer;
use focusline_core::sharpness::{LaplacianScorer, SharpnessScorer};

fn asset_from(blob: Vec<u8>) -> VideoAsset {
    VideoAsset::new(blob, "video/x-ser")
}

/// Valid mono video with `n` textured frames.
fn textured_video(n: usize) -> VideoAsset {
    let frames: Vec<Vec<u8>> = (0..n).map(|_| marked_frame(16, 16, 7)).collect();
    asset_from(build_mono_video(16, 16, &frames))
}

#[test]
fn test_complete_run_scores_every_frame() {
    let frames = vec![
        uniform_frame(16, 16, 40),
        checkerboard_frame(16, 16),
        marked_frame(16, 16, 7),
        uniform_frame(16, 16, 200),
        checkerboard_frame(16, 16),
    ];
    let asset = asset_from(build_mono_video(16, 16, &frames));

    let analyzer = Analyzer::new();
    let result = analyzer.analyze(&asset, &CancelFlag::new()).unwrap();

    assert_eq!(result.status, AnalysisStatus::Complete);
    assert!(result.failure.is_none());
    assert_eq!(result.records.len(), 5);
    for pair in result.records.windows(2) {
        assert!(pair[0].timestamp_us < pair[1].timestamp_us);
    }
    for record in &result.records {
        assert!(record.score.is_finite() && record.score >= 0.0);
    }
    // Uniform frames score zero, checkerboards dominate.
    assert_eq!(result.records[0].score, 0.0);
    assert!(result.records[1].score > result.records[2].score);
}

#[test]
fn test_truncated_video_is_partial_with_reason() {
    let mut blob = build_header(16, 16, 8, 6, 0);
    for _ in 0..4 {
        blob.extend_from_slice(&checkerboard_frame(16, 16));
    }
    blob.extend_from_slice(&vec![0u8; 100]);
    let asset = asset_from(blob);

    let analyzer = Analyzer::new();
    let result = analyzer.analyze(&asset, &CancelFlag::new()).unwrap();

    assert_eq!(result.status, AnalysisStatus::PartialComplete);
    assert_eq!(result.records.len(), 4);
    let failure = result.failure.expect("truncation reason");
    assert_eq!(failure.kind, FailureKind::TruncatedStream);
    assert!(!failure.message.is_empty());
}

#[test]
fn test_undecodable_bytes_fail_with_unsupported_format() {
    let asset = asset_from(b"definitely not a video".repeat(64));

    let analyzer = Analyzer::new();
    let result = analyzer.analyze(&asset, &CancelFlag::new()).unwrap();

    assert_eq!(result.status, AnalysisStatus::Failed);
    assert!(result.records.is_empty());
    assert_eq!(
        result.failure.expect("failure reason").kind,
        FailureKind::UnsupportedFormat
    );
}

#[test]
fn test_truncation_with_zero_frames_fails() {
    // Header fine, but the first frame is already cut off.
    let mut blob = build_header(16, 16, 8, 3, 0);
    blob.extend_from_slice(&[0u8; 10]);
    let asset = asset_from(blob);

    let analyzer = Analyzer::new();
    let result = analyzer.analyze(&asset, &CancelFlag::new()).unwrap();

    assert_eq!(result.status, AnalysisStatus::Failed);
    assert!(result.records.is_empty());
    assert_eq!(
        result.failure.expect("failure reason").kind,
        FailureKind::TruncatedStream
    );
}

/// Fails any frame whose first rasterized byte carries the marker value.
struct FlakyScorer;

impl SharpnessScorer for FlakyScorer {
    fn score(&self, buffer: &PixelBuffer) -> focusline_core::error::Result<f64> {
        if buffer.data[0] == 255 {
            Err(FocusError::ProcessingFailed {
                detail: "injected fault".into(),
            })
        } else {
            LaplacianScorer.score(buffer)
        }
    }
}

#[test]
fn test_failed_frame_is_skipped_not_zeroed() {
    let frames = vec![
        marked_frame(16, 16, 7),
        marked_frame(16, 16, 255), // scorer faults here
        marked_frame(16, 16, 9),
        marked_frame(16, 16, 11),
    ];
    let asset = asset_from(build_mono_video(16, 16, &frames));

    let analyzer = Analyzer::with_scorer(Arc::new(FlakyScorer));
    let result = analyzer.analyze(&asset, &CancelFlag::new()).unwrap();

    assert_eq!(result.status, AnalysisStatus::Complete);
    assert_eq!(result.records.len(), 3);
    // The faulted frame is absent, not recorded as zero.
    let timestamps: Vec<i64> = result.records.iter().map(|r| r.timestamp_us).collect();
    assert_eq!(timestamps, vec![0, 2 * 33_333, 3 * 33_333]);
}

#[test]
fn test_consecutive_failures_escalate_to_failed() {
    let frames = vec![
        marked_frame(16, 16, 7),
        marked_frame(16, 16, 255),
        marked_frame(16, 16, 255),
        marked_frame(16, 16, 255),
        marked_frame(16, 16, 9),
    ];
    let asset = asset_from(build_mono_video(16, 16, &frames));

    let options = AnalysisOptions {
        max_consecutive_failures: 2,
        batch_size: 1,
    };
    let analyzer = Analyzer::with_scorer(Arc::new(FlakyScorer));
    let result = analyzer
        .analyze_reported(&asset, &CancelFlag::new(), &NoProgress, &options)
        .unwrap();

    assert_eq!(result.status, AnalysisStatus::Failed);
    assert!(result.records.is_empty());
    assert_eq!(
        result.failure.expect("failure reason").kind,
        FailureKind::ProcessingFailed
    );
}

struct NoProgress;
impl ProgressReporter for NoProgress {}

#[test]
fn test_precancelled_run_fails_without_records() {
    let asset = textured_video(5);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let analyzer = Analyzer::new();
    let result = analyzer.analyze(&asset, &cancel).unwrap();

    assert_eq!(result.status, AnalysisStatus::Failed);
    assert!(result.records.is_empty());
    assert_eq!(
        result.failure.expect("failure reason").kind,
        FailureKind::Cancelled
    );
}

/// Cancels the run once `after` records have been appended.
struct CancelAfter {
    after: usize,
    flag: CancelFlag,
}

impl ProgressReporter for CancelAfter {
    fn advance(&self, items_done: usize) {
        if items_done >= self.after {
            self.flag.cancel();
        }
    }
}

#[test]
fn test_cancel_mid_run_keeps_exactly_the_recorded_frames() {
    let asset = textured_video(8);
    let cancel = CancelFlag::new();
    let reporter = CancelAfter {
        after: 3,
        flag: cancel.clone(),
    };
    let options = AnalysisOptions {
        batch_size: 1,
        ..AnalysisOptions::default()
    };

    let analyzer = Analyzer::new();
    let result = analyzer
        .analyze_reported(&asset, &cancel, &reporter, &options)
        .unwrap();

    assert_eq!(result.status, AnalysisStatus::PartialComplete);
    assert_eq!(result.records.len(), 3, "no half-appended record");
    assert_eq!(
        result.failure.expect("failure reason").kind,
        FailureKind::Cancelled
    );
}

/// Blocks inside the scoring stage until released, so a test can overlap a
/// second analyze call with a live run.
struct GateReporter {
    entered: mpsc::Sender<()>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ProgressReporter for GateReporter {
    fn begin_stage(&self, stage: AnalysisStage, _total_items: Option<usize>) {
        if matches!(stage, AnalysisStage::Scoring) {
            self.entered.send(()).ok();
            self.release.lock().unwrap().recv().ok();
        }
    }
}

#[test]
fn test_second_analyze_is_rejected_while_running() {
    let asset = textured_video(4);
    let analyzer = Arc::new(Analyzer::new());

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let reporter = GateReporter {
        entered: entered_tx,
        release: Mutex::new(release_rx),
    };

    let background = {
        let analyzer = Arc::clone(&analyzer);
        let asset = asset.clone();
        thread::spawn(move || {
            analyzer.analyze_reported(
                &asset,
                &CancelFlag::new(),
                &reporter,
                &AnalysisOptions::default(),
            )
        })
    };

    entered_rx.recv().expect("run should reach scoring");
    let err = analyzer.analyze(&asset, &CancelFlag::new()).unwrap_err();
    assert!(matches!(err, FocusError::AlreadyRunning));

    release_tx.send(()).unwrap();
    // The rejection must not disturb the in-flight run.
    let result = background.join().unwrap().unwrap();
    assert_eq!(result.status, AnalysisStatus::Complete);
    assert_eq!(result.records.len(), 4);

    // And the orchestrator accepts a fresh run afterwards.
    let again = analyzer.analyze(&asset, &CancelFlag::new()).unwrap();
    assert_eq!(again.status, AnalysisStatus::Complete);
}

#[test]
fn test_asset_slot_lifecycle() {
    let slot = AssetSlot::new();
    assert!(slot.current().is_none());

    slot.set(textured_video(2));
    let held = slot.current().expect("asset was set");
    // Clones share the blob; re-reading is cheap.
    let again = slot.current().expect("still set");
    assert_eq!(held.bytes().as_ptr(), again.bytes().as_ptr());

    slot.clear();
    assert!(slot.current().is_none());
}

#[test]
fn test_result_serializes_for_chart_consumers() {
    let asset = textured_video(2);
    let analyzer = Analyzer::new();
    let result = analyzer.analyze(&asset, &CancelFlag::new()).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "Complete");
    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["timestamp_label"], "00:00.000000");
    assert!(records[0]["score"].is_number());
}
