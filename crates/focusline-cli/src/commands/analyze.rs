use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::debug;

use focusline_core::analyze::{
    AnalysisOptions, AnalysisResult, AnalysisStage, Analyzer, CancelFlag, ProgressReporter,
};
use focusline_core::asset::{AssetSlot, VideoAsset};

#[derive(Clone, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input video file
    pub file: PathBuf,

    /// Show the top N sharpest frames
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Write the full time series to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format for --output
    #[arg(long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Load analysis options from a TOML file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Declared media type from the file extension. The decoder trusts the
/// blob's own header, so this is informational only.
pub fn media_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ser") => "video/x-ser",
        _ => "application/octet-stream",
    }
}

/// Bridges the core's progress callbacks onto an indicatif bar.
struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for ProgressBarReporter {
    fn begin_stage(&self, stage: AnalysisStage, total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
        if let Some(total) = total_items {
            self.bar.set_length(total as u64);
        }
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }
}

fn load_options(path: Option<&PathBuf>) -> Result<AnalysisOptions> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read options from {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("Invalid options file {}", path.display()))
        }
        None => Ok(AnalysisOptions::default()),
    }
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    // The slot is the hand-off point between "upload" and analysis; here
    // both sides live in one process, but the contract is the same.
    let slot = AssetSlot::new();
    slot.set(VideoAsset::new(bytes, media_type_for(&args.file)));
    let asset = slot.current().context("no video loaded")?;
    debug!(bytes = asset.len(), media_type = asset.media_type(), "video loaded");

    let options = load_options(args.config.as_ref())?;

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || handler_flag.cancel())
        .context("Failed to install Ctrl-C handler")?;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = ProgressBarReporter { bar: bar.clone() };

    let analyzer = Analyzer::new();
    let result = analyzer.analyze_reported(&asset, &cancel, &reporter, &options)?;
    bar.finish_and_clear();

    summary_and_table(&result, args.top);

    if let Some(ref path) = args.output {
        export(&result, path, &args.format)?;
        println!("\nSeries written to {}", path.display());
    }

    Ok(())
}

fn summary_and_table(result: &AnalysisResult, top: usize) {
    crate::summary::print_result_summary(result);

    if result.records.is_empty() || top == 0 {
        return;
    }

    let mut ranked: Vec<_> = result.records.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    println!("\nTop {} sharpest frames:", top.min(ranked.len()));
    println!("{:>5}  {:>15}  {:>12}", "Rank", "Time", "Score");
    println!("{}", "-".repeat(36));
    for (rank, record) in ranked.iter().take(top).enumerate() {
        println!(
            "{:>5}  {:>15}  {:>12.6}",
            rank + 1,
            record.timestamp_label,
            record.score
        );
    }
}

/// Chart-consumer payload: ordered points plus the status the UI needs to
/// show "complete", "partial (reason)", or "failed (reason)".
#[derive(Serialize)]
struct ChartExport<'a> {
    status: String,
    reason: Option<&'a str>,
    points: Vec<ChartPoint<'a>>,
}

#[derive(Serialize)]
struct ChartPoint<'a> {
    x: &'a str,
    timestamp_us: i64,
    y: f64,
}

fn export(result: &AnalysisResult, path: &Path, format: &ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Json => {
            let payload = ChartExport {
                status: result.status.to_string(),
                reason: result.failure.as_ref().map(|f| f.message.as_str()),
                points: result
                    .records
                    .iter()
                    .map(|r| ChartPoint {
                        x: &r.timestamp_label,
                        timestamp_us: r.timestamp_us,
                        y: r.score,
                    })
                    .collect(),
            };
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(file, &payload)?;
        }
        ExportFormat::Csv => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            writeln!(file, "timestamp_us,timestamp,score")?;
            for record in &result.records {
                writeln!(
                    file,
                    "{},{},{}",
                    record.timestamp_us, record.timestamp_label, record.score
                )?;
            }
        }
    }
    Ok(())
}
