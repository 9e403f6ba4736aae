use console::Style;
use focusline_core::analyze::{AnalysisResult, AnalysisStatus};

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    ok: Style,
    partial: Style,
    failed: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green().bold(),
            partial: Style::new().yellow().bold(),
            failed: Style::new().red().bold(),
        }
    }
}

pub fn print_result_summary(result: &AnalysisResult) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Sharpness Analysis"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(18)));
    println!();

    let status_style = match result.status {
        AnalysisStatus::Complete => &s.ok,
        AnalysisStatus::PartialComplete => &s.partial,
        AnalysisStatus::Failed => &s.failed,
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to("Status"),
        status_style.apply_to(&result.status)
    );
    if let Some(ref failure) = result.failure {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Reason"),
            s.value.apply_to(&failure.message)
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(result.records.len())
    );

    if result.records.is_empty() {
        return;
    }

    let first = result.records.first().unwrap();
    let last = result.records.last().unwrap();
    println!(
        "  {:<14}{} .. {}",
        s.label.apply_to("Span"),
        s.value.apply_to(&first.timestamp_label),
        s.value.apply_to(&last.timestamp_label)
    );

    let best = result
        .records
        .iter()
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let worst = result.records.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
    let mean = result.records.iter().map(|r| r.score).sum::<f64>() / result.records.len() as f64;

    println!(
        "  {:<14}{:.6}",
        s.label.apply_to("Best score"),
        best
    );
    println!(
        "  {:<14}{:.6}",
        s.label.apply_to("Worst score"),
        worst
    );
    println!(
        "  {:<14}{:.6}",
        s.label.apply_to("Mean score"),
        mean
    );
}
