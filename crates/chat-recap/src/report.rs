//! Plain-text and JSON rendering of a [`RecapReport`].

use std::fmt::Write as _;

use recap_core::formatting::{format_change, format_count, format_number, truncate};
use recap_core::time_utils::TimezoneHandler;
use recap_data::aggregator::{AggregateBucket, RecapAggregator};
use recap_data::analysis::RecapReport;

const TITLE_WIDTH: usize = 48;

/// What the text renderer prints.
#[derive(Debug, Clone)]
pub struct TextOptions {
    /// `summary`, `daily`, `monthly`, `yearly`, `models` or `records`.
    pub view: String,
    pub top_models: usize,
    pub limit: usize,
    pub offset: usize,
    pub timezone: TimezoneHandler,
}

/// Pretty-printed JSON of the whole report.
pub fn render_json(report: &RecapReport) -> anyhow::Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

/// Render the requested view as text.
pub fn render_text(report: &RecapReport, opts: &TextOptions) -> String {
    match opts.view.as_str() {
        "daily" => render_buckets("Day", &report.daily),
        "monthly" => render_buckets("Month", &report.monthly),
        "yearly" => render_buckets("Year", &report.yearly),
        "models" => render_models(report, usize::MAX),
        "records" => render_records(report, opts),
        _ => render_summary(report, opts),
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

fn render_summary(report: &RecapReport, opts: &TextOptions) -> String {
    let mut out = String::new();
    let yir = &report.year_in_review;
    let stats = &report.message_stats;

    let _ = writeln!(out, "Chat recap ({})", report.metadata.timezone);
    if let (Some(first), Some(last)) = (
        report.metadata.first_conversation,
        report.metadata.last_conversation,
    ) {
        let _ = writeln!(
            out,
            "History: {} to {}",
            opts.timezone.format_local(first),
            opts.timezone.format_local(last)
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Conversations: {}   Messages: {}   Voice: {}",
        format_count(report.totals.conversations),
        format_count(report.totals.messages),
        format_count(report.totals.voice_conversations)
    );
    let _ = writeln!(
        out,
        "Messages per conversation: mean {}  median {}  p90 {}  max {}",
        format_number(stats.mean, 1),
        format_number(stats.median, 1),
        format_number(stats.p90, 1),
        format_count(stats.max)
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Year in review: {} vs {}",
        yir.current.year, yir.previous.year
    );
    if report.has_reference_year_data() {
        let _ = writeln!(
            out,
            "{:<22}{:>10}{:>10}{:>10}",
            "", yir.current.year, yir.previous.year, "change"
        );
        let _ = writeln!(
            out,
            "{:<22}{:>10}{:>10}{:>10}",
            "Total conversations",
            format_count(yir.current.conversations),
            format_count(yir.previous.conversations),
            format_change(yir.conversations_change)
        );
        let _ = writeln!(
            out,
            "{:<22}{:>10}{:>10}{:>10}",
            "Avg messages",
            format_number(yir.current.average_messages, 1),
            format_number(yir.previous.average_messages, 1),
            format_change(yir.average_messages_change)
        );
        let _ = writeln!(
            out,
            "{:<22}{:>10}{:>10}{:>10}",
            "Voice conversations",
            format_count(yir.current.voice_conversations),
            format_count(yir.previous.voice_conversations),
            format_change(yir.voice_conversations_change)
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<12}{:>10}{:>10}",
            "Month", yir.current.year, yir.previous.year
        );
        for row in &report.monthly_comparison {
            let _ = writeln!(
                out,
                "{:<12}{:>10}{:>10}",
                row.month_name, row.current, row.previous
            );
        }
    } else {
        let _ = writeln!(out, "No data available for {}.", yir.current.year);
    }
    let _ = writeln!(out);

    out.push_str(&render_models(report, opts.top_models));

    let ex = &report.extraction;
    if ex.skipped > 0 || ex.duplicates > 0 {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Skipped {} malformed and {} duplicate entries of {}.",
            ex.skipped, ex.duplicates, ex.total_entries
        );
    }
    out
}

fn render_buckets(label: &str, buckets: &[AggregateBucket]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12}{:>14}{:>10}{:>8}{:>7}  {}",
        label, "Conversations", "Messages", "Avg", "Voice", "Models"
    );
    for bucket in buckets {
        let models: Vec<String> = bucket
            .models
            .iter()
            .map(|(name, count)| format!("{name} ({count})"))
            .collect();
        let _ = writeln!(
            out,
            "{:<12}{:>14}{:>10}{:>8}{:>7}  {}",
            bucket.key,
            format_count(bucket.stats.conversations),
            format_count(bucket.stats.messages),
            format_number(bucket.stats.mean_messages, 1),
            bucket.stats.voice_conversations,
            models.join(", ")
        );
    }

    let totals = RecapAggregator::calculate_totals(buckets);
    let _ = writeln!(
        out,
        "{:<12}{:>14}{:>10}{:>8}{:>7}  {} periods",
        "TOTAL",
        format_count(totals.conversations),
        format_count(totals.messages),
        format_number(totals.mean_messages, 1),
        totals.voice_conversations,
        buckets.len()
    );
    out
}

fn render_models(report: &RecapReport, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24}{:>14}{:>9}{:>10}",
        "Model", "Conversations", "Share", "Messages"
    );
    for share in report.models.iter().take(top) {
        let _ = writeln!(
            out,
            "{:<24}{:>14}{:>9}{:>10}",
            truncate(&share.model, 23),
            format_count(share.conversations),
            format!("{}%", format_number(share.share_percent, 1)),
            format_count(share.messages)
        );
    }
    if report.models.len() > top {
        let _ = writeln!(out, "... and {} more", report.models.len() - top);
    }
    out
}

fn render_records(report: &RecapReport, opts: &TextOptions) -> String {
    let mut out = String::new();
    let total = report.records.len();
    let _ = writeln!(
        out,
        "{:<38}{:<21}{:<20}{:>6}  {}",
        "ID", "Created", "Model", "Msgs", "Title"
    );
    for record in report.records.iter().skip(opts.offset).take(opts.limit) {
        let _ = writeln!(
            out,
            "{:<38}{:<21}{:<20}{:>6}  {}",
            truncate(&record.id, 37),
            opts.timezone.format_local(record.created_at),
            truncate(record.model.as_deref().unwrap_or("-"), 19),
            record.message_count,
            truncate(record.title.as_deref().unwrap_or("(untitled)"), TITLE_WIDTH)
        );
    }

    let shown_from = opts.offset.min(total);
    let shown_to = opts.offset.saturating_add(opts.limit).min(total);
    if shown_to > shown_from {
        let _ = writeln!(out, "Rows {}-{} of {}", shown_from + 1, shown_to, total);
    } else {
        let _ = writeln!(out, "No rows at offset {} of {}", opts.offset, total);
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
