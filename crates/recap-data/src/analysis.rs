//! Main analysis pipeline for chat-recap.
//!
//! Chains loading, metadata extraction and aggregation, returning a
//! [`RecapReport`] ready for a presentation layer.

use std::path::Path;

use chrono::{DateTime, Utc};
use recap_core::error::Result;
use recap_core::models::ConversationRecord;
use recap_core::statistics::MessageStats;
use recap_core::time_utils::TimezoneHandler;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::aggregator::{
    AggregateBucket, BucketStats, ModelShare, MonthComparison, RecapAggregator, YearComparison,
};
use crate::extractor::{extract_records, ExtractionStats};
use crate::reader::load_export;

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Timezone in which day/month/year buckets are cut.
    pub timezone: TimezoneHandler,
    /// Year compared against its predecessor; the current local year if `None`.
    pub reference_year: Option<i32>,
}

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// RFC 3339 timestamp when this report was generated.
    pub generated_at: String,
    /// IANA name of the bucketing timezone.
    pub timezone: String,
    pub reference_year: i32,
    pub first_conversation: Option<DateTime<Utc>>,
    pub last_conversation: Option<DateTime<Utc>>,
    /// Wall-clock seconds spent reading and parsing the export.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent extracting and aggregating.
    pub transform_time_seconds: f64,
}

/// The complete output of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecapReport {
    pub metadata: ReportMetadata,
    pub extraction: ExtractionStats,
    /// Totals over every extracted conversation.
    pub totals: BucketStats,
    pub message_stats: MessageStats,
    pub daily: Vec<AggregateBucket>,
    pub monthly: Vec<AggregateBucket>,
    pub yearly: Vec<AggregateBucket>,
    pub models: Vec<ModelShare>,
    pub year_in_review: YearComparison,
    pub monthly_comparison: Vec<MonthComparison>,
    /// Extracted records, oldest first.
    pub records: Vec<ConversationRecord>,
}

impl RecapReport {
    /// Whether the reference year holds any conversations.
    pub fn has_reference_year_data(&self) -> bool {
        self.year_in_review.current.conversations > 0
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over the export at `path` (file or export directory).
///
/// Fails only when the export itself is unreadable or malformed; bad
/// individual entries are skipped and counted in [`RecapReport::extraction`].
pub fn analyze_export(path: &Path, options: &AnalysisOptions) -> Result<RecapReport> {
    let load_start = std::time::Instant::now();
    let entries = load_export(path)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut report = analyze_entries(&entries, options);
    report.metadata.load_time_seconds = load_time;

    info!(
        "Analysed {}: {} conversations, {} skipped",
        path.display(),
        report.extraction.extracted,
        report.extraction.skipped
    );
    Ok(report)
}

/// Run extraction and aggregation over already-parsed export entries.
pub fn analyze_entries(entries: &[Value], options: &AnalysisOptions) -> RecapReport {
    let transform_start = std::time::Instant::now();

    let extraction = extract_records(entries);
    let records = extraction.records;

    let tz = options.timezone;
    let aggregator = RecapAggregator::new(tz);
    let reference_year = options.reference_year.unwrap_or_else(|| tz.current_year());

    let daily = aggregator.aggregate_daily(&records);
    let totals = RecapAggregator::calculate_totals(&daily);

    let metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339(),
        timezone: tz.name().to_string(),
        reference_year,
        first_conversation: records.first().map(|r| r.created_at),
        last_conversation: records.last().map(|r| r.created_at),
        load_time_seconds: 0.0,
        transform_time_seconds: 0.0,
    };

    let mut report = RecapReport {
        metadata,
        extraction: extraction.stats,
        totals,
        message_stats: MessageStats::from_counts(records.iter().map(|r| r.message_count)),
        monthly: aggregator.aggregate_monthly(&records),
        yearly: aggregator.aggregate_yearly(&records),
        models: RecapAggregator::model_distribution(&records),
        year_in_review: aggregator.year_comparison(&records, reference_year),
        monthly_comparison: aggregator.monthly_comparison(&records, reference_year),
        daily,
        records,
    };
    report.metadata.transform_time_seconds = transform_start.elapsed().as_secs_f64();
    report
}

// ── Tests ─────────────────────────────────────────────────────────────────────
