//! Conversation aggregation over day, month, year and model buckets.
//!
//! All maps are ordered (`BTreeMap`), so the output depends only on
//! the set of records passed in, never on their order.

use std::collections::BTreeMap;

use recap_core::formatting::{percent_change, percentage};
use recap_core::models::ConversationRecord;
use recap_core::statistics::mean;
use recap_core::time_utils::{month_name, TimezoneHandler};
use serde::{Deserialize, Serialize};

// ── BucketStats ───────────────────────────────────────────────────────────────

/// Counts accumulated across the conversations of one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub conversations: u64,
    pub messages: u64,
    pub voice_conversations: u64,
    /// `messages / conversations`, kept current by [`BucketStats::add_record`].
    pub mean_messages: f64,
}

impl BucketStats {
    /// Add a single record's counts to the running totals.
    pub fn add_record(&mut self, record: &ConversationRecord) {
        self.conversations += 1;
        self.messages += record.message_count;
        if record.voice {
            self.voice_conversations += 1;
        }
        self.mean_messages = mean(self.messages, self.conversations);
    }

    fn merge(&mut self, other: &BucketStats) {
        self.conversations += other.conversations;
        self.messages += other.messages;
        self.voice_conversations += other.voice_conversations;
        self.mean_messages = mean(self.messages, self.conversations);
    }
}

// ── AggregateBucket ───────────────────────────────────────────────────────────

/// All conversations within one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    /// `"2024-01-15"` (daily), `"2024-01"` (monthly) or `"2024"` (yearly).
    pub key: String,
    pub stats: BucketStats,
    /// Conversations per normalised model name.
    pub models: BTreeMap<String, u64>,
}

impl AggregateBucket {
    fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            stats: BucketStats::default(),
            models: BTreeMap::new(),
        }
    }

    fn add_record(&mut self, record: &ConversationRecord) {
        self.stats.add_record(record);
        *self.models.entry(record.model_key()).or_default() += 1;
    }
}

// ── ModelShare ────────────────────────────────────────────────────────────────

/// One row of the per-model distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelShare {
    pub model: String,
    pub conversations: u64,
    pub messages: u64,
    /// Share of all conversations, in percent with two decimals.
    pub share_percent: f64,
}

// ── Year in review ────────────────────────────────────────────────────────────

/// Headline numbers for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    pub conversations: u64,
    pub messages: u64,
    pub average_messages: f64,
    pub voice_conversations: u64,
}

/// A year compared against the year before it.
///
/// Each `*_change` is a percentage, absent when the previous year's value is
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearComparison {
    pub current: YearSummary,
    pub previous: YearSummary,
    pub conversations_change: Option<f64>,
    pub average_messages_change: Option<f64>,
    pub voice_conversations_change: Option<f64>,
}

/// Conversations in one calendar month for the reference and previous year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthComparison {
    /// `1..=12`
    pub month: u32,
    pub month_name: String,
    pub current: u64,
    pub previous: u64,
}

// ── RecapAggregator ───────────────────────────────────────────────────────────

/// Groups conversation records into buckets in a fixed timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecapAggregator {
    tz: TimezoneHandler,
}

impl RecapAggregator {
    pub fn new(tz: TimezoneHandler) -> Self {
        Self { tz }
    }

    /// Aggregate by local calendar day. Key format: `"%Y-%m-%d"`, ascending.
    pub fn aggregate_daily(&self, records: &[ConversationRecord]) -> Vec<AggregateBucket> {
        Self::aggregate_by(records, |r| self.tz.day_key(r.created_at))
    }

    /// Aggregate by local calendar month. Key format: `"%Y-%m"`, ascending.
    pub fn aggregate_monthly(&self, records: &[ConversationRecord]) -> Vec<AggregateBucket> {
        Self::aggregate_by(records, |r| self.tz.month_key(r.created_at))
    }

    /// Aggregate by local calendar year. Key format: `"%Y"`, ascending.
    pub fn aggregate_yearly(&self, records: &[ConversationRecord]) -> Vec<AggregateBucket> {
        Self::aggregate_by(records, |r| format!("{:04}", self.tz.year_of(r.created_at)))
    }

    /// Per-model distribution, most used first; equal counts in lexical order.
    pub fn model_distribution(records: &[ConversationRecord]) -> Vec<ModelShare> {
        let mut by_model: BTreeMap<String, BucketStats> = BTreeMap::new();
        for record in records {
            by_model.entry(record.model_key()).or_default().add_record(record);
        }

        let total = records.len() as f64;
        let mut shares: Vec<ModelShare> = by_model
            .into_iter()
            .map(|(model, stats)| ModelShare {
                model,
                conversations: stats.conversations,
                messages: stats.messages,
                share_percent: percentage(stats.conversations as f64, total, 2),
            })
            .collect();

        // Stable sort keeps the BTreeMap's lexical order among equal counts.
        shares.sort_by(|a, b| b.conversations.cmp(&a.conversations));
        shares
    }

    /// Sum the stats of all buckets into one [`BucketStats`].
    pub fn calculate_totals(buckets: &[AggregateBucket]) -> BucketStats {
        let mut totals = BucketStats::default();
        for bucket in buckets {
            totals.merge(&bucket.stats);
        }
        totals
    }

    /// Headline numbers for the local calendar year `year`.
    pub fn year_summary(&self, records: &[ConversationRecord], year: i32) -> YearSummary {
        let mut stats = BucketStats::default();
        records
            .iter()
            .filter(|r| self.tz.year_of(r.created_at) == year)
            .for_each(|r| stats.add_record(r));

        YearSummary {
            year,
            conversations: stats.conversations,
            messages: stats.messages,
            average_messages: stats.mean_messages,
            voice_conversations: stats.voice_conversations,
        }
    }

    /// Compare `year` against `year - 1`.
    pub fn year_comparison(&self, records: &[ConversationRecord], year: i32) -> YearComparison {
        let current = self.year_summary(records, year);
        let previous = self.year_summary(records, year.saturating_sub(1));

        YearComparison {
            conversations_change: percent_change(
                current.conversations as f64,
                previous.conversations as f64,
            ),
            average_messages_change: percent_change(
                current.average_messages,
                previous.average_messages,
            ),
            voice_conversations_change: percent_change(
                current.voice_conversations as f64,
                previous.voice_conversations as f64,
            ),
            current,
            previous,
        }
    }

    /// Month-by-month conversation counts for `year` and `year - 1`.
    ///
    /// Always returns twelve rows in calendar order.
    pub fn monthly_comparison(
        &self,
        records: &[ConversationRecord],
        year: i32,
    ) -> Vec<MonthComparison> {
        let mut current = [0u64; 12];
        let mut previous = [0u64; 12];

        for record in records {
            let local_year = self.tz.year_of(record.created_at);
            let slot = (self.tz.month_of(record.created_at) - 1) as usize;
            if local_year == year {
                current[slot] += 1;
            } else if local_year == year.saturating_sub(1) {
                previous[slot] += 1;
            }
        }

        (1..=12u32)
            .map(|month| MonthComparison {
                month,
                month_name: month_name(month).to_string(),
                current: current[(month - 1) as usize],
                previous: previous[(month - 1) as usize],
            })
            .collect()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn aggregate_by(
        records: &[ConversationRecord],
        key_fn: impl Fn(&ConversationRecord) -> String,
    ) -> Vec<AggregateBucket> {
        let mut map: BTreeMap<String, AggregateBucket> = BTreeMap::new();

        for record in records {
            let key = key_fn(record);
            map.entry(key.clone())
                .or_insert_with(|| AggregateBucket::new(key))
                .add_record(record);
        }

        map.into_values().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn make_record(id: &str, ts: &str, messages: u64, model: Option<&str>) -> ConversationRecord {
        ConversationRecord {
            id: id.to_string(),
            created_at: DateTime::parse_from_rfc3339(ts)
                .unwrap()
                .with_timezone(&Utc),
            title: None,
            message_count: messages,
            model: model.map(str::to_string),
            voice: false,
        }
    }

    fn voice(mut record: ConversationRecord) -> ConversationRecord {
        record.voice = true;
        record
    }

    fn utc() -> RecapAggregator {
        RecapAggregator::new(TimezoneHandler::utc())
    }

    // ── aggregate_daily ───────────────────────────────────────────────────────

    #[test]
    fn test_daily_three_records_same_day() {
        let records = vec![
            make_record("a", "2024-01-15T08:00:00Z", 4, Some("gpt-4o")),
            make_record("b", "2024-01-15T12:00:00Z", 6, Some("gpt-4o")),
            make_record("c", "2024-01-15T23:59:59Z", 2, Some("gpt-4")),
        ];
        let days = utc().aggregate_daily(&records);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].key, "2024-01-15");
        assert_eq!(days[0].stats.conversations, 3);
        assert_eq!(days[0].stats.messages, 12);
        assert!((days[0].stats.mean_messages - 4.0).abs() < 1e-9);
        assert_eq!(days[0].models.get("gpt-4o"), Some(&2));
        assert_eq!(days[0].models.get("gpt-4"), Some(&1));
    }

    #[test]
    fn test_daily_sorted_by_date() {
        let records = vec![
            make_record("a", "2024-01-20T08:00:00Z", 1, None),
            make_record("b", "2024-01-10T08:00:00Z", 1, None),
            make_record("c", "2024-01-15T08:00:00Z", 1, None),
        ];
        let keys: Vec<String> = utc()
            .aggregate_daily(&records)
            .into_iter()
            .map(|b| b.key)
            .collect();
        assert_eq!(keys, vec!["2024-01-10", "2024-01-15", "2024-01-20"]);
    }

    #[test]
    fn test_daily_uses_configured_timezone() {
        let records = vec![make_record("a", "2024-01-01T03:00:00Z", 1, None)];
        let ny = RecapAggregator::new(TimezoneHandler::new("America/New_York"));
        assert_eq!(ny.aggregate_daily(&records)[0].key, "2023-12-31");
    }

    #[test]
    fn test_daily_empty() {
        assert!(utc().aggregate_daily(&[]).is_empty());
    }

    // ── aggregate_monthly / aggregate_yearly ──────────────────────────────────

    #[test]
    fn test_monthly_groups_by_month() {
        let records = vec![
            make_record("a", "2024-01-05T08:00:00Z", 3, None),
            make_record("b", "2024-01-20T08:00:00Z", 5, None),
            make_record("c", "2024-02-01T08:00:00Z", 7, None),
        ];
        let months = utc().aggregate_monthly(&records);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].key, "2024-01");
        assert_eq!(months[0].stats.conversations, 2);
        assert_eq!(months[1].key, "2024-02");
        assert_eq!(months[1].stats.messages, 7);
    }

    #[test]
    fn test_yearly_groups_by_year() {
        let records = vec![
            make_record("a", "2023-12-31T08:00:00Z", 1, None),
            make_record("b", "2024-01-01T08:00:00Z", 1, None),
            voice(make_record("c", "2024-06-01T08:00:00Z", 1, None)),
        ];
        let years = utc().aggregate_yearly(&records);

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].key, "2023");
        assert_eq!(years[1].key, "2024");
        assert_eq!(years[1].stats.conversations, 2);
        assert_eq!(years[1].stats.voice_conversations, 1);
    }

    #[test]
    fn test_aggregation_order_independent() {
        let records = vec![
            make_record("a", "2024-01-05T08:00:00Z", 3, Some("gpt-4o")),
            make_record("b", "2024-03-20T08:00:00Z", 5, Some("o1")),
            make_record("c", "2024-01-05T18:00:00Z", 7, None),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let agg = utc();
        assert_eq!(agg.aggregate_daily(&records), agg.aggregate_daily(&reversed));
        assert_eq!(agg.aggregate_monthly(&records), agg.aggregate_monthly(&reversed));
        assert_eq!(
            RecapAggregator::model_distribution(&records),
            RecapAggregator::model_distribution(&reversed)
        );
    }

    // ── calculate_totals ──────────────────────────────────────────────────────

    #[test]
    fn test_calculate_totals_matches_record_count() {
        let records = vec![
            make_record("a", "2024-01-15T08:00:00Z", 2, None),
            make_record("b", "2024-01-16T08:00:00Z", 4, None),
            voice(make_record("c", "2024-02-17T08:00:00Z", 6, None)),
        ];
        let totals = RecapAggregator::calculate_totals(&utc().aggregate_daily(&records));

        assert_eq!(totals.conversations, records.len() as u64);
        assert_eq!(totals.messages, 12);
        assert_eq!(totals.voice_conversations, 1);
        assert!((totals.mean_messages - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_totals_empty() {
        assert_eq!(RecapAggregator::calculate_totals(&[]), BucketStats::default());
    }

    // ── model_distribution ────────────────────────────────────────────────────

    #[test]
    fn test_model_distribution_sorted_with_lexical_ties() {
        let records = vec![
            make_record("a", "2024-01-15T08:00:00Z", 1, Some("gpt-4o-2024-05-13")),
            make_record("b", "2024-01-15T09:00:00Z", 1, Some("gpt-4o")),
            make_record("c", "2024-01-15T10:00:00Z", 1, Some("o1")),
            make_record("d", "2024-01-15T11:00:00Z", 1, Some("gpt-4")),
            make_record("e", "2024-01-15T12:00:00Z", 1, None),
        ];
        let dist = RecapAggregator::model_distribution(&records);
        let names: Vec<&str> = dist.iter().map(|m| m.model.as_str()).collect();

        assert_eq!(names, vec!["gpt-4o", "gpt-4", "o1", "unknown"]);
        assert_eq!(dist[0].conversations, 2);
        assert!((dist[0].share_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_model_distribution_empty() {
        assert!(RecapAggregator::model_distribution(&[]).is_empty());
    }

    // ── year_comparison ───────────────────────────────────────────────────────

    #[test]
    fn test_year_comparison_changes() {
        let records = vec![
            make_record("p1", "2023-03-01T08:00:00Z", 4, None),
            voice(make_record("p2", "2023-07-01T08:00:00Z", 6, None)),
            make_record("c1", "2024-01-01T08:00:00Z", 10, None),
            voice(make_record("c2", "2024-02-01T08:00:00Z", 2, None)),
            voice(make_record("c3", "2024-03-01T08:00:00Z", 3, None)),
        ];
        let cmp = utc().year_comparison(&records, 2024);

        assert_eq!(cmp.current.conversations, 3);
        assert_eq!(cmp.previous.conversations, 2);
        assert!((cmp.conversations_change.unwrap() - 50.0).abs() < 1e-9);
        // 5.0 avg this year vs 5.0 last year.
        assert!(cmp.average_messages_change.unwrap().abs() < 1e-9);
        assert!((cmp.voice_conversations_change.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_year_comparison_no_previous_year() {
        let records = vec![make_record("c1", "2024-05-01T08:00:00Z", 3, None)];
        let cmp = utc().year_comparison(&records, 2024);

        assert_eq!(cmp.previous.conversations, 0);
        assert_eq!(cmp.previous.average_messages, 0.0);
        assert!(cmp.conversations_change.is_none());
        assert!(cmp.average_messages_change.is_none());
        assert!(cmp.voice_conversations_change.is_none());
    }

    // ── monthly_comparison ────────────────────────────────────────────────────

    #[test]
    fn test_monthly_comparison_twelve_rows() {
        let records = vec![
            make_record("a", "2023-01-10T08:00:00Z", 1, None),
            make_record("b", "2024-01-11T08:00:00Z", 1, None),
            make_record("c", "2024-01-12T08:00:00Z", 1, None),
            make_record("d", "2024-12-31T08:00:00Z", 1, None),
            make_record("old", "2021-01-01T08:00:00Z", 1, None),
        ];
        let rows = utc().monthly_comparison(&records, 2024);

        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].month_name, "January");
        assert_eq!(rows[0].current, 2);
        assert_eq!(rows[0].previous, 1);
        assert_eq!(rows[11].current, 1);
        assert_eq!(rows.iter().map(|r| r.current + r.previous).sum::<u64>(), 4);
    }

    #[test]
    fn test_comparisons_at_minimum_year_do_not_overflow() {
        let records = vec![make_record("a", "2024-01-10T08:00:00Z", 1, None)];
        let cmp = utc().year_comparison(&records, i32::MIN);
        assert_eq!(cmp.current.conversations, 0);
        assert_eq!(cmp.previous.conversations, 0);

        let rows = utc().monthly_comparison(&records, i32::MIN);
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.current == 0 && r.previous == 0));
    }
}
