//! Metadata extraction from raw export entries.
//!
//! Turns each conversation object into a [`ConversationRecord`], keeping only
//! identifiers, timestamps, titles, model slugs and counts. Message bodies in
//! the `mapping` object are counted, never copied.

use std::cmp::Ordering;

use recap_core::data_processors::{FieldLookup, TimestampProcessor};
use recap_core::error::FieldError;
use recap_core::models::ConversationRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

const ID_KEYS: &[&str] = &["conversation_id", "id"];
const CREATED_KEYS: &[&str] = &["create_time"];
const MODEL_KEYS: &[&str] = &["default_model_slug"];

/// Counters describing one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Entries present in the export.
    pub total_entries: usize,
    /// Records successfully extracted.
    pub extracted: usize,
    /// Entries dropped because of a [`FieldError`].
    pub skipped: usize,
    /// Entries dropped because their id was already extracted.
    pub duplicates: usize,
}

/// Output of [`extract_records`].
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Valid records, sorted by `(created_at, id)`.
    pub records: Vec<ConversationRecord>,
    pub stats: ExtractionStats,
}

/// Extract the metadata of a single export entry.
pub fn extract_record(entry: &Value) -> Result<ConversationRecord, FieldError> {
    if !entry.is_object() {
        return Err(FieldError::NotAnObject);
    }

    let id = FieldLookup::first_string(entry, ID_KEYS)
        .ok_or(FieldError::MissingField("conversation_id"))?;

    let created_raw =
        FieldLookup::first(entry, CREATED_KEYS).ok_or(FieldError::MissingField("create_time"))?;
    let created_at =
        TimestampProcessor::parse(created_raw).ok_or_else(|| FieldError::InvalidField {
            field: "create_time",
            reason: format!("unrecognised timestamp {}", created_raw),
        })?;

    let title = entry
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let model = FieldLookup::first_string(entry, MODEL_KEYS);
    let voice = entry.get("voice").is_some_and(|v| !v.is_null());

    Ok(ConversationRecord {
        id,
        created_at,
        title,
        message_count: FieldLookup::len_of(entry, "mapping"),
        model,
        voice,
    })
}

/// Extract every entry, skipping bad and duplicate ones.
///
/// A [`FieldError`] is logged and counted; it never aborts the pass. Among
/// entries sharing an id the earliest copy is kept, with remaining ties broken
/// by content. The survivor is independent of entry order.
pub fn extract_records(entries: &[Value]) -> Extraction {
    let mut candidates: Vec<ConversationRecord> = Vec::with_capacity(entries.len());
    let mut stats = ExtractionStats {
        total_entries: entries.len(),
        ..Default::default()
    };

    for (index, entry) in entries.iter().enumerate() {
        match extract_record(entry) {
            Ok(record) => candidates.push(record),
            Err(e) => {
                warn!("Skipping entry {}: {}", index, e);
                stats.skipped += 1;
            }
        }
    }

    candidates.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| content_order(a, b)));

    let mut out = Extraction {
        records: Vec::with_capacity(candidates.len()),
        stats,
    };
    for record in candidates {
        if out.records.last().is_some_and(|kept| kept.id == record.id) {
            debug!("Dropping duplicate conversation id {}", record.id);
            out.stats.duplicates += 1;
        } else {
            out.records.push(record);
        }
    }

    out.records
        .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    out.stats.extracted = out.records.len();

    debug!(
        "Extraction: {} entries, {} extracted, {} skipped, {} duplicates",
        out.stats.total_entries, out.stats.extracted, out.stats.skipped, out.stats.duplicates
    );

    out
}

/// Total order over everything but the id.
fn content_order(a: &ConversationRecord, b: &ConversationRecord) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.message_count.cmp(&b.message_count))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.model.cmp(&b.model))
        .then_with(|| a.voice.cmp(&b.voice))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
