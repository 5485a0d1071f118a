use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Label used for conversations whose export entry names no model.
pub const UNKNOWN_MODEL: &str = "unknown";

/// Metadata for one conversation extracted from an export entry.
///
/// Message bodies are never carried here; only the size of the message
/// mapping survives extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Conversation identifier (`conversation_id`, or `id` as a fallback).
    pub id: String,
    /// UTC creation time of the conversation.
    pub created_at: DateTime<Utc>,
    /// User-visible title, if the export carried one.
    #[serde(default)]
    pub title: Option<String>,
    /// Number of nodes in the conversation's message mapping.
    #[serde(default)]
    pub message_count: u64,
    /// Raw default model slug, e.g. `"gpt-4o"`.
    #[serde(default)]
    pub model: Option<String>,
    /// Whether the conversation was held in voice mode.
    #[serde(default)]
    pub voice: bool,
}

impl ConversationRecord {
    /// Normalised model name used as the distribution key.
    pub fn model_key(&self) -> String {
        match self.model.as_deref().map(normalize_model_name) {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_MODEL.to_string(),
        }
    }
}

fn date_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-(\d{4}-\d{2}-\d{2}|\d{8})$").expect("regex is valid"))
}

/// Fold a model slug into the key used for per-model aggregation.
///
/// * Surrounding whitespace is trimmed and the slug is lowercased.
/// * A trailing release-date suffix (`-2024-05-13` or `-20240513`) is removed.
/// * Empty input → `""`.
///
/// # Examples
///
/// ```
/// use recap_core::models::normalize_model_name;
///
/// assert_eq!(normalize_model_name("gpt-4o-2024-05-13"), "gpt-4o");
/// assert_eq!(normalize_model_name("GPT-4"), "gpt-4");
/// assert_eq!(normalize_model_name("o1-preview"), "o1-preview");
/// ```
pub fn normalize_model_name(model: &str) -> String {
    let lower = model.trim().to_lowercase();
    if lower.is_empty() {
        return lower;
    }
    date_suffix_re().replace(&lower, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(model: Option<&str>) -> ConversationRecord {
        ConversationRecord {
            id: "c1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            title: Some("Trip planning".to_string()),
            message_count: 4,
            model: model.map(str::to_string),
            voice: false,
        }
    }

    // ── normalize_model_name ─────────────────────────────────────────────────

    #[test]
    fn test_normalize_strips_dashed_date() {
        assert_eq!(normalize_model_name("gpt-4o-2024-08-06"), "gpt-4o");
    }

    #[test]
    fn test_normalize_strips_compact_date() {
        assert_eq!(normalize_model_name("gpt-4-0613-20230613"), "gpt-4-0613");
    }

    #[test]
    fn test_normalize_keeps_short_numeric_suffix() {
        assert_eq!(normalize_model_name("gpt-4-0613"), "gpt-4-0613");
    }

    #[test]
    fn test_normalize_lowercases_and_trims() {
        assert_eq!(normalize_model_name("  GPT-4o-Mini "), "gpt-4o-mini");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_model_name(""), "");
        assert_eq!(normalize_model_name("   "), "");
    }

    // ── model_key ────────────────────────────────────────────────────────────

    #[test]
    fn test_model_key_normalises() {
        assert_eq!(record(Some("GPT-4o-2024-05-13")).model_key(), "gpt-4o");
    }

    #[test]
    fn test_model_key_unknown_when_missing_or_blank() {
        assert_eq!(record(None).model_key(), UNKNOWN_MODEL);
        assert_eq!(record(Some("")).model_key(), UNKNOWN_MODEL);
    }

    #[test]
    fn test_record_serializes_without_content() {
        let value = serde_json::to_value(record(Some("gpt-4"))).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert!(!keys.contains(&"mapping"));
        assert!(keys.contains(&"message_count"));
    }
}
