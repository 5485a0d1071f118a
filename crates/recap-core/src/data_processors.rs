use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses timestamps from the formats found in conversation exports.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Attempt to parse a [`serde_json::Value`] into a UTC [`DateTime`].
    ///
    /// Handles:
    /// * `null`       → `None`
    /// * JSON number  → Unix timestamp (integer or float seconds), the form
    ///   used by `create_time` in ChatGPT exports.
    /// * JSON string  → ISO 8601 / RFC 3339 (including `Z`-suffix), a numeric
    ///   string of Unix seconds, or common date-time patterns.
    pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Null => None,
            Value::String(s) => Self::parse_str(s.trim()),
            Value::Number(n) => {
                if let Some(secs) = n.as_i64() {
                    DateTime::from_timestamp(secs, 0)
                } else {
                    n.as_f64().and_then(Self::from_float_secs)
                }
            }
            _ => None,
        }
    }

    fn from_float_secs(f: f64) -> Option<DateTime<Utc>> {
        if !f.is_finite() {
            return None;
        }
        let secs = f.floor();
        let nanos = ((f - secs) * 1_000_000_000.0).round() as u32;
        // Rounding can push a fraction like .9999999999 up to a full second.
        if nanos >= 1_000_000_000 {
            return DateTime::from_timestamp(secs as i64 + 1, 0);
        }
        DateTime::from_timestamp(secs as i64, nanos)
    }

    fn parse_str(s: &str) -> Option<DateTime<Utc>> {
        if s.is_empty() {
            return None;
        }

        if let Ok(f) = s.parse::<f64>() {
            return Self::from_float_secs(f);
        }

        // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];

        for fmt in FORMATS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&naive));
        }

        debug!(
            "TimestampProcessor: could not parse timestamp string \"{}\"",
            s
        );
        None
    }
}

// ── FieldLookup ───────────────────────────────────────────────────────────────

/// Lookups over alternative key spellings in a raw JSON entry.
pub struct FieldLookup;

impl FieldLookup {
    /// First value among `keys` that is present and not `null`.
    pub fn first<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|&key| obj.get(key))
            .find(|v| !v.is_null())
    }

    /// First non-blank string among `keys`.
    ///
    /// Integer ids are accepted and rendered as strings.
    pub fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
        for &key in keys {
            match obj.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
                Some(Value::Number(n)) if n.is_i64() || n.is_u64() => return Some(n.to_string()),
                _ => {}
            }
        }
        None
    }

    /// Number of entries in a JSON object or array stored under `key`.
    ///
    /// Returns `0` when the key is absent or holds a scalar.
    pub fn len_of(obj: &Value, key: &str) -> u64 {
        match obj.get(key) {
            Some(Value::Object(map)) => map.len() as u64,
            Some(Value::Array(arr)) => arr.len() as u64,
            _ => 0,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
