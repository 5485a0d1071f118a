use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Converts UTC creation times into the calendar of the configured timezone.
///
/// Conversations are bucketed by the local date on which they were started,
/// so the same export can produce different daily keys in different zones.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// Handler for UTC.
    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Convert a UTC [`DateTime`] into the handler's timezone.
    pub fn to_local(&self, dt: DateTime<Utc>) -> DateTime<Tz> {
        dt.with_timezone(&self.tz)
    }

    /// Day bucket key, `"%Y-%m-%d"` in local time.
    pub fn day_key(&self, dt: DateTime<Utc>) -> String {
        self.to_local(dt).format("%Y-%m-%d").to_string()
    }

    /// Month bucket key, `"%Y-%m"` in local time.
    pub fn month_key(&self, dt: DateTime<Utc>) -> String {
        self.to_local(dt).format("%Y-%m").to_string()
    }

    /// Local calendar year.
    pub fn year_of(&self, dt: DateTime<Utc>) -> i32 {
        self.to_local(dt).year()
    }

    /// Local calendar month, `1..=12`.
    pub fn month_of(&self, dt: DateTime<Utc>) -> u32 {
        self.to_local(dt).month()
    }

    /// The current calendar year in this timezone.
    pub fn current_year(&self) -> i32 {
        self.year_of(Utc::now())
    }

    /// Render a timestamp for display, `"%Y-%m-%d %H:%M:%S"` in local time.
    pub fn format_local(&self, dt: DateTime<Utc>) -> String {
        self.to_local(dt).format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// IANA name of the configured timezone.
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }
}

impl Default for TimezoneHandler {
    fn default() -> Self {
        Self::utc()
    }
}

/// English month name for `month` in `1..=12`.
pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
        .unwrap_or("Unknown")
}
