use serde::{Deserialize, Serialize};

// ── Percentile helper ─────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using linear
/// interpolation between closest ranks (NumPy's default method).
///
/// Returns `0.0` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    match sorted_data {
        [] => 0.0,
        [only] => *only,
        _ => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted_data.len() - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
        }
    }
}

/// Arithmetic mean, `0.0` when `count` is zero.
pub fn mean(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

// ── MessageStats ──────────────────────────────────────────────────────────────

/// Distribution of messages-per-conversation over a set of conversations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageStats {
    pub total: u64,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
    pub min: u64,
    pub max: u64,
}

impl MessageStats {
    /// Summarise per-conversation message counts. Input order is irrelevant.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let mut sorted: Vec<u64> = counts.into_iter().collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_unstable();

        let total: u64 = sorted.iter().sum();
        let as_f64: Vec<f64> = sorted.iter().map(|&c| c as f64).collect();

        Self {
            total,
            mean: mean(total, sorted.len() as u64),
            median: percentile(&as_f64, 50.0),
            p90: percentile(&as_f64, 90.0),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}
