//! Signal normalisers mapping raw metrics into [0, 1].

use chrono::{DateTime, Utc};

/// Recency half-life in days: a month-old issue scores 0.5.
const RECENCY_HALF_LIFE_DAYS: f64 = 30.0;

/// Workflow states ranked by how actionable they are.
pub fn normalize_status(status: &str) -> f64 {
    match status {
        "open" => 1.0,
        "in_progress" => 0.9,
        "blocked" => 0.3,
        "closed" => 0.05,
        _ => 0.5,
    }
}

/// Priority 0 (most urgent) -> 1.0, priority 4 -> 0.0. Out-of-range
/// values normalise to a neutral 0.5.
pub fn normalize_priority(priority: i64) -> f64 {
    if !(0..=4).contains(&priority) {
        return 0.5;
    }
    (4 - priority) as f64 / 4.0
}

/// Share of the snapshot-wide maximum blocker count, clamped.
pub fn normalize_impact(blocker_count: usize, max_blocker_count: usize) -> f64 {
    if max_blocker_count == 0 {
        return 0.0;
    }
    (blocker_count as f64 / max_blocker_count as f64).clamp(0.0, 1.0)
}

/// Exponential decay with a 30-day half-life. Unknown timestamps score
/// a neutral 0.5; future timestamps clamp to 1.0.
pub fn normalize_recency(updated_at: Option<DateTime<Utc>>) -> f64 {
    let Some(updated_at) = updated_at else {
        return 0.5;
    };
    let age = Utc::now().signed_duration_since(updated_at);
    let age_days = age.num_seconds() as f64 / 86_400.0;
    if age_days <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(age_days / RECENCY_HALF_LIFE_DAYS).clamp(0.0, 1.0)
}
