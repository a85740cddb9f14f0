//! Volatility and recovery analysis
//!
//! Reductions over chronologically ordered mood scores. All of them are
//! defined for empty and single-element input.

/// Arithmetic mean, 0 for an empty slice
pub fn average(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    sum as f64 / scores.len() as f64
}

/// Mean absolute difference between consecutive scores.
///
/// `None` with fewer than two scores.
pub fn volatility(scores: &[i32]) -> Option<f64> {
    if scores.len() < 2 {
        return None;
    }
    // Integer sum keeps the mean exact at the threshold
    let total: i64 = scores
        .windows(2)
        .map(|pair| i64::from((pair[1] - pair[0]).abs()))
        .sum();
    Some(total as f64 / (scores.len() - 1) as f64)
}

/// Count one-step swings from negative (≤ -1) to positive (≥ +1) valence
pub fn count_recoveries(scores: &[i32]) -> usize {
    scores
        .windows(2)
        .filter(|pair| pair[0] <= -1 && pair[1] >= 1)
        .count()
}

/// Change in average score between two windows.
///
/// `None` unless the earlier window has enough scored entries to compare
/// against. A current window without scores averages to 0.
pub fn average_delta(current: &[i32], previous: &[i32], previous_min: usize) -> Option<f64> {
    if previous.len() < previous_min.max(1) {
        return None;
    }
    Some(average(current) - average(previous))
}
