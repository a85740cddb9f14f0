//! Cadence analysis
//!
//! Summarizes how regularly check-ins land across the days of a window.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::types::JournalEntry;

/// Gap statistics across a window's active days
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CadenceStats {
    pub active_days: usize,
    /// Mean gap in whole days between consecutive active days
    pub avg_gap: f64,
    /// Mean absolute deviation of the gaps from `avg_gap`
    pub variance: f64,
}

/// Distinct calendar days with at least one entry, in order
pub fn active_days(entries: &[JournalEntry]) -> BTreeSet<NaiveDate> {
    entries.iter().filter_map(JournalEntry::day_key).collect()
}

/// Analyze gap regularity, `None` below `min_active_days` distinct days
pub fn analyze_cadence(days: &BTreeSet<NaiveDate>, min_active_days: usize) -> Option<CadenceStats> {
    if days.len() < min_active_days.max(2) {
        return None;
    }

    let ordered: Vec<&NaiveDate> = days.iter().collect();
    let gaps: Vec<f64> = ordered
        .windows(2)
        .map(|pair| (*pair[1] - *pair[0]).num_days() as f64)
        .collect();

    let avg_gap = mean(&gaps);
    let deviations: Vec<f64> = gaps.iter().map(|gap| (gap - avg_gap).abs()).collect();

    Some(CadenceStats {
        active_days: days.len(),
        avg_gap,
        variance: mean(&deviations),
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(list: &[(i32, u32, u32)]) -> BTreeSet<NaiveDate> {
        list.iter()
            .map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
            .collect()
    }

    #[test]
    fn test_two_days_is_not_enough() {
        let even = days(&[(2024, 3, 10), (2024, 3, 12)]);
        assert_eq!(analyze_cadence(&even, 3), None);
    }

    #[test]
    fn test_even_gaps_have_zero_variance() {
        let stats = analyze_cadence(&days(&[(2024, 3, 8), (2024, 3, 10), (2024, 3, 12)]), 3).unwrap();
        assert_eq!(stats.active_days, 3);
        assert!((stats.avg_gap - 2.0).abs() < 1e-9);
        assert!(stats.variance.abs() < 1e-9);
    }

    #[test]
    fn test_mean_absolute_deviation() {
        // gaps 1, 1, 1, 2 -> mean 1.25, deviations .25 .25 .25 .75
        let stats = analyze_cadence(
            &days(&[(2024, 3, 8), (2024, 3, 9), (2024, 3, 10), (2024, 3, 11), (2024, 3, 13)]),
            3,
        )
        .unwrap();
        assert!((stats.avg_gap - 1.25).abs() < 1e-9);
        assert!((stats.variance - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_scattered_gaps() {
        // gaps 1, 5 -> mean 3, deviation 2
        let stats = analyze_cadence(&days(&[(2024, 3, 1), (2024, 3, 2), (2024, 3, 7)]), 3).unwrap();
        assert!((stats.variance - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_active_days_dedupes_same_day_entries() {
        let entries = vec![
            JournalEntry::with_id("a", "2024-03-10T08:00:00Z", ""),
            JournalEntry::with_id("b", "2024-03-10T20:00:00Z", ""),
            JournalEntry::with_id("c", "2024-03-11T08:00:00Z", ""),
            JournalEntry::with_id("d", "garbage", ""),
        ];
        assert_eq!(active_days(&entries).len(), 2);
    }
}
