//! Mood scoring
//!
//! Maps categorical mood labels onto an ordinal valence scale in [-2, 2].
//! The scale is a ranking convenience for the analyzers, not a clinical
//! measure.

use crate::types::JournalEntry;

/// Known mood vocabulary and its ordinal score
pub const MOOD_SCORES: [(&str, i32); 6] = [
    ("anxious", -2),
    ("rushed", -1),
    ("tired", -1),
    ("focused", 1),
    ("grateful", 1),
    ("peaceful", 2),
];

/// Score a mood label, case-insensitively. Unknown labels score 0.
pub fn score_mood(label: &str) -> i32 {
    let label = label.trim();
    MOOD_SCORES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(label))
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

/// Scores of the mood-bearing entries, oldest first.
///
/// Entries without a mood or with an unparseable timestamp are skipped.
pub fn chronological_scores(entries: &[JournalEntry]) -> Vec<i32> {
    let mut scored: Vec<_> = entries
        .iter()
        .filter_map(|entry| {
            let instant = entry.created_instant()?;
            let label = entry.mood_label()?;
            Some((instant, score_mood(&label)))
        })
        .collect();

    scored.sort_by_key(|(instant, _)| *instant);
    scored.into_iter().map(|(_, score)| score).collect()
}
