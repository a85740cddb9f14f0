//! Signal aggregation
//!
//! Runs the cadence, mood, and volatility analyzers over a pair of week
//! windows and folds their outputs into a discrete, ordered signal set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::cadence::{active_days, analyze_cadence, CadenceStats};
use crate::config::InsightConfig;
use crate::mood::chronological_scores;
use crate::types::{JournalEntry, WeeklyMetrics};
use crate::volatility::{average_delta, count_recoveries, volatility};

/// A named condition derived from the analyzers.
///
/// Declaration order is the canonical ordering of a [`SignalSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    SteadyCadence,
    ScatteredCadence,
    RecoveryPresent,
    HighVariation,
    SundayAnchor,
    GrowingSteadiness,
    RisingStrain,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SteadyCadence => "steady_cadence",
            Self::ScatteredCadence => "scattered_cadence",
            Self::RecoveryPresent => "recovery_present",
            Self::HighVariation => "high_variation",
            Self::SundayAnchor => "sunday_anchor",
            Self::GrowingSteadiness => "growing_steadiness",
            Self::RisingStrain => "rising_strain",
        }
    }
}

/// De-duplicated, ordered set of signals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet(BTreeSet<Signal>);

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, signal: Signal) {
        self.0.insert(signal);
    }

    pub fn contains(&self, signal: Signal) -> bool {
        self.0.contains(&signal)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Signal> {
        self.iter().collect()
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Most frequent mood label of a week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DominantMood {
    /// Lower-cased label
    pub label: String,
    pub count: usize,
}

/// Everything the narrative composer needs to know about a week
#[derive(Debug, Clone, PartialEq)]
pub struct WeekAnalysis {
    pub metrics: WeeklyMetrics,
    pub cadence: Option<CadenceStats>,
    pub volatility: Option<f64>,
    pub recoveries: usize,
    pub average_delta: Option<f64>,
    /// Most frequent mood, regardless of whether it clears the minimum count
    pub dominant_mood: Option<DominantMood>,
    pub signals: SignalSet,
}

/// Analyze the current week against the previous one
pub fn analyze_week(
    current: &[JournalEntry],
    previous: &[JournalEntry],
    config: &InsightConfig,
) -> WeekAnalysis {
    let current_days = active_days(current);
    let previous_days = active_days(previous);
    let current_scores = chronological_scores(current);
    let previous_scores = chronological_scores(previous);

    let cadence = analyze_cadence(&current_days, config.cadence_min_active_days);
    let volatility = volatility(&current_scores);
    let recoveries = count_recoveries(&current_scores);
    let delta = average_delta(
        &current_scores,
        &previous_scores,
        config.previous_min_scored,
    );
    let sunday_links = current.iter().filter(|e| e.has_sermon_link()).count();

    let mut signals = SignalSet::new();

    if let Some(stats) = cadence {
        if stats.active_days >= config.steady_min_active_days
            && stats.variance <= config.steady_variance_max
        {
            signals.insert(Signal::SteadyCadence);
        }
        if stats.variance >= config.scattered_variance_min {
            signals.insert(Signal::ScatteredCadence);
        }
    }
    if recoveries >= 1 {
        signals.insert(Signal::RecoveryPresent);
    }
    if volatility.is_some_and(|v| v >= config.high_variation_min) {
        signals.insert(Signal::HighVariation);
    }
    if sunday_links >= config.sunday_anchor_min_links {
        signals.insert(Signal::SundayAnchor);
    }
    if let Some(delta) = delta {
        if delta >= config.week_delta_threshold {
            signals.insert(Signal::GrowingSteadiness);
        } else if delta <= -config.week_delta_threshold {
            signals.insert(Signal::RisingStrain);
        }
    }

    let metrics = WeeklyMetrics {
        entries_this_week: current.len(),
        active_days: current_days.len(),
        previous_active_days: previous_days.len(),
        mood_entries: current_scores.len(),
        sunday_links,
    };

    debug!(
        entries = metrics.entries_this_week,
        active_days = metrics.active_days,
        signals = signals.len(),
        "Analyzed week"
    );

    WeekAnalysis {
        metrics,
        cadence,
        volatility,
        recoveries,
        average_delta: delta,
        dominant_mood: dominant_mood(current),
        signals,
    }
}

/// Most frequent mood label; ties go to the label seen first, oldest entry first
pub fn dominant_mood(entries: &[JournalEntry]) -> Option<DominantMood> {
    let mut labelled: Vec<_> = entries
        .iter()
        .filter_map(|entry| Some((entry.created_instant()?, entry.mood_label()?)))
        .collect();
    labelled.sort_by_key(|(instant, _)| *instant);

    // Insertion-ordered tally
    let mut tally: Vec<(String, usize)> = Vec::new();
    for (_, label) in labelled {
        match tally.iter_mut().find(|(known, _)| *known == label) {
            Some((_, count)) => *count += 1,
            None => tally.push((label, 1)),
        }
    }

    let mut best: Option<(String, usize)> = None;
    for (label, count) in tally {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((label, count));
        }
    }

    best.map(|(label, count)| DominantMood { label, count })
}
