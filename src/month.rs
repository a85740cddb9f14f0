//! Month-over-month comparison
//!
//! A reduced version of the weekly pass over month windows: active days,
//! average tone, and sunday anchor counts. No cadence analysis.

use tracing::debug;

use crate::cadence::active_days;
use crate::config::InsightConfig;
use crate::locale::{LocaleCatalog, Locale, TextResolver, Translate};
use crate::mood::chronological_scores;
use crate::types::{AnchorTrend, JournalEntry, MonthBranch, MonthComparison, MonthMetrics};
use crate::volatility::{average, average_delta};

/// Reduce two month windows to the figures the narrative compares
pub fn month_metrics(current: &[JournalEntry], previous: &[JournalEntry]) -> MonthMetrics {
    let current_scores = chronological_scores(current);
    let previous_scores = chronological_scores(previous);

    MonthMetrics {
        entries_this_month: current.len(),
        active_days: active_days(current).len(),
        previous_active_days: active_days(previous).len(),
        average_score: (!current_scores.is_empty()).then(|| average(&current_scores)),
        previous_average_score: (!previous_scores.is_empty()).then(|| average(&previous_scores)),
        sunday_links: current.iter().filter(|e| e.has_sermon_link()).count(),
        previous_sunday_links: previous.iter().filter(|e| e.has_sermon_link()).count(),
    }
}

/// Pick the primary month narrative, first match wins
pub fn select_month_branch(
    current: &[JournalEntry],
    previous: &[JournalEntry],
    metrics: &MonthMetrics,
    config: &InsightConfig,
) -> MonthBranch {
    if metrics.active_days >= metrics.previous_active_days + config.month_active_day_lead {
        return MonthBranch::MoreConsistent;
    }

    let delta = average_delta(
        &chronological_scores(current),
        &chronological_scores(previous),
        config.previous_min_scored,
    );
    match delta {
        Some(d) if d >= config.month_delta_threshold => MonthBranch::SteadierTone,
        Some(d) if d <= -config.month_delta_threshold => MonthBranch::HeavierMonth,
        _ => MonthBranch::GradualPractice,
    }
}

pub fn anchor_trend(metrics: &MonthMetrics) -> AnchorTrend {
    use std::cmp::Ordering;

    match metrics.sunday_links.cmp(&metrics.previous_sunday_links) {
        Ordering::Greater => AnchorTrend::More,
        Ordering::Less => AnchorTrend::Fewer,
        Ordering::Equal => AnchorTrend::Similar,
    }
}

/// Compare the current month against the aligned part of the previous one
pub fn compose_month<T: Translate + ?Sized>(
    current: &[JournalEntry],
    previous: &[JournalEntry],
    config: &InsightConfig,
    locale: Locale,
    translate: &T,
    catalog: &LocaleCatalog,
) -> MonthComparison {
    let resolver = TextResolver::new(translate, catalog, locale);
    let metrics = month_metrics(current, previous);
    let branch = select_month_branch(current, previous, &metrics, config);
    let trend = anchor_trend(&metrics);

    debug!(
        branch = branch.as_str(),
        anchor = trend.as_str(),
        active_days = metrics.active_days,
        previous_active_days = metrics.previous_active_days,
        "Selected month narrative"
    );

    let params = [
        ("days", metrics.active_days.to_string()),
        ("previous_days", metrics.previous_active_days.to_string()),
    ];
    let key = branch.as_str();

    MonthComparison {
        title_text: resolver.render(&format!("insights.monthly.{key}.title"), &params),
        body_text: resolver.render(&format!("insights.monthly.{key}.body"), &params),
        supporting_text: resolver.render(
            &format!("insights.monthly.anchor.{}", trend.as_str()),
            &[
                ("count", metrics.sunday_links.to_string()),
                ("previous", metrics.previous_sunday_links.to_string()),
            ],
        ),
        branch,
        anchor_trend: trend,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn on_days(prefix: &str, month: u32, days: &[u32], mood: Option<&str>) -> Vec<JournalEntry> {
        days.iter()
            .map(|d| {
                let entry = JournalEntry::with_id(
                    format!("{prefix}-{d}"),
                    format!("2024-{month:02}-{d:02}T09:00:00Z"),
                    "",
                );
                match mood {
                    Some(m) => entry.with_mood(m),
                    None => entry,
                }
            })
            .collect()
    }

    fn compose(current: &[JournalEntry], previous: &[JournalEntry]) -> MonthComparison {
        let catalog = LocaleCatalog::new();
        compose_month(
            current,
            previous,
            &InsightConfig::default(),
            Locale::En,
            &|key: &str| key.to_string(),
            &catalog,
        )
    }

    #[test]
    fn test_more_consistent_month() {
        let current = on_days("c", 3, &[1, 2, 3, 4, 5], Some("anxious"));
        let previous = on_days("p", 2, &[1, 2], Some("peaceful"));

        let result = compose(&current, &previous);
        // Active days outrank the heavier tone
        assert_eq!(result.branch, MonthBranch::MoreConsistent);
        assert_eq!(result.title_text, "A more consistent month");
        assert_eq!(
            result.body_text,
            "You checked in on 5 days this month, compared with 2 by this point last month."
        );
    }

    #[test]
    fn test_steadier_tone() {
        let current = on_days("c", 3, &[1, 2, 3], Some("peaceful"));
        let previous = on_days("p", 2, &[1, 2, 3], Some("tired"));
        assert_eq!(compose(&current, &previous).branch, MonthBranch::SteadierTone);
    }

    #[test]
    fn test_heavier_month() {
        let current = on_days("c", 3, &[1, 2], Some("anxious"));
        let previous = on_days("p", 2, &[1, 2], Some("focused"));
        assert_eq!(compose(&current, &previous).branch, MonthBranch::HeavierMonth);
    }

    #[test]
    fn test_small_tone_change_is_gradual() {
        let mut current = on_days("c", 3, &[1], Some("focused"));
        current.extend(on_days("d", 3, &[2], Some("grateful")));
        let previous = on_days("p", 2, &[1, 2], Some("focused"));
        assert_eq!(compose(&current, &previous).branch, MonthBranch::GradualPractice);

        // 2.0 against 1.0 clears the threshold
        let lighter = on_days("l", 3, &[1, 2], Some("peaceful"));
        assert_eq!(compose(&lighter, &previous).branch, MonthBranch::SteadierTone);
    }

    #[test]
    fn test_empty_months() {
        let result = compose(&[], &[]);
        assert_eq!(result.branch, MonthBranch::GradualPractice);
        assert_eq!(result.anchor_trend, AnchorTrend::Similar);
        assert_eq!(result.metrics, MonthMetrics::default());
        assert_eq!(
            result.supporting_text,
            "You linked 0 reflections to a teaching this month, about the same as last month."
        );
    }

    #[test]
    fn test_untagged_month_after_calm_month_is_heavier() {
        let current = on_days("c", 3, &[1, 2], None);
        let previous = on_days("p", 2, &[1, 2], Some("peaceful"));
        let result = compose(&current, &previous);
        assert_eq!(result.branch, MonthBranch::HeavierMonth);
        assert_eq!(result.metrics.average_score, None);
        assert_eq!(result.metrics.previous_average_score, Some(2.0));
    }

    #[test]
    fn test_anchor_sentence_always_present() {
        let mut current = on_days("c", 3, &[1, 2, 3, 4, 5, 6], None);
        for entry in current.iter_mut().take(3) {
            entry.linked_sermon_title = Some("Rest".to_string());
        }
        let mut previous = on_days("p", 2, &[1], None);
        previous[0].linked_sermon_title = Some("Light".to_string());

        let result = compose(&current, &previous);
        assert_eq!(result.branch, MonthBranch::MoreConsistent);
        assert_eq!(result.anchor_trend, AnchorTrend::More);
        assert_eq!(
            result.supporting_text,
            "You linked 3 reflections to a teaching this month, up from 1."
        );

        let fewer = compose(&previous, &current);
        assert_eq!(fewer.anchor_trend, AnchorTrend::Fewer);
        assert!(fewer.supporting_text.contains("down from 3"));
    }
}
