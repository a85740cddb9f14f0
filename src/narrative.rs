//! Weekly narrative composition
//!
//! The narrative is picked by a first-match walk over an ordered rule table.
//! Each rule pairs a predicate over the week analysis with a builder for the
//! template parameters its text needs, so every branch can be tested on its
//! own and the priority order is visible in one place.

use tracing::debug;

use crate::config::InsightConfig;
use crate::locale::{LocaleCatalog, Locale, TextResolver, Translate};
use crate::signals::{Signal, WeekAnalysis};
use crate::types::{WeeklyBranch, WeeklyInsight};

/// Template parameters produced by a rule
type Params = Vec<(&'static str, String)>;

/// One row of the decision table
pub struct NarrativeRule {
    pub branch: WeeklyBranch,
    pub applies: fn(&WeekAnalysis, &InsightConfig) -> bool,
    params: fn(&WeekAnalysis, &dyn Fn(&str) -> String) -> Params,
}

/// Narrative rules in priority order. The last rule always applies.
pub static WEEKLY_RULES: [NarrativeRule; 8] = [
    NarrativeRule {
        branch: WeeklyBranch::Recovery,
        applies: |a, _| a.signals.contains(Signal::RecoveryPresent),
        params: no_params,
    },
    NarrativeRule {
        branch: WeeklyBranch::SteadyGrowth,
        applies: |a, _| {
            a.signals.contains(Signal::SteadyCadence)
                && a.signals.contains(Signal::GrowingSteadiness)
        },
        params: no_params,
    },
    NarrativeRule {
        branch: WeeklyBranch::RisingStrain,
        applies: |a, _| a.signals.contains(Signal::RisingStrain),
        params: no_params,
    },
    NarrativeRule {
        branch: WeeklyBranch::HighVariation,
        applies: |a, _| a.signals.contains(Signal::HighVariation),
        params: no_params,
    },
    NarrativeRule {
        branch: WeeklyBranch::SundayAnchor,
        applies: |a, _| a.signals.contains(Signal::SundayAnchor),
        params: |a, _| vec![("count", a.metrics.sunday_links.to_string())],
    },
    NarrativeRule {
        branch: WeeklyBranch::DominantMood,
        applies: |a, config| {
            a.dominant_mood
                .as_ref()
                .is_some_and(|m| m.count >= config.dominant_mood_min_count)
        },
        params: |a, mood_text| match &a.dominant_mood {
            Some(mood) => vec![
                ("mood", mood_text(&mood.label)),
                ("count", mood.count.to_string()),
            ],
            None => Vec::new(),
        },
    },
    NarrativeRule {
        branch: WeeklyBranch::InsufficientData,
        applies: |a, config| a.metrics.active_days <= config.insufficient_max_active_days,
        params: no_params,
    },
    NarrativeRule {
        branch: WeeklyBranch::TakingShape,
        applies: |_, _| true,
        params: no_params,
    },
];

fn no_params(_: &WeekAnalysis, _: &dyn Fn(&str) -> String) -> Params {
    Vec::new()
}

/// First rule whose predicate holds
pub fn select_rule(analysis: &WeekAnalysis, config: &InsightConfig) -> &'static NarrativeRule {
    WEEKLY_RULES
        .iter()
        .find(|rule| (rule.applies)(analysis, config))
        .unwrap_or(&WEEKLY_RULES[WEEKLY_RULES.len() - 1])
}

/// Render the weekly insight for an analyzed week
pub fn compose_weekly<T: Translate + ?Sized>(
    analysis: &WeekAnalysis,
    config: &InsightConfig,
    locale: Locale,
    translate: &T,
    catalog: &LocaleCatalog,
) -> WeeklyInsight {
    let resolver = TextResolver::new(translate, catalog, locale);
    let rule = select_rule(analysis, config);
    debug!(branch = rule.branch.as_str(), locale = locale.code(), "Selected weekly narrative");

    let mood_text = |label: &str| {
        resolver
            .lookup(&format!("mood.{label}"))
            .unwrap_or_else(|| label.to_string())
    };
    let params = (rule.params)(analysis, &mood_text);

    let branch = rule.branch.as_str();
    let notice_text = resolver.render(&format!("insights.weekly.{branch}.notice"), &params);
    let summary_text = resolver.render(&format!("insights.weekly.{branch}.summary"), &params);

    let signal_labels = analysis
        .signals
        .iter()
        .map(|signal| resolver.text(&format!("insights.signal.{}", signal.as_str())))
        .collect();

    let metrics = analysis.metrics;
    let metrics_text = resolver.render(
        "insights.weekly.metrics",
        &[
            ("entries", metrics.entries_this_week.to_string()),
            ("days", metrics.active_days.to_string()),
            ("previous_days", metrics.previous_active_days.to_string()),
        ],
    );

    WeeklyInsight {
        notice_text,
        summary_text,
        signal_labels,
        metrics_text,
        branch: rule.branch,
        signals: analysis.signals.to_vec(),
        metrics,
    }
}
