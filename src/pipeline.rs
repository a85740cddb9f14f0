//! Pipeline orchestration
//!
//! This module provides the public API for the insights engine. It takes
//! pre-windowed entry lists (or a store plus a reference instant) through
//! analysis and narrative composition to localized insight records.

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::config::InsightConfig;
use crate::locale::{Locale, LocaleCatalog, Translate};
use crate::month::compose_month;
use crate::narrative::compose_weekly;
use crate::signals::analyze_week;
use crate::storage::KeyValueStorage;
use crate::store::EntryStore;
use crate::types::{JournalEntry, MonthComparison, WeeklyInsight};
use crate::window::AnalysisWindows;

/// Compute the weekly insight for two already-windowed entry lists.
///
/// # Arguments
/// * `locale` - Locale code of the host (e.g., "en", "es-MX"); unknown codes fall back to English
/// * `translate` - Host string lookup, consulted before the built-in catalog
/// * `current_week` - Entries from the current seven-day window
/// * `previous_week` - Entries from the seven days before it
///
/// # Example
/// ```ignore
/// let insight = compute_weekly_insight("en", &|key: &str| key.to_string(), &current, &previous);
/// println!("{}", insight.notice_text);
/// ```
pub fn compute_weekly_insight<T: Translate + ?Sized>(
    locale: &str,
    translate: &T,
    current_week: &[JournalEntry],
    previous_week: &[JournalEntry],
) -> WeeklyInsight {
    InsightEngine::new().weekly_insight(
        Locale::parse(locale),
        translate,
        current_week,
        previous_week,
    )
}

/// Compute the month-over-month comparison for two already-windowed entry lists.
///
/// `previous_month` is expected to be aligned to the same day-of-month as
/// the current one (see [`crate::window::previous_month`]).
pub fn compute_month_comparison<T: Translate + ?Sized>(
    locale: &str,
    translate: &T,
    current_month: &[JournalEntry],
    previous_month: &[JournalEntry],
) -> MonthComparison {
    InsightEngine::new().month_comparison(
        Locale::parse(locale),
        translate,
        current_month,
        previous_month,
    )
}

/// Insight computation with a custom configuration.
///
/// Holds only immutable thresholds and string tables, so one engine can be
/// shared freely.
#[derive(Debug, Clone, Default)]
pub struct InsightEngine {
    config: InsightConfig,
    catalog: LocaleCatalog,
}

impl InsightEngine {
    /// Create an engine with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom thresholds
    pub fn with_config(config: InsightConfig) -> Self {
        Self {
            config,
            catalog: LocaleCatalog::new(),
        }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    pub fn catalog(&self) -> &LocaleCatalog {
        &self.catalog
    }

    /// Weekly insight for two already-windowed entry lists
    pub fn weekly_insight<T: Translate + ?Sized>(
        &self,
        locale: Locale,
        translate: &T,
        current_week: &[JournalEntry],
        previous_week: &[JournalEntry],
    ) -> WeeklyInsight {
        // Stage 1: Reduce both windows to metrics and signals
        let analysis = analyze_week(current_week, previous_week, &self.config);

        // Stage 2: Pick the narrative and render it
        compose_weekly(&analysis, &self.config, locale, translate, &self.catalog)
    }

    /// Month comparison for two already-windowed entry lists
    pub fn month_comparison<T: Translate + ?Sized>(
        &self,
        locale: Locale,
        translate: &T,
        current_month: &[JournalEntry],
        previous_month: &[JournalEntry],
    ) -> MonthComparison {
        compose_month(
            current_month,
            previous_month,
            &self.config,
            locale,
            translate,
            &self.catalog,
        )
    }

    /// Window a full journal snapshot at `now` and compute the weekly insight
    pub fn weekly_insight_at<T: Translate + ?Sized>(
        &self,
        entries: &[JournalEntry],
        now: DateTime<FixedOffset>,
        locale: Locale,
        translate: &T,
    ) -> WeeklyInsight {
        // Stage 1: Window the snapshot
        let windows = AnalysisWindows::at(now);
        let current = windows.current_week.select(entries);
        let previous = windows.previous_week.select(entries);
        debug!(
            total = entries.len(),
            current = current.len(),
            previous = previous.len(),
            "Windowed entries for weekly insight"
        );

        // Stage 2: Analyze and compose
        self.weekly_insight(locale, translate, &current, &previous)
    }

    /// Window a full journal snapshot at `now` and compare the months
    pub fn month_comparison_at<T: Translate + ?Sized>(
        &self,
        entries: &[JournalEntry],
        now: DateTime<FixedOffset>,
        locale: Locale,
        translate: &T,
    ) -> MonthComparison {
        let windows = AnalysisWindows::at(now);
        let current = windows.current_month.select(entries);
        let previous = windows.previous_month.select(entries);
        debug!(
            total = entries.len(),
            current = current.len(),
            previous = previous.len(),
            "Windowed entries for month comparison"
        );

        self.month_comparison(locale, translate, &current, &previous)
    }
}

/// Stateful processor over a persisted journal.
///
/// Use this when the host keeps its entries in a [`KeyValueStorage`] and
/// wants insights for a reference instant without windowing by hand.
pub struct InsightProcessor<S> {
    store: EntryStore<S>,
    engine: InsightEngine,
}

impl<S: KeyValueStorage> InsightProcessor<S> {
    /// Create a processor with default thresholds
    pub fn new(storage: S) -> Self {
        Self::with_engine(EntryStore::new(storage), InsightEngine::new())
    }

    pub fn with_engine(store: EntryStore<S>, engine: InsightEngine) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &EntryStore<S> {
        &self.store
    }

    /// Mutable access for adding, updating, and deleting entries
    pub fn store_mut(&mut self) -> &mut EntryStore<S> {
        &mut self.store
    }

    pub fn engine(&self) -> &InsightEngine {
        &self.engine
    }

    /// Weekly insight for the week ending at `now`
    pub fn weekly_insight<T: Translate + ?Sized>(
        &self,
        now: DateTime<FixedOffset>,
        locale: Locale,
        translate: &T,
    ) -> WeeklyInsight {
        let entries = self.store.list();
        self.engine
            .weekly_insight_at(&entries, now, locale, translate)
    }

    /// Month comparison for the month up to `now`
    pub fn month_comparison<T: Translate + ?Sized>(
        &self,
        now: DateTime<FixedOffset>,
        locale: Locale,
        translate: &T,
    ) -> MonthComparison {
        let entries = self.store.list();
        self.engine
            .month_comparison_at(&entries, now, locale, translate)
    }
}
