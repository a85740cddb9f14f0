//! Core data types for Formation Insights
//!
//! Journal entries as persisted by the journaling flow, the partial update
//! applied to them, and the narrative results produced by the engine.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signals::Signal;

/// Prompting context an entry was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalVariant {
    EarlyWeek,
    MidWeek,
}

impl JournalVariant {
    /// Parse the persisted form, returning `None` for anything unrecognized
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "early_week" => Some(Self::EarlyWeek),
            "mid_week" => Some(Self::MidWeek),
            _ => None,
        }
    }
}

/// One user-authored check-in.
///
/// Serialized with camelCase keys; this is the on-disk shape of a record in
/// the persisted entry array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Opaque unique identifier
    pub id: String,
    /// RFC 3339 timestamp as written by the journaling flow
    pub created_at: String,
    /// Free-form text, may be empty
    pub body: String,
    /// Prompt the entry was written in response to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_variant: Option<JournalVariant>,
    /// Categorical mood label; unknown labels are kept and score neutrally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Title of the communal teaching this entry links back to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_sermon_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_sermon_url: Option<String>,
}

impl JournalEntry {
    /// Create an entry with a fresh UUID v4 identifier
    pub fn new(created_at: DateTime<FixedOffset>, body: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), created_at.to_rfc3339(), body)
    }

    /// Create an entry with an explicit identifier and raw timestamp
    pub fn with_id(
        id: impl Into<String>,
        created_at: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: created_at.into(),
            body: body.into(),
            invitation_text: None,
            journal_variant: None,
            mood: None,
            linked_sermon_title: None,
            linked_sermon_url: None,
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_sermon(mut self, title: impl Into<String>, url: Option<String>) -> Self {
        self.linked_sermon_title = Some(title.into());
        self.linked_sermon_url = url;
        self
    }

    pub fn with_variant(mut self, variant: JournalVariant) -> Self {
        self.journal_variant = Some(variant);
        self
    }

    pub fn with_invitation(mut self, text: impl Into<String>) -> Self {
        self.invitation_text = Some(text.into());
        self
    }

    /// Parsed creation instant, `None` when the stored string is not RFC 3339
    pub fn created_instant(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.created_at.trim()).ok()
    }

    /// Calendar day of the entry in the offset it was recorded with
    pub fn day_key(&self) -> Option<NaiveDate> {
        self.created_instant().map(|instant| instant.date_naive())
    }

    /// Lower-cased, trimmed mood label if one is present and non-blank
    pub fn mood_label(&self) -> Option<String> {
        self.mood
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether the entry links back to a communal teaching
    pub fn has_sermon_link(&self) -> bool {
        self.linked_sermon_title
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty())
    }

    /// Apply a partial update in place; unset fields are left untouched
    pub fn apply(&mut self, patch: EntryPatch) {
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(text) = patch.invitation_text {
            self.invitation_text = Some(text);
        }
        if let Some(variant) = patch.journal_variant {
            self.journal_variant = Some(variant);
        }
        if let Some(mood) = patch.mood {
            self.mood = Some(mood);
        }
        if let Some(title) = patch.linked_sermon_title {
            self.linked_sermon_title = Some(title);
        }
    }
}

/// Partial update accepted by [`crate::store::EntryStore::update`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub invitation_text: Option<String>,
    #[serde(default)]
    pub journal_variant: Option<JournalVariant>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub linked_sermon_title: Option<String>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
            && self.invitation_text.is_none()
            && self.journal_variant.is_none()
            && self.mood.is_none()
            && self.linked_sermon_title.is_none()
    }
}

/// Narrative branch chosen for the weekly insight, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeeklyBranch {
    Recovery,
    SteadyGrowth,
    RisingStrain,
    HighVariation,
    SundayAnchor,
    DominantMood,
    InsufficientData,
    TakingShape,
}

impl WeeklyBranch {
    /// Stable identifier used in translation keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recovery => "recovery",
            Self::SteadyGrowth => "steady_growth",
            Self::RisingStrain => "rising_strain",
            Self::HighVariation => "high_variation",
            Self::SundayAnchor => "sunday_anchor",
            Self::DominantMood => "dominant_mood",
            Self::InsufficientData => "insufficient_data",
            Self::TakingShape => "taking_shape",
        }
    }
}

/// Raw counts reported alongside every weekly narrative
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMetrics {
    pub entries_this_week: usize,
    pub active_days: usize,
    pub previous_active_days: usize,
    pub mood_entries: usize,
    pub sunday_links: usize,
}

/// Weekly narrative result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyInsight {
    pub notice_text: String,
    pub summary_text: String,
    /// Human-readable tag for every signal present, in signal order
    pub signal_labels: Vec<String>,
    pub metrics_text: String,
    pub branch: WeeklyBranch,
    pub signals: Vec<Signal>,
    pub metrics: WeeklyMetrics,
}

/// Narrative branch chosen for the month comparison, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthBranch {
    MoreConsistent,
    SteadierTone,
    HeavierMonth,
    GradualPractice,
}

impl MonthBranch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoreConsistent => "more_consistent",
            Self::SteadierTone => "steadier_tone",
            Self::HeavierMonth => "heavier_month",
            Self::GradualPractice => "gradual_practice",
        }
    }
}

/// Direction of the month-over-month sunday anchor comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorTrend {
    More,
    Fewer,
    Similar,
}

impl AnchorTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::More => "more",
            Self::Fewer => "fewer",
            Self::Similar => "similar",
        }
    }
}

/// Month-over-month figures behind a [`MonthComparison`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthMetrics {
    pub entries_this_month: usize,
    pub active_days: usize,
    pub previous_active_days: usize,
    /// Mean mood score; `None` when the month has no scored entries
    pub average_score: Option<f64>,
    pub previous_average_score: Option<f64>,
    pub sunday_links: usize,
    pub previous_sunday_links: usize,
}

/// Month comparison narrative result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub title_text: String,
    pub body_text: String,
    /// Sunday anchor comparison, always present
    pub supporting_text: String,
    pub branch: MonthBranch,
    pub anchor_trend: AnchorTrend,
    pub metrics: MonthMetrics,
}
