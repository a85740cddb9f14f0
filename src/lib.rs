//! Formation Insights - On-device insight engine for a reflective journaling practice
//!
//! Turns a user's journal entries into short, localized narrative insights
//! through a deterministic pipeline: entry store → time windows → analyzers
//! (cadence, mood, volatility) → signal set → narrative rule table.
//!
//! ## Modules
//!
//! - **Weekly Insight**: One narrative about the current week, compared with the week before
//! - **Month Comparison**: A reduced month-over-month narrative aligned to the same day-of-month

pub mod cadence;
pub mod config;
pub mod error;
pub mod locale;
pub mod month;
pub mod mood;
pub mod narrative;
pub mod pipeline;
pub mod signals;
pub mod storage;
pub mod store;
pub mod types;
pub mod volatility;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::InsightConfig;
pub use error::{InsightError, Result};
pub use locale::{Locale, LocaleCatalog, Translate};
pub use pipeline::{compute_month_comparison, compute_weekly_insight, InsightEngine, InsightProcessor};
pub use signals::{Signal, SignalSet};
pub use storage::{KeyValueStorage, MemoryStorage};
pub use store::{audit_entries, parse_entries, EntryStore, ENTRIES_KEY};
pub use types::{
    AnchorTrend, EntryPatch, JournalEntry, JournalVariant, MonthBranch, MonthComparison,
    WeeklyBranch, WeeklyInsight,
};
pub use window::AnalysisWindows;

/// Engine version, reported by the FFI and CLI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported alongside the version
pub const PRODUCER_NAME: &str = "formation-insights";
