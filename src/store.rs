//! Journal entry store
//!
//! Persists the entry list as a single JSON array under one storage key and
//! reads it back defensively: records without a string `id`, a parseable
//! string `createdAt`, or a string `body` are dropped instead of failing the
//! whole read.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::{InsightError, Result};
use crate::storage::KeyValueStorage;
use crate::types::{EntryPatch, JournalEntry, JournalVariant};

/// Storage key the entry array lives under
pub const ENTRIES_KEY: &str = "formation.journal.entries";

/// Why a persisted record was left out of the entry list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NotAnObject,
    MissingId,
    MissingCreatedAt,
    UnparseableCreatedAt,
    MissingBody,
    DuplicateId,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotAnObject => "record is not an object",
            Self::MissingId => "id is missing or not a string",
            Self::MissingCreatedAt => "createdAt is missing or not a string",
            Self::UnparseableCreatedAt => "createdAt is not a valid timestamp",
            Self::MissingBody => "body is missing or not a string",
            Self::DuplicateId => "id repeats an earlier record",
        };
        f.write_str(text)
    }
}

/// A record rejected by the defensive reader
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRecord {
    /// Position in the persisted array
    pub index: usize,
    pub id: Option<String>,
    pub reason: DropReason,
}

/// Outcome of reading a persisted entry array
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryAudit {
    /// Valid entries, newest first
    pub entries: Vec<JournalEntry>,
    pub dropped: Vec<DroppedRecord>,
}

/// Read an entry array, reporting every record that was dropped and why.
///
/// Fails only when `json` is not a JSON array at all.
pub fn audit_entries(json: &str) -> Result<EntryAudit> {
    Ok(audit_records(&parse_records(json)?))
}

fn parse_records(json: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(records) => Ok(records),
        _ => Err(InsightError::InvalidEntry(
            "persisted entries must be a JSON array".to_string(),
        )),
    }
}

fn audit_records(records: &[Value]) -> EntryAudit {
    let mut seen = HashSet::new();
    let mut kept: Vec<(DateTime<FixedOffset>, JournalEntry)> = Vec::with_capacity(records.len());
    let mut dropped = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let id = record.get("id").and_then(Value::as_str).map(str::to_string);
        match entry_from_record(record) {
            Ok((instant, entry)) => {
                if seen.insert(entry.id.clone()) {
                    kept.push((instant, entry));
                } else {
                    dropped.push(DroppedRecord {
                        index,
                        id,
                        reason: DropReason::DuplicateId,
                    });
                }
            }
            Err(reason) => dropped.push(DroppedRecord { index, id, reason }),
        }
    }

    // Stable, so equal instants keep their persisted order
    kept.sort_by(|a, b| b.0.cmp(&a.0));

    EntryAudit {
        entries: kept.into_iter().map(|(_, entry)| entry).collect(),
        dropped,
    }
}

/// Read an entry array, silently dropping invalid records
pub fn parse_entries(json: &str) -> Result<Vec<JournalEntry>> {
    audit_entries(json).map(|audit| audit.entries)
}

fn entry_from_record(
    record: &Value,
) -> std::result::Result<(DateTime<FixedOffset>, JournalEntry), DropReason> {
    let map = record.as_object().ok_or(DropReason::NotAnObject)?;

    let id = required_str(map, "id").ok_or(DropReason::MissingId)?;
    let created_at = required_str(map, "createdAt").ok_or(DropReason::MissingCreatedAt)?;
    let body = required_str(map, "body").ok_or(DropReason::MissingBody)?;
    let instant = DateTime::parse_from_rfc3339(created_at.trim())
        .map_err(|_| DropReason::UnparseableCreatedAt)?;

    let entry = JournalEntry {
        id: id.to_string(),
        created_at: created_at.to_string(),
        body: body.to_string(),
        invitation_text: optional_str(map, "invitationText"),
        journal_variant: map
            .get("journalVariant")
            .and_then(Value::as_str)
            .and_then(JournalVariant::parse),
        mood: optional_str(map, "mood"),
        linked_sermon_title: optional_str(map, "linkedSermonTitle"),
        linked_sermon_url: optional_str(map, "linkedSermonUrl"),
    };

    Ok((instant, entry))
}

fn required_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn optional_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Persisted array as seen by a mutation
struct WriteSnapshot {
    entries: Vec<JournalEntry>,
    /// Records the reader dropped, written back untouched
    retained: Vec<Value>,
}

/// Journal entry store over an injected key-value backend
#[derive(Debug, Clone)]
pub struct EntryStore<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> EntryStore<S> {
    /// Create a store persisting under [`ENTRIES_KEY`]
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, ENTRIES_KEY)
    }

    /// Create a store persisting under a custom key
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Valid entries, newest first.
    ///
    /// Never fails: unreadable storage reads as an empty journal.
    pub fn list(&self) -> Vec<JournalEntry> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read journal entries");
                return Vec::new();
            }
        };

        match audit_entries(&raw) {
            Ok(audit) => {
                if !audit.dropped.is_empty() {
                    warn!(
                        key = %self.key,
                        dropped = audit.dropped.len(),
                        kept = audit.entries.len(),
                        "Dropped invalid journal records"
                    );
                }
                audit.entries
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Persisted journal entries are unreadable");
                Vec::new()
            }
        }
    }

    /// Add a new entry; its timestamp must parse and its id must be unused
    pub fn add(&mut self, entry: JournalEntry) -> Result<()> {
        if entry.created_instant().is_none() {
            return Err(InsightError::InvalidEntry(format!(
                "entry {} has unparseable createdAt {:?}",
                entry.id, entry.created_at
            )));
        }

        let mut snapshot = self.load_for_write()?;
        if snapshot.entries.iter().any(|e| e.id == entry.id) {
            return Err(InsightError::DuplicateEntry(entry.id));
        }

        debug!(id = %entry.id, "Adding journal entry");
        snapshot.entries.push(entry);
        self.write(snapshot)
    }

    /// Apply a partial update to an existing entry and return the result.
    ///
    /// An empty patch returns the entry without rewriting storage.
    pub fn update(&mut self, id: &str, patch: EntryPatch) -> Result<JournalEntry> {
        let mut snapshot = self.load_for_write()?;
        let entry = snapshot
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| InsightError::EntryNotFound(id.to_string()))?;

        if patch.is_empty() {
            return Ok(entry.clone());
        }

        entry.apply(patch);
        let updated = entry.clone();

        debug!(id, "Updated journal entry");
        self.write(snapshot)?;
        Ok(updated)
    }

    /// Remove an entry, returning whether anything was removed.
    ///
    /// Dropped records sharing the id go with it, so a stale copy cannot
    /// resurface on the next read.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let mut snapshot = self.load_for_write()?;
        let before = snapshot.entries.len();
        snapshot.entries.retain(|e| e.id != id);

        if snapshot.entries.len() == before {
            return Ok(false);
        }

        snapshot
            .retained
            .retain(|record| record.get("id").and_then(Value::as_str) != Some(id));

        debug!(id, "Deleted journal entry");
        self.write(snapshot)?;
        Ok(true)
    }

    /// Unlike `list`, refuses to proceed when existing data cannot be read so
    /// a write never clobbers entries it could not see. Records the reader
    /// drops are carried along and written back as they were.
    fn load_for_write(&self) -> Result<WriteSnapshot> {
        let raw = match self.storage.get(&self.key)? {
            Some(raw) => raw,
            None => {
                return Ok(WriteSnapshot {
                    entries: Vec::new(),
                    retained: Vec::new(),
                })
            }
        };

        let records = parse_records(&raw)
            .map_err(|e| InsightError::Storage(format!("existing entries are unreadable: {e}")))?;
        let audit = audit_records(&records);
        let retained = audit
            .dropped
            .iter()
            .filter_map(|d| records.get(d.index).cloned())
            .collect();

        Ok(WriteSnapshot {
            entries: audit.entries,
            retained,
        })
    }

    fn write(&mut self, snapshot: WriteSnapshot) -> Result<()> {
        let WriteSnapshot {
            mut entries,
            retained,
        } = snapshot;
        entries.sort_by(|a, b| b.created_instant().cmp(&a.created_instant()));

        if !retained.is_empty() {
            warn!(
                key = %self.key,
                retained = retained.len(),
                "Keeping invalid journal records in place"
            );
        }

        let mut records = entries
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        records.extend(retained);

        let json = serde_json::to_string(&records)?;
        self.storage.set(&self.key, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use pretty_assertions::assert_eq;

    fn store_with(json: &str) -> EntryStore<MemoryStorage> {
        EntryStore::new(MemoryStorage::with_value(ENTRIES_KEY, json))
    }

    fn ids(entries: &[JournalEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_list_filters_invalid_records() {
        let store = store_with(
            r#"[
                {"id": "ok", "createdAt": "2024-03-10T09:00:00Z", "body": "fine"},
                {"id": 7, "createdAt": "2024-03-10T09:00:00Z", "body": "numeric id"},
                {"id": "no-date", "body": "missing"},
                {"id": "bad-date", "createdAt": "yesterday", "body": ""},
                {"id": "no-body", "createdAt": "2024-03-10T09:00:00Z"},
                {"id": "null-body", "createdAt": "2024-03-10T09:00:00Z", "body": null},
                "just a string",
                {"id": "empty-body", "createdAt": "2024-03-09T09:00:00Z", "body": ""}
            ]"#,
        );

        let entries = store.list();
        assert_eq!(ids(&entries), vec!["ok", "empty-body"]);
        for entry in &entries {
            assert!(entry.created_instant().is_some());
        }
    }

    #[test]
    fn test_optional_fields_with_wrong_types_read_as_absent() {
        let store = store_with(
            r#"[{"id": "a", "createdAt": "2024-03-10T09:00:00Z", "body": "",
                 "mood": 3, "journalVariant": "weekend", "linkedSermonTitle": "Rest",
                 "invitationText": ["x"]}]"#,
        );

        let entry = &store.list()[0];
        assert_eq!(entry.mood, None);
        assert_eq!(entry.journal_variant, None);
        assert_eq!(entry.invitation_text, None);
        assert_eq!(entry.linked_sermon_title.as_deref(), Some("Rest"));
    }

    #[test]
    fn test_list_sorted_newest_first() {
        let store = store_with(
            r#"[
                {"id": "mid", "createdAt": "2024-03-10T09:00:00Z", "body": ""},
                {"id": "old", "createdAt": "2024-03-01T09:00:00Z", "body": ""},
                {"id": "new", "createdAt": "2024-03-12T09:00:00+02:00", "body": ""}
            ]"#,
        );
        assert_eq!(ids(&store.list()), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_older_insert_keeps_newer_order() {
        let mut store = EntryStore::new(MemoryStorage::new());
        store
            .add(JournalEntry::with_id("b", "2024-03-10T09:00:00Z", ""))
            .unwrap();
        store
            .add(JournalEntry::with_id("a", "2024-03-12T09:00:00Z", ""))
            .unwrap();
        store
            .add(JournalEntry::with_id("old", "2024-02-01T09:00:00Z", ""))
            .unwrap();

        assert_eq!(ids(&store.list()), vec!["a", "b", "old"]);
    }

    #[test]
    fn test_unreadable_storage_lists_empty() {
        assert!(store_with("{not json").list().is_empty());
        assert!(store_with(r#"{"id": "a"}"#).list().is_empty());
        assert!(EntryStore::new(MemoryStorage::new()).list().is_empty());
    }

    #[test]
    fn test_add_rejects_duplicates_and_bad_timestamps() {
        let mut store = EntryStore::new(MemoryStorage::new());
        store
            .add(JournalEntry::with_id("a", "2024-03-10T09:00:00Z", ""))
            .unwrap();

        let dup = store.add(JournalEntry::with_id("a", "2024-03-11T09:00:00Z", ""));
        assert!(matches!(dup, Err(InsightError::DuplicateEntry(id)) if id == "a"));

        let bad = store.add(JournalEntry::with_id("b", "not a date", ""));
        assert!(matches!(bad, Err(InsightError::InvalidEntry(_))));

        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_update_is_last_write_wins() {
        let mut store = EntryStore::new(MemoryStorage::new());
        store
            .add(JournalEntry::with_id("a", "2024-03-10T09:00:00Z", "first").with_mood("tired"))
            .unwrap();

        store
            .update(
                "a",
                EntryPatch {
                    body: Some("second".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let updated = store
            .update(
                "a",
                EntryPatch {
                    body: Some("third".to_string()),
                    mood: Some("peaceful".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.body, "third");
        let entries = store.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], updated);
        assert_eq!(entries[0].mood.as_deref(), Some("peaceful"));
    }

    #[test]
    fn test_update_missing_entry() {
        let mut store = EntryStore::new(MemoryStorage::new());
        let result = store.update("ghost", EntryPatch::default());
        assert!(matches!(result, Err(InsightError::EntryNotFound(_))));
    }

    #[test]
    fn test_delete() {
        let mut store = EntryStore::new(MemoryStorage::new());
        store
            .add(JournalEntry::with_id("a", "2024-03-10T09:00:00Z", ""))
            .unwrap();
        store
            .add(JournalEntry::with_id("b", "2024-03-11T09:00:00Z", ""))
            .unwrap();

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert_eq!(ids(&store.list()), vec!["b"]);
    }

    #[test]
    fn test_writes_refuse_to_clobber_unreadable_data() {
        let mut store = store_with("{corrupt");
        let result = store.add(JournalEntry::with_id("a", "2024-03-10T09:00:00Z", ""));
        assert!(matches!(result, Err(InsightError::Storage(_))));
        assert_eq!(
            store.storage().get(ENTRIES_KEY).unwrap().as_deref(),
            Some("{corrupt")
        );
    }

    #[test]
    fn test_writes_keep_records_the_reader_dropped() {
        let mut store = store_with(
            r#"[{"id": "legacy", "createdAt": "2024-03-10 09:00", "body": ""}]"#,
        );
        store
            .add(JournalEntry::with_id("fresh", "2024-03-11T09:00:00Z", "new"))
            .unwrap();

        assert_eq!(ids(&store.list()), vec!["fresh"]);

        let raw = store.storage().get(ENTRIES_KEY).unwrap().unwrap();
        let records: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "fresh");
        assert_eq!(
            records[1],
            serde_json::json!({"id": "legacy", "createdAt": "2024-03-10 09:00", "body": ""})
        );

        let audit = audit_entries(&raw).unwrap();
        assert_eq!(audit.dropped[0].reason, DropReason::UnparseableCreatedAt);
    }

    #[test]
    fn test_delete_removes_stale_duplicates() {
        let mut store = store_with(
            r#"[
                {"id": "a", "createdAt": "2024-03-10T09:00:00Z", "body": "kept"},
                {"id": "a", "createdAt": "2024-03-09T09:00:00Z", "body": "stale"},
                {"id": "b", "body": "no date"}
            ]"#,
        );

        assert!(store.delete("a").unwrap());
        assert!(store.list().is_empty());

        let audit = audit_entries(&store.storage().get(ENTRIES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(audit.dropped.len(), 1);
        assert_eq!(audit.dropped[0].id.as_deref(), Some("b"));
    }

    #[test]
    fn test_empty_patch_leaves_storage_untouched() {
        let raw = r#"[ {"id": "a", "createdAt": "2024-03-10T09:00:00Z", "body": "same"} ]"#;
        let mut store = store_with(raw);

        let entry = store.update("a", EntryPatch::default()).unwrap();
        assert_eq!(entry.body, "same");
        assert_eq!(store.storage().get(ENTRIES_KEY).unwrap().as_deref(), Some(raw));
    }

    #[test]
    fn test_audit_reports_reasons() {
        let audit = audit_entries(
            r#"[
                {"id": "a", "createdAt": "2024-03-10T09:00:00Z", "body": ""},
                {"id": "a", "createdAt": "2024-03-11T09:00:00Z", "body": ""},
                {"id": "c", "createdAt": "soon", "body": ""},
                42
            ]"#,
        )
        .unwrap();

        assert_eq!(ids(&audit.entries), vec!["a"]);
        assert_eq!(
            audit.dropped,
            vec![
                DroppedRecord {
                    index: 1,
                    id: Some("a".to_string()),
                    reason: DropReason::DuplicateId,
                },
                DroppedRecord {
                    index: 2,
                    id: Some("c".to_string()),
                    reason: DropReason::UnparseableCreatedAt,
                },
                DroppedRecord {
                    index: 3,
                    id: None,
                    reason: DropReason::NotAnObject,
                },
            ]
        );
    }

    #[test]
    fn test_audit_rejects_non_array() {
        assert!(audit_entries(r#"{"entries": []}"#).is_err());
        assert!(audit_entries("nope").is_err());
    }
}
