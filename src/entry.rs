//! Entry and day file records.
//!
//! An [`Entry`] is a single line of user text together with the kind and
//! tags the classifier assigned to it. Entries are grouped on disk by the
//! civil date of their creation into a [`DayFile`].
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{EntryKind, TodoStatus};

const ID_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const ID_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_SUFFIX_LEN: usize = 6;
/// Longest forward search for a wall-clock time skipped by a DST jump
const DST_GAP_SEARCH_MINUTES: usize = 180;

/// Represents a single scratchpad entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// `YYYYMMDDhhmmss-xxxxxx`, unique within its day file
    pub id: String,
    /// The raw user text, kept verbatim
    pub content: String,
    /// Semantic category, stored under `type` for compatibility with existing files
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Filled in by the background title fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_status: Option<TodoStatus>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Entry {
    /// Creates an unclassified entry stamped with the current time.
    pub fn new(content: impl Into<String>) -> Self {
        Self::at(content, Local::now())
    }

    /// Creates an unclassified entry on `date`, using the current local time of day.
    pub fn new_for_date(content: impl Into<String>, date: NaiveDate) -> Self {
        Self::at(content, local_datetime(date, Local::now().time()))
    }

    fn at(content: impl Into<String>, stamp: DateTime<Local>) -> Self {
        Entry {
            id: generate_id(&stamp),
            content: content.into(),
            kind: EntryKind::Note,
            tags: Vec::new(),
            url: None,
            url_title: None,
            todo_status: None,
            created_at: stamp,
            updated_at: stamp,
            metadata: BTreeMap::new(),
        }
    }

    /// Appends a tag unless it is empty or already present. Returns whether it was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_todo(&self) -> bool {
        self.kind == EntryKind::Todo
    }

    /// Todo status with the pending default applied.
    pub fn status(&self) -> TodoStatus {
        self.todo_status.unwrap_or_default()
    }

    /// Replaces the random suffix of the id, keeping its timestamp prefix.
    pub fn reroll_id_suffix(&mut self) {
        let prefix = match self.id.split_once('-') {
            Some((prefix, _)) => prefix.to_string(),
            None => self.created_at.format(ID_TIMESTAMP_FORMAT).to_string(),
        };
        self.id = format!("{}-{}", prefix, random_suffix());
    }

    /// Moves both timestamps by whole calendar days, keeping the local time
    /// of day.
    pub fn shift_days(&mut self, days: i64) {
        self.created_at = shift_local(self.created_at, days);
        self.updated_at = shift_local(self.updated_at, days);
    }

    pub fn touch(&mut self) {
        let now = Local::now();
        // updated_at never moves backwards, even for entries dated in the future
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Resolves the wall-clock `time` on `date` in the local time zone.
///
/// An ambiguous time (clocks falling back) resolves to the earlier instant.
/// A time skipped by clocks springing forward moves to the first valid
/// minute after it on the same date, so the result always lies on `date`
/// when the zone allows it.
pub fn local_datetime(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    if let Some(stamp) = Local.from_local_datetime(&naive).earliest() {
        return stamp;
    }

    let mut probe = naive;
    for _ in 0..DST_GAP_SEARCH_MINUTES {
        probe += Duration::minutes(1);
        if probe.date() != date {
            break;
        }
        if let Some(stamp) = Local.from_local_datetime(&probe).earliest() {
            return stamp;
        }
    }

    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

fn shift_local(stamp: DateTime<Local>, days: i64) -> DateTime<Local> {
    match stamp.date_naive().checked_add_signed(Duration::days(days)) {
        Some(date) => local_datetime(date, stamp.time()),
        None => stamp,
    }
}

/// All entries created on one civil date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayFile {
    pub date: NaiveDate,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl DayFile {
    pub fn new(date: NaiveDate) -> Self {
        DayFile {
            date,
            entries: Vec::new(),
        }
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Replaces the entry with the same id in place, or appends it.
    /// Returns true when an existing entry was replaced.
    pub fn upsert(&mut self, entry: Entry) -> bool {
        if let Some(existing) = self.get_mut(&entry.id) {
            *existing = entry;
            return true;
        }
        self.entries.push(entry);
        // stable: equal timestamps keep insertion order
        self.entries.sort_by_key(|e| e.created_at);
        false
    }
}

fn generate_id(stamp: &DateTime<Local>) -> String {
    format!("{}-{}", stamp.format(ID_TIMESTAMP_FORMAT), random_suffix())
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_SUFFIX_LEN)
        .map(|_| ID_SUFFIX_CHARSET[rng.gen_range(0..ID_SUFFIX_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_has_well_formed_id() {
        let entry = Entry::new("hello");
        let (stamp, suffix) = entry.id.split_once('-').unwrap();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), 6);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(entry.content, "hello");
        assert!(entry.tags.is_empty());
        assert!(entry.metadata.is_empty());
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn entry_for_date_lands_on_that_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let entry = Entry::new_for_date("planned", date);
        assert_eq!(entry.created_at.date_naive(), date);
        assert!(entry.id.starts_with("20240315"));
    }

    #[test]
    fn shift_days_keeps_time_of_day_across_months() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let time = NaiveTime::from_hms_opt(21, 15, 0).unwrap();
        let mut entry = Entry::new("later");
        entry.created_at = local_datetime(date, time);
        entry.updated_at = entry.created_at;

        entry.shift_days(2);
        assert_eq!(
            entry.created_at.date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(entry.created_at.time(), time);
        assert_eq!(entry.updated_at, entry.created_at);
    }

    #[test]
    fn add_tag_rejects_duplicates_and_empty() {
        let mut entry = Entry::new("x");
        assert!(entry.add_tag("work"));
        assert!(!entry.add_tag("work"));
        assert!(!entry.add_tag("  "));
        assert!(entry.add_tag("Team"));
        assert_eq!(entry.tags, vec!["work", "team"]);
    }

    #[test]
    fn reroll_keeps_timestamp_prefix() {
        let mut entry = Entry::new("x");
        let before = entry.id.clone();
        let prefix = before.split_once('-').unwrap().0.to_string();
        // a fresh 6 char suffix repeating is astronomically unlikely; loop guards it anyway
        for _ in 0..8 {
            entry.reroll_id_suffix();
            if entry.id != before {
                break;
            }
        }
        assert_ne!(entry.id, before);
        assert!(entry.id.starts_with(&prefix));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut day = DayFile::new(date);
        let first = Entry::new_for_date("one", date);
        let mut second = Entry::new_for_date("two", date);
        second.created_at = first.created_at + chrono::Duration::seconds(1);
        assert!(!day.upsert(first.clone()));
        assert!(!day.upsert(second.clone()));

        let mut edited = first.clone();
        edited.content = "one, edited".into();
        assert!(day.upsert(edited));
        assert_eq!(day.entries.len(), 2);
        assert_eq!(day.entries[0].content, "one, edited");
        assert_eq!(day.entries[1].id, second.id);
    }
}
