//! Entry lifecycle orchestration.
//!
//! `EntryService` ties the classifier, the day file store and the title
//! fetcher together. It is the only place that creates entries or changes
//! their status, and it is shared between the UI thread and background
//! tasks behind an `Arc`.
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, error, info, warn};
use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    search::{rank_entries, sort_by_recency},
    Classifier, DayFileStore, Entry, EntryKind, Result, TitleFetcher, TodoStatus,
};

pub struct EntryService {
    store: Arc<DayFileStore>,
    classifier: Classifier,
    fetcher: Arc<dyn TitleFetcher>,
    /// Runtime for background title fetches; `None` disables them
    runtime: Option<Handle>,
    fuzzy_search: bool,
}

impl EntryService {
    pub fn new(
        store: Arc<DayFileStore>,
        fetcher: Arc<dyn TitleFetcher>,
        runtime: Option<Handle>,
    ) -> Self {
        Self {
            store,
            classifier: Classifier::new(),
            fetcher,
            runtime,
            fuzzy_search: true,
        }
    }

    pub fn with_fuzzy_search(mut self, enabled: bool) -> Self {
        self.fuzzy_search = enabled;
        self
    }

    pub fn store(&self) -> &Arc<DayFileStore> {
        &self.store
    }

    /// Creates, classifies and persists an entry for today.
    ///
    /// Link entries get their page title fetched in the background when a
    /// runtime is available.
    ///
    /// # Arguments
    ///
    /// * `content` - The text typed by the user
    /// * `force_kind` - Skip classification and use this kind; a forced todo
    ///   starts pending with the `todo` and `task` tags
    ///
    /// # Returns
    ///
    /// A Result containing the stored entry or the error that prevented the
    /// save
    pub fn create_entry(&self, content: &str, force_kind: Option<EntryKind>) -> Result<Entry> {
        let entry = Entry::new(content);
        self.finish_entry(entry, force_kind)
    }

    /// Same as [`create_entry`](Self::create_entry) but dated on `date`.
    pub fn create_entry_for_date(
        &self,
        content: &str,
        date: NaiveDate,
        force_kind: Option<EntryKind>,
    ) -> Result<Entry> {
        let entry = Entry::new_for_date(content, date);
        self.finish_entry(entry, force_kind)
    }

    /// Classifies `content` and stores it in tomorrow's day file.
    pub fn create_tomorrow_entry(&self, content: &str) -> Result<Entry> {
        let mut entry = Entry::new(content);
        self.classifier.classify(&mut entry);
        self.store.save_entry_for_tomorrow(&mut entry)?;
        info!("Created {} entry {} for tomorrow", entry.kind, entry.id);
        self.spawn_title_fetch(&entry);
        Ok(entry)
    }

    fn finish_entry(&self, mut entry: Entry, force_kind: Option<EntryKind>) -> Result<Entry> {
        match force_kind {
            Some(EntryKind::Todo) => {
                entry.kind = EntryKind::Todo;
                entry.todo_status = Some(TodoStatus::Pending);
                entry.tags = vec!["todo".to_string(), "task".to_string()];
            }
            Some(kind) => entry.kind = kind,
            None => self.classifier.classify(&mut entry),
        }

        self.store.insert_new_entry(&mut entry)?;
        info!("Created {} entry {}", entry.kind, entry.id);
        self.spawn_title_fetch(&entry);
        Ok(entry)
    }

    /// Fetches the page title of a link entry in the background and writes
    /// it to the stored copy. In-memory snapshots are left alone.
    pub fn spawn_title_fetch(&self, entry: &Entry) -> Option<JoinHandle<()>> {
        if entry.kind != EntryKind::Link {
            return None;
        }
        let url = entry.url.clone().filter(|u| !u.is_empty())?;
        let Some(runtime) = self.runtime.as_ref() else {
            debug!("No runtime available, skipping title fetch for {}", url);
            return None;
        };

        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let date = entry.created_at.date_naive();
        let id = entry.id.clone();

        Some(runtime.spawn(async move {
            let title = fetcher.fetch_title(&url).await;
            let write = tokio::task::spawn_blocking(move || {
                store.update_entry(date, &id, |stored| stored.url_title = Some(title))
            })
            .await;
            match write {
                Ok(Ok(Some(updated))) => debug!("Stored title for entry {}", updated.id),
                Ok(Ok(None)) => debug!("Entry for {} vanished before its title arrived", url),
                Ok(Err(e)) => warn!("Failed to store title for {}: {}", url, e),
                Err(e) => error!("Title write task for {} failed: {}", url, e),
            }
        }))
    }

    /// Flips a todo between pending and completed. `entries` is the caller's
    /// snapshot; returns `None` when `entry_id` is not a todo in it.
    pub fn toggle_todo_status(&self, entry_id: &str, entries: &[Entry]) -> Result<Option<Entry>> {
        self.set_todo_status(entry_id, entries, TodoStatus::toggled)
    }

    /// Marks a todo cancelled, or restores a cancelled todo to pending.
    pub fn cancel_todo(&self, entry_id: &str, entries: &[Entry]) -> Result<Option<Entry>> {
        self.set_todo_status(entry_id, entries, TodoStatus::cancelled)
    }

    fn set_todo_status(
        &self,
        entry_id: &str,
        entries: &[Entry],
        transition: fn(TodoStatus) -> TodoStatus,
    ) -> Result<Option<Entry>> {
        let Some(snapshot) = entries.iter().find(|e| e.id == entry_id && e.is_todo()) else {
            debug!("No todo {} in snapshot, nothing to change", entry_id);
            return Ok(None);
        };
        let status = transition(snapshot.status());
        let updated = self.apply_to_stored(snapshot, |e| {
            e.todo_status = Some(status);
            e.touch();
        })?;
        info!("Todo {} is now {:?}", entry_id, status);
        Ok(Some(updated))
    }

    /// Replaces the content of a todo. Blank content is rejected with `None`.
    pub fn update_todo_content(
        &self,
        entry_id: &str,
        entries: &[Entry],
        content: &str,
    ) -> Result<Option<Entry>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }
        let Some(snapshot) = entries.iter().find(|e| e.id == entry_id) else {
            return Ok(None);
        };
        let updated = self.apply_to_stored(snapshot, |e| {
            e.content = content.to_string();
            e.touch();
        })?;
        info!("Updated content of entry {}", entry_id);
        Ok(Some(updated))
    }

    /// Applies `change` to the stored copy of `snapshot` under the day lock so
    /// concurrent writes to other fields survive. Falls back to saving the
    /// changed snapshot when the entry is not on disk.
    fn apply_to_stored<F>(&self, snapshot: &Entry, change: F) -> Result<Entry>
    where
        F: Fn(&mut Entry),
    {
        let date = snapshot.created_at.date_naive();
        if let Some(updated) = self.store.update_entry(date, &snapshot.id, &change)? {
            return Ok(updated);
        }
        let mut copy = snapshot.clone();
        change(&mut copy);
        self.store.save_entry(&copy)?;
        Ok(copy)
    }

    pub fn load_today_entries(&self) -> Result<Vec<Entry>> {
        self.store.load_today_entries()
    }

    pub fn load_entries_for_date(&self, date: NaiveDate) -> Result<Vec<Entry>> {
        self.store.load_entries_for_date(date)
    }

    pub fn load_filtered_entries(&self, kind: EntryKind) -> Result<Vec<Entry>> {
        self.store.load_filtered_entries(kind)
    }

    pub fn load_all_entries(&self) -> Result<Vec<Entry>> {
        self.store.load_all_entries()
    }

    pub fn entries_by_date(&self) -> Result<std::collections::BTreeMap<NaiveDate, Vec<Entry>>> {
        self.store.entries_by_date()
    }

    /// Case-insensitive substring search, ordered by relevance when fuzzy
    /// search is enabled and by recency otherwise.
    pub fn search_entries(&self, query: &str, links_only: bool) -> Result<Vec<Entry>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.store.search_entries(&query, links_only)?;
        Ok(if self.fuzzy_search {
            rank_entries(hits, &query)
        } else {
            sort_by_recency(hits)
        })
    }
}
