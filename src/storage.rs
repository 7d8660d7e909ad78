use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::{Duration, Local, NaiveDate};
use globset::{Glob, GlobMatcher};
use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{
    day_file::{parse_day_file, render_day_file},
    Config, DayFile, Entry, EntryKind, Result, StakError,
};

/// Owns the on-disk day files in the data directory.
///
/// Every write to a day file, and every read of a single day, holds that
/// day's lock, so a background title write and a foreground toggle on the
/// same file are applied one after the other. Files are replaced through a
/// temporary file and a rename, so readers never see a partial file.
pub struct DayFileStore {
    /// Directory holding `<date>.md` files
    data_dir: PathBuf,

    /// strftime pattern for file names
    date_format: String,

    /// One lock per day file, keyed by formatted date
    day_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,

    /// Matches day file names (`*.md`)
    day_file_glob: GlobMatcher,
}

impl DayFileStore {
    /// Creates a store for the data directory and date format in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_format(&config.data_dir, &config.strftime_date_format())
    }

    pub fn with_format(data_dir: &Path, date_format: &str) -> Result<Self> {
        let day_file_glob = Glob::new("*.md")
            .map_err(|e| StakError::ConfigError {
                message: format!("invalid day file pattern: {}", e),
            })?
            .compile_matcher();

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            date_format: date_format.to_string(),
            day_locks: Mutex::new(HashMap::new()),
            day_file_glob,
        })
    }

    /// Ensures the data directory exists.
    pub fn initialize(&self) -> Result<()> {
        if !self.data_dir.exists() {
            debug!(
                "Data directory does not exist, creating: {}",
                self.data_dir.display()
            );
            fs::create_dir_all(&self.data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                StakError::DirectoryError {
                    path: self.data_dir.clone(),
                }
            })?;
        }
        info!("Storage initialized at {}", self.data_dir.display());
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File key for a date, e.g. `2024-03-15`.
    pub fn date_key(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }

    pub fn day_file_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir.join(format!("{}.md", self.date_key(date)))
    }

    /// Inserts or replaces `entry` in the day file of its creation date.
    ///
    /// The day file is read, changed and written back while its lock is
    /// held. A day file that exists but cannot be parsed is left untouched.
    ///
    /// # Arguments
    ///
    /// * `entry` - The entry to store; an entry with the same id is replaced
    ///
    /// # Returns
    ///
    /// A Result indicating success or the I/O or format error that stopped
    /// the write
    pub fn save_entry(&self, entry: &Entry) -> Result<()> {
        let date = entry.created_at.date_naive();
        self.with_day_file(date, |day| {
            let replaced = day.upsert(entry.clone());
            trace!(
                "{} entry {} in {}",
                if replaced { "Replaced" } else { "Appended" },
                entry.id,
                day.date
            );
            Ok(())
        })
    }

    /// Moves `entry` to tomorrow's civil date and saves it there.
    ///
    /// # Arguments
    ///
    /// * `entry` - The entry to move; its timestamps are shifted in place
    ///
    /// # Returns
    ///
    /// A Result indicating success or failure of the write
    pub fn save_entry_for_tomorrow(&self, entry: &mut Entry) -> Result<()> {
        let tomorrow = Local::now().date_naive() + Duration::days(1);
        let shift = (tomorrow - entry.created_at.date_naive()).num_days();
        entry.shift_days(shift);
        self.insert_new_entry(entry)
    }

    /// Appends a new entry, re-rolling its id suffix while it collides with
    /// an id already present in the target day file.
    pub fn insert_new_entry(&self, entry: &mut Entry) -> Result<()> {
        let date = entry.created_at.date_naive();
        self.with_day_file(date, |day| {
            while day.contains_id(&entry.id) {
                debug!("Id {} already used on {}, re-rolling", entry.id, day.date);
                entry.reroll_id_suffix();
            }
            day.upsert(entry.clone());
            Ok(())
        })
    }

    /// Applies `update` to the stored copy of an entry and persists it.
    ///
    /// The read, the change and the write happen under the day lock, so
    /// concurrent updates to other fields of the same entry are kept.
    ///
    /// # Arguments
    ///
    /// * `date` - The civil date whose day file holds the entry
    /// * `id` - The id of the entry to change
    /// * `update` - Mutation applied to the stored copy
    ///
    /// # Returns
    ///
    /// A Result containing the updated entry, or `None` when the day file
    /// does not hold that id
    pub fn update_entry<F>(&self, date: NaiveDate, id: &str, update: F) -> Result<Option<Entry>>
    where
        F: FnOnce(&mut Entry),
    {
        let lock = self.day_lock(date)?;
        let _guard = lock.lock().map_err(|_| StakError::LockAcquisitionFailed {
            message: format!("day lock for {} is poisoned", self.date_key(date)),
        })?;

        let path = self.day_file_path(date);
        let Some(mut day) = self.read_day_file(&path)? else {
            return Ok(None);
        };
        let updated = match day.get_mut(id) {
            Some(entry) => {
                update(entry);
                entry.clone()
            }
            None => return Ok(None),
        };
        self.write_day_file(&path, &day)?;
        Ok(Some(updated))
    }

    /// Entries for today's date; a missing file is an empty list.
    pub fn load_today_entries(&self) -> Result<Vec<Entry>> {
        self.load_entries_for_date(Local::now().date_naive())
    }

    /// Entries stored in the day file of `date`; a missing file is an empty list.
    pub fn load_entries_for_date(&self, date: NaiveDate) -> Result<Vec<Entry>> {
        let lock = self.day_lock(date)?;
        let _guard = lock.lock().map_err(|_| StakError::LockAcquisitionFailed {
            message: format!("day lock for {} is poisoned", self.date_key(date)),
        })?;
        let day = self.read_day_file(&self.day_file_path(date))?;
        Ok(day.map(|d| d.entries).unwrap_or_default())
    }

    /// Every entry of `kind` across all days, newest first.
    pub fn load_filtered_entries(&self, kind: EntryKind) -> Result<Vec<Entry>> {
        let mut entries: Vec<Entry> = self
            .load_all_entries()?
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Every entry in every readable day file. Unreadable files are skipped.
    pub fn load_all_entries(&self) -> Result<Vec<Entry>> {
        let mut all = Vec::new();
        for path in self.list_day_files()? {
            if let Some(day) = self.read_day_file_lenient(&path) {
                all.extend(day.entries);
            }
        }
        debug!("Loaded {} entries from {}", all.len(), self.data_dir.display());
        Ok(all)
    }

    /// All entries grouped by their creation date.
    pub fn entries_by_date(&self) -> Result<BTreeMap<NaiveDate, Vec<Entry>>> {
        let mut grouped: BTreeMap<NaiveDate, Vec<Entry>> = BTreeMap::new();
        for entry in self.load_all_entries()? {
            grouped
                .entry(entry.created_at.date_naive())
                .or_default()
                .push(entry);
        }
        Ok(grouped)
    }

    /// Searches every day file for matching entries.
    ///
    /// An entry matches when its content, tags, url or url title contain
    /// `query`, ignoring case. Unreadable day files are skipped.
    ///
    /// # Arguments
    ///
    /// * `query` - Text to look for; a blank query matches nothing
    /// * `links_only` - Restrict the results to link entries
    ///
    /// # Returns
    ///
    /// A Result containing the matching entries, newest first
    pub fn search_entries(&self, query: &str, links_only: bool) -> Result<Vec<Entry>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        info!("Searching entries for '{}' (links only: {})", query, links_only);

        let mut hits: Vec<Entry> = self
            .load_all_entries()?
            .into_iter()
            .filter(|e| !links_only || e.kind == EntryKind::Link)
            .filter(|e| matches_query(e, &query))
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!("Search for '{}' found {} entries", query, hits.len());
        Ok(hits)
    }

    /// Day files directly inside the data directory, sorted by name.
    pub fn list_day_files(&self) -> Result<Vec<PathBuf>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.day_file_glob.is_match(e.file_name()))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        Ok(files)
    }

    fn with_day_file<F>(&self, date: NaiveDate, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut DayFile) -> Result<()>,
    {
        let lock = self.day_lock(date)?;
        let _guard = lock.lock().map_err(|_| StakError::LockAcquisitionFailed {
            message: format!("day lock for {} is poisoned", self.date_key(date)),
        })?;

        let path = self.day_file_path(date);
        // An unreadable existing file aborts the save instead of being overwritten
        let mut day = self.read_day_file(&path)?.unwrap_or_else(|| DayFile::new(date));
        mutate(&mut day)?;
        self.write_day_file(&path, &day)
    }

    fn day_lock(&self, date: NaiveDate) -> Result<Arc<Mutex<()>>> {
        let key = self.date_key(date);
        let mut locks = self
            .day_locks
            .lock()
            .map_err(|_| StakError::LockAcquisitionFailed {
                message: "Failed to acquire lock on day lock table".to_string(),
            })?;
        Ok(Arc::clone(locks.entry(key).or_default()))
    }

    /// Reads and parses a day file. `Ok(None)` when the file does not exist.
    fn read_day_file(&self, path: &Path) -> Result<Option<DayFile>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                error!("Failed to open day file {}: {}", path.display(), e);
                return Err(StakError::Io(e));
            }
        };
        let day = parse_day_file(&text, path)?;
        trace!("Loaded {} entries from {}", day.entries.len(), path.display());
        Ok(Some(day))
    }

    /// Unlocked read for aggregate loads: retries a failed parse once, then skips.
    fn read_day_file_lenient(&self, path: &Path) -> Option<DayFile> {
        match self.read_day_file(path) {
            Ok(day) => day,
            Err(first) => {
                debug!("Retrying read of {} after: {}", path.display(), first);
                match self.read_day_file(path) {
                    Ok(day) => day,
                    Err(e) => {
                        warn!("Skipping unreadable day file {}: {}", path.display(), e);
                        None
                    }
                }
            }
        }
    }

    fn write_day_file(&self, path: &Path, day: &DayFile) -> Result<()> {
        let dir = path.parent().unwrap_or(self.data_dir.as_path());
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                StakError::Io(e)
            })?;
        }

        let text = render_day_file(day)?;

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            StakError::Io(e)
        })?;
        temp_file.write_all(text.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            StakError::Io(e)
        })?;
        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            StakError::Io(e)
        })?;

        temp_file.persist(path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            StakError::Io(e.error)
        })?;

        debug!("Saved {} entries to {}", day.entries.len(), path.display());
        Ok(())
    }
}

/// `query` must already be trimmed and lowercased.
pub fn matches_query(entry: &Entry, query: &str) -> bool {
    entry.content.to_lowercase().contains(query)
        || entry.tags.iter().any(|t| t.to_lowercase().contains(query))
        || entry
            .url
            .as_deref()
            .is_some_and(|u| u.to_lowercase().contains(query))
        || entry
            .url_title
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(query))
}
