use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, error, info, trace};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::{Result, StakError};

/// Watches the data directory for day files changed by other programs.
///
/// The callback runs on notify's event thread with the day files touched by
/// one event. Dropping the watcher stops it.
pub struct DataDirWatcher {
    _watcher: RecommendedWatcher,
    data_dir: PathBuf,
}

impl DataDirWatcher {
    pub fn start<F>(data_dir: &Path, on_change: F) -> Result<Self>
    where
        F: Fn(Vec<PathBuf>) + Send + 'static,
    {
        let mut watcher: RecommendedWatcher = Watcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    trace!("File system event: {:?}", event.kind);
                    let changed = changed_day_files(&event);
                    if !changed.is_empty() {
                        on_change(changed);
                    }
                }
                Err(e) => error!("File system watcher error: {}", e),
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(|e| {
            error!("Failed to create file watcher: {}", e);
            StakError::DirectoryError {
                path: data_dir.to_path_buf(),
            }
        })?;

        watcher
            .watch(data_dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                error!("Failed to watch directory {}: {}", data_dir.display(), e);
                StakError::DirectoryError {
                    path: data_dir.to_path_buf(),
                }
            })?;

        info!("File system watcher initialized for {}", data_dir.display());
        Ok(Self {
            _watcher: watcher,
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Drop for DataDirWatcher {
    fn drop(&mut self) {
        debug!("File system watcher for {} stopped", self.data_dir.display());
    }
}

/// Day files (`*.md`) created, modified or removed by `event`.
pub fn changed_day_files(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => event
            .paths
            .iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut e = Event::new(kind);
        for p in paths {
            e = e.add_path(PathBuf::from(p));
        }
        e
    }

    #[test]
    fn only_markdown_changes_count() {
        let e = event(
            EventKind::Modify(ModifyKind::Any),
            &["/d/2024-03-15.md", "/d/.tmpA1b2C3", "/d/stak.log"],
        );
        assert_eq!(changed_day_files(&e), vec![PathBuf::from("/d/2024-03-15.md")]);
    }

    #[test]
    fn create_and_remove_are_reported() {
        let created = event(EventKind::Create(CreateKind::File), &["/d/a.md"]);
        let removed = event(EventKind::Remove(RemoveKind::File), &["/d/b.md"]);
        assert_eq!(changed_day_files(&created).len(), 1);
        assert_eq!(changed_day_files(&removed).len(), 1);
    }

    #[test]
    fn access_events_are_ignored() {
        let read = event(EventKind::Access(AccessKind::Any), &["/d/a.md"]);
        assert!(changed_day_files(&read).is_empty());
    }
}
