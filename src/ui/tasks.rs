//! Background loads and the messages they post back to the view.
//!
//! A [`Task`] is a blocking unit of work executed off the UI thread. Its
//! result comes back as a [`Message`] tagged with what was asked for, so the
//! view can drop results that no longer match what it shows.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, warn};

use super::Mode;
use crate::{Entry, EntryKind, EntryService, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Today's entries for stream mode, every todo for todos mode
    LoadView { mode: Mode },
    /// All entries grouped by day, for the calendar markers
    LoadCalendar,
    LoadDay { date: NaiveDate },
    Search {
        query: String,
        links_only: bool,
        mode: Mode,
    },
}

#[derive(Debug, Clone)]
pub enum Message {
    ViewLoaded {
        mode: Mode,
        entries: Vec<Entry>,
    },
    CalendarLoaded {
        by_date: BTreeMap<NaiveDate, Vec<Entry>>,
    },
    DayLoaded {
        date: NaiveDate,
        entries: Vec<Entry>,
    },
    SearchResults {
        query: String,
        links_only: bool,
        mode: Mode,
        entries: Vec<Entry>,
    },
    LoadFailed {
        message: String,
    },
    /// A day file changed on disk
    DataChanged,
}

impl Task {
    pub fn run(self, service: &EntryService) -> Message {
        debug!("Running {:?}", self);
        let result = match self {
            Task::LoadView { mode } => load_view(service, mode)
                .map(|entries| Message::ViewLoaded { mode, entries }),
            Task::LoadCalendar => service
                .entries_by_date()
                .map(|by_date| Message::CalendarLoaded { by_date }),
            Task::LoadDay { date } => service
                .load_entries_for_date(date)
                .map(|entries| Message::DayLoaded { date, entries }),
            Task::Search {
                query,
                links_only,
                mode,
            } => service
                .search_entries(&query, links_only)
                .map(|entries| Message::SearchResults {
                    query,
                    links_only,
                    mode,
                    entries,
                }),
        };

        result.unwrap_or_else(|e| {
            warn!("Background load failed: {}", e);
            Message::LoadFailed {
                message: format!("Load failed: {}", e),
            }
        })
    }
}

fn load_view(service: &EntryService, mode: Mode) -> Result<Vec<Entry>> {
    match mode {
        Mode::Todos => service.load_filtered_entries(EntryKind::Todo),
        Mode::Stream | Mode::Calendar => service.load_today_entries(),
    }
}
