//! The view state machine.
//!
//! [`ViewState`] owns everything the screen shows. Keys and background
//! results are applied one at a time on the UI thread; anything slow is
//! handed back to the caller as [`Task`]s whose results return through
//! [`ViewState::apply`]. Saves are quick file writes and run inline so a
//! failure can keep the input line intact.
use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info, warn};

use super::{
    commands::{completions, parse_command, SlashCommand, LINKS_USAGE, SEARCH_USAGE, TODO_USAGE},
    input::TextInput,
    tasks::{Message, Task},
};
use crate::{
    calendar::{get_spatial_date, shift_month},
    Entry, EntryKind, EntryService, NavDirection, Result, TodoStatus,
};

/// How long an error stays in the status bar
pub const ERROR_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Stream,
    Todos,
    Calendar,
}

impl Mode {
    /// Shift+Tab order: stream, todos, calendar.
    pub fn next(self) -> Self {
        match self {
            Mode::Stream => Mode::Todos,
            Mode::Todos => Mode::Calendar,
            Mode::Calendar => Mode::Stream,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Stream => "STAK",
            Mode::Todos => "TODO",
            Mode::Calendar => "CALENDAR",
        }
    }
}

/// Focusable panes of the calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Input,
    Entries,
    DatePicker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub links_only: bool,
}

#[derive(Debug, Clone)]
struct TodoEdit {
    idx: usize,
    entry_id: String,
    original_content: String,
}

pub struct ViewState {
    service: Arc<EntryService>,
    mode: Mode,
    pane: Pane,
    entries: Vec<Entry>,
    /// -1 when nothing is selected
    selected_idx: isize,
    input: TextInput,
    edit: Option<TodoEdit>,
    error: Option<(String, Instant)>,
    show_help: bool,
    selected_date: NaiveDate,
    calendar_entries: BTreeMap<NaiveDate, Vec<Entry>>,
    search: Option<SearchState>,
    should_quit: bool,
}

impl ViewState {
    pub fn new(service: Arc<EntryService>) -> Self {
        Self {
            service,
            mode: Mode::Stream,
            pane: Pane::Input,
            entries: Vec::new(),
            selected_idx: -1,
            input: TextInput::new(),
            edit: None,
            error: None,
            show_help: false,
            selected_date: Local::now().date_naive(),
            calendar_entries: BTreeMap::new(),
            search: None,
            should_quit: false,
        }
    }

    /// Loads for the first frame.
    pub fn initial_tasks(&self) -> Vec<Task> {
        vec![self.reload_task()]
    }

    pub fn service(&self) -> &Arc<EntryService> {
        &self.service
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn selected_idx(&self) -> isize {
        self.selected_idx
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    /// Index of the todo being edited, -1 when not editing.
    pub fn editing_todo_idx(&self) -> isize {
        self.edit.as_ref().map_or(-1, |e| e.idx as isize)
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn calendar_entries(&self) -> &BTreeMap<NaiveDate, Vec<Entry>> {
        &self.calendar_entries
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// The error banner, if it was raised less than [`ERROR_TTL`] before `now`.
    pub fn visible_error(&self, now: Instant) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|(_, at)| now.saturating_duration_since(*at) < ERROR_TTL)
            .map(|(message, _)| message.as_str())
    }

    /// Text of the status bar's context segment.
    pub fn status_context(&self) -> String {
        if let Some(search) = &self.search {
            let label = if search.links_only { "links" } else { "search" };
            return format!("{}: \"{}\" • {} hits", label, search.query, self.entries.len());
        }
        match self.mode {
            Mode::Todos if self.edit.is_some() => "EDITING TODO".to_string(),
            Mode::Todos => {
                let done = self
                    .entries
                    .iter()
                    .filter(|e| e.is_todo() && e.status() == TodoStatus::Completed)
                    .count();
                format!("{}/{} done", done, self.entries.len())
            }
            Mode::Calendar => format!(
                "{} • {} entries",
                self.selected_date.format("%B %Y"),
                self.entries.len()
            ),
            Mode::Stream => format!("{} entries", self.entries.len()),
        }
    }

    /// Slash commands matching the current input, for the suggestion line.
    pub fn suggestions(&self) -> Vec<&'static str> {
        if !self.input.is_focused() {
            return Vec::new();
        }
        completions(self.input.value())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Task> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('?') if !self.input.is_focused() || self.input.is_empty() => {
                self.show_help = !self.show_help;
                return Vec::new();
            }
            KeyCode::Esc => return self.handle_esc(),
            KeyCode::BackTab => return self.cycle_mode(),
            KeyCode::Enter => return self.handle_enter(),
            KeyCode::Tab => return self.handle_tab(),
            _ => {}
        }

        if self.mode == Mode::Calendar && self.pane != Pane::Input {
            self.handle_calendar_key(key)
        } else if !self.input.is_focused() {
            self.handle_list_key(key)
        } else {
            self.handle_input_key(key)
        }
    }

    /// Applies a background result. Results for a view that is no longer
    /// shown are dropped.
    pub fn apply(&mut self, message: Message) -> Vec<Task> {
        match message {
            Message::ViewLoaded { mode, entries } => {
                if mode != self.mode || self.search.is_some() {
                    debug!("Discarding stale {:?} entries", mode);
                    return Vec::new();
                }
                self.set_entries(entries);
            }
            Message::CalendarLoaded { by_date } => {
                if self.mode != Mode::Calendar {
                    debug!("Discarding calendar entries outside calendar mode");
                    return Vec::new();
                }
                self.entries = by_date
                    .get(&self.selected_date)
                    .cloned()
                    .unwrap_or_default();
                self.calendar_entries = by_date;
                self.clamp_selection();
            }
            Message::DayLoaded { date, entries } => {
                if self.mode != Mode::Calendar || date != self.selected_date {
                    debug!("Discarding stale entries for {}", date);
                    return Vec::new();
                }
                if entries.is_empty() {
                    self.calendar_entries.remove(&date);
                } else {
                    self.calendar_entries.insert(date, entries.clone());
                }
                self.set_entries(entries);
            }
            Message::SearchResults {
                query,
                links_only,
                mode,
                entries,
            } => {
                let current = SearchState { query, links_only };
                if mode != self.mode || self.search.as_ref() != Some(&current) {
                    debug!("Discarding stale results for '{}'", current.query);
                    return Vec::new();
                }
                self.set_entries(entries);
            }
            Message::LoadFailed { message } => self.set_error(message),
            Message::DataChanged => {
                if self.edit.is_some() {
                    debug!("Data changed while editing, reload deferred");
                    return Vec::new();
                }
                return vec![self.reload_task()];
            }
        }
        Vec::new()
    }

    fn handle_esc(&mut self) -> Vec<Task> {
        if self.show_help {
            self.show_help = false;
            return Vec::new();
        }
        if self.edit.is_some() {
            self.cancel_edit();
            return Vec::new();
        }
        if self.search.take().is_some() {
            self.selected_idx = -1;
            return vec![self.reload_task()];
        }
        if self.mode == Mode::Calendar {
            self.mode = Mode::Stream;
            self.pane = Pane::Input;
            self.input.focus();
            self.selected_idx = -1;
            return vec![self.reload_task()];
        }
        Vec::new()
    }

    fn cycle_mode(&mut self) -> Vec<Task> {
        if self.edit.is_some() {
            self.cancel_edit();
        }
        self.search = None;
        self.mode = self.mode.next();
        self.pane = Pane::Input;
        self.input.focus();
        self.selected_idx = -1;
        self.show_help = false;
        info!("Switched to {} mode", self.mode.label());
        vec![self.reload_task()]
    }

    fn switch_mode(&mut self, mode: Mode) -> Vec<Task> {
        if self.edit.is_some() {
            self.cancel_edit();
        }
        self.search = None;
        self.mode = mode;
        self.pane = Pane::Input;
        self.input.clear();
        self.input.focus();
        self.selected_idx = -1;
        vec![self.reload_task()]
    }

    fn handle_enter(&mut self) -> Vec<Task> {
        if self.show_help {
            self.show_help = false;
            return Vec::new();
        }
        match self.mode {
            Mode::Calendar => match self.pane {
                Pane::Input => self.submit(),
                Pane::Entries => Vec::new(),
                Pane::DatePicker => {
                    self.pane = Pane::Input;
                    self.input.focus();
                    Vec::new()
                }
            },
            Mode::Todos if self.edit.is_some() => self.save_edit(),
            Mode::Todos if !self.input.is_focused() && self.selected_entry().is_some() => {
                self.change_selected_status(EntryService::toggle_todo_status)
            }
            _ => self.submit(),
        }
    }

    fn handle_tab(&mut self) -> Vec<Task> {
        match self.mode {
            Mode::Calendar => match self.pane {
                Pane::Input => {
                    self.pane = Pane::Entries;
                    self.input.blur();
                    if !self.entries.is_empty() && self.selected_idx < 0 {
                        self.selected_idx = self.entries.len() as isize - 1;
                    }
                }
                Pane::Entries => {
                    self.pane = Pane::DatePicker;
                    self.selected_idx = -1;
                }
                Pane::DatePicker => {
                    self.pane = Pane::Input;
                    self.input.focus();
                    self.selected_idx = -1;
                }
            },
            Mode::Todos if self.edit.is_some() => {}
            Mode::Todos => {
                if self.input.is_focused() {
                    self.input.blur();
                    if !self.entries.is_empty() && self.selected_idx < 0 {
                        self.selected_idx = 0;
                    }
                } else {
                    self.input.focus();
                    self.selected_idx = -1;
                }
            }
            Mode::Stream => {
                if let [only] = completions(self.input.value()).as_slice() {
                    self.input.set_value(only);
                }
            }
        }
        Vec::new()
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Up if self.mode != Mode::Calendar => self.select_previous(),
            KeyCode::Down if self.mode != Mode::Calendar => self.select_next(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.home(),
            KeyCode::End => self.input.end(),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input.insert_char(c)
            }
            _ => {}
        }
        Vec::new()
    }

    /// Keys while the todo list, not the input, has focus.
    fn handle_list_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.select_previous(),
            KeyCode::Down => self.select_next(),
            KeyCode::Char('e') | KeyCode::Right if self.mode == Mode::Todos => {
                self.start_edit();
            }
            KeyCode::Char('x') if self.mode == Mode::Todos => {
                return self.change_selected_status(EntryService::cancel_todo);
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) -> Vec<Task> {
        if key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return Vec::new();
        }
        match self.pane {
            Pane::Entries => {
                match key.code {
                    KeyCode::Up => self.select_previous(),
                    KeyCode::Down => self.select_next(),
                    _ => {}
                }
                Vec::new()
            }
            Pane::DatePicker => {
                let date = self.selected_date;
                let target = match key.code {
                    KeyCode::Up => get_spatial_date(date, NavDirection::Up),
                    KeyCode::Down => get_spatial_date(date, NavDirection::Down),
                    KeyCode::Left => get_spatial_date(date, NavDirection::Left),
                    KeyCode::Right => get_spatial_date(date, NavDirection::Right),
                    KeyCode::PageUp => shift_month(date, -1),
                    KeyCode::PageDown => shift_month(date, 1),
                    KeyCode::Home | KeyCode::Char('t') => Local::now().date_naive(),
                    _ => return Vec::new(),
                };
                self.select_date(target)
            }
            Pane::Input => Vec::new(),
        }
    }

    fn select_date(&mut self, date: NaiveDate) -> Vec<Task> {
        if date == self.selected_date {
            return Vec::new();
        }
        self.selected_date = date;
        vec![Task::LoadDay { date }]
    }

    fn select_previous(&mut self) {
        if self.selected_idx > 0 {
            self.selected_idx -= 1;
        }
    }

    fn select_next(&mut self) {
        if self.selected_idx < self.entries.len() as isize - 1 {
            self.selected_idx += 1;
        }
    }

    fn selected_entry(&self) -> Option<&Entry> {
        usize::try_from(self.selected_idx)
            .ok()
            .and_then(|idx| self.entries.get(idx))
    }

    /// Submits the input line as a command or a new entry.
    fn submit(&mut self) -> Vec<Task> {
        let text = self.input.value().trim().to_string();
        if text.is_empty() {
            return Vec::new();
        }
        if let Some(command) = parse_command(&text) {
            return self.run_command(command);
        }

        let result = if text.starts_with("tomorrow") {
            self.service.create_tomorrow_entry(&text)
        } else {
            match self.mode {
                Mode::Calendar => {
                    self.service
                        .create_entry_for_date(&text, self.selected_date, None)
                }
                Mode::Todos => self.service.create_entry(&text, Some(EntryKind::Todo)),
                Mode::Stream => self.service.create_entry(&text, None),
            }
        };
        if self.saved(result).is_none() {
            return Vec::new();
        }
        self.input.clear();
        self.search = None;
        vec![self.reload_task()]
    }

    fn run_command(&mut self, command: SlashCommand) -> Vec<Task> {
        debug!("Running command {:?}", command);
        match command {
            SlashCommand::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            SlashCommand::Help => {
                self.show_help = !self.show_help;
                self.input.clear();
                Vec::new()
            }
            SlashCommand::Stream => self.switch_mode(Mode::Stream),
            SlashCommand::Todos => self.switch_mode(Mode::Todos),
            SlashCommand::Calendar => self.switch_mode(Mode::Calendar),
            SlashCommand::Todo(text) if text.is_empty() => {
                self.set_error(TODO_USAGE.to_string());
                Vec::new()
            }
            SlashCommand::Todo(text) => {
                let result = if self.mode == Mode::Calendar {
                    self.service
                        .create_entry_for_date(&text, self.selected_date, Some(EntryKind::Todo))
                } else {
                    self.service.create_entry(&text, Some(EntryKind::Todo))
                };
                if self.saved(result).is_none() {
                    return Vec::new();
                }
                self.input.clear();
                vec![self.reload_task()]
            }
            SlashCommand::Search(query) => self.start_search(query, false),
            SlashCommand::Links(query) => self.start_search(query, true),
            SlashCommand::Unknown(name) => {
                self.set_error(format!("Unknown command: {}", name));
                self.input.clear();
                Vec::new()
            }
        }
    }

    fn start_search(&mut self, query: String, links_only: bool) -> Vec<Task> {
        if query.is_empty() {
            let usage = if links_only { LINKS_USAGE } else { SEARCH_USAGE };
            self.set_error(usage.to_string());
            return Vec::new();
        }
        if self.edit.is_some() {
            self.cancel_edit();
        }
        self.mode = Mode::Stream;
        self.pane = Pane::Input;
        self.input.clear();
        self.input.focus();
        self.selected_idx = -1;
        self.search = Some(SearchState {
            query: query.clone(),
            links_only,
        });
        info!("Searching for '{}' (links only: {})", query, links_only);
        vec![Task::Search {
            query,
            links_only,
            mode: Mode::Stream,
        }]
    }

    /// Toggles or cancels the selected todo through `change`.
    fn change_selected_status(
        &mut self,
        change: fn(&EntryService, &str, &[Entry]) -> Result<Option<Entry>>,
    ) -> Vec<Task> {
        let Some(entry) = self.selected_entry().filter(|e| e.is_todo()) else {
            return Vec::new();
        };
        let id = entry.id.clone();
        let idx = self.selected_idx as usize;
        match self.saved(change(&self.service, &id, &self.entries)) {
            Some(Some(updated)) => {
                self.entries[idx] = updated;
                vec![self.reload_task()]
            }
            _ => Vec::new(),
        }
    }

    fn start_edit(&mut self) {
        let Some(entry) = self.selected_entry().filter(|e| e.is_todo()) else {
            return;
        };
        let edit = TodoEdit {
            idx: self.selected_idx as usize,
            entry_id: entry.id.clone(),
            original_content: entry.content.clone(),
        };
        self.input.set_value(&edit.original_content);
        self.input.focus();
        debug!("Editing todo {}", edit.entry_id);
        self.edit = Some(edit);
    }

    fn save_edit(&mut self) -> Vec<Task> {
        let Some(edit) = self.edit.clone() else {
            return Vec::new();
        };
        let content = self.input.value().to_string();
        let result = self
            .service
            .update_todo_content(&edit.entry_id, &self.entries, &content);
        match self.saved(result) {
            Some(Some(updated)) => {
                if let Some(slot) = self.entries.get_mut(edit.idx) {
                    *slot = updated;
                }
                self.finish_edit();
                vec![self.reload_task()]
            }
            Some(None) => {
                self.cancel_edit();
                Vec::new()
            }
            // keep editing so the text is not lost
            None => Vec::new(),
        }
    }

    fn cancel_edit(&mut self) {
        if let Some(edit) = &self.edit {
            if let Some(entry) = self.entries.get_mut(edit.idx) {
                if entry.id == edit.entry_id {
                    entry.content = edit.original_content.clone();
                }
            }
        }
        self.finish_edit();
    }

    fn finish_edit(&mut self) {
        self.edit = None;
        self.input.clear();
        self.input.blur();
    }

    /// Unwraps a save result, raising the error banner on failure.
    fn saved<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Save failed: {}", e);
                self.set_error(format!("Save failed: {}", e));
                None
            }
        }
    }

    fn set_error(&mut self, message: String) {
        self.error = Some((message, Instant::now()));
    }

    fn set_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        if !self.entries.is_empty() && self.selected_idx < 0 {
            self.selected_idx = self.entries.len() as isize - 1;
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let last = self.entries.len() as isize - 1;
        if self.selected_idx > last {
            self.selected_idx = last;
        }
    }

    /// The load that refreshes whatever is currently shown.
    fn reload_task(&self) -> Task {
        match (&self.search, self.mode) {
            (Some(search), _) => Task::Search {
                query: search.query.clone(),
                links_only: search.links_only,
                mode: self.mode,
            },
            (None, Mode::Calendar) => Task::LoadCalendar,
            (None, mode) => Task::LoadView { mode },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DayFileStore, LinkExtractor};
    use std::fs;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> (TempDir, ViewState) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(DayFileStore::with_format(dir.path(), "%Y-%m-%d").unwrap());
        store.initialize().unwrap();
        let fetcher = Arc::new(LinkExtractor::new().unwrap());
        let service = Arc::new(EntryService::new(store, fetcher, None));
        (dir, ViewState::new(service))
    }

    /// Runs tasks inline until the state asks for nothing more.
    fn pump(state: &mut ViewState, tasks: Vec<Task>) {
        let mut queue = tasks;
        while let Some(task) = queue.pop() {
            let message = task.run(state.service());
            queue.extend(state.apply(message));
        }
    }

    fn press(state: &mut ViewState, code: KeyCode) {
        let tasks = state.handle_key(key(code));
        pump(state, tasks);
    }

    fn type_line(state: &mut ViewState, text: &str) {
        for c in text.chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
        press(state, KeyCode::Enter);
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn shift_tab_cycles_modes() {
        let (_dir, mut state) = setup();
        assert_eq!(state.mode(), Mode::Stream);
        press(&mut state, KeyCode::BackTab);
        assert_eq!(state.mode(), Mode::Todos);
        press(&mut state, KeyCode::BackTab);
        assert_eq!(state.mode(), Mode::Calendar);
        assert_eq!(state.pane(), Pane::Input);
        press(&mut state, KeyCode::BackTab);
        assert_eq!(state.mode(), Mode::Stream);
        assert_eq!(state.selected_idx(), -1);
    }

    #[test]
    fn submitted_entry_appears_and_input_clears() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "This is just a regular note");
        assert!(state.input().is_empty());
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.entries()[0].kind, EntryKind::Note);
        assert_eq!(state.selected_idx(), 0);
        assert_eq!(state.status_context(), "1 entries");
    }

    #[test]
    fn blank_input_is_ignored() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "   ");
        assert!(state.entries().is_empty());
        assert!(state.visible_error(Instant::now()).is_none());
    }

    #[test]
    fn stale_view_results_are_discarded() {
        let (_dir, mut state) = setup();
        press(&mut state, KeyCode::BackTab);
        let stale = Message::ViewLoaded {
            mode: Mode::Stream,
            entries: vec![Entry::new("old")],
        };
        state.apply(stale);
        assert!(state.entries().is_empty());

        let fresh = Message::ViewLoaded {
            mode: Mode::Todos,
            entries: vec![Entry::new("a"), Entry::new("b")],
        };
        state.apply(fresh);
        assert_eq!(state.entries().len(), 2);
        assert_eq!(state.selected_idx(), 1);
    }

    #[test]
    fn todo_command_usage_and_unknown_command() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "/todo");
        assert_eq!(state.visible_error(Instant::now()), Some(TODO_USAGE));
        assert_eq!(state.input().value(), "/todo");

        state.input.clear();
        type_line(&mut state, "/frob");
        assert_eq!(
            state.visible_error(Instant::now()),
            Some("Unknown command: /frob")
        );
        assert!(state.input().is_empty());
    }

    #[test]
    fn error_banner_expires() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "/nope");
        let raised = Instant::now();
        assert!(state.visible_error(raised).is_some());
        assert!(state.visible_error(raised + Duration::from_secs(6)).is_none());
    }

    #[test]
    fn quit_command_and_ctrl_c() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "/q");
        assert!(state.should_quit());

        let (_dir, mut state) = setup();
        state.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(state.should_quit());
    }

    #[test]
    fn todos_mode_forces_todo_and_toggles() {
        let (_dir, mut state) = setup();
        press(&mut state, KeyCode::BackTab);
        type_line(&mut state, "call the plumber");
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.entries()[0].kind, EntryKind::Todo);
        assert_eq!(state.status_context(), "0/1 done");

        press(&mut state, KeyCode::Tab);
        assert!(!state.input().is_focused());
        assert_eq!(state.selected_idx(), 0);

        press(&mut state, KeyCode::Enter);
        assert_eq!(state.entries()[0].status(), TodoStatus::Completed);
        assert_eq!(state.status_context(), "1/1 done");

        press(&mut state, KeyCode::Enter);
        assert_eq!(state.entries()[0].status(), TodoStatus::Pending);

        press(&mut state, KeyCode::Char('x'));
        assert_eq!(state.entries()[0].status(), TodoStatus::Cancelled);
        press(&mut state, KeyCode::Char('x'));
        assert_eq!(state.entries()[0].status(), TodoStatus::Pending);
    }

    #[test]
    fn editing_a_todo_saves_and_cancels() {
        let (_dir, mut state) = setup();
        press(&mut state, KeyCode::BackTab);
        type_line(&mut state, "/t write report");
        press(&mut state, KeyCode::Tab);

        press(&mut state, KeyCode::Char('e'));
        assert_eq!(state.editing_todo_idx(), 0);
        assert_eq!(state.input().value(), "write report");
        assert!(state.input().is_focused());
        assert_eq!(state.status_context(), "EDITING TODO");

        for c in " v2".chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.editing_todo_idx(), -1);
        assert!(state.input().is_empty());
        assert!(!state.input().is_focused());
        assert_eq!(state.entries()[0].content, "write report v2");

        press(&mut state, KeyCode::Right);
        assert_eq!(state.editing_todo_idx(), 0);
        state.handle_key(key(KeyCode::Backspace));
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.editing_todo_idx(), -1);
        assert_eq!(state.entries()[0].content, "write report v2");
    }

    #[test]
    fn empty_edit_cancels() {
        let (_dir, mut state) = setup();
        press(&mut state, KeyCode::BackTab);
        type_line(&mut state, "/t keep me");
        press(&mut state, KeyCode::Tab);
        press(&mut state, KeyCode::Char('e'));
        state.input.clear();
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.editing_todo_idx(), -1);
        assert_eq!(state.entries()[0].content, "keep me");
    }

    #[test]
    fn calendar_panes_and_spatial_navigation() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "/cal");
        assert_eq!(state.mode(), Mode::Calendar);

        press(&mut state, KeyCode::Tab);
        assert_eq!(state.pane(), Pane::Entries);
        assert!(!state.input().is_focused());
        press(&mut state, KeyCode::Tab);
        assert_eq!(state.pane(), Pane::DatePicker);

        state.selected_date = d(2024, 3, 15);
        press(&mut state, KeyCode::Down);
        assert_eq!(state.selected_date(), d(2024, 3, 22));
        assert!(state.status_context().starts_with("March 2024"));

        state.selected_date = d(2024, 3, 1);
        press(&mut state, KeyCode::Left);
        assert_eq!(state.selected_date(), d(2024, 2, 29));
        press(&mut state, KeyCode::Right);
        assert_eq!(state.selected_date(), d(2024, 3, 1));

        press(&mut state, KeyCode::PageDown);
        assert_eq!(state.selected_date(), d(2024, 4, 1));
        press(&mut state, KeyCode::Char('t'));
        assert_eq!(state.selected_date(), Local::now().date_naive());

        press(&mut state, KeyCode::Enter);
        assert_eq!(state.pane(), Pane::Input);
        assert!(state.input().is_focused());
    }

    #[test]
    fn calendar_entries_go_to_selected_date() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "/cal");
        state.selected_date = d(2024, 3, 15);
        type_line(&mut state, "retro notes");

        let stored = state.service().load_entries_for_date(d(2024, 3, 15)).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(state.calendar_entries().contains_key(&d(2024, 3, 15)));
        assert_eq!(state.entries().len(), 1);
    }

    #[test]
    fn stale_day_results_are_discarded() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "/cal");
        state.selected_date = d(2024, 3, 2);
        state.apply(Message::DayLoaded {
            date: d(2024, 3, 1),
            entries: vec![Entry::new("late")],
        });
        assert!(state.entries().is_empty());
    }

    #[test]
    fn esc_leaves_calendar() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "/cal");
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode(), Mode::Stream);
    }

    #[test]
    fn help_toggle_respects_typing() {
        let (_dir, mut state) = setup();
        press(&mut state, KeyCode::Char('?'));
        assert!(state.show_help());
        press(&mut state, KeyCode::Esc);
        assert!(!state.show_help());

        for c in "why?".chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
        assert!(!state.show_help());
        assert_eq!(state.input().value(), "why?");
    }

    #[test]
    fn search_shows_hits_until_esc() {
        let (_dir, mut state) = setup();
        type_line(&mut state, "learn tokio runtime");
        type_line(&mut state, "buy groceries");
        type_line(&mut state, "/search tokio");

        assert_eq!(state.search().map(|s| s.query.as_str()), Some("tokio"));
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.status_context(), "search: \"tokio\" • 1 hits");

        press(&mut state, KeyCode::Esc);
        assert!(state.search().is_none());
        assert_eq!(state.entries().len(), 2);
    }

    #[test]
    fn tab_completes_single_command() {
        let (_dir, mut state) = setup();
        for c in "/ca".chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(state.suggestions(), vec!["/cal"]);
        press(&mut state, KeyCode::Tab);
        assert_eq!(state.input().value(), "/cal");
    }

    #[test]
    fn q_quits_only_without_input_focus() {
        let (_dir, mut state) = setup();
        state.handle_key(key(KeyCode::Char('q')));
        assert!(!state.should_quit());
        assert_eq!(state.input().value(), "q");

        state.input.clear();
        press(&mut state, KeyCode::BackTab);
        press(&mut state, KeyCode::Tab);
        state.handle_key(key(KeyCode::Char('q')));
        assert!(state.should_quit());
    }

    #[test]
    fn failed_save_keeps_input() {
        let (dir, mut state) = setup();
        let today = Local::now().date_naive();
        fs::create_dir(dir.path().join(format!("{}.md", today.format("%Y-%m-%d")))).unwrap();

        type_line(&mut state, "will not save");
        assert_eq!(state.input().value(), "will not save");
        let error = state.visible_error(Instant::now()).unwrap();
        assert!(error.starts_with("Save failed:"));
    }

    #[test]
    fn data_change_reloads_unless_editing() {
        let (_dir, mut state) = setup();
        assert_eq!(
            state.apply(Message::DataChanged),
            vec![Task::LoadView { mode: Mode::Stream }]
        );

        press(&mut state, KeyCode::BackTab);
        type_line(&mut state, "/t item");
        press(&mut state, KeyCode::Tab);
        press(&mut state, KeyCode::Char('e'));
        assert!(state.apply(Message::DataChanged).is_empty());
    }
}
