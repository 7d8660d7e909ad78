use std::time::Instant;

use chrono::{Datelike, Local, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use super::{
    commands::HELP_LINES,
    input::{PLACEHOLDER, PROMPT},
    Mode, Pane, ViewState,
};
use crate::{
    calendar::{month_grid, WEEKDAY_HEADER},
    Entry, EntryKind, TodoStatus,
};

/// Calendar mode needs at least this much room for its content area
pub const CALENDAR_MIN_WIDTH: u16 = 80;
pub const CALENDAR_MIN_HEIGHT: u16 = 20;

const KEY_HINTS: &str =
    "shift+tab mode • tab pane • enter select/toggle • e edit • ? help • ctrl+c quit";

/// Colors of the screen, chosen by the `theme` config option.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub mode_bg: Color,
    pub context_bg: Color,
    pub time_bg: Color,
    pub bar_bg: Color,
    pub error_bg: Color,
    pub selected_bg: Color,
    pub accent: Color,
    pub marker: Color,
    pub muted: Color,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name {
            "mono" => Self::mono(),
            _ => Self::default_palette(),
        }
    }

    fn default_palette() -> Self {
        Self {
            mode_bg: Color::Rgb(0x5F, 0x87, 0xAF),
            context_bg: Color::Rgb(0x87, 0x5F, 0x87),
            time_bg: Color::Rgb(0x5F, 0x87, 0x5F),
            bar_bg: Color::Rgb(0x2D, 0x2D, 0x2D),
            error_bg: Color::Rgb(0xFF, 0x00, 0x00),
            selected_bg: Color::Rgb(0x44, 0x44, 0x44),
            accent: Color::Rgb(0xFF, 0xA5, 0x00),
            marker: Color::Rgb(0xFF, 0xA5, 0x00),
            muted: Color::Rgb(0x66, 0x66, 0x66),
        }
    }

    fn mono() -> Self {
        Self {
            mode_bg: Color::White,
            context_bg: Color::Gray,
            time_bg: Color::Gray,
            bar_bg: Color::Black,
            error_bg: Color::White,
            selected_bg: Color::DarkGray,
            accent: Color::White,
            marker: Color::White,
            muted: Color::DarkGray,
        }
    }

    fn segment(&self, bg: Color) -> Style {
        let fg = if bg == Color::White || bg == Color::Gray {
            Color::Black
        } else {
            Color::White
        };
        Style::default().bg(bg).fg(fg)
    }
}

pub fn draw(frame: &mut Frame<'_>, state: &ViewState, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    if state.show_help() {
        draw_help(frame, rows[0]);
    } else if state.mode() == Mode::Calendar {
        draw_calendar_view(frame, rows[0], state, theme);
    } else {
        draw_entries(frame, rows[0], state, theme);
    }
    draw_status_bar(frame, rows[1], state, theme);
    draw_input(frame, rows[2], state, theme);
    draw_hint_line(frame, rows[3], state, theme);
}

fn draw_help(frame: &mut Frame<'_>, area: Rect) {
    let lines: Vec<Line> = HELP_LINES.iter().map(|l| Line::raw(*l)).collect();
    let paragraph = Paragraph::new(lines).block(Block::default().title(" Help "));
    frame.render_widget(paragraph, inset(area));
}

/// Chat-style list: oldest at the top, newest at the bottom.
fn draw_entries(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let area = inset(area);
    let entries = state.entries();

    if entries.is_empty() {
        let text = match (state.search(), state.mode()) {
            (Some(_), _) => "No entries found.",
            (None, Mode::Todos) => "No todos yet. Start typing to add one.",
            (None, _) => "No entries yet. Start typing to add one.",
        };
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.muted));
        frame.render_widget(paragraph, centered_line(area));
        return;
    }

    let visible = usize::from(area.height).max(1);
    let (start, end) = visible_window(entries.len(), visible, state.selected_idx());
    let marker = state.mode() == Mode::Todos && !state.input().is_focused();

    let lines: Vec<Line> = entries[start..end]
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let selected = (start + offset) as isize == state.selected_idx();
            entry_line(entry, selected, marker, theme)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

/// Range of rows to show so that `selected` stays on screen.
pub fn visible_window(len: usize, visible: usize, selected: isize) -> (usize, usize) {
    let mut start = len.saturating_sub(visible);
    if let Ok(selected) = usize::try_from(selected) {
        if selected < start {
            start = selected;
        }
    }
    (start, (start + visible).min(len))
}

fn entry_line(entry: &Entry, selected: bool, marker: bool, theme: &Theme) -> Line<'static> {
    let mut text = format!("{} {}", entry.created_at.format("%H:%M"), entry_text(entry));
    if selected && marker {
        text = format!("› {}", text);
    }
    let style = if selected {
        Style::default().bg(theme.selected_bg).fg(Color::White)
    } else if entry.status() == TodoStatus::Cancelled && entry.is_todo() {
        Style::default().fg(theme.muted).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    Line::from(Span::styled(text, style))
}

fn entry_text(entry: &Entry) -> String {
    let mut text = match (entry.kind, entry.status()) {
        (EntryKind::Todo, TodoStatus::Completed) => format!("✓ {}", entry.content),
        (EntryKind::Todo, TodoStatus::Cancelled) => format!("✗ {}", entry.content),
        (EntryKind::Todo, TodoStatus::Pending) => format!("□ {}", entry.content),
        _ => entry.content.clone(),
    };
    if let Some(title) = entry.url_title.as_deref().filter(|t| !t.is_empty()) {
        text.push_str(&format!("  [{}]", title));
    }
    text
}

fn draw_calendar_view(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    if area.width < CALENDAR_MIN_WIDTH || area.height < CALENDAR_MIN_HEIGHT {
        let text = format!(
            "Terminal too small. Calendar mode needs at least {}x{} characters.",
            CALENDAR_MIN_WIDTH, CALENDAR_MIN_HEIGHT
        );
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, centered_line(area));
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    draw_day_entries(frame, columns[0], state, theme);
    draw_month(frame, columns[1], state, theme);
}

fn pane_block(title: &'static str, focused: bool, theme: &Theme) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { theme.accent } else { theme.muted }))
}

fn draw_day_entries(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let block = pane_block(" Entries ", state.pane() == Pane::Entries, theme);
    let mut lines = vec![
        Line::from(Span::styled(
            state.selected_date().format("%A, %B %-d, %Y").to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
    ];

    if state.entries().is_empty() {
        lines.push(Line::from(Span::styled(
            "No entries for this date",
            Style::default().fg(theme.muted),
        )));
    } else {
        for (i, entry) in state.entries().iter().enumerate() {
            lines.push(entry_line(entry, i as isize == state.selected_idx(), false, theme));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_month(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let block = pane_block(" Calendar ", state.pane() == Pane::DatePicker, theme);
    let selected = state.selected_date();
    let today = Local::now().date_naive();

    let mut lines = vec![
        Line::from(Span::styled(
            selected.format("%B %Y").to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(WEEKDAY_HEADER.join(" ")),
    ];

    for week in month_grid(selected) {
        let mut spans = Vec::with_capacity(14);
        for (col, cell) in week.iter().enumerate() {
            if col > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(match cell {
                Some(date) => day_cell(*date, selected, today, state, theme),
                None => Span::raw("  "),
            });
        }
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn day_cell(
    date: NaiveDate,
    selected: NaiveDate,
    today: NaiveDate,
    state: &ViewState,
    theme: &Theme,
) -> Span<'static> {
    let mut style = Style::default();
    if state
        .calendar_entries()
        .get(&date)
        .is_some_and(|entries| !entries.is_empty())
    {
        style = style.fg(theme.marker).add_modifier(Modifier::BOLD);
    }
    if date == today {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if date == selected {
        style = style.bg(theme.selected_bg);
        if state.pane() == Pane::DatePicker {
            style = style.add_modifier(Modifier::REVERSED);
        }
    }
    Span::styled(format!("{:>2}", date.day()), style)
}

fn draw_status_bar(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let mode = Span::styled(
        format!(" {} ", state.mode().label()),
        theme.segment(theme.mode_bg).add_modifier(Modifier::BOLD),
    );
    let context = match state.visible_error(Instant::now()) {
        Some(error) => Span::styled(format!(" {} ", error), theme.segment(theme.error_bg)),
        None => Span::styled(
            format!(" {} ", state.status_context()),
            theme.segment(theme.context_bg),
        ),
    };
    let time = Span::styled(
        format!(" {} ", Local::now().format("%H:%M %a %b %-d")),
        theme.segment(theme.time_bg),
    );

    let used = mode.width() + 1 + context.width() + time.width();
    let spacer = usize::from(area.width).saturating_sub(used);
    let line = Line::from(vec![
        mode,
        Span::raw(" "),
        context,
        Span::raw(" ".repeat(spacer)),
        time,
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme.bar_bg)),
        area,
    );
}

fn draw_input(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let input = state.input();
    let active = match state.mode() {
        Mode::Calendar => state.pane() == Pane::Input,
        _ => input.is_focused(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if active { theme.accent } else { theme.muted }));

    let line = if input.is_empty() {
        Line::from(vec![
            Span::raw(PROMPT),
            Span::styled(PLACEHOLDER, Style::default().fg(theme.muted)),
        ])
    } else {
        Line::from(vec![Span::raw(PROMPT), Span::raw(input.value().to_string())])
    };

    let inner = block.inner(area);
    // keep the cursor in view on long lines
    let text_width = usize::from(inner.width).saturating_sub(PROMPT.len() + 1);
    let scroll = input.cursor_column().saturating_sub(text_width);
    let paragraph = Paragraph::new(line)
        .block(block)
        .scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX)));
    frame.render_widget(paragraph, area);

    if input.is_focused() && !state.show_help() {
        let column = PROMPT.len() + input.cursor_column() - scroll;
        let x = inner.x.saturating_add(u16::try_from(column).unwrap_or(u16::MAX));
        frame.set_cursor_position(Position::new(x.min(inner.right()), inner.y));
    }
}

fn draw_hint_line(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let suggestions = state.suggestions();
    let line = if suggestions.is_empty() {
        Line::from(Span::styled(KEY_HINTS, Style::default().fg(theme.muted)))
    } else {
        Line::from(Span::styled(
            suggestions.join("  "),
            Style::default().fg(theme.accent),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn inset(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(2),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(4),
        height: area.height.saturating_sub(2),
    }
}

fn centered_line(area: Rect) -> Rect {
    let height = area.height.min(2);
    Rect {
        x: area.x,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width: area.width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_follows_the_tail() {
        assert_eq!(visible_window(10, 4, -1), (6, 10));
        assert_eq!(visible_window(3, 10, 0), (0, 3));
    }

    #[test]
    fn window_keeps_selection_visible() {
        assert_eq!(visible_window(10, 4, 2), (2, 6));
        assert_eq!(visible_window(10, 4, 8), (6, 10));
        assert_eq!(visible_window(0, 4, -1), (0, 0));
    }

    #[test]
    fn todo_glyphs() {
        let mut todo = Entry::new("ship it");
        todo.kind = EntryKind::Todo;
        todo.todo_status = Some(TodoStatus::Pending);
        assert_eq!(entry_text(&todo), "□ ship it");
        todo.todo_status = Some(TodoStatus::Completed);
        assert_eq!(entry_text(&todo), "✓ ship it");

        let mut link = Entry::new("https://go.dev");
        link.kind = EntryKind::Link;
        link.url_title = Some("The Go Programming Language".into());
        assert_eq!(entry_text(&link), "https://go.dev  [The Go Programming Language]");
    }

    #[test]
    fn mono_theme_by_name() {
        assert_eq!(Theme::from_name("mono").accent, Color::White);
        assert_ne!(Theme::from_name("anything").accent, Color::White);
    }
}
