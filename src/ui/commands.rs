//! Slash commands typed into the input line.

/// Commands offered for completion, in display order
pub const SLASH_COMMANDS: &[&str] = &[
    "/stak", "/todos", "/cal", "/todo", "/search", "/links", "/help", "/quit",
];

/// Help overlay lines
pub const HELP_LINES: &[&str] = &[
    "Shift+Tab      cycle STAK → TODO → CALENDAR",
    "Tab            next pane (calendar) / list focus (todos)",
    "Enter          submit, toggle selected todo, save edit",
    "e / →          edit selected todo",
    "x              cancel / restore selected todo",
    "↑ ↓ ← →        navigate; move the date in the calendar",
    "PgUp PgDn      previous / next month",
    "t / Home       jump to today",
    "Esc            dismiss help, cancel edit, leave search or calendar",
    "?              toggle this help",
    "",
    "/stak          stream of today's entries",
    "/todos         all todos",
    "/cal           calendar view",
    "/todo <text>   add a todo (alias /t)",
    "/search <q>    search all entries",
    "/links <q>     search links only",
    "/help          toggle help (alias /h)",
    "/quit          exit stak (alias /q)",
    "",
    "Lines starting with \"tomorrow\" go to tomorrow's file.",
];

pub const TODO_USAGE: &str = "Usage: /todo <text> or /t <text>";
pub const SEARCH_USAGE: &str = "Usage: /search <query>";
pub const LINKS_USAGE: &str = "Usage: /links <query>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Quit,
    Help,
    Stream,
    Calendar,
    Todos,
    /// Remaining words joined by single spaces, possibly empty
    Todo(String),
    Search(String),
    Links(String),
    Unknown(String),
}

/// Parses a line starting with `/`. Returns `None` for anything else.
pub fn parse_command(input: &str) -> Option<SlashCommand> {
    let mut parts = input.split_whitespace();
    let command = parts.next()?;
    if !command.starts_with('/') {
        return None;
    }
    let args = parts.collect::<Vec<_>>().join(" ");

    Some(match command {
        "/quit" | "/q" => SlashCommand::Quit,
        "/help" | "/h" => SlashCommand::Help,
        "/stak" => SlashCommand::Stream,
        "/cal" => SlashCommand::Calendar,
        "/todos" => SlashCommand::Todos,
        "/todo" | "/t" => SlashCommand::Todo(args),
        "/search" => SlashCommand::Search(args),
        "/links" => SlashCommand::Links(args),
        other => SlashCommand::Unknown(other.to_string()),
    })
}

/// Known commands starting with `prefix`. Empty unless `prefix` starts with `/`.
pub fn completions(prefix: &str) -> Vec<&'static str> {
    if !prefix.starts_with('/') || prefix.contains(char::is_whitespace) {
        return Vec::new();
    }
    SLASH_COMMANDS
        .iter()
        .copied()
        .filter(|c| c.starts_with(prefix))
        .collect()
}
