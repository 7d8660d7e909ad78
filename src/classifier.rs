//! Rule-based classification of raw entry text.
//!
//! The classifier picks exactly one kind per entry, trying the rules in a
//! fixed order (link, code, question, meeting, todo, note; first match
//! wins), then decorates the entry with keyword tags. Every keyword list
//! is a table below so tests can enumerate them.
use log::trace;
use regex::Regex;

use crate::{Entry, EntryKind, TodoStatus};

/// Substring (matched against lowercased content) to language tag.
pub const LANGUAGE_TAGS: &[(&str, &str)] = &[
    ("go", "golang"),
    ("golang", "golang"),
    ("javascript", "js"),
    ("typescript", "ts"),
    ("python", "python"),
    ("rust", "rust"),
    ("java", "java"),
    ("docker", "docker"),
    ("sql", "database"),
    ("bash", "shell"),
    ("yaml", "config"),
    ("json", "config"),
];

/// Keywords tagged on notes and todos.
pub const GENERAL_TAGS: &[(&str, &str)] = &[
    ("idea", "idea"),
    ("brainstorm", "brainstorm"),
    ("thought", "reflection"),
    ("reminder", "reminder"),
    ("important", "important"),
    ("urgent", "urgent"),
    ("bug", "bug"),
    ("feature", "feature"),
    ("fix", "fix"),
];

/// Keywords tagged on every entry regardless of kind.
pub const DOMAIN_TAGS: &[(&str, &str)] = &[
    ("work", "work"),
    ("personal", "personal"),
    ("project", "project"),
    ("learning", "learning"),
    ("research", "research"),
    ("client", "client"),
    ("team", "team"),
];

pub const MEETING_KEYWORDS: &[&str] = &[
    "meeting",
    "standup",
    "sync",
    "1:1",
    "one-on-one",
    "zoom",
    "conference",
];

/// Words that turn a "call" into a meeting.
pub const CALL_CONTEXT: &[&str] = &["meeting", "scheduled", "today", "tomorrow"];

pub const IMPERATIVE_PHRASES: &[&str] = &[
    "need to",
    "should",
    "must",
    "have to",
    "remember to",
    "don't forget",
];

pub const ACTION_VERBS: &[&str] = &[
    "fix", "update", "implement", "create", "build", "add", "remove", "refactor", "test",
    "deploy", "setup", "install", "configure", "write", "read", "check", "review", "merge",
    "commit", "push", "debug", "investigate", "research", "learn", "practice", "buy", "call",
    "email", "schedule", "book", "contact", "finish", "complete", "start", "begin", "continue",
    "prepare", "plan", "organize", "clean", "backup", "sync", "send", "reply", "respond",
    "follow", "track", "monitor",
];

pub const TODO_INDICATORS: &[&str] = &[
    "need to",
    "should",
    "must",
    "have to",
    "remember to",
    "don't forget",
    "todo:",
    "task:",
    "action:",
    "next:",
    "tomorrow",
    "later",
    "work on",
    "get done",
    "todo",
    "task",
    "action",
    "handle",
    "later today",
    "this week",
    "before",
    "after",
];

pub const LINK_TAGS: &[&str] = &["link", "web", "reference"];
pub const CODE_TAGS: &[&str] = &["code"];
pub const QUESTION_TAGS: &[&str] = &["question", "inquiry"];
pub const MEETING_TAGS: &[&str] = &["meeting", "discussion"];
pub const TODO_TAGS: &[&str] = &["todo", "task"];
pub const NOTE_TAGS: &[&str] = &["note"];

/// Pure, deterministic classifier. Holds only compiled patterns.
pub struct Classifier {
    link_regex: Regex,
    code_regex: Regex,
    question_regex: Regex,
    todo_prefix_regex: Regex,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        // The patterns are literals; a failure here is a programming error caught by tests.
        Classifier {
            link_regex: compile(r"https?://[^\s]+"),
            code_regex: compile(
                r"(?m)```|`[^`]+`|\$\s+[a-zA-Z]|^\s*(import|function|class|def|const|let|var)\s+",
            ),
            question_regex: compile(r"\?(\s|$)"),
            todo_prefix_regex: compile(r"(?i)^(\s*-\s*\[\s*\]|todo:|\[\s*\]|\*\s+|•\s+)"),
        }
    }

    /// Sets kind, url, todo status and tags on `entry` from its content.
    pub fn classify(&self, entry: &mut Entry) {
        let original = entry.content.clone();
        let lower = original.to_lowercase();

        let kind = self.detect_kind(&original, &lower);
        entry.kind = kind;
        match kind {
            EntryKind::Link => {
                entry.url = self.first_url(&original);
                add_tags(entry, LINK_TAGS);
            }
            EntryKind::Code => add_tags(entry, CODE_TAGS),
            EntryKind::Question => add_tags(entry, QUESTION_TAGS),
            EntryKind::Meeting => add_tags(entry, MEETING_TAGS),
            EntryKind::Todo => {
                entry.todo_status = Some(TodoStatus::Pending);
                add_tags(entry, TODO_TAGS);
                add_keyword_tags(entry, &lower, GENERAL_TAGS);
            }
            EntryKind::Note | EntryKind::Idea => {
                add_tags(entry, NOTE_TAGS);
                add_keyword_tags(entry, &lower, GENERAL_TAGS);
            }
        }

        add_keyword_tags(entry, &lower, LANGUAGE_TAGS);
        add_keyword_tags(entry, &lower, DOMAIN_TAGS);
        trace!("Classified entry {} as {} with tags {:?}", entry.id, kind, entry.tags);
    }

    /// The kind rule that wins for `content`, without touching an entry.
    pub fn kind_of(&self, content: &str) -> EntryKind {
        self.detect_kind(content, &content.to_lowercase())
    }

    /// First http(s) URL in `content`.
    pub fn first_url(&self, content: &str) -> Option<String> {
        self.link_regex
            .find(content)
            .map(|m| m.as_str().to_string())
    }

    fn detect_kind(&self, original: &str, lower: &str) -> EntryKind {
        if self.link_regex.is_match(original) {
            EntryKind::Link
        } else if self.code_regex.is_match(original) {
            EntryKind::Code
        } else if self.question_regex.is_match(original) {
            EntryKind::Question
        } else if is_meeting(lower) {
            EntryKind::Meeting
        } else if self.is_todo(original, lower) {
            EntryKind::Todo
        } else {
            EntryKind::Note
        }
    }

    fn is_todo(&self, original: &str, lower: &str) -> bool {
        self.todo_prefix_regex.is_match(original)
            || IMPERATIVE_PHRASES.iter().any(|p| lower.contains(p))
            || starts_with_action_verb(lower)
            || TODO_INDICATORS.iter().any(|p| lower.contains(p))
    }
}

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => panic!("invalid classifier pattern {pattern}: {e}"),
    }
}

fn is_meeting(lower: &str) -> bool {
    MEETING_KEYWORDS.iter().any(|k| lower.contains(k))
        || (lower.contains("call") && CALL_CONTEXT.iter().any(|k| lower.contains(k)))
}

fn starts_with_action_verb(lower: &str) -> bool {
    let trimmed = lower.trim_start();
    ACTION_VERBS.iter().any(|verb| match trimmed.strip_prefix(verb) {
        Some(rest) => rest.is_empty() || rest.starts_with(' ') || rest.starts_with(':'),
        None => false,
    })
}

fn add_tags(entry: &mut Entry, tags: &[&str]) {
    for tag in tags {
        entry.add_tag(tag);
    }
}

fn add_keyword_tags(entry: &mut Entry, lower: &str, table: &[(&str, &str)]) {
    for (keyword, tag) in table {
        if lower.contains(keyword) {
            entry.add_tag(tag);
        }
    }
}
