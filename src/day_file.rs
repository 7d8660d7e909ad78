//! On-disk format of a day file.
//!
//! A day file is a YAML front-matter block holding the authoritative
//! [`DayFile`] followed by a Markdown body regenerated from it on every
//! save. Only the front-matter is ever read back.
use std::{fmt::Write as _, path::Path};

use crate::{DayFile, Entry, Result, StakError, TodoStatus};

const FRONT_MATTER_DELIMITER: &str = "---";
const HEADING_DATE_FORMAT: &str = "%B %-d, %Y";
const ENTRY_TIME_FORMAT: &str = "%H:%M";

/// Serializes a day file to its full text: front-matter plus Markdown body.
pub fn render_day_file(day: &DayFile) -> Result<String> {
    let yaml = serde_yaml::to_string(day)?;
    let mut out = String::with_capacity(yaml.len() * 2);
    out.push_str(FRONT_MATTER_DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(FRONT_MATTER_DELIMITER);
    out.push_str("\n\n");
    let _ = write!(out, "# {}\n\n", day.date.format(HEADING_DATE_FORMAT));
    for entry in &day.entries {
        out.push_str(&render_entry(entry));
    }
    Ok(out)
}

/// Markdown body for a single entry, ending with its separator.
pub fn render_entry(entry: &Entry) -> String {
    let mut md = String::new();
    let _ = write!(md, "## {}\n\n", entry.created_at.format(ENTRY_TIME_FORMAT));

    if entry.is_todo() {
        let checkbox = match entry.status() {
            TodoStatus::Completed => "[x]",
            TodoStatus::Pending | TodoStatus::Cancelled => "[ ]",
        };
        let _ = writeln!(md, "- {} {}", checkbox, entry.content);
    } else {
        let _ = writeln!(md, "{}", entry.content);
    }

    if let Some(url) = entry.url.as_deref().filter(|u| !u.is_empty()) {
        match entry.url_title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => {
                let _ = write!(md, "\n[{}]({})\n", title, url);
            }
            None => {
                let _ = write!(md, "\n{}\n", url);
            }
        }
    }

    if !entry.tags.is_empty() {
        let _ = write!(md, "\n*Tags: {}*\n", entry.tags.join(", "));
    }

    md.push_str("\n---\n\n");
    md
}

/// Extracts the YAML between the opening `---` line and the next line that is exactly `---`.
pub fn split_front_matter(text: &str) -> Option<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != FRONT_MATTER_DELIMITER {
        return None;
    }
    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            return Some(&text[start..offset]);
        }
        offset += line.len();
    }
    None
}

/// Parses the front-matter of a day file. `path` is only used for error messages.
pub fn parse_day_file(text: &str, path: &Path) -> Result<DayFile> {
    let yaml = split_front_matter(text).ok_or_else(|| StakError::InvalidFormat {
        path: path.to_path_buf(),
        message: "missing front-matter".to_string(),
    })?;
    let day: DayFile = serde_yaml::from_str(yaml)?;
    Ok(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryKind;
    use chrono::NaiveDate;

    fn day() -> DayFile {
        DayFile::new(NaiveDate::from_ymd_opt(2006, 1, 2).unwrap())
    }

    #[test]
    fn renders_heading_and_entries() {
        let mut day = day();
        let mut todo = Entry::new_for_date("- water plants", day.date);
        todo.kind = EntryKind::Todo;
        todo.todo_status = Some(TodoStatus::Completed);
        todo.add_tag("todo");
        todo.add_tag("task");
        day.upsert(todo);

        let text = render_day_file(&day).unwrap();
        assert!(text.starts_with("---\n"));
        assert!(text.contains("# January 2, 2006\n"));
        assert!(text.contains("- [x] - water plants\n"));
        assert!(text.contains("*Tags: todo, task*\n"));
        assert!(text.trim_end().ends_with("---"));
    }

    #[test]
    fn link_renders_title_when_known() {
        let mut entry = Entry::new("see https://go.dev");
        entry.kind = EntryKind::Link;
        entry.url = Some("https://go.dev".into());
        assert!(render_entry(&entry).contains("\nhttps://go.dev\n"));

        entry.url_title = Some("The Go Programming Language".into());
        assert!(render_entry(&entry).contains("[The Go Programming Language](https://go.dev)"));
    }

    #[test]
    fn pending_todo_renders_open_checkbox() {
        let mut entry = Entry::new("ship it");
        entry.kind = EntryKind::Todo;
        entry.todo_status = Some(TodoStatus::Pending);
        assert!(render_entry(&entry).contains("- [ ] ship it\n"));
    }

    #[test]
    fn round_trips_through_front_matter() {
        let mut day = day();
        let mut entry = Entry::new_for_date("a line with --- dashes\n---\nand a separator", day.date);
        entry.add_tag("note");
        entry.metadata.insert("source".into(), "test".into());
        day.upsert(entry);

        let text = render_day_file(&day).unwrap();
        let parsed = parse_day_file(&text, Path::new("2006-01-02.md")).unwrap();
        assert_eq!(parsed, day);
    }

    #[test]
    fn body_is_never_read_back() {
        let day = day();
        let mut text = render_day_file(&day).unwrap();
        text.push_str("## 10:00\n\nhand written line\n\n---\n\n");
        let parsed = parse_day_file(&text, Path::new("x.md")).unwrap();
        assert!(parsed.entries.is_empty());
    }

    #[test]
    fn missing_front_matter_is_invalid() {
        let err = parse_day_file("# just markdown\n", Path::new("x.md")).unwrap_err();
        assert!(matches!(err, StakError::InvalidFormat { .. }));
        assert!(split_front_matter("---\nunterminated: true\n").is_none());
    }
}
