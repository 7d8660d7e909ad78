/// Upper bound on input length, in characters
pub const CHAR_LIMIT: usize = 500;

pub const PROMPT: &str = "> ";
pub const PLACEHOLDER: &str = "Enter your thoughts, links, todos...";

/// Single-line text input with a byte cursor kept on char boundaries.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self {
            focused: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Replaces the text and moves the cursor to the end.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.chars().take(CHAR_LIMIT).collect();
        self.cursor = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch.is_control() || self.value.chars().count() >= CHAR_LIMIT {
            return;
        }
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.value.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.value.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.len();
    }

    /// Cursor position in characters, for placing the terminal cursor.
    pub fn cursor_column(&self) -> usize {
        self.value[..self.cursor].chars().count()
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.value[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.value[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> TextInput {
        let mut input = TextInput::new();
        text.chars().for_each(|c| input.insert_char(c));
        input
    }

    #[test]
    fn editing_in_the_middle() {
        let mut input = typed("héllo");
        input.move_left();
        input.move_left();
        input.insert_char('X');
        assert_eq!(input.value(), "hélXlo");
        assert_eq!(input.cursor_column(), 4);

        input.home();
        input.delete();
        input.end();
        input.backspace();
        assert_eq!(input.value(), "élXl");
    }

    #[test]
    fn multibyte_cursor_moves() {
        let mut input = typed("日本");
        input.move_left();
        input.backspace();
        assert_eq!(input.value(), "本");
        input.move_right();
        input.move_right();
        assert_eq!(input.cursor_column(), 1);
    }

    #[test]
    fn limit_and_control_chars() {
        let mut input = typed(&"a".repeat(CHAR_LIMIT + 10));
        assert_eq!(input.value().len(), CHAR_LIMIT);
        input.clear();
        input.insert_char('\n');
        assert!(input.is_empty());
    }

    #[test]
    fn set_value_places_cursor_at_end() {
        let mut input = TextInput::new();
        input.set_value("fix bug");
        input.insert_char('s');
        assert_eq!(input.value(), "fix bugs");
        assert!(input.is_focused());
        input.blur();
        assert!(!input.is_focused());
    }
}
