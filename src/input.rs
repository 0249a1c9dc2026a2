//! Single-line text input with a cursor.
//!
//! The cursor counts characters, not bytes, so multi-byte titles edit safely.

/// A text input field with cursor position and active state management.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
            active: false,
        }
    }

    /// Byte offset of the cursor.
    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        let at = self.byte_index();
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    /// Empty the field.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Value with a visible cursor marker when active.
    pub fn display(&self) -> String {
        if !self.active {
            return self.value.clone();
        }
        let at = self.byte_index();
        format!("{}│{}", &self.value[..at], &self.value[at..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor() {
        let mut f = InputField::with_value("ac");
        f.move_cursor_left();
        f.handle_char('b');
        assert_eq!(f.value, "abc");
        f.handle_backspace();
        assert_eq!(f.value, "ac");
        f.handle_delete();
        assert_eq!(f.value, "a");
        assert_eq!(f.cursor, 1);
    }

    #[test]
    fn handles_multibyte_characters() {
        let mut f = InputField::with_value("café");
        f.handle_backspace();
        assert_eq!(f.value, "caf");
        f.handle_char('é');
        f.handle_char('!');
        assert_eq!(f.value, "café!");
        f.clear();
        assert_eq!(f.cursor, 0);
    }

    #[test]
    fn display_shows_cursor_only_when_active() {
        let mut f = InputField::with_value("ab");
        assert_eq!(f.display(), "ab");
        f.active = true;
        f.move_cursor_left();
        assert_eq!(f.display(), "a│b");
    }
}
