/// Single-line text input with a byte cursor kept on char boundaries.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn set<T: Into<String>>(&mut self, value: T) {
        self.text = value.into().replace(['\r', '\n'], " ");
        self.cursor = self.text.len();
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\r' || ch == '\n' {
            return;
        }
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some((idx, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.text.drain(idx..self.cursor);
            self.cursor = idx;
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            self.text.drain(self.cursor..self.cursor + ch.len_utf8());
        }
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    /// Cursor position in characters, for placing the terminal cursor.
    pub fn cursor_col(&self) -> usize {
        self.text[..self.cursor].chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor_respect_multibyte_chars() {
        let mut buffer = TextBuffer::new();
        for ch in "café".chars() {
            buffer.insert_char(ch);
        }
        buffer.move_left();
        buffer.insert_char('x');
        assert_eq!(buffer.as_str(), "cafxé");
        assert_eq!(buffer.cursor_col(), 4);

        buffer.delete_char();
        assert_eq!(buffer.as_str(), "cafx");
        buffer.backspace();
        assert_eq!(buffer.as_str(), "caf");
    }

    #[test]
    fn set_flattens_newlines_and_moves_cursor_to_end() {
        let mut buffer = TextBuffer::new();
        buffer.set("two\nlines");
        assert_eq!(buffer.as_str(), "two lines");
        assert_eq!(buffer.cursor_col(), 9);
        buffer.insert_char('\n');
        assert_eq!(buffer.as_str(), "two lines");

        buffer.move_home();
        buffer.backspace();
        assert_eq!(buffer.cursor_col(), 0);
        buffer.move_end();
        buffer.move_right();
        assert_eq!(buffer.cursor_col(), 9);
    }
}
