use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line editor for the free text status filter.
#[derive(Default)]
pub struct Inputter {
    text: String,
    cursor: usize, // in chars, not bytes
    state: InputState,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    #[default]
    EDITING,
    SUBMITTED,
    CANCELED,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputResult {
    pub text: String,
    pub cursor: usize,
    pub state: InputState,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.state = InputState::SUBMITTED,
            (KeyCode::Esc, _) => self.state = InputState::CANCELED,
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = (self.cursor + 1).min(self.len()),
            (KeyCode::Home, _) => self.cursor = 0,
            (KeyCode::End, _) => self.cursor = self.len(),
            (KeyCode::Char(chr), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.insert(chr),
            (code, modifiers) => trace!("Ignoring input key {code:?} {modifiers:?}"),
        }
        self.get()
    }

    /// Start a new edit prefilled with `text`, cursor at the end.
    pub fn start(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.len();
        self.state = InputState::EDITING;
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            text: self.text.clone(),
            cursor: self.cursor,
            state: self.state,
        }
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn insert(&mut self, chr: char) {
        let pos = self.byte_pos(self.cursor);
        self.text.insert(pos, chr);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let pos = self.byte_pos(self.cursor);
            self.text.remove(pos);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.len() {
            let pos = self.byte_pos(self.cursor);
            self.text.remove(pos);
        }
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.text.len())
    }
}
