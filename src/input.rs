use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Down,
    Up,
    PageDown,
    PageUp,
    Top,
    Bottom,
    Select,
    Cancel,
}

pub fn map_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('d')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(Action::Cancel)
        }
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Down),
        KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Up),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => Some(Action::Select),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAction {
    Char(char),
    Backspace,
    Submit,
    Cancel,
}

pub fn map_text_key(key: KeyEvent) -> Option<TextAction> {
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('d')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(TextAction::Cancel)
        }
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => None,
        KeyCode::Char(c) => Some(TextAction::Char(c)),
        KeyCode::Backspace => Some(TextAction::Backspace),
        KeyCode::Enter => Some(TextAction::Submit),
        KeyCode::Esc => Some(TextAction::Cancel),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Cursor {
    selected: usize,
    len: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, len }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Moves the cursor; wraps at both ends for single steps, clamps for pages.
    pub fn apply(&mut self, action: Action, page: usize) {
        if self.len == 0 {
            return;
        }
        let last = self.len - 1;
        self.selected = match action {
            Action::Down if self.selected == last => 0,
            Action::Down => self.selected + 1,
            Action::Up if self.selected == 0 => last,
            Action::Up => self.selected - 1,
            Action::PageDown => (self.selected + page.max(1)).min(last),
            Action::PageUp => self.selected.saturating_sub(page.max(1)),
            Action::Top => 0,
            Action::Bottom => last,
            Action::Select | Action::Cancel => self.selected,
        };
    }
}
