//! The `:` command prompt with line editing and history recall.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_input::{Input, InputRequest};

use crate::action::Action;
use crate::theme;

const HISTORY_LIMIT: usize = 200;

#[derive(Default)]
pub struct Prompt {
    input: Input,
    active: bool,
    history: Vec<String>,
    /// Index into `history` while recalling.
    recall: Option<usize>,
}

impl Prompt {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn open(&mut self, text: String) {
        self.input = Input::new(text);
        self.active = true;
        self.recall = None;
    }

    pub fn close(&mut self) {
        self.active = false;
        self.input.reset();
        self.recall = None;
    }

    /// Remember a command line, skipping immediate repeats.
    pub fn remember(&mut self, line: &str) {
        if self.history.last().is_some_and(|last| last == line) {
            return;
        }
        self.history.push(line.to_owned());
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => Some(Action::ClosePrompt),
            KeyCode::Enter => {
                let line = self.input.value().trim().to_owned();
                self.close();
                (!line.is_empty()).then_some(Action::RunCommand(line))
            }
            KeyCode::Up => {
                self.recall_older();
                None
            }
            KeyCode::Down => {
                self.recall_newer();
                None
            }
            _ => {
                if let Some(request) = edit_request(key) {
                    self.input.handle(request);
                }
                None
            }
        }
    }

    fn recall_older(&mut self) {
        let Some(last) = self.history.len().checked_sub(1) else {
            return;
        };
        let index = self.recall.map_or(last, |i| i.saturating_sub(1));
        self.show(index);
    }

    fn recall_newer(&mut self) {
        match self.recall {
            Some(i) if i + 1 < self.history.len() => self.show(i + 1),
            Some(_) => {
                self.recall = None;
                self.input.reset();
            }
            None => {}
        }
    }

    fn show(&mut self, index: usize) {
        if let Some(line) = self.history.get(index) {
            self.input = Input::new(line.clone());
            self.recall = Some(index);
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = usize::from(area.width.saturating_sub(2));
        let scroll = self.input.visual_scroll(width);
        let line = Line::from(vec![
            Span::styled(":", theme::key_hint_key()),
            Span::raw(self.input.value()),
        ]);
        frame.render_widget(
            Paragraph::new(line).scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX))),
            area,
        );

        let cursor = self.input.visual_cursor().saturating_sub(scroll) + 1;
        let x = area.x + u16::try_from(cursor).unwrap_or(area.width).min(area.width);
        frame.set_cursor_position((x, area.y));
    }
}

/// Line-editing request for a key, emacs-style for control chords.
fn edit_request(key: KeyEvent) -> Option<InputRequest> {
    let request = match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('a')) | (_, KeyCode::Home) => InputRequest::GoToStart,
        (KeyModifiers::CONTROL, KeyCode::Char('e')) | (_, KeyCode::End) => InputRequest::GoToEnd,
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => InputRequest::DeleteLine,
        (KeyModifiers::CONTROL, KeyCode::Char('k')) => InputRequest::DeleteTillEnd,
        (KeyModifiers::CONTROL, KeyCode::Char('w')) => InputRequest::DeletePrevWord,
        (KeyModifiers::CONTROL, KeyCode::Left) => InputRequest::GoToPrevWord,
        (KeyModifiers::CONTROL, KeyCode::Right) => InputRequest::GoToNextWord,
        (KeyModifiers::CONTROL, _) => return None,
        (_, KeyCode::Char(c)) => InputRequest::InsertChar(c),
        (_, KeyCode::Backspace) => InputRequest::DeletePrevChar,
        (_, KeyCode::Delete) => InputRequest::DeleteNextChar,
        (_, KeyCode::Left) => InputRequest::GoToPrevChar,
        (_, KeyCode::Right) => InputRequest::GoToNextChar,
        _ => return None,
    };
    Some(request)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn press(prompt: &mut Prompt, code: KeyCode) -> Option<Action> {
        prompt.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(prompt: &mut Prompt, text: &str) {
        for c in text.chars() {
            press(prompt, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_trimmed_line() {
        let mut prompt = Prompt::default();
        prompt.open(String::new());
        type_text(&mut prompt, " ls seeding ");
        let Some(Action::RunCommand(line)) = press(&mut prompt, KeyCode::Enter) else {
            panic!("expected a command");
        };
        assert_eq!(line, "ls seeding");
        assert!(!prompt.is_active());
    }

    #[test]
    fn empty_line_submits_nothing() {
        let mut prompt = Prompt::default();
        prompt.open(String::new());
        assert!(press(&mut prompt, KeyCode::Enter).is_none());
    }

    #[test]
    fn prefilled_text_is_editable() {
        let mut prompt = Prompt::default();
        prompt.open("move id=3 ".into());
        type_text(&mut prompt, "/data");
        let Some(Action::RunCommand(line)) = press(&mut prompt, KeyCode::Enter) else {
            panic!("expected a command");
        };
        assert_eq!(line, "move id=3 /data");
    }

    #[test]
    fn history_recalls_older_then_newer() {
        let mut prompt = Prompt::default();
        prompt.remember("ls");
        prompt.remember("stop all");
        prompt.remember("stop all");
        prompt.open(String::new());

        press(&mut prompt, KeyCode::Up);
        assert_eq!(prompt.input.value(), "stop all");
        press(&mut prompt, KeyCode::Up);
        assert_eq!(prompt.input.value(), "ls");
        press(&mut prompt, KeyCode::Up);
        assert_eq!(prompt.input.value(), "ls");
        press(&mut prompt, KeyCode::Down);
        assert_eq!(prompt.input.value(), "stop all");
        press(&mut prompt, KeyCode::Down);
        assert_eq!(prompt.input.value(), "");
    }

    #[test]
    fn control_u_clears_the_line() {
        let mut prompt = Prompt::default();
        prompt.open("remove id=4 ".into());
        prompt.handle_key_event(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        type_text(&mut prompt, "ls");
        press(&mut prompt, KeyCode::Backspace);
        assert_eq!(prompt.input.value(), "l");
    }

    #[test]
    fn escape_asks_to_close() {
        let mut prompt = Prompt::default();
        prompt.open("ls".into());
        assert!(matches!(press(&mut prompt, KeyCode::Esc), Some(Action::ClosePrompt)));
    }
}
