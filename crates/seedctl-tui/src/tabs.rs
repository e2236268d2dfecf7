//! A tab shows one live view. Its rows come from the data bridge; its
//! keys either move the selection or build command lines aimed at the
//! selected row.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, TableState};
use tokio_util::sync::CancellationToken;

use seedctl_core::{EntityId, ViewSpec};

use crate::action::{Action, TabContent, TabId};
use crate::theme;
use crate::widgets::entity_table;

const PAGE: isize = 10;

/// Keys that run a command on the selected row's torrent.
const RUN_KEYS: &[(char, &str, &str)] = &[
    ('s', "start", "start"),
    ('p', "stop", "stop"),
    ('v', "verify", "verify"),
    ('a', "announce", "announce"),
    ('i', "details", "details"),
    ('f', "filelist", "files"),
    ('e', "peerlist", "peers"),
    ('t', "trackerlist", "trackers"),
];

/// Keys that prefill the prompt, for commands needing confirmation or
/// another argument.
const PROMPT_KEYS: &[(char, &str, &str)] = &[
    ('D', "remove", "remove"),
    ('m', "move", "move"),
    ('n', "rename", "rename"),
];

pub struct Tab {
    pub id: TabId,
    pub spec: ViewSpec,
    content: Option<TabContent>,
    table_state: TableState,
    cancel: CancellationToken,
}

impl Tab {
    pub fn new(id: TabId, spec: ViewSpec, cancel: CancellationToken) -> Self {
        Self {
            id,
            spec,
            content: None,
            table_state: TableState::default().with_selected(Some(0)),
            cancel,
        }
    }

    /// Label for the tab bar.
    pub fn label(&self) -> String {
        let count = self
            .content
            .as_ref()
            .map_or_else(|| "…".to_owned(), |c| c.ids.len().to_string());
        let title = if self.spec.title.is_empty() {
            self.spec.kind.plural()
        } else {
            self.spec.title.as_str()
        };
        format!("{title} ({count})")
    }

    /// Replace the rows, keeping the same entity selected when it is
    /// still listed.
    pub fn update(&mut self, content: TabContent) {
        let previous = self.selected_id().cloned();
        let index = previous
            .and_then(|id| content.ids.iter().position(|i| *i == id))
            .or(self.table_state.selected())
            .unwrap_or(0);
        let last = content.ids.len().saturating_sub(1);
        self.table_state.select(Some(index.min(last)));
        self.content = Some(content);
    }

    pub fn selected_id(&self) -> Option<&EntityId> {
        let content = self.content.as_ref()?;
        content.ids.get(self.table_state.selected()?)
    }

    fn len(&self) -> usize {
        self.content.as_ref().map_or(0, |c| c.ids.len())
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.table_state.select(Some(next));
    }

    /// Command line for `command` aimed at the selected row's torrent.
    fn targeted(&self, command: &str) -> Option<String> {
        self.selected_id()
            .map(|id| format!("{command} id={}", id.torrent_id()))
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        match (key.modifiers, key.code) {
            (_, KeyCode::Char('j') | KeyCode::Down) => self.move_selection(1),
            (_, KeyCode::Char('k') | KeyCode::Up) => self.move_selection(-1),
            (KeyModifiers::CONTROL, KeyCode::Char('d')) | (_, KeyCode::PageDown) => {
                self.move_selection(PAGE);
            }
            (KeyModifiers::CONTROL, KeyCode::Char('u')) | (_, KeyCode::PageUp) => {
                self.move_selection(-PAGE);
            }
            (_, KeyCode::Char('g') | KeyCode::Home) => self.table_state.select(Some(0)),
            (_, KeyCode::Char('G') | KeyCode::End) => {
                self.table_state.select(Some(self.len().saturating_sub(1)));
            }
            (_, KeyCode::Char(c)) => {
                if let Some((_, command, _)) = RUN_KEYS.iter().find(|(k, ..)| *k == c) {
                    return self.targeted(command).map(Action::RunCommand);
                }
                if let Some((_, command, _)) = PROMPT_KEYS.iter().find(|(k, ..)| *k == c) {
                    return self
                        .targeted(command)
                        .map(|line| Action::OpenPrompt(format!("{line} ")));
                }
            }
            _ => {}
        }
        None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.label()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Length(1), // filter / sort
            Constraint::Min(1),    // table
            Constraint::Length(1), // hints
        ])
        .split(inner);

        let filter_line = Line::from(vec![
            Span::styled(" Filter: ", Style::default().fg(theme::DIM_WHITE)),
            Span::styled(self.spec.filter.to_string(), Style::default().fg(theme::NEON_CYAN)),
            Span::styled("  Sort: ", Style::default().fg(theme::DIM_WHITE)),
            Span::styled(self.spec.sort.to_string(), Style::default().fg(theme::NEON_CYAN)),
        ]);
        frame.render_widget(Paragraph::new(filter_line), layout[0]);

        match &self.content {
            Some(content) if content.loaded || !content.ids.is_empty() => {
                let mut state = self.table_state;
                frame.render_stateful_widget(
                    entity_table::table(&content.rendered),
                    layout[1],
                    &mut state,
                );
            }
            _ => frame.render_widget(
                Paragraph::new(" Loading…").style(theme::key_hint()),
                layout[1],
            ),
        }

        frame.render_widget(Paragraph::new(hints()), layout[2]);
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn hints() -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (key, _, label) in RUN_KEYS.iter().chain(PROMPT_KEYS) {
        spans.push(Span::styled(key.to_string(), theme::key_hint_key()));
        spans.push(Span::styled(format!(" {label}  "), theme::key_hint()));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use seedctl_core::{EntityKind, Rendered};

    use super::*;

    fn tab_with(ids: Vec<EntityId>) -> Tab {
        let mut tab = Tab::new(1, ViewSpec::new(EntityKind::Torrent), CancellationToken::new());
        tab.update(content(ids));
        tab
    }

    fn content(ids: Vec<EntityId>) -> TabContent {
        TabContent {
            rendered: Rendered {
                headers: vec!["ID"],
                widths: vec![4],
                rows: ids.iter().map(|id| vec![id.to_string()]).collect(),
            },
            ids,
            loaded: true,
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn selection_follows_the_entity_across_updates() {
        let mut tab = tab_with(vec![EntityId::Torrent(1), EntityId::Torrent(2)]);
        tab.handle_key_event(key('j'));
        assert_eq!(tab.selected_id(), Some(&EntityId::Torrent(2)));

        tab.update(content(vec![
            EntityId::Torrent(2),
            EntityId::Torrent(3),
            EntityId::Torrent(1),
        ]));
        assert_eq!(tab.selected_id(), Some(&EntityId::Torrent(2)));
    }

    #[test]
    fn selection_is_clamped_when_rows_vanish() {
        let mut tab = tab_with(vec![
            EntityId::Torrent(1),
            EntityId::Torrent(2),
            EntityId::Torrent(3),
        ]);
        tab.handle_key_event(key('G'));
        tab.update(content(vec![EntityId::Torrent(1)]));
        assert_eq!(tab.selected_id(), Some(&EntityId::Torrent(1)));
    }

    #[test]
    fn run_keys_target_the_selected_torrent() {
        let mut tab = tab_with(vec![EntityId::File {
            torrent: 4,
            index: 0,
        }]);
        let Some(Action::RunCommand(line)) = tab.handle_key_event(key('p')) else {
            panic!("expected a command");
        };
        assert_eq!(line, "stop id=4");
        let Some(Action::RunCommand(line)) = tab.handle_key_event(key('i')) else {
            panic!("expected a command");
        };
        assert_eq!(line, "details id=4");
    }

    #[test]
    fn prompt_keys_prefill_the_prompt() {
        let mut tab = tab_with(vec![EntityId::Torrent(9)]);
        let Some(Action::OpenPrompt(text)) = tab.handle_key_event(key('m')) else {
            panic!("expected a prompt");
        };
        assert_eq!(text, "move id=9 ");
    }

    #[test]
    fn empty_tab_runs_nothing() {
        let mut tab = tab_with(Vec::new());
        assert!(tab.handle_key_event(key('s')).is_none());
        assert_eq!(tab.label(), "torrents (0)");
    }

    #[test]
    fn dropping_a_tab_cancels_its_bridge() {
        let cancel = CancellationToken::new();
        let tab = Tab::new(1, ViewSpec::new(EntityKind::Torrent), cancel.clone());
        drop(tab);
        assert!(cancel.is_cancelled());
    }
}
