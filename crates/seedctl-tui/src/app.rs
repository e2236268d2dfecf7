//! Application core: event loop, tab management, action dispatch.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use seedctl_core::command::Word;
use seedctl_core::{Dispatcher, Session, SyncStatus, ViewSpec, script};

use crate::action::{Action, Notification, TabId};
use crate::data_bridge;
use crate::event::{Event, EventReader};
use crate::outcome;
use crate::prompt::Prompt;
use crate::tabs::Tab;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::status_bar;

/// How long a notification stays in the status bar.
const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

const HELP_LINES: &[(&str, &str)] = &[
    (":", "Command prompt"),
    ("1-9", "Jump to tab"),
    ("Tab / S-Tab", "Next / previous tab"),
    ("w", "Close tab"),
    ("r", "Refresh now"),
    ("j / k", "Move selection"),
    ("g / G", "First / last row"),
    ("C-d / C-u", "Page down / up"),
    ("s / p", "Start / stop torrent"),
    ("v / a", "Verify / announce torrent"),
    ("i", "Details of torrent"),
    ("f / e / t", "Files, peers, trackers of torrent"),
    ("D / m / n", "Remove, move, rename (prompt)"),
    ("?", "Toggle this help"),
    ("q / C-c", "Quit"),
];

/// What runs once the terminal is up: the rc script, then the initial
/// command line.
#[derive(Debug, Default)]
pub struct Startup {
    /// rc path and whether it is the default one.
    pub rc: Option<(PathBuf, bool)>,
    pub command: Vec<String>,
}

/// Scrollable text shown over the tabs.
struct Popup {
    title: String,
    lines: Vec<String>,
    scroll: u16,
}

pub struct App {
    session: Session,
    dispatcher: Dispatcher,
    tabs: Vec<Tab>,
    active: usize,
    next_tab_id: TabId,
    prompt: Prompt,
    popup: Option<Popup>,
    help_visible: bool,
    notification: Option<(Notification, Instant)>,
    sync: SyncStatus,
    running: bool,
    /// Parent of every tab bridge and the status forwarder.
    cancel: CancellationToken,
    startup: Option<Startup>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(session: Session, startup: Startup) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            dispatcher: Dispatcher::new(session.clone()),
            sync: session.sync_status(),
            session,
            tabs: Vec::new(),
            active: 0,
            next_tab_id: 1,
            prompt: Prompt::default(),
            popup: None,
            help_visible: false,
            notification: None,
            running: true,
            cancel: CancellationToken::new(),
            startup: Some(startup),
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        tokio::spawn(data_bridge::bridge_status(
            self.session.clone(),
            self.action_tx.clone(),
            self.cancel.child_token(),
        ));
        if let Some(startup) = self.startup.take() {
            self.spawn_startup(startup);
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key) {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                } else {
                    self.process_action(action);
                }
            }
        }

        events.stop();
        self.cancel.cancel();
        self.tabs.clear();
        self.session.shutdown().await;
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    /// rc failures become notifications; the initial command (or a
    /// torrent listing) opens the first tab.
    fn spawn_startup(&self, startup: Startup) {
        let dispatcher = self.dispatcher.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Some((path, is_default)) = startup.rc {
                match script::run_file(&dispatcher, &path, is_default).await {
                    Ok(Some(report)) => {
                        for line in report.failures() {
                            let reason = line.error.as_deref().unwrap_or(&line.text);
                            let _ = tx.send(Action::Notify(Notification::warning(format!(
                                "{}:{}: {reason}",
                                report.path, line.line
                            ))));
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        let _ = tx.send(outcome::error(&err));
                    }
                }
            }

            let words: Vec<Word> = if startup.command.is_empty() {
                vec![Word::new("list")]
            } else {
                startup.command.into_iter().map(Word::new).collect()
            };
            let actions = match dispatcher.dispatch(words).await {
                Ok(report) => outcome::actions(report),
                Err(err) => vec![outcome::error(&err)],
            };
            for action in actions {
                let _ = tx.send(action);
            }
        });
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Map a key to an action. The prompt and overlays take keys first,
    /// then global bindings, then the active tab.
    fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if self.prompt.is_active() {
            return self.prompt.handle_key_event(key);
        }

        if let Some(popup) = self.popup.as_mut() {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    return Some(Action::ClosePopup);
                }
                KeyCode::Char('j') | KeyCode::Down => popup.scroll = popup.scroll.saturating_add(1),
                KeyCode::Char('k') | KeyCode::Up => popup.scroll = popup.scroll.saturating_sub(1),
                _ => {}
            }
            return None;
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?' | 'q') => Some(Action::ToggleHelp),
                _ => None,
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => {
                return Some(Action::Quit);
            }
            (_, KeyCode::Char(':')) => return Some(Action::OpenPrompt(String::new())),
            (_, KeyCode::Char('?')) => return Some(Action::ToggleHelp),
            (_, KeyCode::Char('r')) => return Some(Action::Refresh),
            (_, KeyCode::Char('w')) => return Some(Action::CloseTab),
            (_, KeyCode::Char(c @ '1'..='9')) => {
                let n = c.to_digit(10).and_then(|d| usize::try_from(d).ok())?;
                return Some(Action::SwitchTab(n - 1));
            }
            (_, KeyCode::Tab) => return Some(Action::NextTab),
            (_, KeyCode::BackTab) => return Some(Action::PrevTab),
            _ => {}
        }

        self.tabs
            .get_mut(self.active)
            .and_then(|tab| tab.handle_key_event(key))
    }

    // ── State ───────────────────────────────────────────────────────

    fn process_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Render | Action::Resize(..) => {}
            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, at)| at.elapsed() >= NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
            }

            Action::OpenView(spec) => self.open_tab(spec),
            Action::SwitchTab(index) => {
                if index < self.tabs.len() {
                    self.active = index;
                }
            }
            Action::NextTab => {
                if !self.tabs.is_empty() {
                    self.active = (self.active + 1) % self.tabs.len();
                }
            }
            Action::PrevTab => {
                if !self.tabs.is_empty() {
                    self.active = self.active.checked_sub(1).unwrap_or(self.tabs.len() - 1);
                }
            }
            Action::CloseTab => {
                if self.active < self.tabs.len() {
                    let tab = self.tabs.remove(self.active);
                    debug!(tab = tab.id, "closing tab");
                    self.active = self.active.min(self.tabs.len().saturating_sub(1));
                }
            }
            Action::TabUpdated(id, content) => {
                if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
                    tab.update(content);
                }
            }

            Action::OpenPrompt(text) => self.prompt.open(text),
            Action::ClosePrompt => self.prompt.close(),
            Action::RunCommand(line) => self.run_command(line),

            Action::Notify(notification) => {
                self.notification = Some((notification, Instant::now()));
            }
            Action::ShowText { title, lines } => {
                self.popup = Some(Popup {
                    title,
                    lines,
                    scroll: 0,
                });
            }
            Action::ClosePopup => self.popup = None,
            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::SyncChanged(status) => self.sync = status,
            Action::Refresh => self.session.trigger_all(),
        }
    }

    fn open_tab(&mut self, spec: ViewSpec) {
        let id = self.next_tab_id;
        self.next_tab_id += 1;
        let cancel = self.cancel.child_token();
        data_bridge::spawn_view_bridge(
            &self.session,
            id,
            spec.clone(),
            self.action_tx.clone(),
            cancel.clone(),
        );
        debug!(tab = id, kind = %spec.kind, "opening tab");
        self.tabs.push(Tab::new(id, spec, cancel));
        self.active = self.tabs.len() - 1;
    }

    fn run_command(&mut self, line: String) {
        self.prompt.remember(&line);
        let dispatcher = self.dispatcher.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let actions = match dispatcher.run_line(&line).await {
                Ok(report) => outcome::actions(report),
                Err(err) => vec![outcome::error(&err)],
            };
            for action in actions {
                let _ = tx.send(action);
            }
        });
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let banner = status_bar::warning_line(&self.sync);

        let layout = Layout::vertical([
            Constraint::Length(u16::from(banner.is_some())),
            Constraint::Length(1), // tab bar
            Constraint::Min(1),    // active tab
            Constraint::Length(1), // prompt / status
        ])
        .split(area);

        if let Some(banner) = banner {
            frame.render_widget(Paragraph::new(banner), layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);

        match self.tabs.get(self.active) {
            Some(tab) => tab.render(frame, layout[2]),
            None => frame.render_widget(
                Paragraph::new(" No views open. Press : and type a command, e.g. ls")
                    .style(theme::key_hint()),
                layout[2],
            ),
        }

        if self.prompt.is_active() {
            self.prompt.render(frame, layout[3]);
        } else {
            let notification = self.notification.as_ref().map(|(n, _)| n);
            frame.render_widget(
                Paragraph::new(status_bar::line(&self.sync, notification))
                    .style(Style::default().bg(theme::BG_DARK)),
                layout[3],
            );
        }

        if let Some(popup) = &self.popup {
            render_popup(frame, area, popup);
        } else if self.help_visible {
            render_help(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = self
            .tabs
            .iter()
            .enumerate()
            .map(|(i, tab)| {
                let style = if i == self.active {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", i + 1, tab.label()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(self.active);
        frame.render_widget(tabs, area);
    }
}

/// A rectangle of at most `width` x `height`, centered in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

fn overlay_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK))
}

fn render_popup(frame: &mut Frame, area: Rect, popup: &Popup) {
    let longest = popup.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = u16::try_from(longest + 4).unwrap_or(u16::MAX).max(40);
    let height = u16::try_from(popup.lines.len() + 2).unwrap_or(u16::MAX);
    let rect = centered(area, width, height);

    let lines: Vec<Line> = popup.lines.iter().map(|l| Line::raw(l.as_str())).collect();
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(overlay_block(&popup.title))
            .scroll((popup.scroll, 0)),
        rect,
    );
}

fn render_help(frame: &mut Frame, area: Rect) {
    let height = u16::try_from(HELP_LINES.len() + 2).unwrap_or(u16::MAX);
    let rect = centered(area, 56, height);
    let lines: Vec<Line> = HELP_LINES
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!(" {key:<14}"), theme::key_hint_key()),
                Span::styled(*what, Style::default().fg(theme::DIM_WHITE)),
            ])
        })
        .collect();
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(overlay_block("Keys")), rect);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use seedctl_config::{Defaults, Profile};
    use seedctl_core::{EntityId, EntityKind, RemoteClient, Rendered, Settings};

    use super::*;
    use crate::action::TabContent;

    fn app() -> App {
        let remote = seedctl_config::profile_to_remote(&Profile::default(), &Defaults::default())
            .unwrap();
        let client: Arc<dyn RemoteClient> = Arc::new(remote);
        App::new(
            Session::new(client, Arc::new(Settings::new())),
            Startup::default(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn push_tab(app: &mut App, id: TabId) {
        app.tabs.push(Tab::new(
            id,
            ViewSpec::new(EntityKind::Torrent),
            CancellationToken::new(),
        ));
    }

    #[tokio::test]
    async fn colon_opens_the_prompt_and_it_takes_keys() {
        let mut app = app();
        let action = app.handle_key_event(key(KeyCode::Char(':'))).unwrap();
        app.process_action(action);
        assert!(app.prompt.is_active());

        // 'q' is text while the prompt is open
        assert!(app.handle_key_event(key(KeyCode::Char('q'))).is_none());
        assert!(app.running);
    }

    #[tokio::test]
    async fn popup_swallows_keys_until_closed() {
        let mut app = app();
        app.process_action(Action::ShowText {
            title: "Settings".into(),
            lines: vec!["poll.interval 5".into()],
        });
        assert!(app.handle_key_event(key(KeyCode::Char('j'))).is_none());
        assert_eq!(app.popup.as_ref().unwrap().scroll, 1);

        let action = app.handle_key_event(key(KeyCode::Esc)).unwrap();
        app.process_action(action);
        assert!(app.popup.is_none());
    }

    #[tokio::test]
    async fn tab_switching_wraps_and_ignores_missing_tabs() {
        let mut app = app();
        push_tab(&mut app, 1);
        push_tab(&mut app, 2);

        app.process_action(Action::SwitchTab(5));
        assert_eq!(app.active, 0);
        app.process_action(Action::PrevTab);
        assert_eq!(app.active, 1);
        app.process_action(Action::NextTab);
        assert_eq!(app.active, 0);

        let action = app.handle_key_event(key(KeyCode::Char('2'))).unwrap();
        app.process_action(action);
        assert_eq!(app.active, 1);
    }

    #[tokio::test]
    async fn closing_the_last_tab_moves_selection_left() {
        let mut app = app();
        push_tab(&mut app, 1);
        push_tab(&mut app, 2);
        app.active = 1;
        app.process_action(Action::CloseTab);
        assert_eq!(app.active, 0);
        assert_eq!(app.tabs.len(), 1);
        app.process_action(Action::CloseTab);
        assert!(app.tabs.is_empty());
    }

    #[tokio::test]
    async fn updates_reach_the_tab_by_id() {
        let mut app = app();
        push_tab(&mut app, 7);
        app.process_action(Action::TabUpdated(
            7,
            TabContent {
                rendered: Rendered {
                    headers: vec!["ID"],
                    widths: vec![2],
                    rows: vec![vec!["3".into()]],
                },
                ids: vec![EntityId::Torrent(3)],
                loaded: true,
            },
        ));
        assert_eq!(app.tabs[0].selected_id(), Some(&EntityId::Torrent(3)));
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut app = app();
        let action = app.handle_key_event(key(KeyCode::Char('q'))).unwrap();
        app.process_action(action);
        assert!(!app.running);
    }
}
