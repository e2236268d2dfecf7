//! Bottom status line: sync indicator, notification and key hints.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use seedctl_core::{SyncState, SyncStatus};

use crate::action::{Notification, NotificationLevel};
use crate::theme;

/// Dot and label for the poller state.
pub fn sync_span(status: &SyncStatus) -> Span<'static> {
    let (symbol, color) = match status.state {
        SyncState::Ready => ("●", theme::SUCCESS_GREEN),
        SyncState::Syncing | SyncState::Uninitialized => ("◐", theme::NEON_CYAN),
        SyncState::Stale => ("◐", theme::ELECTRIC_YELLOW),
        SyncState::Disconnected => ("○", theme::ERROR_RED),
    };
    let label = if status.failures > 0 && status.state != SyncState::Ready {
        format!("{symbol} {} ({} failed)", status.state, status.failures)
    } else {
        format!("{symbol} {}", status.state)
    };
    Span::styled(label, Style::default().fg(color))
}

fn notification_span(notification: &Notification) -> Span<'static> {
    let color = match notification.level {
        NotificationLevel::Info => theme::DIM_WHITE,
        NotificationLevel::Success => theme::SUCCESS_GREEN,
        NotificationLevel::Warning => theme::ELECTRIC_YELLOW,
        NotificationLevel::Error => theme::ERROR_RED,
    };
    Span::styled(notification.message.clone(), Style::default().fg(color))
}

pub fn line(status: &SyncStatus, notification: Option<&Notification>) -> Line<'static> {
    let mut spans = vec![Span::raw(" "), sync_span(status)];
    spans.push(Span::styled(" │ ", theme::key_hint()));
    match notification {
        Some(n) => spans.push(notification_span(n)),
        None => {
            for (key, hint) in [(":", "command"), ("?", "help"), ("q", "quit")] {
                spans.push(Span::styled(key, theme::key_hint_key()));
                spans.push(Span::styled(format!(" {hint}  "), theme::key_hint()));
            }
        }
    }
    Line::from(spans)
}

/// The persistent banner while the daemon is unreachable.
pub fn warning_line(status: &SyncStatus) -> Option<Line<'static>> {
    status
        .warning()
        .map(|w| Line::from(Span::styled(format!(" ⚠ {w} "), theme::warning_banner())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: SyncState, failures: u32) -> SyncStatus {
        SyncStatus {
            state,
            failures,
            last_error: Some("connection refused".into()),
            ..SyncStatus::default()
        }
    }

    #[test]
    fn ready_shows_no_failure_count() {
        let span = sync_span(&status(SyncState::Ready, 0));
        assert_eq!(span.content, "● ready");
    }

    #[test]
    fn stale_shows_failures() {
        let span = sync_span(&status(SyncState::Stale, 2));
        assert_eq!(span.content, "◐ stale (2 failed)");
    }

    #[test]
    fn banner_only_while_disconnected() {
        assert!(warning_line(&status(SyncState::Stale, 1)).is_none());
        let banner = warning_line(&status(SyncState::Disconnected, 5)).unwrap_or_default();
        assert!(banner.to_string().contains("connection refused"));
    }

    #[test]
    fn notification_replaces_hints() {
        let n = Notification::error("no matching torrents");
        let text = line(&status(SyncState::Ready, 0), Some(&n)).to_string();
        assert!(text.contains("no matching torrents"));
        assert!(!text.contains("quit"));
    }
}
