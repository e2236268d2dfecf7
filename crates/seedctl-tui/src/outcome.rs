//! Turns command results into UI actions.
//!
//! Listings become new tabs, mutations and messages become status-bar
//! notifications, and longer text (help, settings, details) opens a popup.

use seedctl_core::command::{AddEntry, CommandOutcome, EntryOutcome, MutationReport};
use seedctl_core::remote::AddOutcome;
use seedctl_core::{ChainReport, CoreError, ScriptReport};

use crate::action::{Action, Notification};

/// Actions for every command that ran in a chain, in order.
pub fn actions(report: ChainReport) -> Vec<Action> {
    report
        .runs
        .into_iter()
        .filter_map(|run| match run.result {
            Ok(outcome) => from_outcome(outcome),
            Err(err) => Some(error(&err)),
        })
        .collect()
}

pub fn error(err: &CoreError) -> Action {
    Action::Notify(Notification::error(err.to_string()))
}

fn from_outcome(outcome: CommandOutcome) -> Option<Action> {
    let action = match outcome {
        CommandOutcome::View(spec) => Action::OpenView(spec),
        CommandOutcome::Mutation(report) => Action::Notify(mutation(&report)),
        CommandOutcome::Added(entries) => Action::Notify(added(&entries)),
        CommandOutcome::Details(details) => Action::ShowText {
            title: format!("#{} {}", details.id, details.name),
            lines: details
                .rows
                .iter()
                .map(|(name, value)| format!("{name:<18} {value}"))
                .collect(),
        },
        CommandOutcome::Magnets(links) => Action::ShowText {
            title: "Magnet links".into(),
            lines: links
                .iter()
                .flat_map(|l| [l.name.clone(), format!("  {}", l.uri)])
                .collect(),
        },
        CommandOutcome::Settings(entries) => Action::ShowText {
            title: "Settings".into(),
            lines: entries
                .iter()
                .map(|e| format!("{:<22} {:<16} {}", e.name, e.value, e.description))
                .collect(),
        },
        CommandOutcome::Fields { kind, fields } => Action::ShowText {
            title: format!("Fields of {}", kind.plural()),
            lines: fields
                .iter()
                .map(|f| {
                    let aliases = if f.aliases.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", f.aliases.join(", "))
                    };
                    format!("{:<24} {}", format!("{}{aliases}", f.name), f.description)
                })
                .collect(),
        },
        CommandOutcome::Message(message) => Action::Notify(Notification::info(message)),
        CommandOutcome::Help(help) => Action::ShowText {
            title: help.title,
            lines: help.lines,
        },
        CommandOutcome::Script(report) => Action::Notify(script(&report)),
        CommandOutcome::Nothing => return None,
    };
    Some(action)
}

fn mutation(report: &MutationReport) -> Notification {
    let total = report.entries.len();
    let ok = report.succeeded();
    if report.is_success() {
        let what = match report.entries.as_slice() {
            [single] => single.name.clone(),
            _ => format!("{total} {}", report.kind.plural()),
        };
        return Notification::success(format!("{} {what}", report.action));
    }

    let reasons: Vec<String> = report
        .failed()
        .map(|e| match &e.outcome {
            EntryOutcome::Rejected(reason) | EntryOutcome::Connectivity(reason) => {
                format!("{}: {reason}", e.name)
            }
            EntryOutcome::Ok => e.name.clone(),
        })
        .collect();
    let message = format!("{} {ok} of {total}; {}", report.action, reasons.join("; "));
    if ok == 0 {
        Notification::error(message)
    } else {
        Notification::warning(message)
    }
}

fn added(entries: &[AddEntry]) -> Notification {
    let parts: Vec<String> = entries
        .iter()
        .map(|e| match &e.result {
            Ok(AddOutcome::Added { id, name }) => format!("added {name} (#{id})"),
            Ok(AddOutcome::Duplicate { id, name }) => format!("already present: {name} (#{id})"),
            Err(reason) => format!("{}: {reason}", e.source),
        })
        .collect();
    let message = parts.join("; ");
    if entries.iter().all(|e| e.result.is_ok()) {
        Notification::success(message)
    } else {
        Notification::error(message)
    }
}

fn script(report: &ScriptReport) -> Notification {
    match report.failures().next() {
        None => Notification::success(format!(
            "{}: {} commands",
            report.path,
            report.lines.len()
        )),
        Some(first) => Notification::warning(format!(
            "{}:{}: {}",
            report.path,
            first.line,
            first.error.as_deref().unwrap_or(&first.text)
        )),
    }
}
