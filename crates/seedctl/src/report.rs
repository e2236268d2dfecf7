//! Rendering of command outcomes and chain results.
//!
//! Each outcome of a chain is printed as it is reached. The exit code of
//! the whole invocation is the code of the last command that ran.

use serde::Serialize;
use tabled::Tabled;

use seedctl_core::command::{
    AddEntry, CommandOutcome, Details, EntryOutcome, Help, MagnetLink, MutationReport,
};
use seedctl_core::field::FieldInfo;
use seedctl_core::remote::AddOutcome;
use seedctl_core::settings::SettingEntry;
use seedctl_core::{
    Cached, ChainReport, Entity, EntityKind, Peer, ScriptReport, Session, Torrent, TorrentFile,
    Tracker, ViewSpec,
};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::{CliError, exit_code};
use crate::output::{self, Tone, paint};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Default")]
    default: &'static str,
    #[tabled(rename = "Description")]
    description: &'static str,
}

impl From<&SettingEntry> for SettingRow {
    fn from(e: &SettingEntry) -> Self {
        Self {
            name: e.name,
            value: e.value.clone(),
            default: e.default,
            description: e.description,
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Aliases")]
    aliases: String,
    #[tabled(rename = "Type")]
    ty: String,
    #[tabled(rename = "Description")]
    description: &'static str,
}

impl From<&FieldInfo> for FieldRow {
    fn from(f: &FieldInfo) -> Self {
        Self {
            name: f.name,
            aliases: f.aliases.join(", "),
            ty: f.ty.map_or_else(|| "flag".to_owned(), |t| t.to_string()),
            description: f.description,
        }
    }
}

#[derive(Serialize)]
struct MessageOut<'a> {
    message: &'a str,
}

// ── Reporter ────────────────────────────────────────────────────────

pub struct Reporter {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Reporter {
    pub fn new(global: &GlobalOpts) -> Self {
        Self {
            format: global.output,
            color: output::should_color(global.color),
            quiet: global.quiet,
        }
    }

    /// Print every run of a chain. Returns the process exit code.
    pub async fn chain(&self, session: &Session, report: ChainReport) -> i32 {
        let mut code = exit_code::SUCCESS;
        for run in report.runs {
            code = match run.result {
                Ok(outcome) => match self.outcome(session, &outcome).await {
                    Ok(()) => outcome_code(&outcome),
                    Err(err) => self.error(err),
                },
                Err(err) => self.error(err.into()),
            };
        }
        code
    }

    /// Print a diagnostic to stderr and return its exit code.
    pub fn error(&self, err: CliError) -> i32 {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        code
    }

    pub async fn outcome(&self, session: &Session, outcome: &CommandOutcome) -> Result<(), CliError> {
        let text = match outcome {
            CommandOutcome::View(spec) => match spec.kind {
                EntityKind::Torrent => self.view::<Torrent>(session, spec).await?,
                EntityKind::Peer => self.view::<Peer>(session, spec).await?,
                EntityKind::File => self.view::<TorrentFile>(session, spec).await?,
                EntityKind::Tracker => self.view::<Tracker>(session, spec).await?,
            },
            CommandOutcome::Mutation(report) => self.mutation(report)?,
            CommandOutcome::Added(entries) => self.added(entries)?,
            CommandOutcome::Details(details) => self.details(details)?,
            CommandOutcome::Magnets(links) => self.magnets(links)?,
            CommandOutcome::Settings(entries) => self.settings(entries)?,
            CommandOutcome::Fields { fields, .. } => self.fields(fields)?,
            CommandOutcome::Message(message) => {
                output::render_structured(self.format, &MessageOut { message })?
                    .unwrap_or_else(|| message.clone())
            }
            CommandOutcome::Help(help) => self.help(help)?,
            CommandOutcome::Script(report) => self.script(report)?,
            CommandOutcome::Nothing => String::new(),
        };
        output::print_output(&text, self.quiet);
        Ok(())
    }

    /// Load one listing from the daemon and render it.
    async fn view<E: Cached>(&self, session: &Session, spec: &ViewSpec) -> Result<String, CliError> {
        session.refresh::<E>().await?;
        let items = session.view::<E>(spec.clone()).current_items();
        if let Some(text) = output::render_structured(self.format, items.as_slice())? {
            return Ok(text);
        }
        if self.format == OutputFormat::Plain {
            return Ok(lines(items.iter().map(|e| e.id().to_string())));
        }
        let rendered = spec.render(&items, &session.settings().format_options());
        Ok(output::render_grid(&rendered.headers, &rendered.rows))
    }

    fn mutation(&self, report: &MutationReport) -> Result<String, CliError> {
        if let Some(text) = output::render_structured(self.format, report)? {
            return Ok(text);
        }
        if self.format == OutputFormat::Plain {
            return Ok(lines(
                report
                    .entries
                    .iter()
                    .filter(|e| e.is_ok())
                    .map(|e| e.id.to_string()),
            ));
        }
        Ok(lines(report.entries.iter().map(|e| match &e.outcome {
            EntryOutcome::Ok => format!(
                "{} {} {}",
                paint("✓", Tone::Good, self.color),
                report.action,
                e.name
            ),
            EntryOutcome::Rejected(reason) => format!(
                "{} {}: {reason}",
                paint("✗", Tone::Bad, self.color),
                e.name
            ),
            EntryOutcome::Connectivity(reason) => format!(
                "{} {}: {reason}",
                paint("!", Tone::Warn, self.color),
                e.name
            ),
        })))
    }

    fn added(&self, entries: &[AddEntry]) -> Result<String, CliError> {
        if let Some(text) = output::render_structured(self.format, entries)? {
            return Ok(text);
        }
        if self.format == OutputFormat::Plain {
            return Ok(lines(entries.iter().filter_map(|e| match &e.result {
                Ok(AddOutcome::Added { id, .. } | AddOutcome::Duplicate { id, .. }) => {
                    Some(id.to_string())
                }
                Err(_) => None,
            })));
        }
        Ok(lines(entries.iter().map(|e| match &e.result {
            Ok(AddOutcome::Added { id, name }) => format!(
                "{} added {name} {}",
                paint("✓", Tone::Good, self.color),
                paint(&format!("(#{id})"), Tone::Dim, self.color)
            ),
            Ok(AddOutcome::Duplicate { id, name }) => format!(
                "{} already present: {name} {}",
                paint("•", Tone::Warn, self.color),
                paint(&format!("(#{id})"), Tone::Dim, self.color)
            ),
            Err(reason) => format!(
                "{} {}: {reason}",
                paint("✗", Tone::Bad, self.color),
                e.source
            ),
        })))
    }

    fn details(&self, details: &Details) -> Result<String, CliError> {
        if let Some(text) = output::render_structured(self.format, details)? {
            return Ok(text);
        }
        if self.format == OutputFormat::Plain {
            return Ok(lines(
                details.rows.iter().map(|(name, value)| format!("{name}={value}")),
            ));
        }
        let width = details.rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        Ok(lines(details.rows.iter().map(|(name, value)| {
            format!("{} {value}", paint(&format!("{name:<width$}"), Tone::Dim, self.color))
        })))
    }

    /// One URI per line, ready to paste.
    fn magnets(&self, links: &[MagnetLink]) -> Result<String, CliError> {
        if let Some(text) = output::render_structured(self.format, links)? {
            return Ok(text);
        }
        Ok(lines(links.iter().map(|l| l.uri.clone())))
    }

    fn settings(&self, entries: &[SettingEntry]) -> Result<String, CliError> {
        if let Some(text) = output::render_structured(self.format, entries)? {
            return Ok(text);
        }
        if self.format == OutputFormat::Plain {
            return Ok(lines(entries.iter().map(|e| format!("{}={}", e.name, e.value))));
        }
        let rows: Vec<SettingRow> = entries.iter().map(SettingRow::from).collect();
        Ok(output::render_rows(&rows))
    }

    fn fields(&self, fields: &[FieldInfo]) -> Result<String, CliError> {
        if let Some(text) = output::render_structured(self.format, fields)? {
            return Ok(text);
        }
        if self.format == OutputFormat::Plain {
            return Ok(lines(fields.iter().map(|f| f.name.to_owned())));
        }
        let rows: Vec<FieldRow> = fields.iter().map(FieldRow::from).collect();
        Ok(output::render_rows(&rows))
    }

    fn help(&self, help: &Help) -> Result<String, CliError> {
        if let Some(text) = output::render_structured(self.format, help)? {
            return Ok(text);
        }
        let mut text = help.title.clone();
        for line in &help.lines {
            text.push('\n');
            text.push_str(line);
        }
        Ok(text)
    }

    fn script(&self, report: &ScriptReport) -> Result<String, CliError> {
        if let Some(text) = output::render_structured(self.format, report)? {
            return Ok(text);
        }
        let failed = report.failures().count();
        let summary = format!(
            "{}: {} commands, {failed} failed",
            report.path,
            report.lines.len()
        );
        let failures = report.failures().map(|l| {
            format!(
                "  {} line {}: {}",
                paint("✗", Tone::Bad, self.color),
                l.line,
                l.error.as_deref().unwrap_or(&l.text)
            )
        });
        Ok(lines(std::iter::once(summary).chain(failures)))
    }
}

fn lines(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join("\n")
}

/// Exit code of a command that returned an outcome.
pub fn outcome_code(outcome: &CommandOutcome) -> i32 {
    match outcome {
        CommandOutcome::Mutation(report) if report.is_connectivity_failure() => {
            exit_code::CONNECTION
        }
        other if other.is_success() => exit_code::SUCCESS,
        _ => exit_code::PARTIAL,
    }
}
