//! Output formatting: table, JSON, YAML, plain.
//!
//! Table uses `tabled`, structured formats use serde, plain emits one
//! identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::builder::Builder;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Good,
    Bad,
    Warn,
    Dim,
}

pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match tone {
        Tone::Good => text.green().to_string(),
        Tone::Bad => text.red().bold().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Dim => text.dimmed().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Serialize `data` for the structured formats; `None` for table and
/// plain, which the caller renders itself.
pub fn render_structured<T>(format: OutputFormat, data: &T) -> Result<Option<String>, CliError>
where
    T: serde::Serialize + ?Sized,
{
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Table | OutputFormat::Plain => return Ok(None),
    };
    Ok(Some(text))
}

/// Table with runtime-chosen columns.
pub fn render_grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Table from `Tabled` rows.
pub fn render_rows<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn grid_includes_headers_and_cells() {
        let table = render_grid(
            &["ID", "Name"],
            &[vec!["1".into(), "ubuntu".into()], vec!["2".into(), "debian".into()]],
        );
        assert!(table.contains("Name"));
        assert!(table.contains("debian"));
    }

    #[test]
    fn table_and_plain_are_not_structured() {
        assert!(render_structured(OutputFormat::Table, &[1, 2]).unwrap().is_none());
        assert_eq!(
            render_structured(OutputFormat::JsonCompact, &[1, 2]).unwrap(),
            Some("[1,2]".to_owned())
        );
    }

    #[test]
    fn paint_without_color_is_identity() {
        assert_eq!(paint("ok", Tone::Good, false), "ok");
    }
}
