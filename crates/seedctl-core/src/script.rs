// ── rc scripts ──
//
// Line-oriented command files. Blank lines and `#` comments are skipped;
// a failing line is reported and the rest of the file still runs.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::command::Dispatcher;
use crate::error::CoreError;

/// Result of one script line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptLine {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptReport {
    pub path: String,
    pub lines: Vec<ScriptLine>,
}

impl ScriptReport {
    pub fn is_success(&self) -> bool {
        self.lines.iter().all(|l| l.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScriptLine> {
        self.lines.iter().filter(|l| !l.ok)
    }
}

/// Read a script. A missing default rc file is not an error; a missing
/// file the user named is.
pub fn read_script(path: &Path, is_default: bool) -> Result<Option<String>, CoreError> {
    match std::fs::read_to_string(path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if is_default && e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no rc file");
            Ok(None)
        }
        Err(e) => Err(CoreError::Script {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Run every command line of `source`.
pub async fn run_script(dispatcher: &Dispatcher, path: &str, source: &str) -> ScriptReport {
    let mut lines = Vec::new();
    for (n, raw) in source.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let error = match dispatcher.run_line(text).await {
            Ok(report) if report.is_success() => None,
            Ok(report) => report.failures().last().map(|run| match &run.result {
                Err(e) => e.to_string(),
                Ok(_) => format!("{}: failed", run.command),
            }),
            Err(e) => Some(e.to_string()),
        };
        if let Some(error) = &error {
            warn!(path, line = n + 1, %error, "rc command failed");
        }
        lines.push(ScriptLine {
            line: n + 1,
            text: text.to_owned(),
            ok: error.is_none(),
            error,
        });
    }
    ScriptReport {
        path: path.to_owned(),
        lines,
    }
}

/// Read and run `path` inside one level of script nesting.
pub async fn run_file(
    dispatcher: &Dispatcher,
    path: &Path,
    is_default: bool,
) -> Result<Option<ScriptReport>, CoreError> {
    let _depth = dispatcher.session().enter_script()?;
    let Some(source) = read_script(path, is_default)? else {
        return Ok(None);
    };
    let display = path.display().to_string();
    Ok(Some(run_script(dispatcher, &display, &source).await))
}
