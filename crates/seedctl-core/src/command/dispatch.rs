// ── Command dispatch ──
//
// Runs command lines against a session: tokenize, split into a chain,
// then bind and execute each link whose operator allows it.

use tracing::debug;

use super::chain::{ChainOp, split_chain};
use super::lexer::{Word, tokenize};
use super::outcome::CommandOutcome;
use crate::error::CoreError;
use crate::session::Session;

/// One executed command of a chain.
#[derive(Debug)]
pub struct CommandRun {
    /// Source text of the command.
    pub command: String,
    pub op: ChainOp,
    pub result: Result<CommandOutcome, CoreError>,
}

impl CommandRun {
    pub fn is_success(&self) -> bool {
        self.result.as_ref().is_ok_and(CommandOutcome::is_success)
    }
}

/// Results of every command a chain actually ran, in order. Commands
/// skipped by `&` or `|` do not appear.
#[derive(Debug, Default)]
pub struct ChainReport {
    pub runs: Vec<CommandRun>,
}

impl ChainReport {
    /// The chain succeeds when its last executed command did.
    pub fn is_success(&self) -> bool {
        self.runs.last().is_none_or(CommandRun::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommandRun> {
        self.runs.iter().filter(|r| !r.is_success())
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    session: Session,
}

impl Dispatcher {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parse and run one line. Lexing and chain errors reject the whole
    /// line before anything runs.
    pub async fn run_line(&self, line: &str) -> Result<ChainReport, CoreError> {
        let words = tokenize(line)?;
        self.dispatch(words).await
    }

    /// Run pre-tokenized words (argv from the shell, for instance).
    pub async fn dispatch(&self, words: Vec<Word>) -> Result<ChainReport, CoreError> {
        let links = split_chain(words)?;
        let mut report = ChainReport::default();
        let mut previous: Option<bool> = None;

        for link in links {
            if !link.op.should_run(previous) {
                debug!(command = %link.text(), op = %link.op, "skipping chained command");
                continue;
            }
            let command = link.text();
            let result = self.execute(&link.words).await;
            let run = CommandRun {
                command,
                op: link.op,
                result,
            };
            previous = Some(run.is_success());
            report.runs.push(run);
        }
        Ok(report)
    }

    /// Bind and run a single command.
    pub async fn execute(&self, words: &[Word]) -> Result<CommandOutcome, CoreError> {
        let registry = self.session.commands();
        let bound = registry.bind(words)?;
        debug!(command = %bound.invocation.command(), "dispatching");
        (bound.leaf.handler)(&self.session, &bound.invocation).await
    }
}
