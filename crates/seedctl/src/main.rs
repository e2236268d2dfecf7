mod cli;
mod config;
mod error;
mod output;
mod report;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use seedctl_core::command::Word;
use seedctl_core::{Dispatcher, script};

use crate::cli::{Cli, GlobalOpts};
use crate::error::CliError;
use crate::report::Reporter;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Shell completions generation
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "seedctl", &mut std::io::stdout());
        return;
    }

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose, cli.global.quiet);

    // Dispatch and handle errors with proper exit codes
    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbosity: u8, quiet: bool) {
    let filter = match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    let config = config::load(&cli.global)?;
    let profile = config::resolve_profile(&config, &cli.global)?;
    let session = config::build_session(&config, &profile)?;
    let dispatcher = Dispatcher::new(session.clone());
    let reporter = Reporter::new(&cli.global);

    run_rc(&dispatcher, &cli.global).await?;

    // No command shows the overview
    let words: Vec<Word> = if cli.command.is_empty() {
        vec![Word::new("help")]
    } else {
        cli.command.into_iter().map(Word::new).collect()
    };
    tracing::debug!(words = words.len(), "dispatching command line");

    let code = match dispatcher.dispatch(words).await {
        Ok(report) => reporter.chain(&session, report).await,
        Err(err) => reporter.error(err.into()),
    };
    session.shutdown().await;
    Ok(code)
}

/// Run the rc script before the command. A missing default rc is fine;
/// a missing `--rc` file is an error. Failing lines only warn.
async fn run_rc(dispatcher: &Dispatcher, global: &GlobalOpts) -> Result<(), CliError> {
    if global.no_rc {
        return Ok(());
    }
    let (path, is_default) = match &global.rc {
        Some(path) => (path.clone(), false),
        None => (seedctl_config::rc_path(), true),
    };
    if let Some(report) = script::run_file(dispatcher, &path, is_default).await? {
        for line in report.failures() {
            eprintln!(
                "{}:{}: {}",
                report.path,
                line.line,
                line.error.as_deref().unwrap_or(&line.text)
            );
        }
    }
    Ok(())
}
