#![allow(clippy::print_stderr)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use orbitguard_client_core::{Dashboard, QueryOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{QueryCommand, settle, whoami};

const SHELL_BANNER: &str =
    "OrbitGuard shell. Queries run in the background; a new query replaces the running one. Type `help` for commands.";

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum ShellCommand {
    #[command(flatten)]
    Query(QueryCommand),
    /// Show the stored identity and plan
    Whoami,
    /// Move the account to the Pro plan
    Upgrade,
    /// Move the account back to the Free plan
    Downgrade,
    /// Generate a 24 hour API key (Pro)
    ApiKey,
    /// Forget the stored session
    Logout,
    /// Drop the running query
    Cancel,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

fn parse_line(line: &str) -> Result<Option<ShellCommand>, clap::Error> {
    let words = line.split_whitespace().collect::<Vec<_>>();
    if words.is_empty() {
        return Ok(None);
    }
    ShellLine::try_parse_from(words).map(|parsed| Some(parsed.command))
}

type Running<'a> = FuturesUnordered<LocalBoxFuture<'a, Result<()>>>;

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
}

pub(crate) async fn run(dashboard: &Dashboard) -> Result<ExitCode> {
    eprintln!("{SHELL_BANNER}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut running = Running::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                if handle_line(dashboard, &line, &mut running) == Step::Quit {
                    break;
                }
            }
            Some(settled) = running.next(), if !running.is_empty() => settled?,
        }
    }

    // Input ended; let whatever survived finish rendering.
    while let Some(settled) = running.next().await {
        settled?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Queries and account commands both land in `running`, so a slow upgrade
/// never stalls the query already in flight.
fn handle_line<'a>(dashboard: &'a Dashboard, line: &str, running: &mut Running<'a>) -> Step {
    match parse_line(line) {
        Ok(None) => {}
        Ok(Some(ShellCommand::Query(query))) => {
            running.push(run_query(dashboard, query).boxed_local());
        }
        Ok(Some(ShellCommand::Cancel)) => {
            if dashboard.cancel_queries() {
                eprintln!("Query cancelled.");
            }
        }
        Ok(Some(ShellCommand::Quit)) => {
            dashboard.cancel_queries();
            return Step::Quit;
        }
        Ok(Some(command)) => {
            running.push(run_account_command(dashboard, command).boxed_local());
        }
        Err(error) => eprintln!("{error}"),
    }
    Step::Continue
}

async fn run_account_command(dashboard: &Dashboard, command: ShellCommand) -> Result<()> {
    match command {
        ShellCommand::Whoami => {
            whoami(dashboard)?;
        }
        ShellCommand::Upgrade => {
            settle(dashboard.upgrade().await)?;
        }
        ShellCommand::Downgrade => {
            settle(dashboard.downgrade())?;
        }
        ShellCommand::ApiKey => {
            settle(dashboard.generate_api_key().await)?;
        }
        ShellCommand::Logout => dashboard.logout().context("logout failed")?,
        ShellCommand::Query(_) | ShellCommand::Cancel | ShellCommand::Quit => {}
    }
    Ok(())
}

async fn run_query(dashboard: &Dashboard, query: QueryCommand) -> Result<()> {
    let outcome: QueryOutcome = dashboard.run_query(query.into_request()).await?;
    tracing::debug!(?outcome, "shell query settled");
    Ok(())
}
