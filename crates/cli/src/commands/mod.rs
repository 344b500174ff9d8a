//! Subcommand implementations and the wiring they share.

pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod graph;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use actloop_agent::{
    AgentConfig, AgentLoop, Approval, Checkpointer, FileCheckpointer, InMemoryCheckpointer,
    Outcome, Step,
};
use actloop_config::AppConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Line reader over stdin, shared by questions and approval prompts.
pub fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Load the config from `path` if given, else from the default location.
pub fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// Build a loop from config: provider, built-in actions, agent settings.
pub fn build_agent(config: &AppConfig) -> CliResult<AgentLoop> {
    let provider = actloop_providers::build_from_config(config)?;
    let actions = Arc::new(actloop_tools::default_registry());
    tracing::debug!(
        provider = provider.name(),
        model = %config.agent.model,
        actions = ?actions.names(),
        "Agent ready"
    );
    Ok(AgentLoop::new(
        provider,
        actions,
        AgentConfig::from_app_config(config),
    ))
}

pub fn build_checkpointer(config: &AppConfig) -> Box<dyn Checkpointer> {
    match config.checkpoints.backend.as_str() {
        "memory" => Box::new(InMemoryCheckpointer::new()),
        _ => Box::new(FileCheckpointer::new(config.checkpoints.resolved_dir())),
    }
}

/// Restore `thread` into `agent` if a checkpoint exists.
pub async fn restore_thread(
    agent: &mut AgentLoop,
    store: &dyn Checkpointer,
    thread: &str,
) -> CliResult {
    if let Some(checkpoint) = store.get(thread).await? {
        eprintln!(
            "  Resuming thread '{thread}' ({} messages)",
            checkpoint.messages.len()
        );
        agent.restore(checkpoint);
    }
    Ok(())
}

/// Run `question` with a pause before every action, confirming on `input`.
pub async fn run_with_approval<R: AsyncBufRead + Unpin>(
    agent: &mut AgentLoop,
    question: &str,
    max_turns: u32,
    input: &mut Lines<R>,
) -> CliResult {
    let step = agent.start(question, max_turns).await?;
    drive_approvals(agent, step, input).await
}

/// Pick up the directive a restored thread was paused on.
pub async fn resume_paused<R: AsyncBufRead + Unpin>(
    agent: &mut AgentLoop,
    input: &mut Lines<R>,
) -> CliResult {
    let Some(directive) = agent.pending().cloned() else {
        return Err("the thread has no action awaiting approval".into());
    };
    drive_approvals(agent, Step::AwaitingApproval(directive), input).await
}

/// Ask on `input` about every paused action until the run ends.
///
/// Only an answer of `y` runs the action; anything else, including end of
/// input, denies it.
pub async fn drive_approvals<R: AsyncBufRead + Unpin>(
    agent: &mut AgentLoop,
    mut step: Step,
    input: &mut Lines<R>,
) -> CliResult {
    loop {
        match step {
            Step::Finished(outcome) => {
                print_outcome(&outcome, agent.turns());
                return Ok(());
            }
            Step::Aborted(directive) => {
                eprintln!("  Aborted before running `{directive}`");
                return Ok(());
            }
            Step::AwaitingApproval(directive) => {
                print!("  Run `{directive}`? [y/N] ");
                std::io::stdout().flush()?;
                let answer = input.next_line().await?.unwrap_or_default();
                let approval = if answer.trim().eq_ignore_ascii_case("y") {
                    Approval::Proceed
                } else {
                    Approval::Deny
                };
                step = agent.resume(approval).await?;
            }
        }
    }
}

pub fn print_outcome(outcome: &Outcome, turns: u32) {
    match outcome {
        Outcome::Answer(text) => println!("{text}"),
        Outcome::BudgetExhausted => {
            eprintln!("  No answer after {turns} turns (turn budget exhausted)")
        }
    }
}
