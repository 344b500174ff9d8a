//! `actloop ask`: answer one question.

use std::io::Write;
use std::path::Path;

use actloop_agent::{AgentLoop, AgentStreamEvent};
use clap::Args;
use tokio::sync::mpsc;

use super::{
    CliResult, build_agent, build_checkpointer, load_config, print_outcome, restore_thread,
    resume_paused, run_with_approval, stdin_lines,
};

#[derive(Args)]
pub struct AskArgs {
    /// The question to answer
    #[arg(required_unless_present = "resume")]
    pub question: Option<String>,

    /// Completion requests allowed (defaults to agent.max_turns)
    #[arg(short = 'n', long)]
    pub max_turns: Option<u32>,

    /// Print reply text as it arrives
    #[arg(short, long, conflicts_with_all = ["approve", "resume"])]
    pub stream: bool,

    /// Ask before running each action
    #[arg(short, long)]
    pub approve: bool,

    /// Load and save the conversation under this thread id
    #[arg(short, long)]
    pub thread: Option<String>,

    /// Continue the action the thread was paused on instead of asking anew
    #[arg(short, long, requires = "thread", conflicts_with = "question")]
    pub resume: bool,
}

pub async fn run(config_path: Option<&Path>, args: AskArgs) -> CliResult {
    let config = load_config(config_path)?;
    let mut agent = build_agent(&config)?;

    let store = build_checkpointer(&config);
    if let Some(thread) = &args.thread {
        restore_thread(&mut agent, store.as_ref(), thread).await?;
    }

    let max_turns = args.max_turns.unwrap_or(config.agent.max_turns);
    let approve = args.approve || config.agent.require_approval;

    let result = match &args.question {
        _ if args.resume => resume_paused(&mut agent, &mut stdin_lines()).await,
        Some(question) => {
            if let Some(paused) = agent.pending() {
                eprintln!("  Discarding paused `{paused}` (use --resume to continue it)");
            }
            if approve {
                run_with_approval(&mut agent, question, max_turns, &mut stdin_lines()).await
            } else if args.stream {
                run_streaming(&mut agent, question, max_turns).await
            } else {
                agent
                    .run(question, max_turns)
                    .await
                    .map(|outcome| print_outcome(&outcome, agent.turns()))
                    .map_err(Into::into)
            }
        }
        None => Err("a question is required unless --resume is given".into()),
    };

    // Save even after a failure so the log up to that point is kept
    if let Some(thread) = &args.thread {
        store.put(agent.checkpoint(thread)).await?;
    }
    result
}

async fn run_streaming(agent: &mut AgentLoop, question: &str, max_turns: u32) -> CliResult {
    let (tx, mut rx) = mpsc::channel(64);

    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            match event {
                AgentStreamEvent::Chunk { content } => {
                    let _ = write!(stdout, "{content}");
                    let _ = stdout.flush();
                }
                AgentStreamEvent::Action { name, argument } => {
                    eprintln!("\n  -> {name}: {argument}");
                }
                AgentStreamEvent::Observation { content } => {
                    eprintln!("  <- {content}");
                }
                AgentStreamEvent::Answer { .. } => println!(),
                AgentStreamEvent::BudgetExhausted { turns } => {
                    eprintln!("\n  No answer after {turns} turns (turn budget exhausted)");
                }
                AgentStreamEvent::Error { message } => eprintln!("\n  [Error] {message}"),
            }
        }
    });

    let result = agent.run_streaming(question, max_turns, tx).await;
    printer.await?;
    result?;
    Ok(())
}
