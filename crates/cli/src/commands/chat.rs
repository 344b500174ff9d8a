//! `actloop chat`: interactive mode.
//!
//! Every question is a new run on the same loop, so the model sees the
//! whole session. With `agent.require_approval` set, each action is
//! confirmed on the same input before it runs.

use std::io::Write;
use std::path::Path;

use super::{
    CliResult, build_agent, build_checkpointer, load_config, print_outcome, restore_thread,
    run_with_approval, stdin_lines,
};

pub async fn run(config_path: Option<&Path>, thread: Option<String>) -> CliResult {
    let config = load_config(config_path)?;
    let mut agent = build_agent(&config)?;
    let store = build_checkpointer(&config);
    if let Some(thread) = &thread {
        restore_thread(&mut agent, store.as_ref(), thread).await?;
    }

    println!();
    println!("  actloop chat");
    println!();
    println!("  Provider:  {}", config.provider.name);
    println!("  Model:     {}", config.agent.model);
    println!("  Turns:     {} per question", config.agent.max_turns);
    if config.agent.require_approval {
        println!("  Approval:  required before each action");
    }
    if let Some(thread) = &thread {
        println!("  Thread:    {thread}");
    }
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let approve = config.agent.require_approval;
    let mut lines = stdin_lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        if !question.is_empty() {
            let question = question.to_string();
            let max_turns = config.agent.max_turns;
            println!();
            let result = if approve {
                run_with_approval(&mut agent, &question, max_turns, &mut lines).await
            } else {
                agent
                    .run(&question, max_turns)
                    .await
                    .map(|outcome| print_outcome(&outcome, agent.turns()))
                    .map_err(Into::into)
            };
            if let Err(e) = result {
                eprintln!("  [Error] {e}");
            }
            println!();

            if let Some(thread) = &thread {
                if let Err(e) = store.put(agent.checkpoint(thread)).await {
                    eprintln!("  [Checkpoint Error] {e}");
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    Ok(())
}
