//! End-to-end tests: agent loop + built-in actions + scripted backend.
//!
//! These exercise the full cycle from question to outcome, including the
//! approval pause and checkpointing to disk.

use std::sync::{Arc, Mutex};

use actloop_agent::{
    ActionErrorPolicy, AgentConfig, AgentLoop, Approval, Checkpointer, FileCheckpointer, Outcome,
    Step,
};
use actloop_core::error::{AgentError, ProviderError};
use actloop_core::message::{Message, Role};
use actloop_core::provider::{CompletionRequest, CompletionResponse, Provider};
use actloop_tools::default_registry;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted replies in sequence, cycling
/// through them when `cycle` is set.
struct ScriptedProvider {
    replies: Vec<String>,
    cycle: bool,
    call_count: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            cycle: false,
            call_count: Mutex::new(0),
        }
    }

    fn cycling(replies: &[&str]) -> Self {
        Self {
            cycle: true,
            ..Self::new(replies)
        }
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let index = if self.cycle {
            *count % self.replies.len()
        } else {
            *count
        };
        let reply = self.replies.get(index).cloned().unwrap_or_else(|| {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                *count,
                self.replies.len()
            )
        });
        *count += 1;
        Ok(CompletionResponse {
            message: Message::assistant(reply),
            usage: None,
            model: "mock-model".into(),
        })
    }
}

fn agent(provider: &Arc<ScriptedProvider>) -> AgentLoop {
    AgentLoop::new(
        provider.clone(),
        Arc::new(default_registry()),
        AgentConfig::default(),
    )
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn calculate_directive_feeds_observation_back() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Thought: I need to divide\nAction: calculate: 4*7/3\nPAUSE",
        "Answer: about 9.33",
    ]));
    let mut agent = agent(&provider);

    let outcome = agent.run("What is 4*7/3?", 5).await.unwrap();
    assert_eq!(outcome, Outcome::Answer("Answer: about 9.33".into()));

    let log = agent.conversation().messages();
    let reply_index = log
        .iter()
        .position(|m| m.content.contains("Action: calculate"))
        .unwrap();
    // Dispatch adds the reply and the observation right after it
    assert_eq!(log[reply_index + 1].role, Role::User);
    assert_eq!(log[reply_index + 1].content, "Observation: 9.333333333333334");
}

#[tokio::test]
async fn plain_answer_needs_one_request() {
    let provider = Arc::new(ScriptedProvider::new(&["Answer: it weighs about 50 lbs"]));
    let mut agent = agent(&provider);

    let outcome = agent.run("How heavy is a mutt?", 5).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Answer("Answer: it weighs about 50 lbs".into())
    );
    assert_eq!(provider.calls(), 1);

    // The question and the verbatim reply close the log
    let log = agent.conversation().messages();
    let tail = &log[log.len() - 2..];
    assert_eq!(tail[0], Message::user("How heavy is a mutt?"));
    assert_eq!(tail[1], Message::assistant("Answer: it weighs about 50 lbs"));
}

#[tokio::test]
async fn endless_directives_exhaust_budget() {
    let provider = Arc::new(ScriptedProvider::cycling(&["Action: calculate: 1 + 1"]));
    let mut agent = agent(&provider);

    let outcome = agent.run("never ends", 2).await.unwrap();

    assert_eq!(outcome, Outcome::BudgetExhausted);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn unknown_action_fails_the_run() {
    let provider = Arc::new(ScriptedProvider::new(&["Action: unknown_tool: foo"]));
    let mut agent = agent(&provider);

    let err = agent.run("q", 5).await.unwrap_err();

    assert!(matches!(
        err,
        AgentError::UnknownAction { ref name, ref argument }
            if name == "unknown_tool" && argument == "foo"
    ));
    assert_eq!(err.to_string(), "Unknown action: unknown_tool: foo");
}

#[tokio::test]
async fn combined_dog_weight_question() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Thought: look up the collie\nAction: average_dog_weight: Border Collie\nPAUSE",
        "Thought: now the terrier\nAction: average_dog_weight: Scottish Terrier\nPAUSE",
        "Thought: add them\nAction: calculate: 37 + 20\nPAUSE",
        "Answer: together they weigh 57 lbs",
    ]));
    let mut agent = agent(&provider);

    let outcome = agent
        .run(
            "I have 2 dogs, a border collie and a scottish terrier. \
             What is their combined weight?",
            5,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Answer("Answer: together they weigh 57 lbs".into())
    );
    assert_eq!(agent.turns(), 4);

    let observations: Vec<_> = agent
        .conversation()
        .messages()
        .iter()
        .filter(|m| m.content.starts_with("Observation: "))
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(observations.len(), 3);
    assert!(observations[0].contains("37 lbs"));
    assert!(observations[1].contains("20 lbs"));
    assert_eq!(observations[2], "Observation: 57");
}

#[tokio::test]
async fn observe_policy_lets_model_recover() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Action: calculate: 1 / 0",
        "Action: calculate: 1 / 2",
        "Answer: 0.5",
    ]));
    let mut agent = AgentLoop::new(
        provider.clone(),
        Arc::new(default_registry()),
        AgentConfig::default().with_action_errors(ActionErrorPolicy::Observe),
    );

    let outcome = agent.run("q", 5).await.unwrap();

    assert_eq!(outcome, Outcome::Answer("Answer: 0.5".into()));
    assert!(
        agent
            .conversation()
            .messages()
            .iter()
            .any(|m| m.content == "Observation: Error: division by zero")
    );
}

#[tokio::test]
async fn fatal_policy_stops_on_action_error() {
    let provider = Arc::new(ScriptedProvider::new(&["Action: calculate: 1 / 0"]));
    let mut agent = agent(&provider);

    let err = agent.run("q", 5).await.unwrap_err();
    assert!(matches!(err, AgentError::Action { ref name, .. } if name == "calculate"));
}

#[tokio::test]
async fn approval_pause_survives_a_file_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCheckpointer::new(dir.path());
    let provider = Arc::new(ScriptedProvider::new(&[
        "Action: average_dog_weight: Toy Poodle",
        "Answer: a toy poodle weighs 7 lbs",
    ]));

    let mut first = agent(&provider);
    let step = first.start("How heavy is a toy poodle?", 5).await.unwrap();
    assert!(matches!(step, Step::AwaitingApproval(ref d) if d.name == "average_dog_weight"));
    store.put(first.checkpoint("poodle")).await.unwrap();
    drop(first);

    let checkpoint = store.get("poodle").await.unwrap().unwrap();
    let mut second = agent(&provider);
    second.restore(checkpoint);

    let step = second.resume(Approval::Proceed).await.unwrap();
    assert_eq!(
        step,
        Step::Finished(Outcome::Answer("Answer: a toy poodle weighs 7 lbs".into()))
    );
    assert!(
        second
            .conversation()
            .messages()
            .iter()
            .any(|m| m.content.contains("7 lbs") && m.role == Role::User)
    );
}

#[tokio::test]
async fn denied_action_leaves_no_observation() {
    let provider = Arc::new(ScriptedProvider::new(&["Action: calculate: 2 ** 10"]));
    let mut agent = agent(&provider);

    agent.start("q", 5).await.unwrap();
    let step = agent.resume(Approval::Deny).await.unwrap();

    assert!(matches!(step, Step::Aborted(_)));
    assert!(
        !agent
            .conversation()
            .messages()
            .iter()
            .any(|m| m.content.starts_with("Observation:"))
    );
}
