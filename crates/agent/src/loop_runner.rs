//! The agent reasoning loop implementation.
//!
//! One `AgentLoop` owns one conversation log. Each `run` asks the model,
//! parses the reply for an `Action: <name>: <argument>` line, dispatches it,
//! feeds the observation back and repeats until the model answers or the
//! turn budget runs out.

use std::sync::Arc;

use actloop_config::{ActionErrorPolicy, AppConfig};
use actloop_core::error::{ActionError, AgentError, Result};
use actloop_core::message::{Conversation, ConversationId, Message};
use actloop_core::provider::{CompletionRequest, Provider};
use actloop_core::{ActionRegistry, Directive, parse_directive};
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::checkpoint::Checkpoint;
use crate::stream::ReplyBuffer;
use crate::stream_event::AgentStreamEvent;

/// Turn budget used when the caller has no opinion.
pub const DEFAULT_MAX_TURNS: u32 = 5;

const PROMPT_HEADER: &str = "\
You run in a loop of Thought, Action, PAUSE, Observation.
Use Thought to reason about the question you have been asked.
Use Action to run one of the actions available to you, then reply PAUSE.
Observation will be the result of running that action.

Write an action on a line of its own, exactly like this:
Action: <name>: <argument>

Your available actions are:";

const PROMPT_FOOTER: &str = "\
Once you know the answer, reply without any Action line and start the reply with \"Answer:\".";

/// The default system prompt, listing every registered action.
pub fn default_system_prompt(actions: &ActionRegistry) -> String {
    format!("{PROMPT_HEADER}\n\n{}\n\n{PROMPT_FOOTER}", actions.describe())
}

/// Everything a loop needs besides its backend and actions.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: f32,

    /// `None` uses [`default_system_prompt`]; an empty string sends none.
    pub system_prompt: Option<String>,

    /// Budget used by callers that don't pass one explicitly
    pub max_turns: u32,

    pub action_errors: ActionErrorPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "qwen2.5-it:3b".into(),
            temperature: 0.0,
            system_prompt: None,
            max_turns: DEFAULT_MAX_TURNS,
            action_errors: ActionErrorPolicy::Fatal,
        }
    }
}

impl AgentConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            model: config.agent.model.clone(),
            temperature: config.agent.temperature,
            system_prompt: config.agent.system_prompt.clone(),
            max_turns: config.agent.max_turns,
            action_errors: config.agent.action_errors,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_action_errors(mut self, policy: ActionErrorPolicy) -> Self {
        self.action_errors = policy;
        self
    }
}

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    RequestingCompletion,
    ParsingReply,
    DispatchingAction,
    /// Paused on a directive until `resume` is called
    AwaitingApproval,
    TerminalAnswer,
    TerminalBudgetExhausted,
    /// The caller denied the pending directive
    Aborted,
    Failed,
}

/// How a completed run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The reply that carried no directive, verbatim.
    Answer(String),
    BudgetExhausted,
}

/// Result of a run that may pause for approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Finished(Outcome),
    /// Waiting for [`AgentLoop::resume`] before running this directive.
    AwaitingApproval(Directive),
    /// The caller denied this directive; it was never run.
    Aborted(Directive),
}

/// The caller's decision on a paused directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Proceed,
    Deny,
}

/// One pass through request-and-parse.
enum Progress {
    Directive(Directive),
    Finished(Outcome),
}

type Events<'a> = Option<&'a mpsc::Sender<AgentStreamEvent>>;

/// The core agent loop: completion requests and action dispatch.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    actions: Arc<ActionRegistry>,
    config: AgentConfig,
    conversation: Conversation,

    /// Completions requested in the current run
    turns: u32,
    /// Budget of the current run
    max_turns: u32,

    state: LoopState,
    pending: Option<Directive>,
}

impl AgentLoop {
    /// Create a loop with a fresh log, seeded with the system prompt.
    pub fn new(
        provider: Arc<dyn Provider>,
        actions: Arc<ActionRegistry>,
        config: AgentConfig,
    ) -> Self {
        let prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| default_system_prompt(&actions));
        let max_turns = config.max_turns;
        Self {
            provider,
            actions,
            config,
            conversation: Conversation::with_system(&prompt),
            turns: 0,
            max_turns,
            state: LoopState::AwaitingInput,
            pending: None,
        }
    }

    /// Replace the whole log, e.g. to continue a stored conversation.
    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Completions requested in the current or last run.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The directive paused for approval, if any.
    pub fn pending(&self) -> Option<&Directive> {
        self.pending.as_ref()
    }

    /// Answer `question`, spending at most `max_turns` completion requests.
    ///
    /// Unknown actions and backend failures end the run with an error; the
    /// log keeps everything appended up to that point.
    pub async fn run(&mut self, question: &str, max_turns: u32) -> Result<Outcome> {
        self.begin(question, max_turns);
        loop {
            match self.advance(None).await? {
                Progress::Finished(outcome) => return Ok(outcome),
                Progress::Directive(directive) => self.dispatch(&directive, None).await?,
            }
        }
    }

    /// Like [`run`](Self::run), but pauses before every action.
    ///
    /// The turn that produced the paused directive is already counted.
    pub async fn start(&mut self, question: &str, max_turns: u32) -> Result<Step> {
        self.begin(question, max_turns);
        self.advance_gated().await
    }

    /// Continue a run paused by [`start`](Self::start).
    ///
    /// `Proceed` runs the directive and keeps going until the next pause or
    /// the end of the run. `Deny` drops the directive without running it and
    /// ends the run; its reply stays in the log.
    pub async fn resume(&mut self, approval: Approval) -> Result<Step> {
        let directive = self.pending.take().ok_or(AgentError::NothingPending)?;
        match approval {
            Approval::Deny => {
                info!(
                    conversation_id = %self.conversation.id,
                    action = %directive.name,
                    "Action denied, run aborted"
                );
                self.state = LoopState::Aborted;
                Ok(Step::Aborted(directive))
            }
            Approval::Proceed => {
                self.dispatch(&directive, None).await?;
                self.advance_gated().await
            }
        }
    }

    /// Streamed variant of [`run`](Self::run).
    ///
    /// Reply text is forwarded as `Chunk` events while it arrives; the reply
    /// is only parsed once complete. Exactly one terminal event (`Answer`,
    /// `BudgetExhausted` or `Error`) ends the stream. A dropped receiver does
    /// not stop the run.
    pub async fn run_streaming(
        &mut self,
        question: &str,
        max_turns: u32,
        events: mpsc::Sender<AgentStreamEvent>,
    ) -> Result<Outcome> {
        self.begin(question, max_turns);
        let result = self.drive_streaming(&events).await;

        let terminal = match &result {
            Ok(Outcome::Answer(text)) => AgentStreamEvent::Answer {
                content: text.clone(),
            },
            Ok(Outcome::BudgetExhausted) => AgentStreamEvent::BudgetExhausted { turns: self.turns },
            Err(e) => AgentStreamEvent::Error {
                message: e.to_string(),
            },
        };
        let _ = events.send(terminal).await;
        result
    }

    async fn drive_streaming(&mut self, events: &mpsc::Sender<AgentStreamEvent>) -> Result<Outcome> {
        loop {
            match self.advance(Some(events)).await? {
                Progress::Finished(outcome) => return Ok(outcome),
                Progress::Directive(directive) => self.dispatch(&directive, Some(events)).await?,
            }
        }
    }

    /// Send one user message and return the raw reply, without parsing it
    /// or running any action.
    pub async fn step(&mut self, message: &str) -> Result<String> {
        self.conversation.append(Message::user(message));
        let reply = self.request_reply(None).await?;
        self.state = LoopState::AwaitingInput;
        Ok(reply)
    }

    /// Snapshot the log and any paused directive under `thread_id`.
    pub fn checkpoint(&self, thread_id: &str) -> Checkpoint {
        Checkpoint {
            thread_id: thread_id.to_string(),
            messages: self.conversation.snapshot(),
            pending: self.pending.clone(),
            turns: self.turns,
            max_turns: self.max_turns,
            created_at: Utc::now(),
        }
    }

    /// Replace the log, paused directive and turn counter from a checkpoint.
    ///
    /// A checkpoint taken during an approval pause can be resumed here.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        debug!(
            thread_id = %checkpoint.thread_id,
            messages = checkpoint.messages.len(),
            pending = checkpoint.pending.is_some(),
            "Restoring checkpoint"
        );
        self.conversation = Conversation::from_messages(
            ConversationId::from(&checkpoint.thread_id),
            checkpoint.messages,
        );
        self.turns = checkpoint.turns;
        self.max_turns = checkpoint.max_turns;
        self.state = if checkpoint.pending.is_some() {
            LoopState::AwaitingApproval
        } else {
            LoopState::AwaitingInput
        };
        self.pending = checkpoint.pending;
    }

    fn begin(&mut self, question: &str, max_turns: u32) {
        if let Some(dropped) = self.pending.take() {
            warn!(action = %dropped.name, "New run started, discarding paused action");
        }
        self.turns = 0;
        self.max_turns = max_turns;
        self.state = LoopState::AwaitingInput;
        self.conversation.append(Message::user(question));

        info!(
            conversation_id = %self.conversation.id,
            messages = self.conversation.len(),
            max_turns,
            "Starting run"
        );
    }

    async fn advance_gated(&mut self) -> Result<Step> {
        match self.advance(None).await? {
            Progress::Finished(outcome) => Ok(Step::Finished(outcome)),
            Progress::Directive(directive) => {
                info!(
                    conversation_id = %self.conversation.id,
                    action = %directive.name,
                    argument = %directive.argument,
                    "Awaiting approval"
                );
                self.pending = Some(directive.clone());
                self.state = LoopState::AwaitingApproval;
                Ok(Step::AwaitingApproval(directive))
            }
        }
    }

    /// Spend one turn: request a reply and decide what it asks for.
    async fn advance(&mut self, events: Events<'_>) -> Result<Progress> {
        if self.turns >= self.max_turns {
            warn!(
                conversation_id = %self.conversation.id,
                turns = self.turns,
                "Turn budget exhausted"
            );
            self.state = LoopState::TerminalBudgetExhausted;
            return Ok(Progress::Finished(Outcome::BudgetExhausted));
        }
        self.turns += 1;

        let reply = self.request_reply(events).await?;

        self.state = LoopState::ParsingReply;
        let Some(directive) = parse_directive(&reply) else {
            info!(
                conversation_id = %self.conversation.id,
                turns = self.turns,
                "Answer reached"
            );
            self.state = LoopState::TerminalAnswer;
            return Ok(Progress::Finished(Outcome::Answer(reply)));
        };

        if !self.actions.contains(&directive.name) {
            return Err(self.fail(AgentError::UnknownAction {
                name: directive.name,
                argument: directive.argument,
            }));
        }
        Ok(Progress::Directive(directive))
    }

    /// Request a completion over the full log and append the reply.
    async fn request_reply(&mut self, events: Events<'_>) -> Result<String> {
        self.state = LoopState::RequestingCompletion;
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: self.conversation.snapshot(),
            temperature: self.config.temperature,
        };

        debug!(
            conversation_id = %self.conversation.id,
            turn = self.turns,
            messages = request.messages.len(),
            "Requesting completion"
        );

        let reply = match events {
            None => match self.provider.complete(request).await {
                Ok(response) => response.message.content,
                Err(e) => return Err(self.fail(e.into())),
            },
            Some(tx) => self.stream_reply(request, tx).await?,
        };

        self.conversation.append(Message::assistant(reply.clone()));
        Ok(reply)
    }

    async fn stream_reply(
        &mut self,
        request: CompletionRequest,
        events: &mpsc::Sender<AgentStreamEvent>,
    ) -> Result<String> {
        let mut chunks = match self.provider.stream(request).await {
            Ok(rx) => rx,
            Err(e) => return Err(self.fail(e.into())),
        };

        let mut buffer = ReplyBuffer::new();
        while let Some(item) = chunks.recv().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => return Err(self.fail(e.into())),
            };
            if let Some(delta) = chunk.content.filter(|c| !c.is_empty()) {
                let _ = events
                    .send(AgentStreamEvent::Chunk {
                        content: delta.clone(),
                    })
                    .await;
                buffer.push(&delta);
            }
            if chunk.done {
                break;
            }
        }

        debug!(chunks = buffer.chunks(), "Streamed reply complete");
        Ok(buffer.finish())
    }

    /// Run a directive and append its observation.
    async fn dispatch(&mut self, directive: &Directive, events: Events<'_>) -> Result<()> {
        self.state = LoopState::DispatchingAction;
        info!(
            conversation_id = %self.conversation.id,
            turn = self.turns,
            action = %directive.name,
            argument = %directive.argument,
            "Dispatching action"
        );
        if let Some(tx) = events {
            let _ = tx
                .send(AgentStreamEvent::Action {
                    name: directive.name.clone(),
                    argument: directive.argument.clone(),
                })
                .await;
        }

        let observation = match self
            .actions
            .invoke(&directive.name, &directive.argument)
            .await
        {
            Ok(observation) => observation,
            Err(ActionError::NotFound(_)) => {
                return Err(self.fail(AgentError::UnknownAction {
                    name: directive.name.clone(),
                    argument: directive.argument.clone(),
                }));
            }
            Err(e) => match self.config.action_errors {
                ActionErrorPolicy::Fatal => {
                    return Err(self.fail(AgentError::Action {
                        name: directive.name.clone(),
                        source: e,
                    }));
                }
                ActionErrorPolicy::Observe => {
                    warn!(action = %directive.name, error = %e, "Action failed, reporting to model");
                    format!("Error: {e}")
                }
            },
        };

        debug!(action = %directive.name, observation = %observation, "Action complete");
        if let Some(tx) = events {
            let _ = tx
                .send(AgentStreamEvent::Observation {
                    content: observation.clone(),
                })
                .await;
        }
        self.conversation.append(Message::observation(&observation));
        Ok(())
    }

    fn fail(&mut self, error: AgentError) -> AgentError {
        warn!(
            conversation_id = %self.conversation.id,
            turn = self.turns,
            error = %error,
            "Run failed"
        );
        self.state = LoopState::Failed;
        error
    }
}
