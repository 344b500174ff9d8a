//! The agent loop: ask the model, act, observe, repeat.
//!
//! The loop follows a **Thought → Action → Observation** cycle:
//!
//! 1. **Receive** a question and append it to the log
//! 2. **Request** a completion over the whole log
//! 3. **If the reply has an `Action:` line**: run the action, append
//!    `Observation: ...` as a user turn, loop back to step 2
//! 4. **Otherwise**: the reply is the answer
//!
//! The loop also stops when the turn budget is spent. Runs can stream
//! reply text, pause for approval before each action, and be checkpointed.

pub mod checkpoint;
pub mod graph;
pub mod loop_runner;
pub mod stream;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use actloop_config::ActionErrorPolicy;
pub use checkpoint::{Checkpoint, Checkpointer, FileCheckpointer, InMemoryCheckpointer};
pub use graph::AgentGraph;
pub use loop_runner::{
    AgentConfig, AgentLoop, Approval, DEFAULT_MAX_TURNS, LoopState, Outcome, Step,
    default_system_prompt,
};
pub use stream::ReplyBuffer;
pub use stream_event::AgentStreamEvent;
