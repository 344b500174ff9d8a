//! Agent-level streaming events.
//!
//! `AgentStreamEvent` lifts provider-level stream chunks into loop-level
//! events a caller can render live or forward as JSON lines.

use serde::{Deserialize, Serialize};

/// Events emitted by [`AgentLoop::run_streaming`](crate::AgentLoop::run_streaming).
///
/// Order within one run:
/// - `chunk`            partial reply text, zero or more per turn
/// - `action`           a directive is about to be dispatched
/// - `observation`      the action's result, fed back to the model
/// - `answer`           terminal: the final reply
/// - `budget_exhausted` terminal: the turn budget ran out
/// - `error`            terminal: the run failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Partial text from the model.
    Chunk { content: String },

    Action { name: String, argument: String },

    Observation { content: String },

    /// The full final reply.
    Answer { content: String },

    BudgetExhausted { turns: u32 },

    Error { message: String },
}

impl AgentStreamEvent {
    /// Event name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Action { .. } => "action",
            Self::Observation { .. } => "observation",
            Self::Answer { .. } => "answer",
            Self::BudgetExhausted { .. } => "budget_exhausted",
            Self::Error { .. } => "error",
        }
    }

    /// True for the event that ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Answer { .. } | Self::BudgetExhausted { .. } | Self::Error { .. }
        )
    }
}
