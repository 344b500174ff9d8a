//! # actloop core
//!
//! Domain types, traits, and error definitions for the actloop agent loop.
//! This crate has no I/O of its own: it defines the conversation log, the
//! directive grammar, the action registry, and the completion backend
//! contract that the other crates implement against.

pub mod action;
pub mod directive;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use action::{Action, ActionRegistry};
pub use directive::{Directive, parse_directive};
pub use error::{ActionError, AgentError, CheckpointError, ProviderError, Result};
pub use message::{Conversation, ConversationId, Message, Role, merge_messages};
pub use provider::{ChunkReceiver, CompletionRequest, CompletionResponse, Provider, StreamChunk, Usage};
