//! Shared test helpers for loop tests.

use actloop_core::error::{ActionError, ProviderError};
use actloop_core::message::Message;
use actloop_core::provider::{
    ChunkReceiver, CompletionRequest, CompletionResponse, Provider, StreamChunk, Usage,
};
use actloop_core::{Action, ActionRegistry};
use async_trait::async_trait;
use std::sync::Mutex;

enum Script {
    Replies(Vec<String>),
    Repeat(String),
    Fail(ProviderError),
}

/// A mock provider that returns scripted replies in sequence.
///
/// Panics if more calls are made than replies provided. Streaming splits
/// each reply into `chunk_size`-character deltas.
pub struct ScriptedProvider {
    script: Script,
    chunk_size: usize,
    call_count: Mutex<usize>,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedProvider {
    fn new(script: Script) -> Self {
        Self {
            script,
            chunk_size: usize::MAX,
            call_count: Mutex::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::texts(&[reply])
    }

    pub fn texts(replies: &[&str]) -> Self {
        Self::new(Script::Replies(
            replies.iter().map(|r| r.to_string()).collect(),
        ))
    }

    /// Same reply forever.
    pub fn repeating(reply: &str) -> Self {
        Self::new(Script::Repeat(reply.to_string()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(Script::Fail(error))
    }

    pub fn chunked(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn next_reply(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let call = *count;
        *count += 1;
        *self.last_request.lock().unwrap() = Some(request);

        match &self.script {
            Script::Replies(replies) => match replies.get(call) {
                Some(reply) => Ok(reply.clone()),
                None => panic!(
                    "ScriptedProvider: no more replies (call #{call}, have {})",
                    replies.len()
                ),
            },
            Script::Repeat(reply) => Ok(reply.clone()),
            Script::Fail(error) => Err(error.clone()),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let reply = self.next_reply(request)?;
        Ok(CompletionResponse {
            message: Message::assistant(reply),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkReceiver, ProviderError> {
        let reply = self.next_reply(request)?;
        let chars: Vec<char> = reply.chars().collect();
        let (tx, rx) = tokio::sync::mpsc::channel(chars.len() + 1);
        for piece in chars.chunks(self.chunk_size.min(chars.len().max(1))) {
            let _ = tx.send(Ok(StreamChunk::delta(piece.iter().collect::<String>()))).await;
        }
        let _ = tx.send(Ok(StreamChunk::end())).await;
        Ok(rx)
    }
}

/// Returns its argument unchanged.
pub struct EchoAction;

#[async_trait]
impl Action for EchoAction {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "e.g. echo: hello\nReturns the argument"
    }

    async fn invoke(&self, argument: &str) -> Result<String, ActionError> {
        Ok(argument.to_string())
    }
}

/// Always fails.
pub struct FailAction;

#[async_trait]
impl Action for FailAction {
    fn name(&self) -> &str {
        "fail"
    }

    fn description(&self) -> &str {
        "e.g. fail: anything\nAlways fails"
    }

    async fn invoke(&self, _argument: &str) -> Result<String, ActionError> {
        Err(ActionError::Failed("broken on purpose".into()))
    }
}

pub fn registry() -> ActionRegistry {
    ActionRegistry::new().with(EchoAction).with(FailAction)
}
