//! Action trait: the things an agent can ask to have done.
//!
//! An action takes the free-text argument from a directive and returns a
//! textual observation. Actions are registered once in an `ActionRegistry`
//! and looked up by exact, case-sensitive name.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use crate::error::ActionError;

/// The core Action trait.
#[async_trait]
pub trait Action: Send + Sync {
    /// The unique name used in directives (e.g., "calculate").
    fn name(&self) -> &str;

    /// A one-line description, with a usage example, for system prompts.
    fn description(&self) -> &str;

    /// Run the action on the directive argument and return the observation.
    async fn invoke(&self, argument: &str) -> std::result::Result<String, ActionError>;
}

/// A registry of available actions.
///
/// The agent loop uses this to resolve directive names and run them. The
/// registry is built up front and shared read-only (usually as
/// `Arc<ActionRegistry>`) for the lifetime of a loop.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }

    /// Register an action. Replaces any existing action with the same name.
    pub fn register(&mut self, action: impl Action + 'static) {
        let name = action.name().to_string();
        self.actions.insert(name, Arc::new(action));
    }

    /// Builder-style `register`.
    pub fn with(mut self, action: impl Action + 'static) -> Self {
        self.register(action);
        self
    }

    /// Look an action up by exact name.
    pub fn resolve(&self, name: &str) -> Option<&dyn Action> {
        self.actions.get(name).map(|a| a.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Run the named action on `argument`.
    pub async fn invoke(
        &self,
        name: &str,
        argument: &str,
    ) -> std::result::Result<String, ActionError> {
        let action = self
            .resolve(name)
            .ok_or_else(|| ActionError::NotFound(name.to_string()))?;
        debug!(action = name, argument, "Invoking action");
        action.invoke(argument).await
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(|s| s.as_str()).collect()
    }

    /// `name:\n<description>` blocks, ready to paste into a system prompt.
    pub fn describe(&self) -> String {
        self.actions
            .values()
            .map(|a| format!("{}:\n{}", a.name(), a.description()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
