//! Built-in actions for actloop.
//!
//! Actions are what the model can ask for with an
//! `Action: <name>: <argument>` line: arithmetic and a breed weight lookup.

pub mod calculator;
pub mod dog_weight;

pub use calculator::CalculateAction;
pub use dog_weight::DogWeightAction;

use actloop_core::action::ActionRegistry;

/// Create a registry with all built-in actions.
pub fn default_registry() -> ActionRegistry {
    ActionRegistry::new()
        .with(CalculateAction)
        .with(DogWeightAction)
}
