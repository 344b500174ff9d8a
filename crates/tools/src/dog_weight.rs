//! `average_dog_weight` action, a fixed breed lookup table.
//!
//! Stands in for a real breed database so the agent loop can be exercised
//! end-to-end without network access.

use async_trait::async_trait;
use actloop_core::action::Action;
use actloop_core::error::ActionError;

/// Weight reported for breeds not in the table.
pub const DEFAULT_WEIGHT_LBS: u32 = 50;

const KNOWN_BREEDS: &[(&str, u32)] = &[
    ("Scottish Terrier", 20),
    ("Border Collie", 37),
    ("Toy Poodle", 7),
];

pub struct DogWeightAction;

#[async_trait]
impl Action for DogWeightAction {
    fn name(&self) -> &str {
        "average_dog_weight"
    }

    fn description(&self) -> &str {
        "e.g. average_dog_weight: Collie\n\
         returns average weight of a dog when given the breed"
    }

    async fn invoke(&self, argument: &str) -> Result<String, ActionError> {
        Ok(describe_weight(argument))
    }
}

fn describe_weight(breed: &str) -> String {
    match KNOWN_BREEDS.iter().find(|(name, _)| *name == breed) {
        Some((name, lbs)) => format!("a {name}s average weight is {lbs} lbs"),
        None => format!("An average dog weights {DEFAULT_WEIGHT_LBS} lbs"),
    }
}
