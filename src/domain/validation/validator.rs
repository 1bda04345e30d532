use std::fmt::Debug;

use serde_json::{Map, Value};

/// Diagnostic details produced by a validator
pub type ValidationDetails = Map<String, Value>;

/// Judges a response string.
///
/// Implementations must be pure with respect to the response: the runner
/// may call `validate` from any task.
pub trait Validator: Send + Sync + Debug {
    /// Returns whether the response passed plus diagnostic details
    fn validate(&self, response: &str) -> (bool, ValidationDetails);

    /// Human-readable description of the validation criteria
    fn describe(&self) -> String;

    /// `false` for validators that no longer carry their original semantics
    fn is_authoritative(&self) -> bool {
        true
    }
}
