//! Validation domain - Judging model responses

mod definition;
mod validator;
mod validators;

pub use definition::ValidatorDefinition;
pub use validator::{ValidationDetails, Validator};
pub use validators::{Contains, ExactMatch, JsonSchema, PlaceholderValidator, RegexMatch};
