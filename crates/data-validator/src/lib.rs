//! Property Validation
//!
//! Range and sanity checks applied to a property description before it is
//! encoded for the price model.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Validator, ValidationConfig, ValidationResult};
