//! Output grammar and document validation

pub mod conform;
pub mod grammar;
pub mod validator;

pub use conform::conform;
pub use grammar::{ElementRule, Grammar, GrammarError};
pub use validator::{DocumentError, ValidationError, Violation, validate, validate_bytes};
