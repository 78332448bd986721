//! Errors that callers may want to tell apart
//!
//! Most failures are reported as plain `anyhow::Error`. The types here are the ones a caller can
//! recover from on a per-method basis; they are carried inside `anyhow::Error` and can be found
//! with `downcast_ref`.

use crate::token::Token;
use std::fmt::Display;

/// The symbol store describes a method with more than one top-level scope.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsupportedStructure {
    /// The method whose record was rejected.
    pub method: Token,
    /// Number of top-level scopes found.
    pub top_level_scopes: usize,
}

impl std::error::Error for UnsupportedStructure {}

impl Display for UnsupportedStructure {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "Method {} has {} top-level scopes. Only one is supported.",
            self.method, self.top_level_scopes
        )
    }
}

/// A scope names a variable slot that the method body does not have.
///
/// Only reported when [`ReaderOptions::strict_variable_slots`](crate::ReaderOptions) is set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariableSlotOutOfRange {
    #[allow(missing_docs)]
    pub method: Token,
    #[allow(missing_docs)]
    pub slot: u32,
    /// Number of variables the body declares.
    pub variable_count: usize,
}

impl std::error::Error for VariableSlotOutOfRange {}

impl Display for VariableSlotOutOfRange {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "Method {} names variable slot {}, but only has {} variables.",
            self.method, self.slot, self.variable_count
        )
    }
}
