use crate::symbol::RuleId;
use thiserror::Error;

/// Errors reported at the boundary of the grammar API.
///
/// Internal consistency faults are not represented here; they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A grammar cannot be seeded from an empty sequence.
    #[error("cannot build a grammar from an empty input sequence")]
    EmptyInput,

    /// A stale handle from this grammar: the rule it named was inlined.
    ///
    /// Handles from another grammar instance are not detected.
    #[error("rule {0:?} is no longer part of this grammar")]
    UnknownRule(RuleId),
}

pub type Result<T> = std::result::Result<T, GrammarError>;
