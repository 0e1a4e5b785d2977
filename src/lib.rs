//! # Sequitur grammar induction
//!
//! Incrementally infers a straight-line context-free grammar from a sequence
//! of terminals, replacing every repeated subsequence with a rule.
//!
//! The grammar is kept minimal after every symbol by enforcing two constraints:
//! 1. **Digram Uniqueness**: no pair of adjacent symbols appears more than once
//! 2. **Rule Utility**: every rule other than the start rule is used at least twice
//!
//! ## Example
//!
//! ```
//! use sequitur_grammar::Grammar;
//!
//! let grammar = Grammar::build(b"abcabcabc").unwrap();
//!
//! // Reconstructs the original sequence
//! let reconstructed: Vec<u8> = grammar.iter().copied().collect();
//! assert_eq!(reconstructed, b"abcabcabc");
//!
//! println!("{}", grammar);
//! ```
//!
//! ## Performance
//!
//! - O(1) amortized time per symbol added
//! - Rule bodies are circular lists in a generational arena (SlotMap), so
//!   splicing is O(1) and stale handles are detected instead of aliased

mod analysis;
mod digram;
mod error;
mod grammar;
mod iter;
mod list;
mod printer;
mod rule;
mod symbol;


pub use analysis::{Analysis, CompressionStats, Ranked, RuleStats};
pub use error::{GrammarError, Result};
pub use grammar::{Element, Grammar, RuleView, Symbols};
pub use iter::Expansion;
pub use printer::{Printer, RenderTerminal};
pub use symbol::RuleId;
