use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to a symbol slot in the grammar's arena.
    pub(crate) struct SymbolKey;

    /// Opaque handle naming one rule of a [`Grammar`](crate::Grammar).
    ///
    /// Two nonterminals denote the same rule iff their handles are equal.
    pub struct RuleId;
}

/// Symbol kinds in the grammar.
///
/// Every rule body is a circular list closed by exactly one `Guard`, which
/// carries the id of the rule it belongs to.
#[derive(Debug, Clone)]
pub(crate) enum Symbol<T> {
    /// A terminal symbol containing an actual value from the input.
    Terminal(T),

    /// A reference to a rule.
    NonTerminal(RuleId),

    /// Boundary marker of a rule body. Never part of a digram.
    Guard(RuleId),
}

impl<T> Symbol<T> {
    pub(crate) fn is_guard(&self) -> bool {
        matches!(self, Symbol::Guard(_))
    }

    /// The rule a nonterminal denotes.
    pub(crate) fn rule(&self) -> Option<RuleId> {
        match self {
            Symbol::NonTerminal(rule) => Some(*rule),
            _ => None,
        }
    }
}

impl<T: PartialEq> Symbol<T> {
    /// Compares the digram values of two symbols.
    ///
    /// Guards never compare equal, not even to themselves.
    pub(crate) fn same_value(&self, other: &Symbol<T>) -> bool {
        match (self, other) {
            (Symbol::Terminal(a), Symbol::Terminal(b)) => a == b,
            (Symbol::NonTerminal(a), Symbol::NonTerminal(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Clone> Symbol<T> {
    /// The comparable value of a content symbol, `None` for a guard.
    pub(crate) fn digram_value(&self) -> Option<DigramValue<T>> {
        match self {
            Symbol::Terminal(v) => Some(DigramValue::Terminal(v.clone())),
            Symbol::NonTerminal(rule) => Some(DigramValue::Rule(*rule)),
            Symbol::Guard(_) => None,
        }
    }
}

/// One side of a digram index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum DigramValue<T> {
    Terminal(T),
    Rule(RuleId),
}

/// A node in a rule's circular doubly-linked list.
///
/// A node that is not yet spliced into any body points at itself.
#[derive(Debug)]
pub(crate) struct SymbolNode<T> {
    pub symbol: Symbol<T>,
    pub prev: SymbolKey,
    pub next: SymbolKey,
}

impl<T> SymbolNode<T> {
    pub(crate) fn detached(key: SymbolKey, symbol: Symbol<T>) -> Self {
        Self {
            symbol,
            prev: key,
            next: key,
        }
    }
}
