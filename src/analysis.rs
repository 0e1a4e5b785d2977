//! Statistics derived from a finished grammar.
//!
//! Everything here is read-only: usage counts come from the live rule
//! reference counts, everything else is recomputed from the rule bodies.

use crate::error::{GrammarError, Result};
use crate::grammar::{Element, Grammar};
use crate::symbol::RuleId;
use ahash::AHashMap as HashMap;
use std::cmp::Ordering;
use std::hash::Hash;

/// Statistics about the compression.
#[derive(Debug, Clone, Copy)]
pub struct CompressionStats {
    /// Number of input symbols added
    pub input_length: usize,
    /// Total symbols in all rule bodies
    pub grammar_symbols: usize,
    /// Number of rules, counting the start rule
    pub num_rules: usize,
}

impl CompressionStats {
    /// Returns the compression ratio as a percentage.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_length == 0 {
            0.0
        } else {
            (self.grammar_symbols as f64 / self.input_length as f64) * 100.0
        }
    }
}

/// Per-rule figures used by ranking layers.
#[derive(Debug, Clone)]
pub struct RuleStats {
    pub id: RuleId,
    /// Display index, as printed in the rule listing
    pub index: usize,
    /// Live reference count
    pub usage: u32,
    /// Times the rule is instantiated in the derivation of the whole input
    pub occurrences: u64,
    /// Length of the terminal expansion
    pub length: usize,
    /// Share of the input covered by all instances of the rule
    pub coverage: f64,
}

/// A rule with its normalised score.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub id: RuleId,
    pub index: usize,
    pub score: f64,
}

/// Usage and coverage of every rule reachable from the start rule.
pub struct Analysis<'a, T> {
    grammar: &'a Grammar<T>,
    rules: Vec<RuleStats>,
    positions: HashMap<RuleId, usize>,
}

impl<T: Hash + Eq + Clone> Grammar<T> {
    /// Returns compression statistics.
    pub fn stats(&self) -> CompressionStats {
        let grammar_symbols = self
            .rules()
            .into_iter()
            .filter_map(|id| self.rule(id))
            .map(|rule| rule.len())
            .sum();

        CompressionStats {
            input_length: self.len(),
            grammar_symbols,
            num_rules: self.rule_count(),
        }
    }

    /// Computes usage, expansion length and coverage for every rule.
    pub fn analyze(&self) -> Analysis<'_, T> {
        let order = self.rules();
        let positions: HashMap<RuleId, usize> = order
            .iter()
            .enumerate()
            .map(|(index, &rule)| (rule, index))
            .collect();

        let children: Vec<Vec<usize>> = order
            .iter()
            .map(|&id| {
                self.rule(id)
                    .map(|rule| {
                        rule.symbols()
                            .filter_map(|element| match element {
                                Element::Rule(child) => Some(positions[&child]),
                                Element::Terminal(_) => None,
                            })
                            .collect::<Vec<usize>>()
                    })
                    .unwrap_or_default()
            })
            .collect();

        let topo = topological_order(&children);

        let mut occurrences = vec![0u64; order.len()];
        occurrences[0] = 1;
        for &parent in &topo {
            for &child in &children[parent] {
                occurrences[child] += occurrences[parent];
            }
        }

        let mut lengths = vec![0usize; order.len()];
        for &parent in topo.iter().rev() {
            let body_len = self.rule(order[parent]).map_or(0, |rule| rule.len());
            let terminals = body_len - children[parent].len();
            let nested: usize = children[parent].iter().map(|&child| lengths[child]).sum();
            lengths[parent] = terminals + nested;
        }

        let input_length = self.len();
        let rules = order
            .iter()
            .enumerate()
            .map(|(index, &id)| {
                let coverage = if input_length == 0 {
                    0.0
                } else {
                    (occurrences[index] as f64 * lengths[index] as f64) / input_length as f64
                };
                RuleStats {
                    id,
                    index,
                    usage: self.rules[id].count,
                    occurrences: occurrences[index],
                    length: lengths[index],
                    coverage,
                }
            })
            .collect();

        Analysis {
            grammar: self,
            rules,
            positions,
        }
    }
}

/// Orders rules so every rule comes after all rules that reference it.
///
/// `children[i]` lists one entry per reference in the body of rule `i`;
/// rule 0 is the root.
fn topological_order(children: &[Vec<usize>]) -> Vec<usize> {
    let mut pending = vec![0usize; children.len()];
    for child in children.iter().flatten() {
        pending[*child] += 1;
    }

    let mut order = Vec::with_capacity(children.len());
    let mut ready = vec![0];
    while let Some(rule) = ready.pop() {
        order.push(rule);
        for &child in &children[rule] {
            pending[child] -= 1;
            if pending[child] == 0 {
                ready.push(child);
            }
        }
    }

    debug_assert_eq!(order.len(), children.len(), "rule graph has a cycle");
    order
}

impl<'a, T: Hash + Eq + Clone> Analysis<'a, T> {
    /// All rules in display order; the start rule is first.
    pub fn rules(&self) -> &[RuleStats] {
        &self.rules
    }

    pub fn get(&self, id: RuleId) -> Result<&RuleStats> {
        self.positions
            .get(&id)
            .map(|&position| &self.rules[position])
            .ok_or(GrammarError::UnknownRule(id))
    }

    /// The full terminal expansion of a rule.
    pub fn terminals(&self, id: RuleId) -> Result<Vec<T>> {
        let rule = self.grammar.rule(id).ok_or(GrammarError::UnknownRule(id))?;
        Ok(rule.expand().cloned().collect())
    }

    /// Scores every auxiliary rule whose expansion passes `filter`.
    ///
    /// Scores are normalised to sum to one over the kept rules and returned
    /// highest first; equal scores keep display order.
    pub fn rank<F, S>(&self, mut filter: F, mut score: S) -> Vec<Ranked>
    where
        F: FnMut(&[T]) -> bool,
        S: FnMut(&RuleStats) -> f64,
    {
        let start = self.grammar.start();
        let mut ranked: Vec<Ranked> = self
            .rules
            .iter()
            .filter(|stats| stats.id != start)
            .filter_map(|stats| {
                let terminals = self.terminals(stats.id).ok()?;
                filter(terminals.as_slice()).then(|| Ranked {
                    id: stats.id,
                    index: stats.index,
                    score: score(stats),
                })
            })
            .collect();

        let total: f64 = ranked.iter().map(|r| r.score).sum();
        if total > 0.0 {
            for r in &mut ranked {
                r.score /= total;
            }
        }

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        ranked
    }
}

impl<'a> Analysis<'a, u8> {
    /// The full byte expansion of a rule.
    pub fn bytes(&self, id: RuleId) -> Result<Vec<u8>> {
        self.terminals(id)
    }
}
