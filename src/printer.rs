//! Canonical textual listing of a grammar.
//!
//! One line per rule, `<index> -> <body>`, where every body token is
//! followed by a single space. The start rule is `0`; other rules are
//! numbered in the order [`Grammar::rules`] returns them.

use crate::grammar::{Element, Grammar};
use crate::symbol::RuleId;
use ahash::AHashMap as HashMap;
use std::fmt;
use std::hash::Hash;
use std::io::{self, Write};

/// Terminals that have a textual rendering in a rule listing.
pub trait RenderTerminal {
    /// Appends the escaped form of the terminal to `out`.
    fn render(&self, out: &mut Vec<u8>);
}

impl RenderTerminal for u8 {
    fn render(&self, out: &mut Vec<u8>) {
        match *self {
            b' ' => out.push(b'_'),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\\' | b'(' | b')' | b'_' | b'0'..=b'9' => {
                out.push(b'\\');
                out.push(*self);
            }
            byte => out.push(byte),
        }
    }
}

impl RenderTerminal for char {
    fn render(&self, out: &mut Vec<u8>) {
        if self.is_ascii() {
            (*self as u8).render(out);
        } else {
            let mut buf = [0u8; 4];
            out.extend_from_slice(self.encode_utf8(&mut buf).as_bytes());
        }
    }
}

/// Writes rule listings, numbering rules afresh for every grammar.
pub struct Printer<'a, T> {
    grammar: &'a Grammar<T>,
    order: Vec<RuleId>,
    numbering: HashMap<RuleId, usize>,
}

impl<'a, T: Hash + Eq + Clone + RenderTerminal> Printer<'a, T> {
    pub fn new(grammar: &'a Grammar<T>) -> Self {
        let order = grammar.rules();
        let numbering = order
            .iter()
            .enumerate()
            .map(|(index, &rule)| (rule, index))
            .collect();

        Self {
            grammar,
            order,
            numbering,
        }
    }

    /// Display index of a rule, if it is reachable from the start rule.
    pub fn index_of(&self, rule: RuleId) -> Option<usize> {
        self.numbering.get(&rule).copied()
    }

    /// Renders the whole listing into a byte buffer.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (index, &rule) in self.order.iter().enumerate() {
            let Some(view) = self.grammar.rule(rule) else {
                continue;
            };

            out.extend_from_slice(index.to_string().as_bytes());
            out.extend_from_slice(b" -> ");
            for element in view.symbols() {
                match element {
                    Element::Terminal(value) => value.render(&mut out),
                    Element::Rule(child) => {
                        let child_index = self.numbering[&child];
                        out.extend_from_slice(child_index.to_string().as_bytes());
                    }
                }
                out.push(b' ');
            }
            out.push(b'\n');
        }
        out
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.render())
    }
}

impl<T: Hash + Eq + Clone + RenderTerminal> Grammar<T> {
    /// Writes the rule listing to `w`.
    pub fn print<W: Write>(&self, w: W) -> io::Result<()> {
        Printer::new(self).write_to(w)
    }

    /// Returns the rule listing; invalid UTF-8 is replaced.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&Printer::new(self).render()).into_owned()
    }
}

impl<T: Hash + Eq + Clone + RenderTerminal> fmt::Display for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(value: u8) -> Vec<u8> {
        let mut out = Vec::new();
        value.render(&mut out);
        out
    }

    #[test]
    fn test_escapes() {
        assert_eq!(rendered(b' '), b"_".to_vec());
        assert_eq!(rendered(b'\n'), b"\\n".to_vec());
        assert_eq!(rendered(b'\t'), b"\\t".to_vec());
        assert_eq!(rendered(b'\\'), b"\\\\".to_vec());
        assert_eq!(rendered(b'('), b"\\(".to_vec());
        assert_eq!(rendered(b')'), b"\\)".to_vec());
        assert_eq!(rendered(b'_'), b"\\_".to_vec());
        assert_eq!(rendered(b'7'), b"\\7".to_vec());
        assert_eq!(rendered(b'q'), b"q".to_vec());
    }

    #[test]
    fn test_char_matches_byte_rendering() {
        let mut from_char = Vec::new();
        ' '.render(&mut from_char);
        '3'.render(&mut from_char);
        'é'.render(&mut from_char);
        assert_eq!(from_char, "_\\3é".as_bytes().to_vec());
    }

    #[test]
    fn test_abcab_listing() {
        let grammar = Grammar::build(b"abcab").expect("non-empty input");
        assert_eq!(grammar.to_text(), "0 -> 1 c 1 \n1 -> a b \n");
    }

    #[test]
    fn test_single_symbol_listing() {
        let grammar = Grammar::build(b"x").expect("non-empty input");
        assert_eq!(grammar.to_text(), "0 -> x \n");
    }

    #[test]
    fn test_abaaba_listing() {
        let grammar = Grammar::build(b"abaaba").expect("non-empty input");
        assert_eq!(grammar.to_text(), "0 -> 1 1 \n1 -> a b a \n");
    }

    #[test]
    fn test_escaped_listing() {
        let grammar = Grammar::build(b"a 1").expect("non-empty input");
        assert_eq!(grammar.to_text(), "0 -> a _ \\1 \n");
    }

    #[test]
    fn test_nested_numbering() {
        let grammar = Grammar::build(b"abcdbcabcdbc").expect("non-empty input");
        assert_eq!(
            grammar.to_text(),
            "0 -> 1 1 \n1 -> a 2 d 2 \n2 -> b c \n"
        );
    }

    #[test]
    fn test_printing_is_repeatable() {
        let grammar = Grammar::build(b"the cat sat on the mat, the cat sat").expect("input");
        let first = grammar.to_text();
        let second = grammar.to_text();
        assert_eq!(first, second);

        let mut written = Vec::new();
        grammar.print(&mut written).expect("writing to a Vec cannot fail");
        assert_eq!(String::from_utf8(written).expect("ASCII listing"), first);
        assert_eq!(format!("{}", grammar), first);
    }

    #[test]
    fn test_one_complete_line_per_rule() {
        let grammar = Grammar::build(b"abcdbcabcdbc abcdbc").expect("non-empty input");
        let text = grammar.to_text();

        assert!(text.ends_with(" \n"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), grammar.rules().len());
        for (index, line) in lines.iter().enumerate() {
            assert!(line.starts_with(&format!("{} -> ", index)));
            assert!(line.ends_with(' '));
        }
    }

    #[test]
    fn test_index_of() {
        let grammar = Grammar::build(b"abcab").expect("non-empty input");
        let printer = Printer::new(&grammar);
        let rules = grammar.rules();

        assert_eq!(printer.index_of(grammar.start()), Some(0));
        assert_eq!(printer.index_of(rules[1]), Some(1));
    }
}
