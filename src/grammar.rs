//! Grammar runtime.
//!
//! A grammar arrives as BNF text (see [`bnf`] for the dialect), is compiled
//! once into rule tables, and then drives parses through an Earley-style
//! recognizer ([`earley`]). Each rule application surfaces as one node of
//! the returned derivation tree; the ladder engine replays the tree
//! bottom-up, invoking a single reduction action per node.
//!
//! Per-alternative `rank => N` adverbs steer derivation extraction: at every
//! node only the highest-ranked alternatives that derive the span are kept.
//! If more than one derivation survives that filter anywhere in the tree,
//! the parse fails loudly instead of picking one.

use std::collections::HashMap;

use crate::config::Setup;
use crate::error::{Error, ErrorKind};

pub(crate) mod bnf;
pub(crate) mod earley;

use self::bnf::{RawPrimary, Rep};

/// Interned nonterminal identifier.
pub(crate) type SymId = usize;

/// A character class terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CharClass {
    /// Whether the class is complemented.
    pub(crate) negated: bool,
    /// Inclusive code point ranges.
    pub(crate) ranges: Vec<(u32, u32)>,
}

impl CharClass {
    /// Whether the class matches the given character.
    pub(crate) fn contains(&self, c: char) -> bool {
        let u = c as u32;
        let inside = self.ranges.iter().any(|&(lo, hi)| u >= lo && u <= hi);
        inside != self.negated
    }
}

/// A terminal: an exact literal or a character class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Term {
    /// Exact character sequence.
    Literal(Vec<char>),
    /// Single character from a class.
    Class(CharClass),
}

/// One right-hand-side element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Sym {
    /// Nonterminal reference.
    Nt(SymId),
    /// Terminal reference (index into [`Grammar::terms`]).
    T(usize),
}

/// A compiled rule: one alternative of its left-hand side.
#[derive(Debug, Clone)]
pub(crate) struct Rule {
    /// Left-hand-side nonterminal.
    pub(crate) lhs: SymId,
    /// Right-hand-side elements.
    pub(crate) rhs: Vec<Sym>,
    /// Extraction rank of this alternative.
    pub(crate) rank: i32,
}

/// A compiled grammar.
#[derive(Debug)]
pub(crate) struct Grammar {
    /// Nonterminal names, in `<name>` form, indexed by [`SymId`].
    names: Vec<String>,
    /// Name to id lookup.
    by_name: HashMap<String, SymId>,
    /// Interned terminals.
    pub(crate) terms: Vec<Term>,
    /// All rules.
    pub(crate) rules: Vec<Rule>,
    /// Rule ids grouped by left-hand side.
    pub(crate) rules_by_lhs: Vec<Vec<usize>>,
    /// Nullability per nonterminal.
    pub(crate) nullable: Vec<bool>,
    /// Start symbol: the left-hand side of the first rule.
    pub(crate) start: SymId,
}

/// One node of a derivation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    /// Text matched by a terminal.
    Leaf(String),
    /// A rule application.
    Inner {
        /// Left-hand side of the reduced rule.
        sym: SymId,
        /// Child values, in right-hand-side order.
        children: Vec<Node>,
    },
}

impl Grammar {
    /// Compiles BNF text into rule tables.
    ///
    /// The left-hand side of the first rule is the start symbol. Rules
    /// sharing a left-hand side merge their alternatives. Repetition
    /// operators desugar into helper nonterminals.
    pub(crate) fn compile(text: &str) -> Result<Self, Error> {
        let raw = bnf::parse(text).map_err(|msg| Error::new(ErrorKind::BindingInvalid, msg))?;

        let mut compiler = Compiler::default();
        let start = compiler.intern(&raw.rules[0].lhs);
        for rule in &raw.rules {
            let lhs = compiler.intern(&rule.lhs);
            for alt in &rule.alts {
                let mut rhs = Vec::with_capacity(alt.factors.len());
                for factor in &alt.factors {
                    let sym = compiler.lower_primary(&factor.primary)?;
                    match factor.rep {
                        Rep::One => rhs.push(sym),
                        rep => rhs.push(Sym::Nt(compiler.helper(sym, rep))),
                    }
                }
                compiler.rules.push(Rule {
                    lhs,
                    rhs,
                    rank: alt.rank,
                });
            }
        }
        compiler.finish(start)
    }

    /// Returns the name of a nonterminal, in `<name>` form.
    pub(crate) fn symbol_name(&self, sym: SymId) -> &str {
        &self.names[sym]
    }

    /// Whether a nonterminal of this name occurs in the grammar.
    pub(crate) fn has_symbol(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Parses the input, returning the unique derivation tree.
    ///
    /// Fails with [`ErrorKind::GrammarRejected`] when the input does not
    /// match, and [`ErrorKind::GrammarAmbiguous`] when several
    /// highest-ranked derivations exist.
    pub(crate) fn parse(&self, input: &str, setup: &Setup) -> Result<Node, Error> {
        earley::parse(self, input, setup)
    }
}

/// State while lowering raw rules.
#[derive(Default)]
struct Compiler {
    /// See [`Grammar::names`].
    names: Vec<String>,
    /// See [`Grammar::by_name`].
    by_name: HashMap<String, SymId>,
    /// See [`Grammar::terms`].
    terms: Vec<Term>,
    /// Terminal dedup table, keyed by the raw primary's debug form.
    terms_by_key: HashMap<String, usize>,
    /// Helper nonterminal dedup table.
    helpers: HashMap<(Sym, Rep), SymId>,
    /// Compiled rules so far.
    rules: Vec<Rule>,
}

impl Compiler {
    /// Interns a nonterminal name.
    fn intern(&mut self, name: &str) -> SymId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_owned());
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Lowers a raw primary to a grammar element.
    fn lower_primary(&mut self, primary: &RawPrimary) -> Result<Sym, Error> {
        match primary {
            RawPrimary::Symbol(name) => Ok(Sym::Nt(self.intern(name))),
            RawPrimary::Literal(text) => {
                if text.is_empty() {
                    return Err(Error::new(
                        ErrorKind::BindingInvalid,
                        "empty literal in grammar",
                    ));
                }
                Ok(Sym::T(self.intern_term(
                    format!("lit:{}", text),
                    Term::Literal(text.chars().collect()),
                )))
            }
            RawPrimary::Class { negated, ranges } => {
                if !negated && ranges.is_empty() {
                    return Err(Error::new(
                        ErrorKind::BindingInvalid,
                        "empty character class in grammar",
                    ));
                }
                Ok(Sym::T(self.intern_term(
                    format!("class:{}:{:?}", negated, ranges),
                    Term::Class(CharClass {
                        negated: *negated,
                        ranges: ranges.clone(),
                    }),
                )))
            }
        }
    }

    /// Interns a terminal, reusing identical ones.
    fn intern_term(&mut self, key: String, term: Term) -> usize {
        if let Some(&id) = self.terms_by_key.get(&key) {
            return id;
        }
        let id = self.terms.len();
        self.terms.push(term);
        self.terms_by_key.insert(key, id);
        id
    }

    /// Returns (creating if needed) the helper nonterminal implementing a
    /// repetition of `inner`.
    fn helper(&mut self, inner: Sym, rep: Rep) -> SymId {
        if let Some(&id) = self.helpers.get(&(inner, rep)) {
            return id;
        }
        let base = match inner {
            Sym::Nt(id) => self.names[id]
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_owned(),
            Sym::T(id) => format!("__t{}", id),
        };
        let suffix = match rep {
            Rep::Opt => "opt",
            Rep::Star => "star",
            Rep::Plus => "plus",
            Rep::One => unreachable!("Rep::One never produces a helper"),
        };
        let id = self.intern(&format!("<{} {}>", base, suffix));
        self.helpers.insert((inner, rep), id);
        match rep {
            Rep::Opt => {
                self.rules.push(Rule {
                    lhs: id,
                    rhs: Vec::new(),
                    rank: 0,
                });
                self.rules.push(Rule {
                    lhs: id,
                    rhs: vec![inner],
                    rank: 0,
                });
            }
            Rep::Star => {
                self.rules.push(Rule {
                    lhs: id,
                    rhs: Vec::new(),
                    rank: 0,
                });
                self.rules.push(Rule {
                    lhs: id,
                    rhs: vec![Sym::Nt(id), inner],
                    rank: 0,
                });
            }
            Rep::Plus => {
                self.rules.push(Rule {
                    lhs: id,
                    rhs: vec![inner],
                    rank: 0,
                });
                self.rules.push(Rule {
                    lhs: id,
                    rhs: vec![Sym::Nt(id), inner],
                    rank: 0,
                });
            }
            Rep::One => unreachable!("Rep::One never produces a helper"),
        }
        id
    }

    /// Checks referential integrity, computes nullability, and builds the
    /// final tables.
    fn finish(self, start: SymId) -> Result<Grammar, Error> {
        let Compiler {
            names,
            by_name,
            terms,
            rules,
            ..
        } = self;

        let mut rules_by_lhs: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
        for (id, rule) in rules.iter().enumerate() {
            rules_by_lhs[rule.lhs].push(id);
        }
        for (id, name) in names.iter().enumerate() {
            if rules_by_lhs[id].is_empty() {
                return Err(Error::new(
                    ErrorKind::BindingInvalid,
                    format!("grammar references undefined symbol {}", name),
                ));
            }
        }

        let mut nullable = vec![false; names.len()];
        loop {
            let mut changed = false;
            for rule in &rules {
                if nullable[rule.lhs] {
                    continue;
                }
                let all_nullable = rule.rhs.iter().all(|sym| match sym {
                    Sym::Nt(nt) => nullable[*nt],
                    Sym::T(_) => false,
                });
                if all_nullable {
                    nullable[rule.lhs] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Ok(Grammar {
            names,
            by_name,
            terms,
            rules,
            rules_by_lhs,
            nullable,
            start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_merges_alternatives_and_desugars() {
        let g = Grammar::compile(
            "<list> ::= <item>*\n\
             <item> ::= 'a' | 'b'\n",
        )
        .expect("grammar compiles");
        assert_eq!(g.symbol_name(g.start), "<list>");
        assert!(g.nullable[g.start]);
        // helper rules: 2 for the star, 1 for <list>, 2 for <item>
        assert_eq!(g.rules.len(), 5);
    }

    #[test]
    fn undefined_symbol_is_rejected() {
        let err = Grammar::compile("<a> ::= <missing>\n").expect_err("must fail");
        assert_eq!(err.kind(), crate::error::ErrorKind::BindingInvalid);
    }

    #[test]
    fn class_negation() {
        let class = CharClass {
            negated: true,
            ranges: vec![(u32::from('#'), u32::from('#'))],
        };
        assert!(class.contains('a'));
        assert!(!class.contains('#'));
    }
}
