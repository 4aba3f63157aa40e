//! Earley-style recognizer and derivation extraction.
//!
//! The recognizer builds the classic item chart (scan, predict, complete,
//! with the nullable-prediction shortcut so empty rules complete in place).
//! Extraction then walks the chart top-down, counting derivations with a
//! cap of two: a count of zero is a rejection, two is ambiguity. Rule ranks
//! filter alternatives per node before counting, so a lower-ranked
//! alternative never makes a parse ambiguous.
//!
//! Recognizer state is scoped to a single parse and dropped at its end,
//! whatever the outcome.

use std::collections::{HashMap, HashSet};

use crate::config::Setup;
use crate::error::{Error, ErrorKind};

use super::{Grammar, Node, Sym, SymId, Term};

/// A dotted rule with its origin set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Item {
    /// Rule id.
    rule: u32,
    /// Dot position within the right-hand side.
    dot: u32,
    /// Chart set the rule application started in.
    origin: u32,
}

/// Parses the input, returning the unique derivation tree.
pub(crate) fn parse(g: &Grammar, input: &str, setup: &Setup) -> Result<Node, Error> {
    let chars: Vec<char> = input.chars().collect();
    let sets = recognize(g, &chars, setup)?;

    let mut builder = Builder::new(g, &chars, &sets);
    let n = chars.len();
    match builder.count(g.start, 0, n) {
        0 => Err(Error::new(
            ErrorKind::GrammarRejected,
            format!("no derivation of {}", g.symbol_name(g.start)),
        )),
        1 => Ok(builder.build(g.start, 0, n)),
        _ => Err(Error::new(
            ErrorKind::GrammarAmbiguous,
            format!(
                "{} derives the input in more than one way",
                g.symbol_name(g.start)
            ),
        )),
    }
}

/// Matches a terminal at the given character position, returning the
/// number of characters consumed.
fn match_term(term: &Term, chars: &[char], at: usize) -> Option<usize> {
    match term {
        Term::Literal(lit) => {
            if chars.len() >= at + lit.len() && chars[at..at + lit.len()] == lit[..] {
                Some(lit.len())
            } else {
                None
            }
        }
        Term::Class(class) => {
            if at < chars.len() && class.contains(chars[at]) {
                Some(1)
            } else {
                None
            }
        }
    }
}

/// Runs the recognizer, returning the chart.
fn recognize(g: &Grammar, chars: &[char], setup: &Setup) -> Result<Vec<Vec<Item>>, Error> {
    let n = chars.len();
    let mut sets: Vec<Vec<Item>> = vec![Vec::new(); n + 1];
    let mut seen: Vec<HashSet<Item>> = vec![HashSet::new(); n + 1];

    for &r in &g.rules_by_lhs[g.start] {
        add(
            &mut sets,
            &mut seen,
            0,
            Item {
                rule: r as u32,
                dot: 0,
                origin: 0,
            },
        );
    }

    for i in 0..=n {
        let mut idx = 0;
        while idx < sets[i].len() {
            let item = sets[i][idx];
            idx += 1;
            let rule = &g.rules[item.rule as usize];
            if (item.dot as usize) < rule.rhs.len() {
                match rule.rhs[item.dot as usize] {
                    Sym::Nt(nt) => {
                        // Predict; advance over nullable nonterminals in
                        // place so empty derivations are not lost.
                        for &r2 in &g.rules_by_lhs[nt] {
                            add(
                                &mut sets,
                                &mut seen,
                                i,
                                Item {
                                    rule: r2 as u32,
                                    dot: 0,
                                    origin: i as u32,
                                },
                            );
                        }
                        if g.nullable[nt] {
                            add(
                                &mut sets,
                                &mut seen,
                                i,
                                Item {
                                    rule: item.rule,
                                    dot: item.dot + 1,
                                    origin: item.origin,
                                },
                            );
                        }
                    }
                    Sym::T(t) => {
                        if let Some(len) = match_term(&g.terms[t], chars, i) {
                            if setup.trace_terminals {
                                log::trace!(
                                    "scan {:?} at {} for {}",
                                    chars[i..i + len].iter().collect::<String>(),
                                    i,
                                    g.symbol_name(rule.lhs),
                                );
                            }
                            add(
                                &mut sets,
                                &mut seen,
                                i + len,
                                Item {
                                    rule: item.rule,
                                    dot: item.dot + 1,
                                    origin: item.origin,
                                },
                            );
                        }
                    }
                }
            } else {
                // Complete.
                let lhs = rule.lhs;
                let origin = item.origin as usize;
                let mut k = 0;
                while k < sets[origin].len() {
                    let cand = sets[origin][k];
                    k += 1;
                    let crule = &g.rules[cand.rule as usize];
                    if (cand.dot as usize) < crule.rhs.len() {
                        if let Sym::Nt(nt) = crule.rhs[cand.dot as usize] {
                            if nt == lhs {
                                add(
                                    &mut sets,
                                    &mut seen,
                                    i,
                                    Item {
                                        rule: cand.rule,
                                        dot: cand.dot + 1,
                                        origin: cand.origin,
                                    },
                                );
                            }
                        }
                    }
                }
            }
        }
        if setup.trace {
            log::trace!("chart set {}: {} items", i, sets[i].len());
        }
    }

    let accepted = sets[n].iter().any(|it| {
        let rule = &g.rules[it.rule as usize];
        rule.lhs == g.start && (it.dot as usize) == rule.rhs.len() && it.origin == 0
    });
    if accepted {
        Ok(sets)
    } else {
        // The furthest non-empty set tells roughly where progress stopped.
        let far = sets.iter().rposition(|s| !s.is_empty()).unwrap_or(0);
        Err(Error::new(
            ErrorKind::GrammarRejected,
            format!(
                "input does not match {} (progress stopped near character {})",
                g.symbol_name(g.start),
                far
            ),
        ))
    }
}

/// Inserts an item into a chart set, deduplicating.
fn add(sets: &mut [Vec<Item>], seen: &mut [HashSet<Item>], at: usize, item: Item) {
    if seen[at].insert(item) {
        sets[at].push(item);
    }
}

/// Derivation counter and tree builder over a finished chart.
struct Builder<'a> {
    /// The grammar.
    g: &'a Grammar,
    /// The input.
    chars: &'a [char],
    /// End positions of completed spans, per (symbol, origin), ascending.
    ends: HashMap<(SymId, usize), Vec<usize>>,
    /// Completed rule ids per (symbol, origin, end).
    rules_at: HashMap<(SymId, usize, usize), Vec<usize>>,
    /// Derivation counts (capped at 2) per (symbol, origin, end).
    memo: HashMap<(SymId, usize, usize), usize>,
    /// Cycle guard for count recursion.
    in_progress: HashSet<(SymId, usize, usize)>,
}

impl<'a> Builder<'a> {
    /// Indexes completed items of the chart.
    fn new(g: &'a Grammar, chars: &'a [char], sets: &[Vec<Item>]) -> Self {
        let mut ends: HashMap<(SymId, usize), Vec<usize>> = HashMap::new();
        let mut rules_at: HashMap<(SymId, usize, usize), Vec<usize>> = HashMap::new();
        for (j, set) in sets.iter().enumerate() {
            for item in set {
                let rule = &g.rules[item.rule as usize];
                if (item.dot as usize) == rule.rhs.len() {
                    let origin = item.origin as usize;
                    let span_ends = ends.entry((rule.lhs, origin)).or_default();
                    if !span_ends.contains(&j) {
                        span_ends.push(j);
                    }
                    rules_at
                        .entry((rule.lhs, origin, j))
                        .or_default()
                        .push(item.rule as usize);
                }
            }
        }
        for span_ends in ends.values_mut() {
            span_ends.sort_unstable();
        }
        Self {
            g,
            chars,
            ends,
            rules_at,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Counts derivations of `sym` over `i..j`, capped at 2, keeping only
    /// the highest-ranked alternatives that derive the span.
    fn count(&mut self, sym: SymId, i: usize, j: usize) -> usize {
        if let Some(&c) = self.memo.get(&(sym, i, j)) {
            return c;
        }
        // A revisit within the same spine would mean a cyclic derivation;
        // such derivations are infinite families and are not enumerated.
        if !self.in_progress.insert((sym, i, j)) {
            return 0;
        }
        let rules = self
            .rules_at
            .get(&(sym, i, j))
            .cloned()
            .unwrap_or_default();
        let mut per_rule: Vec<(i32, usize)> = Vec::new();
        for r in rules {
            let rhs = self.g.rules[r].rhs.clone();
            let c = self.seq_count(&rhs, i, j);
            if c > 0 {
                per_rule.push((self.g.rules[r].rank, c));
            }
        }
        let total = match per_rule.iter().map(|&(rank, _)| rank).max() {
            Some(max_rank) => per_rule
                .iter()
                .filter(|&&(rank, _)| rank == max_rank)
                .map(|&(_, c)| c)
                .sum::<usize>()
                .min(2),
            None => 0,
        };
        self.in_progress.remove(&(sym, i, j));
        self.memo.insert((sym, i, j), total);
        total
    }

    /// Counts the ways a symbol sequence spans `i..j`, capped at 2.
    fn seq_count(&mut self, syms: &[Sym], i: usize, j: usize) -> usize {
        let (first, rest) = match syms.split_first() {
            Some(split) => split,
            None => return usize::from(i == j),
        };
        let mut total = 0;
        match *first {
            Sym::T(t) => {
                if let Some(len) = match_term(&self.g.terms[t], self.chars, i) {
                    if i + len <= j {
                        total = self.seq_count(rest, i + len, j);
                    }
                }
            }
            Sym::Nt(nt) => {
                let ends = self.ends.get(&(nt, i)).cloned().unwrap_or_default();
                for end in ends.into_iter().filter(|&end| end <= j) {
                    let c1 = self.count(nt, i, end);
                    if c1 == 0 {
                        continue;
                    }
                    let c2 = self.seq_count(rest, end, j);
                    total += c1 * c2;
                    if total >= 2 {
                        return 2;
                    }
                }
            }
        }
        total.min(2)
    }

    /// Builds the unique derivation tree of `sym` over `i..j`.
    ///
    /// Must only be called when [`Self::count`] returned exactly 1.
    fn build(&mut self, sym: SymId, i: usize, j: usize) -> Node {
        let rules = self
            .rules_at
            .get(&(sym, i, j))
            .cloned()
            .unwrap_or_default();
        let mut chosen: Option<usize> = None;
        let mut best_rank = i32::MIN;
        for r in rules {
            let rhs = self.g.rules[r].rhs.clone();
            if self.seq_count(&rhs, i, j) > 0 && (chosen.is_none() || self.g.rules[r].rank > best_rank)
            {
                best_rank = self.g.rules[r].rank;
                chosen = Some(r);
            }
        }
        let rule = chosen.expect("[consistency] a counted derivation must be buildable");
        let rhs = self.g.rules[rule].rhs.clone();
        let mut children = Vec::with_capacity(rhs.len());
        self.build_seq(&rhs, i, j, &mut children);
        Node::Inner { sym, children }
    }

    /// Builds the children of a rule application over `i..j`.
    fn build_seq(&mut self, syms: &[Sym], i: usize, j: usize, out: &mut Vec<Node>) {
        let (first, rest) = match syms.split_first() {
            Some(split) => split,
            None => {
                debug_assert_eq!(i, j, "[consistency] sequence must cover the span");
                return;
            }
        };
        match *first {
            Sym::T(t) => {
                let len = match_term(&self.g.terms[t], self.chars, i)
                    .expect("[consistency] terminal must match in a counted derivation");
                out.push(Node::Leaf(self.chars[i..i + len].iter().collect()));
                self.build_seq(rest, i + len, j, out);
            }
            Sym::Nt(nt) => {
                let ends = self.ends.get(&(nt, i)).cloned().unwrap_or_default();
                for end in ends.into_iter().filter(|&end| end <= j) {
                    if self.count(nt, i, end) > 0 && self.seq_count(rest, end, j) > 0 {
                        out.push(self.build(nt, i, end));
                        self.build_seq(rest, end, j, out);
                        return;
                    }
                }
                unreachable!("[consistency] a counted derivation must be buildable");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Setup;
    use crate::error::ErrorKind;
    use crate::grammar::Grammar;

    /// Collects the leaf text of a tree.
    fn leaves(node: &Node, out: &mut String) {
        match node {
            Node::Leaf(s) => out.push_str(s),
            Node::Inner { children, .. } => {
                for c in children {
                    leaves(c, out);
                }
            }
        }
    }

    #[test]
    fn parses_and_rebuilds_input() {
        let g = Grammar::compile(
            "<s> ::= <word> ':' <word>\n\
             <word> ::= [a-z]+\n",
        )
        .expect("grammar compiles");
        let tree = g.parse("abc:de", &Setup::default()).expect("parses");
        let mut text = String::new();
        leaves(&tree, &mut text);
        assert_eq!(text, "abc:de");
    }

    #[test]
    fn rejects_nonmatching_input() {
        let g = Grammar::compile("<s> ::= [a-z]+\n").expect("grammar compiles");
        let err = g.parse("abc1", &Setup::default()).expect_err("rejects");
        assert_eq!(err.kind(), ErrorKind::GrammarRejected);
    }

    #[test]
    fn nullable_rules_derive_empty_input() {
        let g = Grammar::compile(
            "<s> ::= <a> <b>\n\
             <a> ::=\n\
             <b> ::= [x]*\n",
        )
        .expect("grammar compiles");
        let tree = g.parse("", &Setup::default()).expect("parses empty");
        match tree {
            Node::Inner { children, .. } => assert_eq!(children.len(), 2),
            Node::Leaf(_) => panic!("expected inner node"),
        }
    }

    #[test]
    fn equal_rank_alternatives_are_ambiguous() {
        let g = Grammar::compile(
            "<s> ::= <a> | <b>\n\
             <a> ::= 'x'\n\
             <b> ::= 'x'\n",
        )
        .expect("grammar compiles");
        let err = g.parse("x", &Setup::default()).expect_err("ambiguous");
        assert_eq!(err.kind(), ErrorKind::GrammarAmbiguous);
    }

    #[test]
    fn rank_disambiguates() {
        let g = Grammar::compile(
            "<s> ::= <a> rank => 1 | <b>\n\
             <a> ::= 'x'\n\
             <b> ::= 'x'\n",
        )
        .expect("grammar compiles");
        let tree = g.parse("x", &Setup::default()).expect("rank picks <a>");
        match tree {
            Node::Inner { children, .. } => match &children[0] {
                Node::Inner { sym, .. } => assert_eq!(g.symbol_name(*sym), "<a>"),
                Node::Leaf(_) => panic!("expected inner child"),
            },
            Node::Leaf(_) => panic!("expected inner node"),
        }
    }

    #[test]
    fn ambiguity_within_one_alternative_is_detected() {
        // `xx` splits as (x)(x) with <m> taking one or two characters.
        let g = Grammar::compile(
            "<s> ::= <m> <m>\n\
             <m> ::= 'x' | 'xx' |\n",
        )
        .expect("grammar compiles");
        let err = g.parse("xx", &Setup::default()).expect_err("ambiguous");
        assert_eq!(err.kind(), ErrorKind::GrammarAmbiguous);
    }

    #[test]
    fn multichar_literals_scan() {
        let g = Grammar::compile("<s> ::= '::' [0-9]\n").expect("grammar compiles");
        assert!(g.parse("::7", &Setup::default()).is_ok());
        assert!(g.parse(":7", &Setup::default()).is_err());
    }
}
