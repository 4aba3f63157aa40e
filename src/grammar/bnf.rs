//! BNF meta-grammar reader.
//!
//! The dialect is a compact SLIF-flavored BNF:
//!
//! ```text
//! # comment to end of line
//! <lhs> ::= <sym> 'literal' [A-Za-z\x{A0}-\x{D7FF}] | <other> rank => 1
//! <lhs> ::=                       # empty right-hand side
//! ```
//!
//! Factors are `<symbol>`, `'literal'` (or `"literal"`), or a character
//! class (`[...]`, `[^...]`, with `\]` `\\` `\-` and `\x{HEX}` escapes),
//! each optionally followed by `?`, `*`, or `+`. Alternatives may end with
//! a `rank => N` adverb steering derivation extraction. Rules with the same
//! left-hand side merge their alternatives.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{char as chr, multispace1, one_of},
    combinator::{map, not, opt, recognize, verify},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

/// Repetition operator on a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Rep {
    /// Exactly once.
    One,
    /// Zero or one.
    Opt,
    /// Zero or more.
    Star,
    /// One or more.
    Plus,
}

/// Atomic part of a factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawPrimary {
    /// Nonterminal reference, in `<name>` form.
    Symbol(String),
    /// Exact literal.
    Literal(String),
    /// Character class.
    Class {
        /// Whether the class is complemented.
        negated: bool,
        /// Inclusive code point ranges.
        ranges: Vec<(u32, u32)>,
    },
}

/// A primary with its repetition operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawFactor {
    /// The atom.
    pub(crate) primary: RawPrimary,
    /// Its repetition.
    pub(crate) rep: Rep,
}

/// One alternative of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawAlt {
    /// Factors, possibly empty.
    pub(crate) factors: Vec<RawFactor>,
    /// Extraction rank (default 0).
    pub(crate) rank: i32,
}

/// A parsed rule (one `::=` statement).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRule {
    /// Left-hand side, in `<name>` form.
    pub(crate) lhs: String,
    /// Alternatives.
    pub(crate) alts: Vec<RawAlt>,
}

/// A parsed grammar text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawGrammar {
    /// Rules in source order.
    pub(crate) rules: Vec<RawRule>,
}

/// Parses BNF text.
pub(crate) fn parse(text: &str) -> Result<RawGrammar, String> {
    let mut rules = Vec::new();
    let mut rest = text;
    loop {
        let (after_sp, _) = sp(rest).map_err(|_| "unterminated comment".to_owned())?;
        if after_sp.is_empty() {
            break;
        }
        match rule(after_sp) {
            Ok((next, r)) => {
                rules.push(r);
                rest = next;
            }
            Err(_) => {
                let snippet: String = after_sp.chars().take(40).collect();
                return Err(format!("BNF syntax error near {:?}", snippet));
            }
        }
    }
    if rules.is_empty() {
        return Err("grammar has no rules".to_owned());
    }
    Ok(RawGrammar { rules })
}

/// Skips whitespace and `#` comments.
fn sp(i: &str) -> IResult<&str, &str> {
    recognize(many0(alt((
        multispace1,
        recognize(pair(chr('#'), opt(is_not("\n")))),
    ))))(i)
}

/// Parses one rule statement.
fn rule(i: &str) -> IResult<&str, RawRule> {
    let (i, lhs) = symbol(i)?;
    let (i, _) = sp(i)?;
    let (i, _) = tag("::=")(i)?;
    let (i, alts) = alternation(i)?;
    Ok((i, RawRule { lhs, alts }))
}

/// Parses `alt | alt | ...` up to the next rule or end of input.
fn alternation(i: &str) -> IResult<&str, Vec<RawAlt>> {
    let (mut i, first) = alternative(i)?;
    let mut alts = vec![first];
    loop {
        let (after_sp, _) = sp(i)?;
        match chr::<_, nom::error::Error<&str>>('|')(after_sp) {
            Ok((rest, _)) => {
                let (rest, a) = alternative(rest)?;
                alts.push(a);
                i = rest;
            }
            Err(_) => break,
        }
    }
    Ok((i, alts))
}

/// Parses a single alternative: factors plus an optional rank adverb.
fn alternative(i: &str) -> IResult<&str, RawAlt> {
    let (i, factors) = many0(preceded(sp, factor))(i)?;
    let (i, rank) = opt(preceded(sp, rank_adverb))(i)?;
    Ok((
        i,
        RawAlt {
            factors,
            rank: rank.unwrap_or(0),
        },
    ))
}

/// Parses a `rank => N` adverb.
fn rank_adverb(i: &str) -> IResult<&str, i32> {
    let (i, _) = tag("rank")(i)?;
    let (i, _) = sp(i)?;
    let (i, _) = tag("=>")(i)?;
    let (i, _) = sp(i)?;
    let (i, text) = recognize(pair(
        opt(chr('-')),
        take_while1(|c: char| c.is_ascii_digit()),
    ))(i)?;
    let rank = text
        .parse()
        .map_err(|_| nom::Err::Error(nom::error::Error::new(i, nom::error::ErrorKind::Digit)))?;
    Ok((i, rank))
}

/// Parses one factor.
fn factor(i: &str) -> IResult<&str, RawFactor> {
    let (i, primary) = alt((
        // A symbol directly followed by `::=` starts the next rule.
        map(
            terminated(symbol, not(preceded(sp, tag("::=")))),
            RawPrimary::Symbol,
        ),
        map(literal, RawPrimary::Literal),
        class,
    ))(i)?;
    let (i, rep) = opt(one_of("?*+"))(i)?;
    let rep = match rep {
        Some('?') => Rep::Opt,
        Some('*') => Rep::Star,
        Some('+') => Rep::Plus,
        _ => Rep::One,
    };
    Ok((i, RawFactor { primary, rep }))
}

/// Parses `<name>`, normalizing inner whitespace at the edges.
fn symbol(i: &str) -> IResult<&str, String> {
    map(
        verify(delimited(chr('<'), is_not("<>"), chr('>')), |s: &str| {
            !s.trim().is_empty()
        }),
        |name: &str| format!("<{}>", name.trim()),
    )(i)
}

/// Parses a quoted literal.
fn literal(i: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(chr('\''), opt(is_not("'")), chr('\'')),
            |s: Option<&str>| s.unwrap_or("").to_owned(),
        ),
        map(
            delimited(chr('"'), opt(is_not("\"")), chr('"')),
            |s: Option<&str>| s.unwrap_or("").to_owned(),
        ),
    ))(i)
}

/// Parses a character class.
fn class(i: &str) -> IResult<&str, RawPrimary> {
    let fail = |at| nom::Err::Error(nom::error::Error::new(at, nom::error::ErrorKind::Fail));

    let mut rest = i.strip_prefix('[').ok_or_else(|| fail(i))?;
    let negated = match rest.strip_prefix('^') {
        Some(r) => {
            rest = r;
            true
        }
        None => false,
    };

    let mut ranges = Vec::new();
    loop {
        if let Some(r) = rest.strip_prefix(']') {
            return Ok((r, RawPrimary::Class { negated, ranges }));
        }
        let (lo, r) = class_char(rest).ok_or_else(|| fail(rest))?;
        rest = r;
        // A `-` not directly before `]` denotes a range.
        if rest.starts_with('-') && !rest[1..].starts_with(']') {
            let (hi, r) = class_char(&rest[1..]).ok_or_else(|| fail(rest))?;
            rest = r;
            if hi < lo {
                return Err(fail(rest));
            }
            ranges.push((lo, hi));
        } else {
            ranges.push((lo, lo));
        }
    }
}

/// Parses one (possibly escaped) class character, returning its code point.
fn class_char(i: &str) -> Option<(u32, &str)> {
    let mut chars = i.chars();
    match chars.next()? {
        '\\' => match chars.next()? {
            'x' => {
                let rest = chars.as_str().strip_prefix('{')?;
                let end = rest.find('}')?;
                let value = u32::from_str_radix(&rest[..end], 16).ok()?;
                // Reject lone surrogates so the value stays a valid scalar.
                char::from_u32(value)?;
                Some((value, &rest[end + 1..]))
            }
            'n' => Some((u32::from('\n'), chars.as_str())),
            't' => Some((u32::from('\t'), chars.as_str())),
            c => Some((u32::from(c), chars.as_str())),
        },
        ']' => None,
        c => Some((u32::from(c), chars.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rules_with_ranks_and_reps() {
        let g = parse(
            "# host\n\
             <host> ::= <ip literal> | <ipv4 address> rank => 1 | <reg name>\n\
             <reg name> ::= <reg name char>*\n\
             <reg name char> ::= [A-Za-z0-9\\-._~]\n\
             <ip literal> ::= '[' <reg name> ']'\n\
             <ipv4 address> ::= [0-9]+\n",
        )
        .expect("parses");
        assert_eq!(g.rules.len(), 5);
        assert_eq!(g.rules[0].lhs, "<host>");
        assert_eq!(g.rules[0].alts.len(), 3);
        assert_eq!(g.rules[0].alts[1].rank, 1);
        assert_eq!(g.rules[1].alts[0].factors[0].rep, Rep::Star);
    }

    #[test]
    fn parses_empty_rhs() {
        let g = parse("<a> ::= 'x'\n<b> ::=\n<c> ::= <a>\n").expect("parses");
        assert_eq!(g.rules[1].alts.len(), 1);
        assert!(g.rules[1].alts[0].factors.is_empty());
    }

    #[test]
    fn parses_unicode_class_escapes() {
        let g = parse("<u> ::= [\\x{A0}-\\x{D7FF}\\-]\n").expect("parses");
        match &g.rules[0].alts[0].factors[0].primary {
            RawPrimary::Class { negated, ranges } => {
                assert!(!negated);
                assert_eq!(ranges[0], (0xA0, 0xD7FF));
                assert_eq!(ranges[1], (u32::from('-'), u32::from('-')));
            }
            other => panic!("unexpected primary: {:?}", other),
        }
    }

    #[test]
    fn negated_class() {
        let g = parse("<o> ::= [^#%]\n").expect("parses");
        match &g.rules[0].alts[0].factors[0].primary {
            RawPrimary::Class { negated, ranges } => {
                assert!(*negated);
                assert_eq!(ranges.len(), 2);
            }
            other => panic!("unexpected primary: {:?}", other),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("<a> := 'x'\n").is_err());
        assert!(parse("").is_err());
    }
}
