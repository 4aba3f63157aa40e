//! The ladder engine.
//!
//! A parse computes nine output strings in parallel, one per stage:
//!
//! | index | stage |
//! |---|---|
//! | 0 | `RAW` |
//! | 1 | `URI_CONVERTED` |
//! | 2 | `IRI_CONVERTED` |
//! | 3 | `CASE_NORMALIZED` |
//! | 4 | `CHARACTER_NORMALIZED` |
//! | 5 | `PERCENT_ENCODING_NORMALIZED` |
//! | 6 | `PATH_SEGMENT_NORMALIZED` |
//! | 7 | `SCHEME_BASED_NORMALIZED` |
//! | 8 | `PROTOCOL_BASED_NORMALIZED` |
//!
//! Every rule reduction concatenates its children per stage, then runs the
//! stage callbacks: normalizers (3..=8) cumulatively, converters (1..=2)
//! independently. When the reducing symbol is mapped to a record field, the
//! nine per-stage values land in the nine records.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, ErrorKind};
use crate::grammar::{Grammar, Node};
use crate::record::Record;
use crate::spec::Binding;

/// A ladder stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(usize)]
pub enum LadderIndex {
    /// The input as parsed.
    Raw = 0,
    /// RAW with URI conversions applied (IDN ToASCII on domain reg-names).
    UriConverted = 1,
    /// RAW with IRI conversions applied.
    IriConverted = 2,
    /// Case normalization (RFC 3986 §6.2.2.1).
    CaseNormalized = 3,
    /// Character normalization (RFC 3987 §5.3.2.2).
    CharacterNormalized = 4,
    /// Percent-encoding normalization (RFC 3986 §6.2.2.2).
    PercentEncodingNormalized = 5,
    /// Path segment normalization.
    PathSegmentNormalized = 6,
    /// Scheme-based normalization (RFC 3986 §6.2.3).
    SchemeBasedNormalized = 7,
    /// Protocol-based normalization (RFC 3986 §6.2.4); the stage exposed
    /// to external callers as "the" normalized form.
    ProtocolBasedNormalized = 8,
}

impl LadderIndex {
    /// Number of ladder stages.
    pub const COUNT: usize = 9;

    /// All stages, in ladder order.
    pub const ALL: [LadderIndex; LadderIndex::COUNT] = [
        LadderIndex::Raw,
        LadderIndex::UriConverted,
        LadderIndex::IriConverted,
        LadderIndex::CaseNormalized,
        LadderIndex::CharacterNormalized,
        LadderIndex::PercentEncodingNormalized,
        LadderIndex::PathSegmentNormalized,
        LadderIndex::SchemeBasedNormalized,
        LadderIndex::ProtocolBasedNormalized,
    ];

    /// The stage's position in the ladder.
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self as usize
    }

    /// Looks a stage up by position.
    ///
    /// # Failures
    ///
    /// Fails with [`ErrorKind::IndiceUnknown`] when out of range.
    pub fn from_indice(i: usize) -> Result<Self, Error> {
        LadderIndex::ALL.get(i).copied().ok_or_else(|| {
            Error::new(
                ErrorKind::IndiceUnknown,
                format!("ladder indices range over 0..=8, got {}", i),
            )
        })
    }

    /// The stage's conventional name (`RAW`, `URI_CONVERTED`, ...).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            LadderIndex::Raw => "RAW",
            LadderIndex::UriConverted => "URI_CONVERTED",
            LadderIndex::IriConverted => "IRI_CONVERTED",
            LadderIndex::CaseNormalized => "CASE_NORMALIZED",
            LadderIndex::CharacterNormalized => "CHARACTER_NORMALIZED",
            LadderIndex::PercentEncodingNormalized => "PERCENT_ENCODING_NORMALIZED",
            LadderIndex::PathSegmentNormalized => "PATH_SEGMENT_NORMALIZED",
            LadderIndex::SchemeBasedNormalized => "SCHEME_BASED_NORMALIZED",
            LadderIndex::ProtocolBasedNormalized => "PROTOCOL_BASED_NORMALIZED",
        }
    }
}

impl fmt::Display for LadderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LadderIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LadderIndex::ALL
            .iter()
            .copied()
            .find(|idx| idx.name() == s)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::IndiceUnknown,
                    format!("unrecognized ladder stage name {:?}", s),
                )
            })
    }
}

/// The nine per-stage strings produced by one reduction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LadderValue(pub(crate) [String; LadderIndex::COUNT]);

impl LadderValue {
    /// A terminal's contribution: the matched text at every stage.
    pub(crate) fn leaf(text: &str) -> Self {
        let mut value = LadderValue::default();
        for slot in value.0.iter_mut() {
            slot.push_str(text);
        }
        value
    }

    /// The value at one stage.
    pub(crate) fn stage(&self, index: LadderIndex) -> &str {
        &self.0[index.as_usize()]
    }
}

/// Replays a derivation tree through the reduction pipeline, filling the
/// nine records of a parse.
pub(crate) struct Reducer<'a> {
    /// The binding driving criteria lookup and callback tables.
    binding: &'a Binding,
    /// The records under construction, one per stage.
    records: [Record; LadderIndex::COUNT],
}

impl<'a> Reducer<'a> {
    /// Creates a reducer with empty records of the binding's kind.
    pub(crate) fn new(binding: &'a Binding) -> Self {
        let seed = Record::empty(binding.kind(), binding.setup().uri_compat);
        let records = [
            seed.clone(),
            seed.clone(),
            seed.clone(),
            seed.clone(),
            seed.clone(),
            seed.clone(),
            seed.clone(),
            seed.clone(),
            seed,
        ];
        Self { binding, records }
    }

    /// Runs the whole-input pass: the reduction pipeline applied once to
    /// the full input with the empty criteria key, before parsing. The
    /// empty key never occurs during reductions, so by default this is the
    /// identity at every stage; overlays may hook it.
    pub(crate) fn pre_parse(&mut self, input: &str) -> LadderValue {
        self.reduce("", vec![LadderValue::leaf(input)])
    }

    /// Replays a derivation tree bottom-up.
    pub(crate) fn eval(&mut self, node: &Node, grammar: &Grammar) -> LadderValue {
        match node {
            Node::Leaf(text) => LadderValue::leaf(text),
            Node::Inner { sym, children } => {
                let values = children
                    .iter()
                    .map(|child| self.eval(child, grammar))
                    .collect();
                self.reduce(grammar.symbol_name(*sym), values)
            }
        }
    }

    /// The single reduction action: concatenate, normalize, convert, and
    /// assign to the mapped field, if any.
    fn reduce(&mut self, lhs: &str, children: Vec<LadderValue>) -> LadderValue {
        let binding = self.binding;
        let field = binding.mapped_field(lhs);
        let criteria = match field {
            Some(field) => field.name(),
            None => lhs,
        };

        let mut rc = LadderValue::default();
        for (i, slot) in rc.0.iter_mut().enumerate() {
            for child in &children {
                slot.push_str(&child.0[i]);
            }
        }

        let ctx = binding.context();

        // Stage i applies this reduction's normalizers 3..=i to the
        // stage-i concatenation: transforms already present in the
        // children survive, and each stage stays cumulative over the
        // stages before it.
        for i in 3..LadderIndex::COUNT {
            let mut value = core::mem::take(&mut rc.0[i]);
            for normalizer in &binding.normalizers()[..=(i - 3)] {
                value = normalizer.apply(&ctx, criteria, &value, lhs);
            }
            rc.0[i] = value;
        }

        // Converters are independent of the normalizer chain.
        for (i, converter) in binding.converters().iter().enumerate() {
            let value = converter.apply(&ctx, criteria, &rc.0[i + 1], lhs);
            rc.0[i + 1] = value;
        }

        if binding.setup().trace_values {
            log::trace!(
                "reduce {} (criteria {:?}): raw {:?} -> normalized {:?}",
                lhs,
                criteria,
                rc.stage(LadderIndex::Raw),
                rc.stage(LadderIndex::ProtocolBasedNormalized),
            );
        }

        if let Some(field) = field {
            for (record, value) in self.records.iter_mut().zip(rc.0.iter()) {
                record.set(field, value);
            }
        }
        rc
    }

    /// Consumes the reducer, yielding the filled records.
    pub(crate) fn finish(self) -> [Record; LadderIndex::COUNT] {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_names_round_trip() {
        for idx in LadderIndex::ALL {
            assert_eq!(LadderIndex::from_indice(idx.as_usize()).unwrap(), idx);
            assert_eq!(idx.name().parse::<LadderIndex>().unwrap(), idx);
        }
    }

    #[test]
    fn unknown_indices_are_errors() {
        assert_eq!(
            LadderIndex::from_indice(9).unwrap_err().kind(),
            ErrorKind::IndiceUnknown
        );
        assert_eq!(
            "RAWR".parse::<LadderIndex>().unwrap_err().kind(),
            ErrorKind::IndiceUnknown
        );
    }

    #[test]
    fn leaf_contributes_at_every_stage() {
        let value = LadderValue::leaf("ab");
        for idx in LadderIndex::ALL {
            assert_eq!(value.stage(idx), "ab");
        }
    }
}
