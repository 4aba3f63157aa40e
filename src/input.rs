//! Input construction.
//!
//! An identifier is built either from a string taken verbatim, or from a
//! byte sequence plus a declared character encoding. Octet inputs are
//! decoded through `encoding_rs`; whether the decoded text still needs
//! character (NFC) normalization is inferred from the encoding's canonical
//! name unless the caller states it.
//!
//! URI-compat mode additionally pre-cleans string inputs the way legacy
//! URI libraries do: a `<URL:...>` or `<...>` wrapper and surrounding
//! double quotes are stripped, and ASCII whitespace is trimmed.

use encoding_rs::Encoding;
use unicode_normalization::{is_nfc, UnicodeNormalization};

use crate::config::Setup;
use crate::error::{Error, ErrorKind};

/// Canonical names of encodings whose output is character-normalized
/// already (the UCS family).
const UCS_CANONICAL_NAMES: &[&str] = &[
    "UTF-8", "UTF-16", "UTF-16LE", "UTF-16BE", "UTF-32", "UTF-32LE", "UTF-32BE",
];

/// How byte decoding reacts to malformed sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeStrategy {
    /// Malformed input fails the construction.
    #[default]
    FailOnInvalid,
    /// Malformed sequences decode to U+FFFD.
    Replace,
}

/// Construction options: a string, or octets plus an encoding.
///
/// Exactly one of `input` and `octets` must be set; `encoding` is required
/// with `octets`.
///
/// # Examples
///
/// ```
/// use iri_ladder::input::InputOptions;
///
/// let opts = InputOptions {
///     octets: Some(b"http://example.com/".to_vec()),
///     encoding: Some("utf-8".to_owned()),
///     ..InputOptions::default()
/// };
/// # let _ = opts;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    /// String input, taken verbatim.
    pub input: Option<String>,
    /// Byte input, decoded through `encoding`.
    pub octets: Option<Vec<u8>>,
    /// Encoding label for `octets` (WHATWG labels, e.g. `utf-8`,
    /// `iso-8859-1`).
    pub encoding: Option<String>,
    /// Reaction to malformed byte sequences.
    pub decode_strategy: DecodeStrategy,
    /// Whether the decoded text is already character-normalized. Inferred
    /// from the encoding when absent: true exactly for the UCS family.
    pub is_character_normalized: Option<bool>,
}

impl InputOptions {
    /// Resolves the options to the string the engine parses.
    ///
    /// # Failures
    ///
    /// * [`ErrorKind::InputShape`] on an invalid field combination.
    /// * [`ErrorKind::DecodeFailed`] on an unknown encoding label or, with
    ///   the fail-on-invalid strategy, malformed bytes.
    pub(crate) fn resolve(self) -> Result<String, Error> {
        match (self.input, self.octets) {
            (Some(_), Some(_)) => Err(Error::new(
                ErrorKind::InputShape,
                "`input` and `octets` are mutually exclusive",
            )),
            (None, None) => Err(Error::new(
                ErrorKind::InputShape,
                "one of `input` or `octets` is required",
            )),
            (Some(input), None) => Ok(input),
            (None, Some(octets)) => {
                let label = self.encoding.ok_or_else(|| {
                    Error::new(ErrorKind::InputShape, "`octets` requires `encoding`")
                })?;
                decode(&octets, &label, self.decode_strategy, self.is_character_normalized)
            }
        }
    }
}

/// Decodes octets and applies NFC when the text may be unnormalized.
fn decode(
    octets: &[u8],
    label: &str,
    strategy: DecodeStrategy,
    is_character_normalized: Option<bool>,
) -> Result<String, Error> {
    let encoding = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
        Error::new(
            ErrorKind::DecodeFailed,
            format!("unknown encoding label {:?}", label),
        )
    })?;

    let decoded = match strategy {
        DecodeStrategy::FailOnInvalid => encoding
            .decode_without_bom_handling_and_without_replacement(octets)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::DecodeFailed,
                    format!("octets are not valid {}", encoding.name()),
                )
            })?
            .into_owned(),
        DecodeStrategy::Replace => {
            let (text, _, _) = encoding.decode(octets);
            text.into_owned()
        }
    };

    let normalized = is_character_normalized
        .unwrap_or_else(|| UCS_CANONICAL_NAMES.contains(&encoding.name()));
    if normalized || is_nfc(&decoded) {
        Ok(decoded)
    } else {
        Ok(decoded.nfc().collect())
    }
}

/// URI-compat input pre-cleaning; the identity outside compat mode.
pub(crate) fn pre_clean(input: &str, setup: &Setup) -> String {
    if !setup.uri_compat {
        return input.to_owned();
    }
    let mut s = trim_ascii_ws(input);
    if let Some(inner) = s.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        s = trim_ascii_ws(inner.strip_prefix("URL:").unwrap_or(inner));
    }
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s = &s[1..s.len() - 1];
    }
    trim_ascii_ws(s).to_owned()
}

/// Trims ASCII whitespace from both ends.
fn trim_ascii_ws(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace())
}
