//! Normalizer and converter callback tables.
//!
//! Every ladder stage past RAW owns a table mapping a *criteria key* (the
//! mapped field name of a reduction, or its bare LHS symbol) to a callback.
//! Lookups fall through to identity, so a stage only acts where a table
//! entry exists. Overlays extend the built-in tables by inserting or
//! wrapping entries; they never replace a table wholesale.
//!
//! The percent-decoding and IDN callbacks are tolerant by policy: on any
//! failure they log and keep the original value, because partially
//! normalizing a malformed identifier would corrupt it further.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::config::Setup;
use crate::percent_encoding::unescape;
use crate::record::Kind;

/// A normalizer or converter callback.
///
/// Arguments are the reduction context, the criteria key, the current
/// value, and the reducing LHS symbol; the return value replaces the
/// current value. Callbacks must be total.
pub type Callback = Arc<dyn Fn(&Context<'_>, &str, &str, &str) -> String + Send + Sync>;

/// Reduction context handed to every callback.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Name of the binding (scheme name, or `generic` / `common`).
    pub whoami: &'a str,
    /// Identifier kind of the binding.
    pub kind: Kind,
    /// Default port of the scheme, when the overlay declares one.
    pub default_port: Option<u16>,
    /// Whether the scheme is inherently secured.
    pub secure: bool,
    /// Whether `reg_name` values are domain names (enables IDN handling).
    pub reg_name_is_domain_name: bool,
    /// Single-code-point predicate for unreserved characters.
    pub unreserved: &'a Regex,
    /// Single-code-point predicate for reserved characters.
    pub reserved: &'a Regex,
    /// Configuration snapshot of the binding.
    pub setup: &'a Setup,
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("whoami", &self.whoami)
            .field("kind", &self.kind)
            .field("default_port", &self.default_port)
            .field("secure", &self.secure)
            .field("reg_name_is_domain_name", &self.reg_name_is_domain_name)
            .finish()
    }
}

/// Criteria-keyed callback table of one ladder stage.
#[derive(Clone, Default)]
pub struct CallbackTable {
    /// Criteria key to callback.
    entries: HashMap<String, Callback>,
}

impl CallbackTable {
    /// Installs (or overrides) the callback for a criteria key.
    pub fn insert(&mut self, criteria: impl Into<String>, callback: Callback) {
        self.entries.insert(criteria.into(), callback);
    }

    /// Returns the callback for a criteria key, when installed.
    ///
    /// Overlays use this to wrap an existing entry: fetch, capture, and
    /// [`insert`][`Self::insert`] a callback that delegates to it.
    #[must_use]
    pub fn get(&self, criteria: &str) -> Option<Callback> {
        self.entries.get(criteria).cloned()
    }

    /// Applies the stage to a value, falling through to identity when the
    /// criteria key owns no entry.
    #[must_use]
    pub fn apply(&self, ctx: &Context<'_>, criteria: &str, value: &str, lhs: &str) -> String {
        match self.entries.get(criteria) {
            Some(callback) => callback(ctx, criteria, value, lhs),
            None => value.to_owned(),
        }
    }
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_tuple("CallbackTable").field(&keys).finish()
    }
}

/// Number of normalizer stages (ladder indices 3 through 8).
pub(crate) const NORMALIZER_STAGES: usize = 6;

/// Number of converter stages (ladder indices 1 and 2).
pub(crate) const CONVERTER_STAGES: usize = 2;

/// Builds the built-in normalizer tables for a kind.
///
/// Order matches ladder indices 3..=8: case, character, percent-encoding,
/// path-segment, scheme-based, protocol-based. The common kind installs
/// only the percent-case rule; the generic kind gets the full RFC 3986 /
/// RFC 3987 defaults. Character, path-segment and protocol-based stages
/// stay identity until an overlay extends them.
pub(crate) fn builtin_normalizers(
    kind: Kind,
    pct_symbol: Option<&str>,
) -> [CallbackTable; NORMALIZER_STAGES] {
    let mut case = CallbackTable::default();
    let character = CallbackTable::default();
    let mut pct = CallbackTable::default();
    let path_segment = CallbackTable::default();
    let mut scheme_based = CallbackTable::default();
    let protocol_based = CallbackTable::default();

    if let Some(sym) = pct_symbol {
        case.insert(sym, Arc::new(|_: &Context<'_>, _: &str, v: &str, _: &str| uppercase_pct(v)));
    }

    if kind == Kind::Generic {
        case.insert(
            "scheme",
            Arc::new(|_: &Context<'_>, _: &str, v: &str, _: &str| v.to_ascii_lowercase()),
        );
        case.insert(
            "host",
            Arc::new(|_: &Context<'_>, _: &str, v: &str, _: &str| lowercase_ascii_host(v)),
        );
        if let Some(sym) = pct_symbol {
            pct.insert(
                sym,
                Arc::new(|ctx: &Context<'_>, _: &str, v: &str, _: &str| {
                    unescape(v, ctx.unreserved)
                }),
            );
        }
        scheme_based.insert(
            "path",
            Arc::new(|_: &Context<'_>, _: &str, v: &str, _: &str| {
                if v.is_empty() {
                    "/".to_owned()
                } else {
                    v.to_owned()
                }
            }),
        );
        scheme_based.insert(
            "authority",
            Arc::new(|ctx: &Context<'_>, _: &str, v: &str, _: &str| {
                strip_default_port(v, ctx.default_port)
            }),
        );
    }

    [case, character, pct, path_segment, scheme_based, protocol_based]
}

/// Builds the built-in converter tables for a kind.
///
/// Order matches ladder indices 1..=2: URI-converted, IRI-converted. Both
/// transform `reg_name` through IDN ToASCII when the overlay declares the
/// reg-name to be a domain name, and are identity elsewhere.
pub(crate) fn builtin_converters(kind: Kind) -> [CallbackTable; CONVERTER_STAGES] {
    let mut uri = CallbackTable::default();
    let mut iri = CallbackTable::default();
    if kind == Kind::Generic {
        let to_ascii: Callback =
            Arc::new(|ctx: &Context<'_>, _: &str, v: &str, _: &str| domain_to_ascii(ctx, v));
        uri.insert("reg_name", to_ascii.clone());
        iri.insert("reg_name", to_ascii);
    }
    [uri, iri]
}

/// Uppercases the hexadecimal digits of `%HH` triplets.
fn uppercase_pct(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_triplet = 0_u8;
    for c in value.chars() {
        if in_triplet > 0 {
            in_triplet -= 1;
            out.push(c.to_ascii_uppercase());
        } else if c == '%' {
            in_triplet = 2;
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

/// Lowercases a host when it is pure US-ASCII, keeping percent triplet
/// digits uppercase. Non-ASCII hosts come back unchanged.
fn lowercase_ascii_host(value: &str) -> String {
    if !value.is_ascii() {
        return value.to_owned();
    }
    let mut out = String::with_capacity(value.len());
    let mut in_triplet = 0_u8;
    for c in value.chars() {
        if in_triplet > 0 {
            in_triplet -= 1;
            out.push(c.to_ascii_uppercase());
        } else if c == '%' {
            in_triplet = 2;
            out.push(c);
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}

/// Strips a trailing `:<default_port>`, or a bare trailing `:` (empty
/// port), from an authority.
fn strip_default_port(value: &str, default_port: Option<u16>) -> String {
    if let Some(port) = default_port {
        if let Some(stripped) = value.strip_suffix(&format!(":{}", port)) {
            return stripped.to_owned();
        }
    }
    if let Some(stripped) = value.strip_suffix(':') {
        return stripped.to_owned();
    }
    value.to_owned()
}

/// IDN ToASCII for domain-name reg-names; identity for everything else.
///
/// Failures keep the original value: a reg-name that does not map cleanly
/// must not be corrupted by the conversion stage.
fn domain_to_ascii(ctx: &Context<'_>, value: &str) -> String {
    if !ctx.reg_name_is_domain_name || value.is_ascii() {
        return value.to_owned();
    }
    match idna::Config::default()
        .use_std3_ascii_rules(true)
        .to_ascii(value)
    {
        Ok(ascii) => ascii,
        Err(errors) => {
            log::warn!(
                "IDN conversion of {:?} failed ({:?}); keeping the original",
                value,
                errors
            );
            value.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static UNRESERVED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\A[A-Za-z0-9\-._~]\z").expect("valid regex"));
    static RESERVED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\A[:/?#\[\]@!$&'()*+,;=]\z").expect("valid regex"));

    fn ctx<'a>(setup: &'a Setup, default_port: Option<u16>) -> Context<'a> {
        Context {
            whoami: "test",
            kind: Kind::Generic,
            default_port,
            secure: false,
            reg_name_is_domain_name: true,
            unreserved: &UNRESERVED,
            reserved: &RESERVED,
            setup,
        }
    }

    #[test]
    fn identity_fall_through() {
        let table = CallbackTable::default();
        let setup = Setup::default();
        let c = ctx(&setup, None);
        assert_eq!(table.apply(&c, "nothing", "value", "<x>"), "value");
    }

    #[test]
    fn pct_case_is_uppercased() {
        assert_eq!(uppercase_pct("%7e%ce%B1"), "%7E%CE%B1");
    }

    #[test]
    fn ascii_host_is_lowercased_with_pct_kept_upper() {
        assert_eq!(lowercase_ascii_host("Example.COM"), "example.com");
        assert_eq!(lowercase_ascii_host("Ex%4Dple"), "ex%4Dple");
        assert_eq!(lowercase_ascii_host("Ex%4dple"), "ex%4Dple");
        assert_eq!(lowercase_ascii_host("\u{3B1}.example"), "\u{3B1}.example");
    }

    #[test]
    fn default_port_stripping() {
        assert_eq!(strip_default_port("example.com:80", Some(80)), "example.com");
        assert_eq!(strip_default_port("example.com:8080", Some(80)), "example.com:8080");
        assert_eq!(strip_default_port("example.com:", Some(80)), "example.com");
        assert_eq!(strip_default_port("example.com:", None), "example.com");
        assert_eq!(strip_default_port("example.com:80", None), "example.com:80");
        assert_eq!(strip_default_port("[2001:db8::1]", Some(80)), "[2001:db8::1]");
    }

    #[test]
    fn generic_defaults_cover_expected_criteria() {
        let normalizers = builtin_normalizers(Kind::Generic, Some("<pct encoded>"));
        let setup = Setup::default();
        let c = ctx(&setup, Some(80));
        // case
        assert_eq!(normalizers[0].apply(&c, "scheme", "HTTP", "<scheme>"), "http");
        assert_eq!(normalizers[0].apply(&c, "<pct encoded>", "%7e", "<pct encoded>"), "%7E");
        // percent-encoding
        assert_eq!(
            normalizers[2].apply(&c, "<pct encoded>", "%7E", "<pct encoded>"),
            "~"
        );
        // scheme-based
        assert_eq!(normalizers[4].apply(&c, "path", "", "<path empty>"), "/");
        assert_eq!(
            normalizers[4].apply(&c, "authority", "example.com:80", "<authority>"),
            "example.com"
        );
    }

    #[test]
    fn common_defaults_keep_everything_else_identity() {
        let normalizers = builtin_normalizers(Kind::Common, Some("<pct encoded>"));
        let setup = Setup::default();
        let c = ctx(&setup, None);
        assert_eq!(normalizers[0].apply(&c, "scheme", "HTTP", "<scheme>"), "HTTP");
        assert_eq!(normalizers[0].apply(&c, "<pct encoded>", "%7e", "<pct encoded>"), "%7E");
        assert_eq!(normalizers[4].apply(&c, "path", "", "<path>"), "");
    }

    #[test]
    fn idn_conversion_is_tolerant() {
        let setup = Setup::default();
        let c = ctx(&setup, None);
        assert_eq!(domain_to_ascii(&c, "example.com"), "example.com");
        let converted = domain_to_ascii(&c, "\u{4F8B}\u{3048}.jp");
        assert!(converted.starts_with("xn--"), "got {:?}", converted);
    }
}
