//! Parameterization: binding a grammar to a record kind.
//!
//! A [`Descriptor`] names everything that makes an identifier kind
//! concrete: the BNF text, the symbol-to-field mapping, the reserved and
//! unreserved predicates, and the percent-encoding symbol. [`Binding::bind`]
//! validates the descriptor, compiles the grammar, installs the built-in
//! callback tables for the kind, lets the overlay extend them, and yields
//! the engine the ladder runs on.
//!
//! The built-in descriptors are [`Descriptor::generic`] (RFC 3986 / RFC
//! 3987 merged grammar) and [`Descriptor::common`] (the permissive
//! `scheme:opaque#fragment` fallback). Their bindings are compiled once
//! and shared behind [`Binding::generic`] / [`Binding::common`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Setup;
use crate::error::{Error, ErrorKind};
use crate::grammar::Grammar;
use crate::ladder::{LadderIndex, Reducer};
use crate::normalize::{
    builtin_converters, builtin_normalizers, CallbackTable, Context, CONVERTER_STAGES,
    NORMALIZER_STAGES,
};
use crate::record::{Field, Kind, Record};
use crate::scheme::{GenericOverlay, Overlay};

/// Merged RFC 3986 / RFC 3987 reference grammar (IRI flavor).
///
/// `<ipv4 address>` outranks `<reg name>` so dotted-quad hosts decompose
/// deterministically; everything else is unambiguous by construction. A
/// bare `%` is not part of the language: percent triplets are syntax.
const GENERIC_BNF: &str = r#"
# RFC 3986 / RFC 3987 URI and IRI references.
<uri reference>      ::= <uri> | <relative ref>

<uri>                ::= <scheme> ':' <opaque> <fragment part>
<relative ref>       ::= <relative opaque> <fragment part>
<opaque>             ::= <hier part> <query part>
<relative opaque>    ::= <relative part> <query part>

<query part>         ::=
<query part>         ::= '?' <query>
<fragment part>      ::=
<fragment part>      ::= '#' <fragment>

<hier part>          ::= '//' <authority> <path abempty>
<hier part>          ::= <path absolute>
<hier part>          ::= <path rootless>
<hier part>          ::= <path empty>

<relative part>      ::= '//' <authority> <path abempty>
<relative part>      ::= <path absolute>
<relative part>      ::= <path noscheme>
<relative part>      ::= <path empty>

<scheme>             ::= <alpha> <scheme char>*
<scheme char>        ::= [A-Za-z0-9+.\-]

<authority>          ::= <userinfo part> <host> <port part>
<userinfo part>      ::=
<userinfo part>      ::= <userinfo> '@'
<port part>          ::=
<port part>          ::= ':' <port>

<userinfo>           ::= <userinfo char>*
<userinfo char>      ::= <iunreserved> | <pct encoded> | <sub delims> | ':'

<host>               ::= <ip literal> | <ipv4 address> rank => 1 | <reg name>
<port>               ::= <digit>*

<ip literal>         ::= '[' <ipv6 address> ']' | '[' <ipv6 addrz> ']' | '[' <ipvfuture> ']'

<ipvfuture>          ::= [vV] <hexdig>+ '.' <ipvfuture char>+
<ipvfuture char>     ::= <unreserved> | <sub delims> | ':'

<ipv6 addrz>         ::= <ipv6 address> '%25' <zoneid>
<zoneid>             ::= <zoneid char>+
<zoneid char>        ::= <unreserved> | <pct encoded>

<ipv6 address>       ::= <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16 colon> <ls32>
<ipv6 address>       ::= '::' <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16 colon> <ls32>
<ipv6 address>       ::= '::' <h16 colon> <h16 colon> <h16 colon> <h16 colon> <ls32>
<ipv6 address>       ::= <ipv6 head 1> '::' <h16 colon> <h16 colon> <h16 colon> <h16 colon> <ls32>
<ipv6 address>       ::= '::' <h16 colon> <h16 colon> <h16 colon> <ls32>
<ipv6 address>       ::= <ipv6 head 2> '::' <h16 colon> <h16 colon> <h16 colon> <ls32>
<ipv6 address>       ::= '::' <h16 colon> <h16 colon> <ls32>
<ipv6 address>       ::= <ipv6 head 3> '::' <h16 colon> <h16 colon> <ls32>
<ipv6 address>       ::= '::' <h16 colon> <ls32>
<ipv6 address>       ::= <ipv6 head 4> '::' <h16 colon> <ls32>
<ipv6 address>       ::= '::' <ls32>
<ipv6 address>       ::= <ipv6 head 5> '::' <ls32>
<ipv6 address>       ::= '::' <h16>
<ipv6 address>       ::= <ipv6 head 6> '::' <h16>
<ipv6 address>       ::= '::'
<ipv6 address>       ::= <ipv6 head 7> '::'

<ipv6 head 1>        ::= <h16>
<ipv6 head 2>        ::= <ipv6 head 1> | <h16 colon> <h16>
<ipv6 head 3>        ::= <ipv6 head 2> | <h16 colon> <h16 colon> <h16>
<ipv6 head 4>        ::= <ipv6 head 3> | <h16 colon> <h16 colon> <h16 colon> <h16>
<ipv6 head 5>        ::= <ipv6 head 4> | <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16>
<ipv6 head 6>        ::= <ipv6 head 5> | <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16>
<ipv6 head 7>        ::= <ipv6 head 6> | <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16 colon> <h16>

<h16 colon>          ::= <h16> ':'
<h16>                ::= <hexdig> | <hexdig> <hexdig> | <hexdig> <hexdig> <hexdig> | <hexdig> <hexdig> <hexdig> <hexdig>
<ls32>               ::= <h16> ':' <h16> | <ipv4 address>

<ipv4 address>       ::= <dec octet> '.' <dec octet> '.' <dec octet> '.' <dec octet>
<dec octet>          ::= <digit>
<dec octet>          ::= [1-9] <digit>
<dec octet>          ::= '1' <digit> <digit>
<dec octet>          ::= '2' [0-4] <digit>
<dec octet>          ::= '25' [0-5]

<reg name>           ::= <reg name char>*
<reg name char>      ::= <iunreserved> | <pct encoded> | <sub delims>

<path abempty>       ::= <slash segment>*
<slash segment>      ::= '/' <segment>
<path absolute>      ::= '/'
<path absolute>      ::= '/' <segment nz> <slash segment>*
<path rootless>      ::= <segment nz> <slash segment>*
<path noscheme>      ::= <segment nz nc> <slash segment>*
<path empty>         ::=

<segment>            ::= <pchar>*
<segment nz>         ::= <pchar>+
<segment nz nc>      ::= <segment nz nc char>+
<segment nz nc char> ::= <iunreserved> | <pct encoded> | <sub delims> | '@'
<pchar>              ::= <iunreserved> | <pct encoded> | <sub delims> | ':' | '@'

<query>              ::= <query char>*
<query char>         ::= <pchar> | <iprivate> | '/' | '?'
<fragment>           ::= <fragment char>*
<fragment char>      ::= <pchar> | '/' | '?'

<pct encoded>        ::= '%' <hexdig> <hexdig>

<alpha>              ::= [A-Za-z]
<digit>              ::= [0-9]
<hexdig>             ::= [0-9A-Fa-f]
<sub delims>         ::= [!$&'()*+,;=]
<unreserved>         ::= [A-Za-z0-9\-._~]
<iunreserved>        ::= [A-Za-z0-9\-._~] | <ucschar>
<ucschar>            ::= [\x{A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}\x{10000}-\x{1FFFD}\x{20000}-\x{2FFFD}\x{30000}-\x{3FFFD}\x{40000}-\x{4FFFD}\x{50000}-\x{5FFFD}\x{60000}-\x{6FFFD}\x{70000}-\x{7FFFD}\x{80000}-\x{8FFFD}\x{90000}-\x{9FFFD}\x{A0000}-\x{AFFFD}\x{B0000}-\x{BFFFD}\x{C0000}-\x{CFFFD}\x{D0000}-\x{DFFFD}\x{E1000}-\x{EFFFD}]
<iprivate>           ::= [\x{E000}-\x{F8FF}\x{F0000}-\x{FFFFD}\x{100000}-\x{10FFFD}]
"#;

/// Permissive fallback grammar: `scheme ':' opaque '#' fragment` with both
/// the scheme and the fragment optional.
///
/// The scheme alternative outranks the scheme-less one so `a:b` keeps its
/// scheme. The opaque part excludes `#` and requires well-formed percent
/// triplets; the fragment takes everything after the first `#`.
const COMMON_BNF: &str = r#"
<common reference> ::= <scheme> ':' <opaque> <fragment part> rank => 1
<common reference> ::= <opaque> <fragment part>
<fragment part>    ::=
<fragment part>    ::= '#' <fragment>
<scheme>           ::= <alpha> <scheme char>*
<scheme char>      ::= [A-Za-z0-9+.\-]
<opaque>           ::= <opaque unit>*
<opaque unit>      ::= <opaque char> | <pct encoded>
<opaque char>      ::= [^#%]
<fragment>         ::= <any char>*
<any char>         ::= [\x{0}-\x{10FFFF}]
<pct encoded>      ::= '%' <hexdig> <hexdig>
<alpha>            ::= [A-Za-z]
<hexdig>           ::= [0-9A-Fa-f]
"#;

/// Unreserved predicate of the IRI flavor (`iunreserved`), one code point.
const IUNRESERVED_RE: &str = "\\A[A-Za-z0-9\\-._~\\x{A0}-\\x{D7FF}\\x{F900}-\\x{FDCF}\\x{FDF0}-\\x{FFEF}\\x{10000}-\\x{1FFFD}\\x{20000}-\\x{2FFFD}\\x{30000}-\\x{3FFFD}\\x{40000}-\\x{4FFFD}\\x{50000}-\\x{5FFFD}\\x{60000}-\\x{6FFFD}\\x{70000}-\\x{7FFFD}\\x{80000}-\\x{8FFFD}\\x{90000}-\\x{9FFFD}\\x{A0000}-\\x{AFFFD}\\x{B0000}-\\x{BFFFD}\\x{C0000}-\\x{CFFFD}\\x{D0000}-\\x{DFFFD}\\x{E1000}-\\x{EFFFD}]\\z";

/// Unreserved predicate of the URI flavor, one code point.
const UNRESERVED_RE: &str = r"\A[A-Za-z0-9\-._~]\z";

/// Reserved predicate (gen-delims plus sub-delims), one code point.
const RESERVED_RE: &str = r"\A[:/?#\[\]@!$&'()*+,;=]\z";

/// Everything that makes an identifier kind concrete.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// Name of the bound kind: a scheme name, or `generic` / `common`.
    pub whoami: String,
    /// Record kind the grammar populates.
    pub kind: Kind,
    /// Grammar text; the first rule's left-hand side is the start symbol.
    pub bnf: Cow<'static, str>,
    /// Single-code-point predicate for reserved characters.
    pub reserved: Regex,
    /// Single-code-point predicate for unreserved characters.
    pub unreserved: Regex,
    /// Grammar symbol matching `%HH` triplets, when the grammar has one.
    pub pct_encoded: Option<String>,
    /// Grammar symbol to record field mapping.
    pub mapping: HashMap<String, Field>,
}

impl Descriptor {
    /// The built-in generic descriptor.
    #[must_use]
    pub fn generic() -> Self {
        let mapping = [
            ("<uri reference>", Field::Output),
            ("<scheme>", Field::Scheme),
            ("<opaque>", Field::Opaque),
            ("<relative opaque>", Field::Opaque),
            ("<fragment>", Field::Fragment),
            ("<hier part>", Field::HierPart),
            ("<query>", Field::Query),
            ("<segment>", Field::Segment),
            ("<segment nz>", Field::Segment),
            ("<segment nz nc>", Field::Segment),
            ("<authority>", Field::Authority),
            ("<path abempty>", Field::Path),
            ("<path absolute>", Field::Path),
            ("<path rootless>", Field::Path),
            ("<path noscheme>", Field::Path),
            ("<path empty>", Field::Path),
            ("<relative ref>", Field::RelativeRef),
            ("<relative part>", Field::RelativePart),
            ("<userinfo>", Field::Userinfo),
            ("<host>", Field::Host),
            ("<port>", Field::Port),
            ("<ip literal>", Field::IpLiteral),
            ("<ipv4 address>", Field::Ipv4Address),
            ("<reg name>", Field::RegName),
            ("<ipv6 address>", Field::Ipv6Address),
            ("<ipv6 addrz>", Field::Ipv6Addrz),
            ("<ipvfuture>", Field::Ipvfuture),
            ("<zoneid>", Field::Zoneid),
        ]
        .into_iter()
        .map(|(sym, field)| (sym.to_owned(), field))
        .collect();

        Self {
            whoami: "generic".to_owned(),
            kind: Kind::Generic,
            bnf: Cow::Borrowed(GENERIC_BNF),
            reserved: Regex::new(RESERVED_RE).expect("valid reserved regex"),
            unreserved: Regex::new(IUNRESERVED_RE).expect("valid unreserved regex"),
            pct_encoded: Some("<pct encoded>".to_owned()),
            mapping,
        }
    }

    /// The built-in common descriptor.
    #[must_use]
    pub fn common() -> Self {
        let mapping = [
            ("<common reference>", Field::Output),
            ("<scheme>", Field::Scheme),
            ("<opaque>", Field::Opaque),
            ("<fragment>", Field::Fragment),
        ]
        .into_iter()
        .map(|(sym, field)| (sym.to_owned(), field))
        .collect();

        Self {
            whoami: "common".to_owned(),
            kind: Kind::Common,
            bnf: Cow::Borrowed(COMMON_BNF),
            reserved: Regex::new(RESERVED_RE).expect("valid reserved regex"),
            unreserved: Regex::new(UNRESERVED_RE).expect("valid unreserved regex"),
            pct_encoded: Some("<pct encoded>".to_owned()),
            mapping,
        }
    }

    /// Renames the descriptor, typically to a scheme name.
    #[must_use]
    pub fn with_whoami(mut self, whoami: &str) -> Self {
        self.whoami = whoami.to_owned();
        self
    }
}

/// A bound identifier kind: compiled grammar plus callback tables.
pub struct Binding {
    /// The descriptor this binding was made from.
    descriptor: Descriptor,
    /// Compiled grammar (compiled once per binding).
    grammar: Grammar,
    /// Normalizer tables for ladder stages 3..=8.
    normalizers: [CallbackTable; NORMALIZER_STAGES],
    /// Converter tables for ladder stages 1..=2.
    converters: [CallbackTable; CONVERTER_STAGES],
    /// The overlay the binding was composed with.
    overlay: Arc<dyn Overlay>,
    /// Configuration snapshot captured at bind time.
    setup: Setup,
}

impl core::fmt::Debug for Binding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Binding")
            .field("whoami", &self.descriptor.whoami)
            .field("kind", &self.descriptor.kind)
            .field("overlay", &self.overlay.name())
            .finish()
    }
}

/// The shared generic binding.
static GENERIC_BINDING: Lazy<Arc<Binding>> = Lazy::new(|| {
    Binding::bind(Descriptor::generic(), Arc::new(GenericOverlay))
        .expect("built-in generic descriptor must bind")
});

/// The shared common binding.
static COMMON_BINDING: Lazy<Arc<Binding>> = Lazy::new(|| {
    Binding::bind(Descriptor::common(), Arc::new(GenericOverlay))
        .expect("built-in common descriptor must bind")
});

impl Binding {
    /// Binds a descriptor with an overlay, using the global setup.
    ///
    /// # Failures
    ///
    /// Fails with [`ErrorKind::BindingInvalid`] when the mapping uses
    /// malformed symbol keys, targets fields unknown to the kind, leaves
    /// fields unmapped, or the grammar text does not compile.
    pub fn bind(descriptor: Descriptor, overlay: Arc<dyn Overlay>) -> Result<Arc<Self>, Error> {
        Binding::bind_with_setup(descriptor, overlay, Setup::global().clone())
    }

    /// Binds a descriptor with an explicit setup snapshot.
    pub fn bind_with_setup(
        descriptor: Descriptor,
        overlay: Arc<dyn Overlay>,
        setup: Setup,
    ) -> Result<Arc<Self>, Error> {
        validate_mapping(&descriptor)?;
        let grammar = Grammar::compile(&descriptor.bnf)?;
        for symbol in descriptor.mapping.keys() {
            if !grammar.has_symbol(symbol) {
                log::debug!(
                    "binding {:?}: mapped symbol {} does not occur in the grammar",
                    descriptor.whoami,
                    symbol
                );
            }
        }

        let mut normalizers =
            builtin_normalizers(descriptor.kind, descriptor.pct_encoded.as_deref());
        let mut converters = builtin_converters(descriptor.kind);
        overlay.build_case_normalizer(&mut normalizers[0]);
        overlay.build_character_normalizer(&mut normalizers[1]);
        overlay.build_percent_encoding_normalizer(&mut normalizers[2]);
        overlay.build_path_segment_normalizer(&mut normalizers[3]);
        overlay.build_scheme_based_normalizer(&mut normalizers[4]);
        overlay.build_protocol_based_normalizer(&mut normalizers[5]);
        overlay.build_uri_converter(&mut converters[0]);
        overlay.build_iri_converter(&mut converters[1]);

        log::debug!(
            "bound {:?} ({:?} kind) with overlay {:?}",
            descriptor.whoami,
            descriptor.kind,
            overlay.name()
        );

        Ok(Arc::new(Self {
            descriptor,
            grammar,
            normalizers,
            converters,
            overlay,
            setup,
        }))
    }

    /// The shared built-in generic binding.
    #[must_use]
    pub fn generic() -> Arc<Binding> {
        Arc::clone(&GENERIC_BINDING)
    }

    /// The shared built-in common binding.
    #[must_use]
    pub fn common() -> Arc<Binding> {
        Arc::clone(&COMMON_BINDING)
    }

    /// Name of the binding.
    #[must_use]
    pub fn whoami(&self) -> &str {
        &self.descriptor.whoami
    }

    /// Record kind the binding populates.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.descriptor.kind
    }

    /// Default port declared by the overlay.
    #[must_use]
    pub fn default_port(&self) -> Option<u16> {
        self.overlay.default_port()
    }

    /// Whether the overlay declares the scheme inherently secured.
    #[must_use]
    pub fn secure(&self) -> bool {
        self.overlay.secure()
    }

    /// Configuration snapshot of the binding.
    #[must_use]
    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    /// Field mapped to a grammar symbol, if any.
    pub(crate) fn mapped_field(&self, symbol: &str) -> Option<Field> {
        self.descriptor.mapping.get(symbol).copied()
    }

    /// Normalizer tables, in ladder-stage order (3..=8).
    pub(crate) fn normalizers(&self) -> &[CallbackTable; NORMALIZER_STAGES] {
        &self.normalizers
    }

    /// Converter tables, in ladder-stage order (1..=2).
    pub(crate) fn converters(&self) -> &[CallbackTable; CONVERTER_STAGES] {
        &self.converters
    }

    /// The reduction context of this binding.
    pub(crate) fn context(&self) -> Context<'_> {
        Context {
            whoami: &self.descriptor.whoami,
            kind: self.descriptor.kind,
            default_port: self.overlay.default_port(),
            secure: self.overlay.secure(),
            reg_name_is_domain_name: self.overlay.reg_name_is_domain_name(),
            unreserved: &self.descriptor.unreserved,
            reserved: &self.descriptor.reserved,
            setup: &self.setup,
        }
    }

    /// Parses an input into the nine-record snapshot.
    ///
    /// Runs the whole-input pass, feeds its character-normalized value to
    /// the grammar, and replays the derivation tree through the ladder.
    pub(crate) fn parse_snapshot(&self, input: &str) -> Result<[Record; LadderIndex::COUNT], Error> {
        let mut reducer = Reducer::new(self);
        let pre = reducer.pre_parse(input);
        let grammar_input = pre.stage(LadderIndex::CharacterNormalized).to_owned();
        let tree = self.grammar.parse(&grammar_input, &self.setup)?;
        reducer.eval(&tree, &self.grammar);
        Ok(reducer.finish())
    }
}

/// Binding-time mapping checks.
fn validate_mapping(descriptor: &Descriptor) -> Result<(), Error> {
    for (symbol, field) in &descriptor.mapping {
        let well_formed = symbol.len() > 2
            && symbol.starts_with('<')
            && symbol.ends_with('>')
            && !symbol[1..symbol.len() - 1].contains(|c: char| c == '<' || c == '>');
        if !well_formed {
            return Err(Error::new(
                ErrorKind::BindingInvalid,
                format!("mapping key {:?} is not of the form <name>", symbol),
            ));
        }
        if !field.is_known_for(descriptor.kind) {
            return Err(Error::new(
                ErrorKind::BindingInvalid,
                format!(
                    "field {:?} is not declared by the {:?} kind",
                    field.name(),
                    descriptor.kind
                ),
            ));
        }
    }

    let mapped: Vec<Field> = descriptor.mapping.values().copied().collect();
    for field in Field::all_for(descriptor.kind) {
        // A `segment` mapping covers `segments` too: assigning the scalar
        // appends to the list.
        let covered = mapped.contains(field)
            || (*field == Field::Segments && mapped.contains(&Field::Segment));
        if !covered {
            return Err(Error::new(
                ErrorKind::BindingInvalid,
                format!("field {:?} is left unmapped", field.name()),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_descriptors_bind() {
        let generic = Binding::generic();
        assert_eq!(generic.kind(), Kind::Generic);
        assert_eq!(generic.whoami(), "generic");
        let common = Binding::common();
        assert_eq!(common.kind(), Kind::Common);
    }

    #[test]
    fn malformed_symbol_key_is_rejected() {
        let mut descriptor = Descriptor::common();
        descriptor
            .mapping
            .insert("scheme".to_owned(), Field::Scheme);
        let err = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::BindingInvalid);
    }

    #[test]
    fn unknown_field_for_kind_is_rejected() {
        let mut descriptor = Descriptor::common();
        descriptor
            .mapping
            .insert("<host>".to_owned(), Field::Host);
        let err = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::BindingInvalid);
    }

    #[test]
    fn unmapped_field_is_rejected() {
        let mut descriptor = Descriptor::common();
        descriptor.mapping.remove("<fragment>");
        let err = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::BindingInvalid);
    }

    #[test]
    fn generic_snapshot_decomposes_components() {
        let binding = Binding::generic();
        let records = binding
            .parse_snapshot("http://user@example.com:8042/over/there?name=ferret#nose")
            .expect("parses");
        let raw = records[0].as_generic().expect("generic record");
        assert_eq!(raw.scheme.as_deref(), Some("http"));
        assert_eq!(raw.authority.as_deref(), Some("user@example.com:8042"));
        assert_eq!(raw.userinfo.as_deref(), Some("user"));
        assert_eq!(raw.host.as_deref(), Some("example.com"));
        assert_eq!(raw.reg_name.as_deref(), Some("example.com"));
        assert_eq!(raw.port.as_deref(), Some("8042"));
        assert_eq!(raw.path.as_deref(), Some("/over/there"));
        assert_eq!(raw.query.as_deref(), Some("name=ferret"));
        assert_eq!(raw.fragment.as_deref(), Some("nose"));
        assert_eq!(raw.hier_part.as_deref(), Some("//user@example.com:8042/over/there"));
        assert_eq!(raw.opaque, "//user@example.com:8042/over/there?name=ferret");
        assert_eq!(raw.segments, vec!["over".to_owned(), "there".to_owned()]);
        assert_eq!(raw.output, "http://user@example.com:8042/over/there?name=ferret#nose");
    }

    #[test]
    fn ipv4_hosts_prefer_the_address_rule() {
        let binding = Binding::generic();
        let records = binding
            .parse_snapshot("http://192.0.2.16:80/")
            .expect("parses");
        let raw = records[0].as_generic().expect("generic record");
        assert_eq!(raw.host.as_deref(), Some("192.0.2.16"));
        assert_eq!(raw.ipv4_address.as_deref(), Some("192.0.2.16"));
        assert_eq!(raw.reg_name, None);
    }

    #[test]
    fn ipv6_and_zone_ids_decompose() {
        let binding = Binding::generic();
        let records = binding
            .parse_snapshot("ldap://[2001:db8::7]/c=GB?objectClass?one")
            .expect("parses");
        let raw = records[0].as_generic().expect("generic record");
        assert_eq!(raw.ip_literal.as_deref(), Some("[2001:db8::7]"));
        assert_eq!(raw.ipv6_address.as_deref(), Some("2001:db8::7"));
        assert_eq!(raw.query.as_deref(), Some("objectClass?one"));

        let records = binding
            .parse_snapshot("http://[fe80::a%25en1]")
            .expect("parses");
        let raw = records[0].as_generic().expect("generic record");
        assert_eq!(raw.ipv6_addrz.as_deref(), Some("fe80::a%25en1"));
        assert_eq!(raw.zoneid.as_deref(), Some("en1"));
    }

    #[test]
    fn common_snapshot_decomposes() {
        let binding = Binding::common();
        let records = binding
            .parse_snapshot("mailto:user@example.com#frag")
            .expect("parses");
        let raw = records[0].as_common().expect("common record");
        assert_eq!(raw.scheme.as_deref(), Some("mailto"));
        assert_eq!(raw.opaque, "user@example.com");
        assert_eq!(raw.fragment.as_deref(), Some("frag"));
    }

    #[test]
    fn relative_references_populate_relative_fields() {
        let binding = Binding::generic();
        let records = binding.parse_snapshot("../g?q#f").expect("parses");
        let raw = records[0].as_generic().expect("generic record");
        assert_eq!(raw.scheme, None);
        assert_eq!(raw.relative_ref.as_deref(), Some("../g?q#f"));
        assert_eq!(raw.relative_part.as_deref(), Some("../g"));
        assert_eq!(raw.path.as_deref(), Some("../g"));
        assert_eq!(raw.query.as_deref(), Some("q"));
        assert_eq!(raw.opaque, "../g?q");
    }
}
