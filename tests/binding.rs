//! Tests for parameterization, overlays, and input construction.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use iri_ladder::config::Setup;
use iri_ladder::input::{DecodeStrategy, InputOptions};
use iri_ladder::normalize::{CallbackTable, Context};
use iri_ladder::record::{Field, Kind};
use iri_ladder::scheme::{GenericOverlay, Overlay};
use iri_ladder::spec::{Binding, Descriptor};
use iri_ladder::types::Ri;
use iri_ladder::ErrorKind;

/// A descriptor for a deliberately tiny common-kind language.
fn toy_descriptor(bnf: &str) -> Descriptor {
    let mapping: HashMap<String, Field> = [
        ("<toy>", Field::Output),
        ("<scheme>", Field::Scheme),
        ("<opaque>", Field::Opaque),
        ("<fragment>", Field::Fragment),
    ]
    .into_iter()
    .map(|(sym, field)| (sym.to_owned(), field))
    .collect();

    Descriptor {
        whoami: "toy".to_owned(),
        kind: Kind::Common,
        bnf: Cow::Owned(bnf.to_owned()),
        reserved: Regex::new(r"\A[:/?#\[\]@!$&'()*+,;=]\z").expect("valid regex"),
        unreserved: Regex::new(r"\A[A-Za-z0-9\-._~]\z").expect("valid regex"),
        pct_encoded: None,
        mapping,
    }
}

#[test]
fn ambiguous_grammars_fail_loudly() {
    // S6: an input the bound grammar derives two ways.
    let descriptor = toy_descriptor(
        "<toy> ::= <scheme> | <opaque> | <fragment>\n\
         <scheme> ::= 'x'\n\
         <opaque> ::= 'x'\n\
         <fragment> ::= 'y'\n",
    );
    let binding = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect("binds");

    let err = Ri::with_binding(&binding, "x").expect_err("two derivations");
    assert_eq!(err.kind(), ErrorKind::GrammarAmbiguous);

    // The unambiguous part of the language still parses.
    let ok = Ri::with_binding(&binding, "y").expect("one derivation");
    assert_eq!(ok.fragment(), Some("y"));
}

#[test]
fn ranks_resolve_ambiguity() {
    let descriptor = toy_descriptor(
        "<toy> ::= <scheme> rank => 1 | <opaque> | <fragment>\n\
         <scheme> ::= 'x'\n\
         <opaque> ::= 'x'\n\
         <fragment> ::= 'y'\n",
    );
    let binding = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect("binds");
    let ri = Ri::with_binding(&binding, "x").expect("rank picks the scheme");
    assert_eq!(ri.scheme(), Some("x"));
}

#[test]
fn binding_validation_failures() {
    // Mal-formed symbol key.
    let mut descriptor = toy_descriptor("<toy> ::= 'x'\n");
    descriptor.mapping.insert("toy".to_owned(), Field::Output);
    let err = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect_err("bad key");
    assert_eq!(err.kind(), ErrorKind::BindingInvalid);

    // Unknown field for the kind.
    let mut descriptor = toy_descriptor("<toy> ::= 'x'\n");
    descriptor.mapping.insert("<port>".to_owned(), Field::Port);
    let err = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect_err("bad field");
    assert_eq!(err.kind(), ErrorKind::BindingInvalid);

    // Unmapped field.
    let mut descriptor = toy_descriptor("<toy> ::= 'x'\n");
    descriptor.mapping.remove("<fragment>");
    let err = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect_err("unmapped");
    assert_eq!(err.kind(), ErrorKind::BindingInvalid);

    // Grammar referencing an undefined symbol.
    let descriptor = toy_descriptor("<toy> ::= <nowhere>\n");
    let err = Binding::bind(descriptor, Arc::new(GenericOverlay)).expect_err("undefined");
    assert_eq!(err.kind(), ErrorKind::BindingInvalid);
}

/// An overlay that upgrades `http`-style references to a fixed host case
/// policy at the protocol-based stage.
struct WwwStripOverlay;

impl Overlay for WwwStripOverlay {
    fn name(&self) -> &str {
        "www-strip"
    }

    fn default_port(&self) -> Option<u16> {
        Some(80)
    }

    fn reg_name_is_domain_name(&self) -> bool {
        true
    }

    fn build_protocol_based_normalizer(&self, table: &mut CallbackTable) {
        table.insert(
            "host",
            Arc::new(|_ctx: &Context<'_>, _criteria: &str, value: &str, _lhs: &str| {
                value.strip_prefix("www.").unwrap_or(value).to_owned()
            }),
        );
    }
}

#[test]
fn overlays_extend_tables_by_composition() {
    let binding = Binding::bind(
        Descriptor::generic().with_whoami("www-strip"),
        Arc::new(WwwStripOverlay),
    )
    .expect("binds");

    let ri = Ri::with_binding(&binding, "HTTP://WWW.Example.COM:80/a").expect("parses");
    // Built-in stages still apply (case, default port), and the overlay's
    // protocol-based rule composes on top.
    assert_eq!(ri.canonical(), "http://example.com/a");
    // Earlier stages are untouched by the protocol-based overlay.
    assert_eq!(
        ri.output_by_type("SCHEME_BASED_NORMALIZED").expect("stage 7"),
        "http://www.example.com/a"
    );
}

#[test]
fn explicit_setup_controls_compat_mode() {
    let compat = Setup {
        uri_compat: true,
        ..Setup::default()
    };
    let binding = Binding::bind_with_setup(
        Descriptor::generic(),
        Arc::new(GenericOverlay),
        compat,
    )
    .expect("binds");

    let ri = Ri::with_binding(&binding, "  <URL:http://a/b>  ").expect("parses");
    assert_eq!(ri.raw(), "http://a/b");
    // URI-compat seeds `segments` with one empty string.
    assert_eq!(
        ri.segments().to_vec(),
        vec![String::new(), "b".to_owned()]
    );
}

#[test]
fn octet_construction_feeds_the_parser() {
    let ri = Ri::from_options(InputOptions {
        octets: Some(b"http://example.com/%7euser".to_vec()),
        encoding: Some("utf-8".to_owned()),
        ..InputOptions::default()
    })
    .expect("decodes and parses");
    assert_eq!(ri.canonical(), "http://example.com/~user");

    // Latin-1 octets decode, then parse as an IRI.
    let ri = Ri::from_options(InputOptions {
        octets: Some(vec![
            b'h', b't', b't', b'p', b':', b'/', b'/', 0xE9, b'.', b'f', b'r', b'/',
        ]),
        encoding: Some("iso-8859-1".to_owned()),
        ..InputOptions::default()
    })
    .expect("decodes and parses");
    assert_eq!(ri.host(), Some("\u{E9}.fr"));
}

#[test]
fn input_shape_errors_surface() {
    assert_eq!(
        Ri::from_options(InputOptions::default()).unwrap_err().kind(),
        ErrorKind::InputShape
    );
    assert_eq!(
        Ri::from_options(InputOptions {
            octets: Some(vec![0xFF]),
            encoding: Some("utf-8".to_owned()),
            decode_strategy: DecodeStrategy::FailOnInvalid,
            ..InputOptions::default()
        })
        .unwrap_err()
        .kind(),
        ErrorKind::DecodeFailed
    );
}

#[test]
fn scheme_bindings_report_overlay_data() {
    let http = Ri::new("http://example.com/").expect("parses");
    assert_eq!(http.default_port(), Some(80));
    assert!(!http.secure());

    let https = Ri::new("https://example.com/").expect("parses");
    assert_eq!(https.default_port(), Some(443));
    assert!(https.secure());
    assert_eq!(https.canonical(), "https://example.com/");

    let ldap = Ri::new("LDAP://Example.COM:389/c=GB").expect("parses");
    assert_eq!(ldap.canonical(), "ldap://example.com/c=GB");
}
