//! Component-bearing record types.
//!
//! A parse produces nine records of the same kind, one per ladder stage.
//! The *common* kind keeps only the coarse decomposition (scheme, opaque,
//! fragment); the *generic* kind carries the full RFC 3986 / RFC 3987
//! component set.

use once_cell::sync::Lazy;
use regex::Regex;

/// Identifier kind: drives which record type a parse populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Coarse `scheme:opaque#fragment` decomposition.
    Common,
    /// Full generic syntax decomposition.
    Generic,
}

/// A record field a grammar symbol can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Field {
    /// Final ladder value of the whole reference.
    Output,
    /// Scheme.
    Scheme,
    /// Everything after the scheme, minus the fragment.
    Opaque,
    /// Fragment.
    Fragment,
    /// Hierarchical part (authority plus path).
    HierPart,
    /// Query.
    Query,
    /// Most recent path segment; assigning it also appends to
    /// [`Field::Segments`].
    Segment,
    /// Ordered path segment list (append-only during a parse).
    Segments,
    /// Authority.
    Authority,
    /// Path.
    Path,
    /// Whole relative reference.
    RelativeRef,
    /// Relative part (authority plus path of a relative reference).
    RelativePart,
    /// Userinfo.
    Userinfo,
    /// Host.
    Host,
    /// Port.
    Port,
    /// Bracketed IP literal.
    IpLiteral,
    /// Dotted-quad IPv4 address.
    Ipv4Address,
    /// Registered name.
    RegName,
    /// IPv6 address.
    Ipv6Address,
    /// IPv6 address with a zone identifier.
    Ipv6Addrz,
    /// `vX.` future IP literal.
    Ipvfuture,
    /// Zone identifier of an IPv6 address.
    Zoneid,
}

/// Fields of the common kind, in declaration order.
const COMMON_FIELDS: &[Field] = &[Field::Output, Field::Scheme, Field::Opaque, Field::Fragment];

/// Fields of the generic kind, in declaration order.
const GENERIC_FIELDS: &[Field] = &[
    Field::Output,
    Field::Scheme,
    Field::Opaque,
    Field::Fragment,
    Field::HierPart,
    Field::Query,
    Field::Segment,
    Field::Segments,
    Field::Authority,
    Field::Path,
    Field::RelativeRef,
    Field::RelativePart,
    Field::Userinfo,
    Field::Host,
    Field::Port,
    Field::IpLiteral,
    Field::Ipv4Address,
    Field::RegName,
    Field::Ipv6Address,
    Field::Ipv6Addrz,
    Field::Ipvfuture,
    Field::Zoneid,
];

impl Field {
    /// Canonical field name, also the criteria key for mapped reductions.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Field::Output => "output",
            Field::Scheme => "scheme",
            Field::Opaque => "opaque",
            Field::Fragment => "fragment",
            Field::HierPart => "hier_part",
            Field::Query => "query",
            Field::Segment => "segment",
            Field::Segments => "segments",
            Field::Authority => "authority",
            Field::Path => "path",
            Field::RelativeRef => "relative_ref",
            Field::RelativePart => "relative_part",
            Field::Userinfo => "userinfo",
            Field::Host => "host",
            Field::Port => "port",
            Field::IpLiteral => "ip_literal",
            Field::Ipv4Address => "ipv4_address",
            Field::RegName => "reg_name",
            Field::Ipv6Address => "ipv6_address",
            Field::Ipv6Addrz => "ipv6_addrz",
            Field::Ipvfuture => "ipvfuture",
            Field::Zoneid => "zoneid",
        }
    }

    /// Looks a field up by its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        GENERIC_FIELDS.iter().copied().find(|f| f.name() == name)
    }

    /// All fields declared by the given kind.
    #[must_use]
    pub fn all_for(kind: Kind) -> &'static [Field] {
        match kind {
            Kind::Common => COMMON_FIELDS,
            Kind::Generic => GENERIC_FIELDS,
        }
    }

    /// Whether this field exists on records of the given kind.
    #[must_use]
    pub fn is_known_for(self, kind: Kind) -> bool {
        Field::all_for(kind).contains(&self)
    }
}

/// Common-kind record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonRecord {
    /// Final ladder value (never absent; empty before assignment).
    pub output: String,
    /// Scheme, when the reference carries one.
    pub scheme: Option<String>,
    /// Everything after the scheme, minus the fragment (never absent).
    pub opaque: String,
    /// Fragment, when present.
    pub fragment: Option<String>,
}

/// Generic-kind record: the full RFC 3986 / RFC 3987 component set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericRecord {
    /// Final ladder value (never absent; empty before assignment).
    pub output: String,
    /// Scheme.
    pub scheme: Option<String>,
    /// Everything after the scheme, minus the fragment (never absent).
    pub opaque: String,
    /// Fragment.
    pub fragment: Option<String>,
    /// Hierarchical part.
    pub hier_part: Option<String>,
    /// Query.
    pub query: Option<String>,
    /// Most recent path segment.
    pub segment: Option<String>,
    /// Authority.
    pub authority: Option<String>,
    /// Path.
    pub path: Option<String>,
    /// Whole relative reference.
    pub relative_ref: Option<String>,
    /// Relative part.
    pub relative_part: Option<String>,
    /// Userinfo.
    pub userinfo: Option<String>,
    /// Host.
    pub host: Option<String>,
    /// Port.
    pub port: Option<String>,
    /// Bracketed IP literal.
    pub ip_literal: Option<String>,
    /// Dotted-quad IPv4 address.
    pub ipv4_address: Option<String>,
    /// Registered name.
    pub reg_name: Option<String>,
    /// IPv6 address.
    pub ipv6_address: Option<String>,
    /// IPv6 address with zone identifier.
    pub ipv6_addrz: Option<String>,
    /// Future IP literal.
    pub ipvfuture: Option<String>,
    /// Zone identifier.
    pub zoneid: Option<String>,
    /// Path segments, in document order (append-only during a parse).
    pub segments: Vec<String>,
}

impl GenericRecord {
    /// Creates an empty record. URI-compat mode seeds `segments` with a
    /// single empty string.
    #[must_use]
    pub fn new(uri_compat: bool) -> Self {
        let mut record = Self::default();
        if uri_compat {
            record.segments.push(String::new());
        }
        record
    }
}

/// A record of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Common-kind record.
    Common(CommonRecord),
    /// Generic-kind record.
    Generic(GenericRecord),
}

impl Record {
    /// Creates an empty record of the given kind.
    #[must_use]
    pub(crate) fn empty(kind: Kind, uri_compat: bool) -> Self {
        match kind {
            Kind::Common => Record::Common(CommonRecord::default()),
            Kind::Generic => Record::Generic(GenericRecord::new(uri_compat)),
        }
    }

    /// Returns the record kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Record::Common(_) => Kind::Common,
            Record::Generic(_) => Kind::Generic,
        }
    }

    /// Returns the `output` field.
    #[must_use]
    pub fn output(&self) -> &str {
        match self {
            Record::Common(c) => &c.output,
            Record::Generic(g) => &g.output,
        }
    }

    /// Returns the generic view, when this is a generic record.
    #[must_use]
    pub fn as_generic(&self) -> Option<&GenericRecord> {
        match self {
            Record::Generic(g) => Some(g),
            Record::Common(_) => None,
        }
    }

    /// Returns the common view, when this is a common record.
    #[must_use]
    pub fn as_common(&self) -> Option<&CommonRecord> {
        match self {
            Record::Common(c) => Some(c),
            Record::Generic(_) => None,
        }
    }

    /// Assigns a field from a reduction value.
    ///
    /// Assigning [`Field::Segment`] also appends the value to `segments`
    /// (one append per segment reduction, in document order);
    /// [`Field::Segments`] appends without touching the scalar.
    pub(crate) fn set(&mut self, field: Field, value: &str) {
        match self {
            Record::Common(c) => match field {
                Field::Output => c.output = value.to_owned(),
                Field::Scheme => c.scheme = Some(value.to_owned()),
                Field::Opaque => c.opaque = value.to_owned(),
                Field::Fragment => c.fragment = Some(value.to_owned()),
                // Binding validation rejects other fields for this kind.
                _ => debug_assert!(false, "field {:?} is not a common field", field),
            },
            Record::Generic(g) => match field {
                Field::Output => g.output = value.to_owned(),
                Field::Scheme => g.scheme = Some(value.to_owned()),
                Field::Opaque => g.opaque = value.to_owned(),
                Field::Fragment => g.fragment = Some(value.to_owned()),
                Field::HierPart => g.hier_part = Some(value.to_owned()),
                Field::Query => g.query = Some(value.to_owned()),
                Field::Segment => {
                    g.segment = Some(value.to_owned());
                    g.segments.push(value.to_owned());
                }
                Field::Segments => g.segments.push(value.to_owned()),
                Field::Authority => g.authority = Some(value.to_owned()),
                Field::Path => g.path = Some(value.to_owned()),
                Field::RelativeRef => g.relative_ref = Some(value.to_owned()),
                Field::RelativePart => g.relative_part = Some(value.to_owned()),
                Field::Userinfo => g.userinfo = Some(value.to_owned()),
                Field::Host => g.host = Some(value.to_owned()),
                Field::Port => g.port = Some(value.to_owned()),
                Field::IpLiteral => g.ip_literal = Some(value.to_owned()),
                Field::Ipv4Address => g.ipv4_address = Some(value.to_owned()),
                Field::RegName => g.reg_name = Some(value.to_owned()),
                Field::Ipv6Address => g.ipv6_address = Some(value.to_owned()),
                Field::Ipv6Addrz => g.ipv6_addrz = Some(value.to_owned()),
                Field::Ipvfuture => g.ipvfuture = Some(value.to_owned()),
                Field::Zoneid => g.zoneid = Some(value.to_owned()),
            },
        }
    }
}

/// `SchemeLike` predicate: `^[A-Za-z][A-Za-z0-9+.-]*$`.
static SCHEME_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[A-Za-z][A-Za-z0-9+.\-]*\z").expect("valid scheme regex"));

/// Checks whether the given string is syntactically a scheme.
#[must_use]
pub fn is_scheme_like(s: &str) -> bool {
    SCHEME_LIKE.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_like() {
        assert!(is_scheme_like("http"));
        assert!(is_scheme_like("z39.50r"));
        assert!(is_scheme_like("coap+tcp"));
        assert!(!is_scheme_like(""));
        assert!(!is_scheme_like("1http"));
        assert!(!is_scheme_like("ht tp"));
    }

    #[test]
    fn field_coverage_by_kind() {
        assert!(Field::Scheme.is_known_for(Kind::Common));
        assert!(!Field::Host.is_known_for(Kind::Common));
        assert!(Field::Host.is_known_for(Kind::Generic));
        assert_eq!(Field::from_name("reg_name"), Some(Field::RegName));
        assert_eq!(Field::from_name("no_such"), None);
    }

    #[test]
    fn segment_assignment_appends() {
        let mut r = Record::empty(Kind::Generic, false);
        r.set(Field::Segment, "a");
        r.set(Field::Segment, "b");
        let g = r.as_generic().expect("generic record");
        assert_eq!(g.segment.as_deref(), Some("b"));
        assert_eq!(g.segments, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn uri_compat_seeds_segments() {
        let r = Record::empty(Kind::Generic, true);
        assert_eq!(r.as_generic().expect("generic record").segments, vec![String::new()]);
    }
}
