//! The parsed resource identifier type.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, ErrorKind};
use crate::input::{pre_clean, InputOptions};
use crate::ladder::LadderIndex;
use crate::record::{is_scheme_like, GenericRecord, Kind, Record};
use crate::resolve::{recompose, transform};
use crate::scheme;
use crate::spec::Binding;

/// A parsed resource identifier.
///
/// Construction parses the input immediately; an `Ri` always carries a
/// complete nine-record ladder snapshot. The parse result is immutable,
/// except that [`set_input`][`Ri::set_input`] re-parses and replaces all
/// nine records atomically.
///
/// Equality (`==`, [`Hash`], [`eq_protocol_based`][`Ri::eq_protocol_based`])
/// is byte-equality of the PROTOCOL_BASED_NORMALIZED (index 8) outputs;
/// [`Display`][`fmt::Display`] shows the RAW (index 0) output.
///
/// # Examples
///
/// ```
/// use iri_ladder::types::Ri;
///
/// let iri = Ri::new("HTTP://Example.COM:80/%7euser")?;
/// assert_eq!(iri.to_string(), "HTTP://Example.COM:80/%7euser");
/// assert_eq!(iri.canonical(), "http://example.com/~user");
/// assert_eq!(iri.scheme(), Some("HTTP"));
/// assert_eq!(iri.host(), Some("Example.COM"));
///
/// assert_eq!(iri, Ri::new("http://example.com/~user")?);
/// # Ok::<_, iri_ladder::Error>(())
/// ```
#[derive(Clone)]
pub struct Ri {
    /// The binding the identifier was parsed with.
    binding: Arc<Binding>,
    /// The nine-record ladder snapshot.
    records: [Record; LadderIndex::COUNT],
}

impl Ri {
    /// Parses a string, selecting a scheme binding from the registry when
    /// one is registered for the input's scheme, and the generic binding
    /// otherwise.
    ///
    /// # Failures
    ///
    /// Fails with [`ErrorKind::GrammarRejected`] or
    /// [`ErrorKind::GrammarAmbiguous`] when the input does not parse.
    pub fn new(input: &str) -> Result<Self, Error> {
        let binding = detect_binding(input);
        Ri::with_binding(&binding, input)
    }

    /// Parses a string with the common (coarse) syntax.
    pub fn common(input: &str) -> Result<Self, Error> {
        Ri::with_binding(&Binding::common(), input)
    }

    /// Parses a string with an explicit binding.
    pub fn with_binding(binding: &Arc<Binding>, input: &str) -> Result<Self, Error> {
        let cleaned = pre_clean(input, binding.setup());
        let records = binding.parse_snapshot(&cleaned)?;
        Ok(Self {
            binding: Arc::clone(binding),
            records,
        })
    }

    /// Builds an identifier from construction options (string, or octets
    /// plus encoding).
    ///
    /// # Examples
    ///
    /// ```
    /// use iri_ladder::input::InputOptions;
    /// use iri_ladder::types::Ri;
    ///
    /// let iri = Ri::from_options(InputOptions {
    ///     octets: Some(b"http://example.com/".to_vec()),
    ///     encoding: Some("utf-8".to_owned()),
    ///     ..InputOptions::default()
    /// })?;
    /// assert_eq!(iri.canonical(), "http://example.com/");
    /// # Ok::<_, iri_ladder::Error>(())
    /// ```
    pub fn from_options(options: InputOptions) -> Result<Self, Error> {
        let input = options.resolve()?;
        Ri::new(&input)
    }

    /// Re-parses a new input, replacing all nine records atomically. The
    /// binding is kept.
    pub fn set_input(&mut self, input: &str) -> Result<(), Error> {
        let cleaned = pre_clean(input, self.binding.setup());
        self.records = self.binding.parse_snapshot(&cleaned)?;
        Ok(())
    }

    /// The binding the identifier was parsed with.
    #[must_use]
    pub fn binding(&self) -> &Arc<Binding> {
        &self.binding
    }

    /// Identifier kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.binding.kind()
    }

    /// The RAW (index 0) output: the input as parsed.
    #[must_use]
    pub fn raw(&self) -> &str {
        self.records[0].output()
    }

    /// The PROTOCOL_BASED_NORMALIZED (index 8) output: the normalized form
    /// exposed to external callers.
    #[must_use]
    pub fn canonical(&self) -> &str {
        self.records[LadderIndex::ProtocolBasedNormalized.as_usize()].output()
    }

    /// The output string at a ladder position.
    ///
    /// # Failures
    ///
    /// Fails with [`ErrorKind::IndiceUnknown`] when out of range.
    pub fn output_by_indice(&self, indice: usize) -> Result<&str, Error> {
        LadderIndex::from_indice(indice).map(|idx| self.records[idx.as_usize()].output())
    }

    /// The record at a ladder position.
    ///
    /// # Failures
    ///
    /// Fails with [`ErrorKind::IndiceUnknown`] when out of range.
    pub fn struct_by_indice(&self, indice: usize) -> Result<&Record, Error> {
        LadderIndex::from_indice(indice).map(|idx| &self.records[idx.as_usize()])
    }

    /// The output string at a ladder stage named `RAW`, `URI_CONVERTED`,
    /// `IRI_CONVERTED`, `CASE_NORMALIZED`, `CHARACTER_NORMALIZED`,
    /// `PERCENT_ENCODING_NORMALIZED`, `PATH_SEGMENT_NORMALIZED`,
    /// `SCHEME_BASED_NORMALIZED`, or `PROTOCOL_BASED_NORMALIZED`.
    ///
    /// # Failures
    ///
    /// Fails with [`ErrorKind::IndiceUnknown`] on an unrecognized name.
    pub fn output_by_type(&self, name: &str) -> Result<&str, Error> {
        name.parse::<LadderIndex>()
            .map(|idx| self.records[idx.as_usize()].output())
    }

    /// The record at a named ladder stage; see
    /// [`output_by_type`][`Ri::output_by_type`] for the names.
    ///
    /// # Failures
    ///
    /// Fails with [`ErrorKind::IndiceUnknown`] on an unrecognized name.
    pub fn struct_by_type(&self, name: &str) -> Result<&Record, Error> {
        name.parse::<LadderIndex>()
            .map(|idx| &self.records[idx.as_usize()])
    }

    /// The RAW generic record, when the identifier is generic.
    fn raw_generic(&self) -> Option<&GenericRecord> {
        self.records[0].as_generic()
    }

    /// Scheme, at RAW.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        match &self.records[0] {
            Record::Common(c) => c.scheme.as_deref(),
            Record::Generic(g) => g.scheme.as_deref(),
        }
    }

    /// Everything after the scheme minus the fragment, at RAW.
    #[must_use]
    pub fn opaque(&self) -> &str {
        match &self.records[0] {
            Record::Common(c) => &c.opaque,
            Record::Generic(g) => &g.opaque,
        }
    }

    /// Fragment, at RAW.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        match &self.records[0] {
            Record::Common(c) => c.fragment.as_deref(),
            Record::Generic(g) => g.fragment.as_deref(),
        }
    }

    /// Authority, at RAW. Generic identifiers only.
    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.raw_generic().and_then(|g| g.authority.as_deref())
    }

    /// Userinfo, at RAW. Generic identifiers only.
    #[must_use]
    pub fn userinfo(&self) -> Option<&str> {
        self.raw_generic().and_then(|g| g.userinfo.as_deref())
    }

    /// Host, at RAW. Generic identifiers only.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.raw_generic().and_then(|g| g.host.as_deref())
    }

    /// Port, at RAW. Generic identifiers only.
    #[must_use]
    pub fn port(&self) -> Option<&str> {
        self.raw_generic().and_then(|g| g.port.as_deref())
    }

    /// Registered name, at RAW. Generic identifiers only.
    #[must_use]
    pub fn reg_name(&self) -> Option<&str> {
        self.raw_generic().and_then(|g| g.reg_name.as_deref())
    }

    /// Path, at RAW. Generic identifiers only.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.raw_generic().and_then(|g| g.path.as_deref())
    }

    /// Query, at RAW. Generic identifiers only.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.raw_generic().and_then(|g| g.query.as_deref())
    }

    /// Path segments in document order, at RAW. Empty for common
    /// identifiers.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        self.raw_generic().map_or(&[], |g| &g.segments)
    }

    /// Whether a scheme is defined at RAW.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.scheme().is_some()
    }

    /// Whether no scheme is defined at RAW.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        !self.is_absolute()
    }

    /// Default port of the scheme overlay, when one is declared.
    #[must_use]
    pub fn default_port(&self) -> Option<u16> {
        self.binding.default_port()
    }

    /// Whether the scheme overlay declares the scheme inherently secured.
    #[must_use]
    pub fn secure(&self) -> bool {
        self.binding.secure()
    }

    /// The explicit port, or the scheme's default.
    #[must_use]
    pub fn port_or_default(&self) -> Option<u16> {
        match self.port() {
            Some(port) => port.parse().ok(),
            None => self.default_port(),
        }
    }

    /// Resolves this reference against an absolute base, per RFC 3986
    /// §5.2–§5.3. Returns `self` unchanged when a scheme is already
    /// defined at RAW.
    ///
    /// # Failures
    ///
    /// * [`ErrorKind::WrongKind`] unless both identifiers are generic.
    /// * [`ErrorKind::NotAbsolute`] when the base has no scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use iri_ladder::types::Ri;
    ///
    /// let base = Ri::new("http://a/b/c/d;p?q")?;
    /// assert_eq!(Ri::new("../../g")?.abs(&base)?.canonical(), "http://a/g");
    /// assert_eq!(Ri::new("g;x")?.abs(&base)?.canonical(), "http://a/b/c/g;x");
    /// # Ok::<_, iri_ladder::Error>(())
    /// ```
    pub fn abs(&self, base: &Ri) -> Result<Ri, Error> {
        let reference = self.raw_generic().ok_or_else(|| {
            Error::new(ErrorKind::WrongKind, "abs() requires generic identifiers")
        })?;
        if reference.scheme.is_some() {
            return Ok(self.clone());
        }
        let base_record = base.raw_generic().ok_or_else(|| {
            Error::new(ErrorKind::WrongKind, "abs() requires a generic base")
        })?;

        let parts = transform(reference, base_record, self.binding.setup())?;
        if parts.authority.is_none() && parts.path.starts_with("//") {
            // `scheme://bar` would re-parse with `bar` as an authority, so
            // the target is unrepresentable as a reference string.
            return Err(Error::new(
                ErrorKind::GrammarRejected,
                "resolution target has no authority but a path starting with //",
            ));
        }
        let target = recompose(&parts);

        let binding = parts
            .scheme
            .as_deref()
            .and_then(scheme::lookup)
            .unwrap_or_else(|| Arc::clone(&base.binding));
        Ri::with_binding(&binding, &target)
    }

    /// Byte-equality of the index-8 outputs, as an explicit method.
    #[must_use]
    pub fn eq_protocol_based(&self, other: &Ri) -> bool {
        self.canonical() == other.canonical()
    }
}

/// Selects the binding for an input: the registered scheme binding when the
/// input has a recognized scheme, the generic binding otherwise.
fn detect_binding(input: &str) -> Arc<Binding> {
    let cleaned = pre_clean(input, crate::config::Setup::global());
    cleaned
        .split_once(':')
        .filter(|(scheme, _)| is_scheme_like(scheme))
        .and_then(|(scheme, _)| scheme::lookup(scheme))
        .unwrap_or_else(Binding::generic)
}

/// Whether `s` parses as an identifier with a scheme defined at RAW.
///
/// # Examples
///
/// ```
/// use iri_ladder::types::is_stringified_absolute_reference;
///
/// assert!(is_stringified_absolute_reference("http://example.com/"));
/// assert!(!is_stringified_absolute_reference("//example.com/"));
/// assert!(!is_stringified_absolute_reference("not a reference"));
/// ```
#[must_use]
pub fn is_stringified_absolute_reference(s: &str) -> bool {
    Ri::new(s).map_or(false, |ri| ri.is_absolute())
}

impl fmt::Display for Ri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

impl fmt::Debug for Ri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ri")
            .field("whoami", &self.binding.whoami())
            .field("raw", &self.raw())
            .field("canonical", &self.canonical())
            .finish()
    }
}

impl PartialEq for Ri {
    fn eq(&self, other: &Self) -> bool {
        self.eq_protocol_based(other)
    }
}

impl Eq for Ri {}

impl Hash for Ri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl FromStr for Ri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ri::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Ri {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.raw())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Ri {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ri::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_detection_selects_overlays() {
        assert_eq!(Ri::new("http://a/").unwrap().default_port(), Some(80));
        assert_eq!(Ri::new("HTTPS://a/").unwrap().default_port(), Some(443));
        assert_eq!(Ri::new("unknown://a/").unwrap().default_port(), None);
        assert_eq!(Ri::new("//a/").unwrap().default_port(), None);
    }

    #[test]
    fn set_input_replaces_the_snapshot() {
        let mut ri = Ri::new("http://a/x").expect("parses");
        ri.set_input("http://b/y").expect("re-parses");
        assert_eq!(ri.host(), Some("b"));
        assert_eq!(ri.raw(), "http://b/y");

        let before = ri.raw().to_owned();
        assert!(ri.set_input("http://%").is_err());
        assert_eq!(ri.raw(), before, "failed re-parse must not corrupt");
    }

    #[test]
    fn wrong_kind_is_reported() {
        let common = Ri::common("mailto:a@b").expect("parses");
        let base = Ri::new("http://a/").expect("parses");
        assert_eq!(
            common.abs(&base).unwrap_err().kind(),
            ErrorKind::WrongKind
        );
    }

    #[test]
    fn abs_of_absolute_is_identity() {
        let base = Ri::new("http://a/b").expect("parses");
        let this = Ri::new("g:h").expect("parses");
        assert_eq!(this.abs(&base).expect("identity").raw(), "g:h");
    }

    #[test]
    fn port_or_default() {
        assert_eq!(Ri::new("http://a/").unwrap().port_or_default(), Some(80));
        assert_eq!(Ri::new("http://a:8080/").unwrap().port_or_default(), Some(8080));
        assert_eq!(Ri::new("ldaps://a/").unwrap().port_or_default(), Some(636));
    }
}
