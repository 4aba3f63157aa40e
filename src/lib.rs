//! Grammar-driven parsing, normalization, conversion and resolution for
//! [RFC 3986 Uniform Resource Identifiers (URIs)][RFC 3986] and [RFC 3987
//! Internationalized Resource Identifiers (IRIs)][RFC 3987].
//!
//! An input string (or a byte sequence plus a declared encoding) is
//! decomposed by a BNF grammar into named components and, in the same
//! traversal, turned into a ladder of nine progressively transformed
//! output strings: raw, URI-converted, IRI-converted, then case,
//! character, percent-encoding, path-segment, scheme-based and
//! protocol-based normalization. Reference resolution (RFC 3986 §5) and
//! recomposition operate on the decomposed components.
//!
//! # Capability
//!
//! * [`types::Ri`] — parse once, then read components, any ladder stage,
//!   and resolve references with [`Ri::abs`][`types::Ri::abs`].
//! * [`spec`] — bind your own grammar, field mapping and predicates into
//!   an identifier kind; [`scheme`] overlays layer per-scheme behavior
//!   (default port, secure flag, IDN reg-names) over the generic core.
//! * [`resolve`] — the RFC 3986 §5.2–§5.3 algorithms, standalone.
//! * [`percent_encoding`] — tolerant percent-codec primitives.
//!
//! # Examples
//!
//! ```
//! use iri_ladder::types::Ri;
//!
//! let iri = Ri::new("HTTP://Example.COM:80/%7euser")?;
//! assert_eq!(iri.canonical(), "http://example.com/~user");
//! assert_eq!(iri.raw(), "HTTP://Example.COM:80/%7euser");
//!
//! let base = Ri::new("http://a/b/c/d;p?q")?;
//! let resolved = Ri::new("../../g")?.abs(&base)?;
//! assert_eq!(resolved.canonical(), "http://a/g");
//! # Ok::<_, iri_ladder::Error>(())
//! ```
//!
//! # Equality
//!
//! Two identifiers compare equal iff their index-8
//! (`PROTOCOL_BASED_NORMALIZED`) outputs are byte-equal. Comparison with
//! protocol knowledge beyond the bound overlays is out of scope; implement
//! it on top of the exposed ladder stages.
//!
//! # Feature flags
//!
//! * `serde` — `Serialize`/`Deserialize` for [`types::Ri`]: serialized as
//!   the RAW string, deserialized by re-parsing.
//!
//! # Rationale
//!
//! ## Why a grammar at runtime
//!
//! The decomposition and the nine-stage ladder are computed during a
//! single grammar traversal: each rule reduction concatenates its
//! children per stage and applies the per-stage callback tables, keyed by
//! the reduced symbol's mapped field. Scheme customization then needs no
//! second parser: an overlay only extends the callback tables of a
//! binding. The grammar itself is data ([`spec::Descriptor::bnf`]), so a
//! scheme may also ship a stricter grammar without touching the engine.
//!
//! ## `foo://` has an empty authority, not an absent one
//!
//! As in RFC 3986, `foo://` decomposes to an *empty* authority with an
//! empty path: the `//` prefix means the authority production was used.
//! This is why an authority-less path may never begin with `//`, and why
//! resolution refuses to produce such a target instead of silently
//! recomposing a string that would re-parse differently.
//!
//! [RFC 3986]: https://tools.ietf.org/html/rfc3986
//! [RFC 3987]: https://tools.ietf.org/html/rfc3987
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

pub mod config;
pub mod error;
pub(crate) mod grammar;
pub mod input;
pub mod ladder;
pub mod normalize;
pub mod percent_encoding;
pub mod record;
pub mod resolve;
pub mod scheme;
pub mod spec;
pub mod types;

pub use crate::error::{Error, ErrorKind};
pub use crate::ladder::LadderIndex;
pub use crate::types::Ri;
