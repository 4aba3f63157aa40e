//! Reference resolution.
//!
//! Implements the RFC 3986 §5.2–§5.3 algorithms: component transformation,
//! path merging, `remove_dot_segments`, and recomposition. Resolution
//! operates on the RAW records of the reference and the base; the result
//! is recomposed into a string and re-parsed by the caller.
//!
//! Two setup knobs relax the RFC behavior for legacy compatibility:
//! `remove_dot_segments_strict` (off: excess `..` segments stay in the
//! output of `remove_dot_segments`) and `abs_remote_leading_dots` (off:
//! excess `..` segments survive resolution of a relative path). Both are
//! on by default.

use crate::config::Setup;
use crate::error::{Error, ErrorKind};
use crate::record::GenericRecord;

/// Recomposition parts of a resolution target.
///
/// See [RFC 3986 §5.3](https://datatracker.ietf.org/doc/html/rfc3986#section-5.3).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parts {
    /// Scheme, without the trailing `:`.
    pub scheme: Option<String>,
    /// Authority, without the leading `//`.
    pub authority: Option<String>,
    /// Path.
    pub path: String,
    /// Query, without the leading `?`.
    pub query: Option<String>,
    /// Fragment, without the leading `#`.
    pub fragment: Option<String>,
}

/// Removes `.` and `..` path segments.
///
/// This is the strict RFC 3986 §5.2.4 algorithm: excess `..` segments that
/// would climb above the root are discarded.
///
/// # Examples
///
/// ```
/// use iri_ladder::resolve::remove_dot_segments;
///
/// assert_eq!(remove_dot_segments("/a/b/c/./../../g"), "/a/g");
/// assert_eq!(remove_dot_segments("mid/content=5/../6"), "mid/6");
/// assert_eq!(remove_dot_segments("/../g"), "/g");
/// ```
#[must_use]
pub fn remove_dot_segments(input: &str) -> String {
    remove_dot_segments_with(input, true)
}

/// `remove_dot_segments` with a strictness toggle.
///
/// When `strict` is off, a `..` that finds no segment to remove is kept in
/// the output instead of being discarded.
#[must_use]
pub(crate) fn remove_dot_segments_with(input: &str, strict: bool) -> String {
    let mut inp = input.to_owned();
    let mut out = String::with_capacity(input.len());

    while !inp.is_empty() {
        if inp.starts_with("../") {
            // 2.A
            inp.drain(..3);
        } else if inp.starts_with("./") {
            // 2.A
            inp.drain(..2);
        } else if inp.starts_with("/./") {
            // 2.B
            inp.replace_range(..3, "/");
        } else if inp == "/." {
            // 2.B
            inp.replace_range(..2, "/");
        } else if inp.starts_with("/../") {
            // 2.C
            inp.replace_range(..4, "/");
            pop_segment(&mut out, strict);
        } else if inp == "/.." {
            // 2.C
            inp.replace_range(..3, "/");
            pop_segment(&mut out, strict);
        } else if inp == "." || inp == ".." {
            // 2.D
            inp.clear();
        } else {
            // 2.E: move the first segment (with its leading slash, if any)
            // from the input to the output.
            let skip = usize::from(inp.starts_with('/'));
            let end = inp[skip..]
                .find('/')
                .map_or_else(|| inp.len(), |pos| pos + skip);
            out.push_str(&inp[..end]);
            inp.drain(..end);
        }
    }
    out
}

/// Removes the output's last segment and its preceding slash, if any.
///
/// In non-strict mode an empty output receives the unmatched `/..`
/// instead.
fn pop_segment(out: &mut String, strict: bool) {
    let had_segment = !out.is_empty();
    match out.rfind('/') {
        Some(pos) => out.truncate(pos),
        None => out.clear(),
    }
    if !strict && !had_segment {
        // Legacy mode: keep how far above the root the path climbed.
        out.push_str("/..");
    }
}

/// Merges a relative-path reference with the base path.
///
/// See [RFC 3986 §5.2.3](https://datatracker.ietf.org/doc/html/rfc3986#section-5.2.3).
fn merge(base: &GenericRecord, r_path: &str) -> String {
    let b_path = base.path.as_deref().unwrap_or("");
    if base.authority.is_some() && b_path.is_empty() {
        return format!("/{}", r_path);
    }
    match b_path.rfind('/') {
        Some(pos) => format!("{}{}", &b_path[..=pos], r_path),
        None => r_path.to_owned(),
    }
}

/// Transforms a reference against a base, per RFC 3986 §5.2.2.
///
/// Both records are RAW (index 0) components of generic-kind identifiers.
///
/// # Failures
///
/// Fails with [`ErrorKind::NotAbsolute`] when the base has no scheme.
pub(crate) fn transform(
    reference: &GenericRecord,
    base: &GenericRecord,
    setup: &Setup,
) -> Result<Parts, Error> {
    let base_scheme = base.scheme.as_deref().ok_or_else(|| {
        Error::new(
            ErrorKind::NotAbsolute,
            "resolution requires a base with a scheme",
        )
    })?;
    let strict = if setup.uri_compat {
        setup.abs_remote_leading_dots
    } else {
        true
    };
    let rds = |path: &str| remove_dot_segments_with(path, strict);

    let r_path = reference.path.as_deref().unwrap_or("");
    let mut target = Parts {
        fragment: reference.fragment.clone(),
        ..Parts::default()
    };

    if let Some(scheme) = &reference.scheme {
        target.scheme = Some(scheme.clone());
        target.authority = reference.authority.clone();
        target.path = rds(r_path);
        target.query = reference.query.clone();
    } else if reference.authority.is_some() {
        target.scheme = Some(base_scheme.to_owned());
        target.authority = reference.authority.clone();
        target.path = rds(r_path);
        target.query = reference.query.clone();
    } else if r_path.is_empty() {
        target.scheme = Some(base_scheme.to_owned());
        target.authority = base.authority.clone();
        target.path = base.path.clone().unwrap_or_default();
        target.query = reference.query.clone().or_else(|| base.query.clone());
    } else if r_path.starts_with('/') {
        target.scheme = Some(base_scheme.to_owned());
        target.authority = base.authority.clone();
        target.path = rds(r_path);
        target.query = reference.query.clone();
    } else {
        target.scheme = Some(base_scheme.to_owned());
        target.authority = base.authority.clone();
        target.path = rds(&merge(base, r_path));
        target.query = reference.query.clone();
    }
    Ok(target)
}

/// Recomposes parts into a reference string.
///
/// See [RFC 3986 §5.3](https://datatracker.ietf.org/doc/html/rfc3986#section-5.3).
///
/// # Examples
///
/// ```
/// use iri_ladder::resolve::{recompose, Parts};
///
/// let parts = Parts {
///     scheme: Some("http".to_owned()),
///     authority: Some("a".to_owned()),
///     path: "/b/c".to_owned(),
///     query: Some("q".to_owned()),
///     fragment: None,
/// };
/// assert_eq!(recompose(&parts), "http://a/b/c?q");
/// ```
#[must_use]
pub fn recompose(parts: &Parts) -> String {
    let mut out = String::new();
    if let Some(scheme) = &parts.scheme {
        out.push_str(scheme);
        out.push(':');
    }
    if let Some(authority) = &parts.authority {
        out.push_str("//");
        out.push_str(authority);
    }
    out.push_str(&parts.path);
    if let Some(query) = &parts.query {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = &parts.fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
