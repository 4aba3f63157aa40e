//! Scheme overlays.
//!
//! An overlay layers scheme-specific knowledge over the generic engine:
//! the default port, the secure flag, whether reg-names are domain names
//! (which switches on IDN conversion), and hooks that extend the
//! normalizer and converter tables. Hooks compose with the built-in
//! tables; they insert or wrap entries rather than replacing a table.
//!
//! The registry binds the built-in overlays once and selects one by the
//! scheme of the input being parsed. On-disk plugin discovery is an
//! external concern; its configuration keys live in
//! [`Setup`][`crate::config::Setup`].

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::normalize::CallbackTable;
use crate::spec::{Binding, Descriptor};

/// Scheme-specific customization points.
///
/// Every method has a default, so an overlay only states what it changes.
pub trait Overlay: Send + Sync {
    /// Overlay name, for diagnostics.
    fn name(&self) -> &str;

    /// Default port of the scheme, stripped by scheme-based normalization.
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Whether the scheme is inherently secured.
    fn secure(&self) -> bool {
        false
    }

    /// Whether `reg_name` values are domain names.
    fn reg_name_is_domain_name(&self) -> bool {
        false
    }

    /// Extends the case normalizer table (ladder index 3).
    fn build_case_normalizer(&self, _table: &mut CallbackTable) {}

    /// Extends the character normalizer table (ladder index 4).
    fn build_character_normalizer(&self, _table: &mut CallbackTable) {}

    /// Extends the percent-encoding normalizer table (ladder index 5).
    fn build_percent_encoding_normalizer(&self, _table: &mut CallbackTable) {}

    /// Extends the path-segment normalizer table (ladder index 6).
    fn build_path_segment_normalizer(&self, _table: &mut CallbackTable) {}

    /// Extends the scheme-based normalizer table (ladder index 7).
    fn build_scheme_based_normalizer(&self, _table: &mut CallbackTable) {}

    /// Extends the protocol-based normalizer table (ladder index 8).
    fn build_protocol_based_normalizer(&self, _table: &mut CallbackTable) {}

    /// Extends the URI converter table (ladder index 1).
    fn build_uri_converter(&self, _table: &mut CallbackTable) {}

    /// Extends the IRI converter table (ladder index 2).
    fn build_iri_converter(&self, _table: &mut CallbackTable) {}
}

/// The no-customization overlay used by the built-in bindings.
#[derive(Debug, Clone, Copy)]
pub struct GenericOverlay;

impl Overlay for GenericOverlay {
    fn name(&self) -> &str {
        "generic"
    }
}

/// `http`.
#[derive(Debug, Clone, Copy)]
pub struct HttpOverlay;

impl Overlay for HttpOverlay {
    fn name(&self) -> &str {
        "http"
    }

    fn default_port(&self) -> Option<u16> {
        Some(80)
    }

    fn reg_name_is_domain_name(&self) -> bool {
        true
    }
}

/// `https`.
#[derive(Debug, Clone, Copy)]
pub struct HttpsOverlay;

impl Overlay for HttpsOverlay {
    fn name(&self) -> &str {
        "https"
    }

    fn default_port(&self) -> Option<u16> {
        Some(443)
    }

    fn secure(&self) -> bool {
        true
    }

    fn reg_name_is_domain_name(&self) -> bool {
        true
    }
}

/// `ftp`.
#[derive(Debug, Clone, Copy)]
pub struct FtpOverlay;

impl Overlay for FtpOverlay {
    fn name(&self) -> &str {
        "ftp"
    }

    fn default_port(&self) -> Option<u16> {
        Some(21)
    }

    fn reg_name_is_domain_name(&self) -> bool {
        true
    }
}

/// `ldap`.
#[derive(Debug, Clone, Copy)]
pub struct LdapOverlay;

impl Overlay for LdapOverlay {
    fn name(&self) -> &str {
        "ldap"
    }

    fn default_port(&self) -> Option<u16> {
        Some(389)
    }

    fn reg_name_is_domain_name(&self) -> bool {
        true
    }
}

/// `ldaps`.
#[derive(Debug, Clone, Copy)]
pub struct LdapsOverlay;

impl Overlay for LdapsOverlay {
    fn name(&self) -> &str {
        "ldaps"
    }

    fn default_port(&self) -> Option<u16> {
        Some(636)
    }

    fn secure(&self) -> bool {
        true
    }

    fn reg_name_is_domain_name(&self) -> bool {
        true
    }
}

/// Built-in scheme bindings, created on first use.
static REGISTRY: Lazy<HashMap<&'static str, Arc<Binding>>> = Lazy::new(|| {
    /// Binds one scheme overlay over the generic descriptor.
    fn bind(name: &'static str, overlay: Arc<dyn Overlay>) -> (&'static str, Arc<Binding>) {
        let binding = Binding::bind(Descriptor::generic().with_whoami(name), overlay)
            .expect("built-in scheme overlays must bind");
        (name, binding)
    }

    [
        bind("http", Arc::new(HttpOverlay)),
        bind("https", Arc::new(HttpsOverlay)),
        bind("ftp", Arc::new(FtpOverlay)),
        bind("ldap", Arc::new(LdapOverlay)),
        bind("ldaps", Arc::new(LdapsOverlay)),
    ]
    .into_iter()
    .collect()
});

/// Looks a scheme binding up, case-insensitively.
#[must_use]
pub fn lookup(scheme: &str) -> Option<Arc<Binding>> {
    REGISTRY.get(scheme.to_ascii_lowercase().as_str()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(lookup("HTTP").is_some());
        assert!(lookup("http").is_some());
        assert!(lookup("gopher").is_none());
    }

    #[test]
    fn overlay_metadata_reaches_the_binding() {
        let http = lookup("http").expect("registered");
        assert_eq!(http.default_port(), Some(80));
        assert!(!http.secure());

        let ldaps = lookup("ldaps").expect("registered");
        assert_eq!(ldaps.default_port(), Some(636));
        assert!(ldaps.secure());
    }
}
