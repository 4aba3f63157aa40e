//! Process-wide setup.
//!
//! The setup is captured once from the environment and treated as an
//! immutable configuration snapshot afterwards, so that every parse made
//! through the same binding is reproducible. Bindings copy the snapshot at
//! construction time; late environment mutation has no effect on them.

use std::env;

use once_cell::sync::Lazy;

/// Environment variable prefix for the crate's own keys.
const ENV_PREFIX: &str = "IRI_LADDER_";

/// Captured global setup.
static GLOBAL: Lazy<Setup> = Lazy::new(Setup::from_env);

/// Process-wide configuration snapshot.
///
/// All fields have conservative defaults; the environment can override them
/// (`IRI_LADDER_TRACE=1`, `IRI_LADDER_URI_COMPAT=1`, and so on). Flags are
/// parsed as "anything but `0`, `false`, or empty is on".
///
/// The two resolution-strictness knobs are dual-sourced: when `uri_compat`
/// is on they are read from the legacy names `URI_ABS_REMOTE_LEADING_DOTS`
/// and `URI_REMOVE_DOT_SEGMENTS_STRICT`, otherwise from the crate's own
/// prefixed names. Both default to `true`, i.e. RFC 3986 behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    /// Trace the grammar driver (chart construction).
    pub trace: bool,
    /// Trace every terminal scanned by the grammar driver.
    pub trace_terminals: bool,
    /// Trace every reduction value produced by the ladder engine.
    pub trace_values: bool,
    /// Legacy URI-library compatibility mode: input pre-cleaning, seeded
    /// `segments`, and legacy environment names for the strictness knobs.
    pub uri_compat: bool,
    /// Directory name for on-disk scheme plugin discovery.
    ///
    /// Discovery itself is an external collaborator; the key is carried so
    /// integrations share one configuration surface.
    pub plugins_dirname: String,
    /// Implementation directory name for plugin discovery.
    pub impl_dirname: String,
    /// Method name a plugin exposes to claim a scheme.
    pub can_scheme_methodname: String,
    /// Discard `..` segments that would climb above the root when
    /// resolving a reference. `false` keeps them in the target path.
    pub abs_remote_leading_dots: bool,
    /// Discard excess `..` segments in `remove_dot_segments`. `false`
    /// keeps them in the output.
    pub remove_dot_segments_strict: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            trace: false,
            trace_terminals: false,
            trace_values: false,
            uri_compat: false,
            plugins_dirname: "Plugins".to_owned(),
            impl_dirname: "Impl".to_owned(),
            can_scheme_methodname: "can_scheme".to_owned(),
            abs_remote_leading_dots: true,
            remove_dot_segments_strict: true,
        }
    }
}

impl Setup {
    /// Returns the process-wide snapshot, capturing it on first use.
    #[must_use]
    pub fn global() -> &'static Setup {
        &GLOBAL
    }

    /// Captures a snapshot from the current environment.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Setup::default();
        let uri_compat = env_flag("URI_COMPAT").unwrap_or(defaults.uri_compat);

        // Dual-sourced keys, see the type-level docs.
        let (leading_dots, strict) = if uri_compat {
            (
                legacy_flag("URI_ABS_REMOTE_LEADING_DOTS"),
                legacy_flag("URI_REMOVE_DOT_SEGMENTS_STRICT"),
            )
        } else {
            (
                env_flag("ABS_REMOTE_LEADING_DOTS"),
                env_flag("REMOVE_DOT_SEGMENTS_STRICT"),
            )
        };

        Self {
            trace: env_flag("TRACE").unwrap_or(defaults.trace),
            trace_terminals: env_flag("TRACE_TERMINALS").unwrap_or(defaults.trace_terminals),
            trace_values: env_flag("TRACE_VALUES").unwrap_or(defaults.trace_values),
            uri_compat,
            plugins_dirname: env_string("PLUGINS_DIRNAME").unwrap_or(defaults.plugins_dirname),
            impl_dirname: env_string("IMPL_DIRNAME").unwrap_or(defaults.impl_dirname),
            can_scheme_methodname: env_string("CAN_SCHEME_METHODNAME")
                .unwrap_or(defaults.can_scheme_methodname),
            abs_remote_leading_dots: leading_dots.unwrap_or(defaults.abs_remote_leading_dots),
            remove_dot_segments_strict: strict.unwrap_or(defaults.remove_dot_segments_strict),
        }
    }
}

/// Reads a prefixed environment string.
fn env_string(key: &str) -> Option<String> {
    env::var(format!("{}{}", ENV_PREFIX, key)).ok()
}

/// Reads a prefixed environment flag.
fn env_flag(key: &str) -> Option<bool> {
    env_string(key).map(|v| truthy(&v))
}

/// Reads a legacy (unprefixed) environment flag.
fn legacy_flag(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| truthy(&v))
}

/// Flag parsing shared by all boolean keys.
fn truthy(v: &str) -> bool {
    !(v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_rfc_conformant() {
        let s = Setup::default();
        assert!(!s.uri_compat);
        assert!(s.abs_remote_leading_dots);
        assert!(s.remove_dot_segments_strict);
        assert_eq!(s.plugins_dirname, "Plugins");
        assert_eq!(s.impl_dirname, "Impl");
        assert_eq!(s.can_scheme_methodname, "can_scheme");
    }

    #[test]
    fn flag_parsing() {
        assert!(truthy("1"));
        assert!(truthy("yes"));
        assert!(!truthy("0"));
        assert!(!truthy("false"));
        assert!(!truthy(""));
    }
}
