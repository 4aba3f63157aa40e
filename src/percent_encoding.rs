//! Percent encoding and decoding.
//!
//! The decoder here is deliberately tolerant: identifiers in the wild carry
//! percent sequences that do not decode to UTF-8, and partially rewriting
//! them would corrupt the identifier. `unescape` therefore returns its
//! input unchanged whenever the decoded octets fail validation.

use regex::Regex;

/// Uppercase hexadecimal digits, indexed by nibble.
const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encodes every substring matching `targets`.
///
/// Each match is replaced by the `%HH` triplets (uppercase hexadecimal) of
/// its UTF-8 bytes; everything else is copied through.
///
/// # Examples
///
/// ```
/// use iri_ladder::percent_encoding::percent_encode;
/// use regex::Regex;
///
/// let gen_delims = Regex::new(r"[:/?\#\[\]@]").unwrap();
/// assert_eq!(percent_encode("a/b?c", &gen_delims), "a%2Fb%3Fc");
/// assert_eq!(percent_encode("\u{3B1}", &Regex::new(r"[^A-Za-z]").unwrap()), "%CE%B1");
/// ```
#[must_use]
pub fn percent_encode(s: &str, targets: &Regex) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for m in targets.find_iter(s) {
        out.push_str(&s[last..m.start()]);
        for byte in m.as_str().bytes() {
            push_pct(&mut out, byte);
        }
        last = m.end();
    }
    out.push_str(&s[last..]);
    out
}

/// Appends the `%HH` form of one byte.
fn push_pct(out: &mut String, byte: u8) {
    out.push('%');
    out.push(HEX_UPPER[usize::from(byte >> 4)] as char);
    out.push(HEX_UPPER[usize::from(byte & 0x0F)] as char);
}

/// Selectively decodes percent sequences.
///
/// Each maximal run of `%HH` triplets is decoded to octets and validated as
/// UTF-8. Code points matching `unreserved` are substituted literally; the
/// others keep the exact triplets that produced them. A run whose octets do
/// not form valid UTF-8 (including overlong forms, which UTF-8 validation
/// rejects) makes the whole value come back unchanged.
///
/// # Examples
///
/// ```
/// use iri_ladder::percent_encoding::unescape;
/// use regex::Regex;
///
/// let unreserved = Regex::new(r"\A[A-Za-z0-9\-._~]\z").unwrap();
/// assert_eq!(unescape("%7Euser", &unreserved), "~user");
/// assert_eq!(unescape("%2Fpath", &unreserved), "%2Fpath");
/// // Lone continuation byte: kept untouched.
/// assert_eq!(unescape("%B1", &unreserved), "%B1");
/// ```
#[must_use]
pub fn unescape(value: &str, unreserved: &Regex) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < chars.len() {
        let run_len = pct_run_len(&chars[i..]);
        if run_len == 0 {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let run: String = chars[i..i + run_len].iter().collect();
        let octets = decode_run(&run);
        match core::str::from_utf8(&octets) {
            Ok(decoded) => {
                let mut offset = 0;
                for c in decoded.chars() {
                    let len = c.len_utf8();
                    if unreserved.is_match(c.encode_utf8(&mut [0_u8; 4])) {
                        out.push(c);
                    } else {
                        // The triplets that produced this code point.
                        out.push_str(&run[offset * 3..(offset + len) * 3]);
                    }
                    offset += len;
                }
            }
            Err(_) => return value.to_owned(),
        }
        i += run_len;
    }
    out
}

/// Length (in characters) of the maximal `%HH` run at the start of `chars`.
fn pct_run_len(chars: &[char]) -> usize {
    let mut len = 0;
    while chars.len() >= len + 3
        && chars[len] == '%'
        && chars[len + 1].is_ascii_hexdigit()
        && chars[len + 2].is_ascii_hexdigit()
    {
        len += 3;
    }
    len
}

/// Decodes a validated `%HH` run to octets.
fn decode_run(run: &str) -> Vec<u8> {
    run.as_bytes()
        .chunks(3)
        .map(|triplet| {
            let hi = (triplet[1] as char).to_digit(16).expect("validated hex digit");
            let lo = (triplet[2] as char).to_digit(16).expect("validated hex digit");
            ((hi << 4) | lo) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static UNRESERVED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\A[A-Za-z0-9\-._~]\z").expect("valid regex"));

    #[test]
    fn encode_multibyte() {
        let all = Regex::new(r"[\x{80}-\x{10FFFF}]").expect("valid regex");
        assert_eq!(percent_encode("\u{3B1}\u{3B2}", &all), "%CE%B1%CE%B2");
    }

    #[test]
    fn encode_leaves_nonmatching_text() {
        let delims = Regex::new(r"[?\#]").expect("valid regex");
        assert_eq!(percent_encode("plain", &delims), "plain");
        assert_eq!(percent_encode("a?b#c", &delims), "a%3Fb%23c");
    }

    #[test]
    fn unescape_mixed_run() {
        // `%7E` is unreserved, `%2F` (slash) is not.
        assert_eq!(unescape("%7E%2F%7E", &UNRESERVED), "~%2F~");
    }

    #[test]
    fn unescape_multibyte_unreserved_by_iri_rule() {
        let iunreserved =
            Regex::new(r"\A[A-Za-z0-9\-._~\x{A0}-\x{D7FF}]\z").expect("valid regex");
        assert_eq!(unescape("%CE%B1", &iunreserved), "\u{3B1}");
        // The same octets stay encoded under the ASCII-only rule.
        assert_eq!(unescape("%CE%B1", &UNRESERVED), "%CE%B1");
    }

    #[test]
    fn unescape_keeps_invalid_utf8_runs() {
        assert_eq!(unescape("a%FF%FEb", &UNRESERVED), "a%FF%FEb");
        // Overlong encoding of `/`.
        assert_eq!(unescape("%C0%AF", &UNRESERVED), "%C0%AF");
    }

    #[test]
    fn unescape_ignores_bare_percent() {
        assert_eq!(unescape("100%", &UNRESERVED), "100%");
        assert_eq!(unescape("%ZZ", &UNRESERVED), "%ZZ");
    }

    #[test]
    fn lowercase_hex_decodes_too() {
        assert_eq!(unescape("%7e", &UNRESERVED), "~");
    }
}
