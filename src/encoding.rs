//! Charset handling of TDD files.
//!
//! A TDD file may declare its own charset in a header comment, as the first
//! non-blank thing in the file:
//!
//! ```text
//! # encoding: ISO-8859-2
//! ```
//!
//! `charset` is accepted in place of `encoding`, in any letter case.

use encoding_rs::{Encoding, UTF_16BE};
use log::debug;

use crate::constants::ENCODING_HEADER_WORDS;
use crate::error::{Error, Result};

/// Whitespace of a byte taken as an ISO-8859-1 character.
fn is_latin1_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0b | 0x0c | b'\r' | 0x1c..=0x20)
}

fn skip_non_nl_ws(b: &[u8], mut p: usize) -> usize {
    while p < b.len() && is_latin1_ws(b[p]) && b[p] != b'\n' && b[p] != b'\r' {
        p += 1;
    }
    p
}

/// Returns the charset name declared in the header comment of the raw file
/// content, if there is one. A UTF-8 byte order mark before the `#` is
/// allowed.
pub fn detect_encoding(b: &[u8]) -> Option<String> {
    let ln = b.len();
    let mut p = 0;
    while p < ln && is_latin1_ws(b[p]) {
        p += 1;
    }
    if p == ln {
        return None;
    }
    if b[p] != b'#' {
        if !b[p..].starts_with(b"\xEF\xBB\xBF#") {
            return None;
        }
        p += 3;
    }
    p = skip_non_nl_ws(b, p + 1);

    let word_start = p;
    while p < ln && b[p].is_ascii_alphabetic() {
        p += 1;
    }
    let word = std::str::from_utf8(&b[word_start..p]).ok()?;
    if !ENCODING_HEADER_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word)) {
        return None;
    }

    p = skip_non_nl_ws(b, p);
    if p == ln || b[p] != b':' {
        return None;
    }
    p = skip_non_nl_ws(b, p + 1);

    let name_start = p;
    while p < ln && !is_latin1_ws(b[p]) {
        p += 1;
    }
    if name_start == p {
        return None;
    }
    Some(b[name_start..p].iter().map(|&c| char::from(c)).collect())
}

/// Resolves a charset name to its decoder.
///
/// # Errors
/// * `Error::EncodingError` if the name is not a known charset label
pub fn lookup_encoding(name: &str) -> Result<&'static Encoding> {
    Encoding::for_label(name.trim().as_bytes())
        .ok_or_else(|| Error::EncodingError(name.to_string()))
}

/// Decodes bytes with the named charset. A byte order mark is kept as the
/// `\u{feff}` character, except that plain `UTF-16` uses it to pick the byte
/// order (big-endian when there is none). Malformed sequences are replaced.
///
/// # Errors
/// * `Error::EncodingError` if the charset is unknown
pub fn decode(b: &[u8], encoding_name: &str) -> Result<String> {
    if encoding_name.trim().eq_ignore_ascii_case("UTF-16") {
        let (encoding, body) = match Encoding::for_bom(b) {
            Some((encoding, bom_length)) if encoding != encoding_rs::UTF_8 => {
                (encoding, &b[bom_length..])
            }
            _ => (UTF_16BE, b),
        };
        let (text, _) = encoding.decode_without_bom_handling(body);
        return Ok(text.into_owned());
    }
    let encoding = lookup_encoding(encoding_name)?;
    let (text, _) = encoding.decode_without_bom_handling(b);
    Ok(text.into_owned())
}

/// Loads the content of a TDD file, honoring its `# encoding: NAME` header.
///
/// # Arguments
/// * `b` - Raw file content
/// * `default_encoding` - Charset used when the file has no header
///
/// # Returns
/// * `Result<String>` - Decoded text
///
/// # Errors
/// * `Error::EncodingError` if the charset named by the header or the default is unknown
pub fn load_tdd(b: &[u8], default_encoding: &str) -> Result<String> {
    let encoding = match detect_encoding(b) {
        Some(declared) => {
            debug!("Header declares charset {declared}, overriding {default_encoding}");
            declared
        }
        None => default_encoding.to_string(),
    };
    decode(b, &encoding)
}
