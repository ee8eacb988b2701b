//! Byte-to-text decoding for table and message files.

use std::borrow::Cow;

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Resolves a WHATWG encoding label such as `utf-8`, `latin1` or `euc-jp`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))
}

/// Decodes `bytes`, sniffing a BOM first. Malformed sequences become U+FFFD.
pub fn decode_bytes<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Cow<'a, str> {
    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!("encoding errors while decoding {} input", used.name());
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_labels() {
        assert_eq!(encoding_for_label("utf-8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(encoding_for_label(" latin1 ").unwrap(), encoding_rs::WINDOWS_1252);
        assert_eq!(encoding_for_label("EUC-JP").unwrap(), encoding_rs::EUC_JP);
    }

    #[test]
    fn unknown_label_is_an_error() {
        let err = encoding_for_label("morse-8").unwrap_err();
        assert!(matches!(err, Error::UnknownEncoding(ref l) if l == "morse-8"));
    }

    #[test]
    fn decodes_latin1_bytes() {
        // "É:..-.." in windows-1252
        let bytes = b"\xC9:..-..";
        assert_eq!(decode_bytes(bytes, encoding_rs::WINDOWS_1252), "É:..-..");
    }

    #[test]
    fn strips_utf8_bom() {
        let bytes = b"\xEF\xBB\xBFA:.-";
        assert_eq!(decode_bytes(bytes, encoding_rs::UTF_8), "A:.-");
    }

    #[test]
    fn replaces_malformed_utf8() {
        let bytes = b"A:\xFF";
        assert_eq!(decode_bytes(bytes, encoding_rs::UTF_8), "A:\u{FFFD}");
    }
}
