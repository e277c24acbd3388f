//! Decoding of the EXIF `UserComment` field.
//!
//! The field starts with an 8-byte character code followed by the comment
//! itself. The comment is not necessarily NUL-terminated; its length is the
//! entry length minus the character code.

use crate::directory::{raw_bytes, Format, TagDirectory};
use crate::error::{ExifError, MetadataWarning};
use crate::ifd::Ifd;
use encoding_rs::{Encoding, ISO_2022_JP, UTF_16BE, UTF_16LE};
use exif::Tag;
use log::warn;
use std::borrow::Cow;

/// Width of the character code that prefixes the comment.
pub const ENCODING_MARKER_LEN: usize = 8;

/// Character code of a user comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentEncoding {
    Ascii,
    Unicode,
    Jis,
    Undefined,
}

impl CommentEncoding {
    const MARKERS: [(&'static [u8; ENCODING_MARKER_LEN], CommentEncoding); 4] = [
        (b"ASCII\0\0\0", CommentEncoding::Ascii),
        (b"UNICODE\0", CommentEncoding::Unicode),
        (b"JIS\0\0\0\0\0", CommentEncoding::Jis),
        (b"\0\0\0\0\0\0\0\0", CommentEncoding::Undefined),
    ];

    /// Matches the first eight bytes verbatim against the known codes.
    pub fn from_marker(marker: &[u8]) -> Option<CommentEncoding> {
        Self::MARKERS
            .iter()
            .find(|(code, _)| code.as_slice() == marker)
            .map(|(_, encoding)| *encoding)
    }
}

/// The user comment of the EXIF directory as UTF-8 text.
///
/// `Ok(None)` when the directory carries no user comment.
pub fn user_comment(dir: &TagDirectory) -> Result<Option<String>, MetadataWarning> {
    let Some(entry) = dir.get(Ifd::Exif, Tag::UserComment) else {
        return Ok(None);
    };

    // Undefined is what the standard asks for, but some manufacturers use Ascii.
    match Format::of(&entry.value) {
        Format::Undefined => {}
        Format::Ascii => {
            warn!("EXIF user comment is stored as Ascii, it should be marked as Undefined data")
        }
        format => {
            return Err(MetadataWarning::InvalidUserCommentFormat {
                format: format.name(),
            })
        }
    }

    let mut raw = raw_bytes(&entry.value).unwrap_or_default();
    if Format::of(&entry.value) == Format::Ascii && has_synthetic_terminator(&raw) {
        raw.to_mut().pop();
    }
    decode(&raw, dir.little_endian()).map(Some)
}

// ASCII values come back split on NUL, and rejoining them always ends in a
// terminator whether the entry had one or not. An odd-length payload ending
// in NUL got one byte more than was stored, which would break UTF-16.
fn has_synthetic_terminator(raw: &[u8]) -> bool {
    raw.len() > ENCODING_MARKER_LEN
        && (raw.len() - ENCODING_MARKER_LEN) % 2 == 1
        && raw.last() == Some(&0)
}

/// Decodes a raw user comment (character code plus payload) to UTF-8.
///
/// UTF-16 payloads honour a byte order mark and otherwise follow the byte
/// order of the directory. Text ends at the first NUL character. Invalid
/// byte sequences are rejected, never replaced.
pub fn decode(raw: &[u8], little_endian: bool) -> Result<String, MetadataWarning> {
    if raw.len() <= ENCODING_MARKER_LEN {
        return Err(MetadataWarning::UserCommentTooShort {
            len: raw.len(),
            min: ENCODING_MARKER_LEN,
        });
    }

    let (marker, payload) = raw.split_at(ENCODING_MARKER_LEN);
    let encoding = CommentEncoding::from_marker(marker).ok_or_else(|| {
        let mut code = [0u8; ENCODING_MARKER_LEN];
        code.copy_from_slice(marker);
        MetadataWarning::UnknownUserCommentEncoding { marker: code }
    })?;

    let text = match encoding {
        CommentEncoding::Ascii | CommentEncoding::Undefined => {
            let bytes = until_nul(payload);
            std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| MetadataWarning::UserCommentConversion { encoding: "UTF-8" })?
        }
        CommentEncoding::Unicode => decode_utf16(payload, little_endian)?,
        CommentEncoding::Jis => strict_decode(ISO_2022_JP, until_nul(payload))?,
    };

    Ok(text.into_owned())
}

fn decode_utf16(payload: &[u8], little_endian: bool) -> Result<Cow<'_, str>, MetadataWarning> {
    let (encoding, body) = match payload {
        [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
        [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
        _ if little_endian => (UTF_16LE, payload),
        _ => (UTF_16BE, payload),
    };

    // Cut at the first NUL code unit so padding after it is never decoded.
    let end = body
        .chunks_exact(2)
        .position(|unit| unit == [0, 0])
        .map_or(body.len(), |i| i * 2);

    strict_decode(encoding, &body[..end])
}

fn strict_decode<'a>(
    encoding: &'static Encoding,
    bytes: &'a [u8],
) -> Result<Cow<'a, str>, MetadataWarning> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(MetadataWarning::UserCommentConversion {
            encoding: encoding.name(),
        })
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Re-encodes UTF-8 text into the caller's text encoding.
///
/// Fails when a character has no representation in `target`, or when
/// `target` cannot be produced by an encoder at all (UTF-16 variants).
pub fn encode_for(text: &str, target: &'static Encoding) -> Result<Vec<u8>, ExifError> {
    let (bytes, used, had_errors) = target.encode(text);
    if had_errors || used != target {
        return Err(ExifError::Encoding {
            encoding: target.name(),
        });
    }
    Ok(bytes.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{ascii, field};
    use assert_matches::assert_matches;
    use encoding_rs::{SHIFT_JIS, UTF_8, WINDOWS_1251};
    use exif::Value;

    fn with_marker(marker: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut raw = marker.to_vec();
        raw.extend_from_slice(payload);
        raw
    }

    fn utf16(text: &str, little_endian: bool) -> Vec<u8> {
        text.encode_utf16()
            .flat_map(|unit| {
                if little_endian {
                    unit.to_le_bytes()
                } else {
                    unit.to_be_bytes()
                }
            })
            .collect()
    }

    #[test]
    fn test_marker_matching_is_fixed_width() {
        assert_eq!(
            CommentEncoding::from_marker(b"ASCII\0\0\0"),
            Some(CommentEncoding::Ascii)
        );
        assert_eq!(
            CommentEncoding::from_marker(b"UNICODE\0"),
            Some(CommentEncoding::Unicode)
        );
        assert_eq!(
            CommentEncoding::from_marker(b"JIS\0\0\0\0\0"),
            Some(CommentEncoding::Jis)
        );
        assert_eq!(
            CommentEncoding::from_marker(&[0; 8]),
            Some(CommentEncoding::Undefined)
        );
        assert_eq!(CommentEncoding::from_marker(b"ASCII\0\0x"), None);
        assert_eq!(CommentEncoding::from_marker(b"ascii\0\0\0"), None);
        assert_eq!(CommentEncoding::from_marker(&[0xFF; 8]), None);
    }

    #[test]
    fn test_ascii_payload_without_terminator() {
        let raw = with_marker(b"ASCII\0\0\0", b"Sunset");
        assert_eq!(decode(&raw, false).unwrap(), "Sunset");
    }

    #[test]
    fn test_ascii_payload_stops_at_nul() {
        let raw = with_marker(b"ASCII\0\0\0", b"Sunset\0\xff\xfe garbage");
        assert_eq!(decode(&raw, false).unwrap(), "Sunset");
    }

    #[test]
    fn test_undefined_marker_passes_utf8_through() {
        let raw = with_marker(&[0; 8], "Привет".as_bytes());
        assert_eq!(decode(&raw, true).unwrap(), "Привет");
    }

    #[test]
    fn test_unicode_follows_byte_order() {
        let raw = with_marker(b"UNICODE\0", &utf16("test", true));
        assert_eq!(decode(&raw, true).unwrap(), "test");

        let raw = with_marker(b"UNICODE\0", &utf16("test", false));
        assert_eq!(decode(&raw, false).unwrap(), "test");
    }

    #[test]
    fn test_unicode_bom_overrides_byte_order() {
        let mut payload = vec![0xFF, 0xFE];
        payload.extend(utf16("日本", true));
        let raw = with_marker(b"UNICODE\0", &payload);
        assert_eq!(decode(&raw, false).unwrap(), "日本");
    }

    #[test]
    fn test_unicode_stops_at_nul_unit() {
        let mut payload = utf16("ok", true);
        payload.extend_from_slice(&[0, 0, 0x00, 0xD8]); // lone surrogate after NUL
        let raw = with_marker(b"UNICODE\0", &payload);
        assert_eq!(decode(&raw, true).unwrap(), "ok");
    }

    #[test]
    fn test_unicode_invalid_sequence() {
        let mut payload = utf16("a", true);
        payload.extend_from_slice(&[0x00, 0xD8]); // unpaired high surrogate
        let raw = with_marker(b"UNICODE\0", &payload);
        assert_matches!(
            decode(&raw, true),
            Err(MetadataWarning::UserCommentConversion { .. })
        );

        let raw = with_marker(b"UNICODE\0", b"abc");
        assert_matches!(
            decode(&raw, true),
            Err(MetadataWarning::UserCommentConversion { .. })
        );
    }

    #[test]
    fn test_jis_payload() {
        // "日本" in ISO-2022-JP
        let payload = b"\x1b$BF|K\\\x1b(B";
        let raw = with_marker(b"JIS\0\0\0\0\0", payload);
        assert_eq!(decode(&raw, false).unwrap(), "日本");
    }

    #[test]
    fn test_jis_invalid_sequence() {
        let raw = with_marker(b"JIS\0\0\0\0\0", b"\x1b$B\xff\xff");
        assert_matches!(
            decode(&raw, false),
            Err(MetadataWarning::UserCommentConversion { .. })
        );
    }

    #[test]
    fn test_unknown_marker() {
        let raw = with_marker(&[0xFF; 8], b"text");
        assert_matches!(
            decode(&raw, false),
            Err(MetadataWarning::UnknownUserCommentEncoding { marker }) if marker == [0xFF; 8]
        );
    }

    #[test]
    fn test_too_short() {
        assert_matches!(
            decode(b"ASCII\0\0\0", false),
            Err(MetadataWarning::UserCommentTooShort { len: 8, min: 8 })
        );
        assert_matches!(
            decode(b"", false),
            Err(MetadataWarning::UserCommentTooShort { len: 0, .. })
        );
    }

    #[test]
    fn test_user_comment_entry_formats() {
        let dir = TagDirectory::from_fields(
            false,
            vec![field(
                Tag::UserComment,
                Value::Undefined(b"ASCII\0\0\0hello".to_vec(), 0),
            )],
        );
        assert_eq!(user_comment(&dir), Ok(Some("hello".to_string())));

        // Tolerated: the comment stored as Ascii.
        let dir = TagDirectory::from_fields(
            false,
            vec![field(
                Tag::UserComment,
                Value::Ascii(vec![b"ASCII".to_vec(), vec![], vec![], b"hello".to_vec()]),
            )],
        );
        assert_eq!(user_comment(&dir), Ok(Some("hello".to_string())));

        let dir = TagDirectory::from_fields(
            false,
            vec![field(Tag::UserComment, Value::Short(vec![1, 2, 3, 4, 5]))],
        );
        assert_matches!(
            user_comment(&dir),
            Err(MetadataWarning::InvalidUserCommentFormat { format: "Short" })
        );
    }

    // Splits stored bytes the way the directory parser does for ASCII values.
    fn stored_as_ascii(bytes: &[u8]) -> Value {
        let mut strings: Vec<Vec<u8>> = bytes.split(|&b| b == 0).map(<[u8]>::to_vec).collect();
        if strings.last().is_some_and(Vec::is_empty) {
            strings.pop();
        }
        Value::Ascii(strings)
    }

    #[test]
    fn test_ascii_stored_unicode_comment() {
        let stored = with_marker(b"UNICODE\0", &utf16("test", false));
        assert_eq!(decode(&stored, false).unwrap(), "test");

        let dir = TagDirectory::from_fields(
            false,
            vec![field(Tag::UserComment, stored_as_ascii(&stored))],
        );
        assert_eq!(user_comment(&dir), Ok(Some("test".to_string())));

        let stored = with_marker(b"UNICODE\0", &utf16("ok", true));
        let dir = TagDirectory::from_fields(
            true,
            vec![field(Tag::UserComment, stored_as_ascii(&stored))],
        );
        assert_eq!(user_comment(&dir), Ok(Some("ok".to_string())));
    }

    #[test]
    fn test_ascii_stored_comment_with_terminator() {
        let stored = b"ASCII\0\0\0hello\0";
        let dir = TagDirectory::from_fields(
            false,
            vec![field(Tag::UserComment, stored_as_ascii(stored))],
        );
        assert_eq!(user_comment(&dir), Ok(Some("hello".to_string())));
    }

    #[test]
    fn test_user_comment_absent() {
        let dir = TagDirectory::from_fields(false, vec![field(Tag::Make, ascii("Canon"))]);
        assert_eq!(user_comment(&dir), Ok(None));
    }

    #[test]
    fn test_encode_for_target() {
        assert_eq!(encode_for("héllo", UTF_8).unwrap(), "héllo".as_bytes());
        assert_eq!(
            encode_for("Привет", WINDOWS_1251).unwrap(),
            vec![0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]
        );
        assert_matches!(
            encode_for("Привет", SHIFT_JIS).map(|b| b.is_empty()),
            Ok(false)
        );
        assert_matches!(
            encode_for("日本", WINDOWS_1251),
            Err(ExifError::Encoding { encoding: "windows-1251" })
        );
        assert_matches!(
            encode_for("text", UTF_16LE),
            Err(ExifError::Encoding { .. })
        );
    }
}
