use crate::user_comment;
use crate::utils::truncate_utf8;
use exif::{Field, Tag, Value};
use log::debug;

/// Human-readable text for one entry, independent of its storage format.
pub fn render(field: &Field, little_endian: bool) -> String {
    match &field.value {
        Value::Ascii(strings) => strings
            .iter()
            .map(|s| String::from_utf8_lossy(s))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Undefined(bytes, _) if field.tag == Tag::UserComment => {
            user_comment::decode(bytes, little_endian)
                .unwrap_or_else(|_| field.display_value().to_string())
        }
        _ => field.display_value().to_string(),
    }
}

/// Like [`render`], cut to at most `max_len` bytes.
pub fn render_bounded(field: &Field, little_endian: bool, max_len: usize) -> String {
    let mut text = render(field, little_endian);
    if text.len() > max_len {
        debug!(
            "Truncating {} value from {} to {} bytes",
            field.tag,
            text.len(),
            max_len
        );
        truncate_utf8(&mut text, max_len);
    }
    text
}
