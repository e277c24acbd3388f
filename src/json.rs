use crate::directory::TagDirectory;
use crate::render::render_bounded;
use crate::tags::tag_name;
use serde_json::{Map, Value};

/// Escapes `"`, `\`, `/` and the control characters JSON has short escapes
/// for. Everything else, including multi-byte UTF-8, passes through as is.
///
/// Not idempotent: apply exactly once.
pub fn escape_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '/' => out.push_str("\\/"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Serializes every entry as `"Name" : "value"` inside one JSON object.
///
/// Directories are walked in scan order and entries in storage order, so a
/// tag present in several directories appears once per directory. Values
/// are rendered, cut to `max_len` bytes, then escaped. Returns `None` for a
/// directory set without entries.
pub fn tags_json(dir: &TagDirectory, max_len: usize) -> Option<String> {
    if dir.is_empty() {
        return None;
    }

    let little_endian = dir.little_endian();
    let items: Vec<String> = dir
        .iter()
        .map(|(_, field)| {
            let value = render_bounded(field, little_endian, max_len);
            format!(" \"{}\" : \"{}\"", tag_name(field.tag), escape_json(&value))
        })
        .collect();

    Some(format!("{{\n{}\n}}", items.join(",\n")))
}

/// Tag name to rendered value. The first occurrence of a name wins, using
/// the same directory order as the tag locator.
pub fn tag_map(dir: &TagDirectory, max_len: usize) -> Map<String, Value> {
    let little_endian = dir.little_endian();
    let mut map = Map::new();
    for (_, field) in dir.iter() {
        map.entry(tag_name(field.tag))
            .or_insert_with(|| Value::String(render_bounded(field, little_endian, max_len)));
    }
    map
}
