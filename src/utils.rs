/// Shortens `text` to at most `max_len` bytes without splitting a character.
pub fn truncate_utf8(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
