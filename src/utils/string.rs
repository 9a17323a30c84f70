/// Joins string-likes with a separator.
pub fn join<S: AsRef<str>>(parts: &[S], separator: &str) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Strips emoji from the head of a remark. Emoji in the basic plane are
/// encoded as four UTF-8 bytes led by `F0 9F`; repeated leading sequences
/// are removed one at a time.
pub fn remove_emoji(remark: &str) -> String {
    let mut bytes = remark.as_bytes();
    while bytes.len() >= 4 && bytes[0] == 0xF0 && bytes[1] == 0x9F {
        bytes = &bytes[4..];
    }
    String::from_utf8_lossy(bytes).into_owned()
}
