//! Whitespace normalization shared by plain-text files and markup fragments.

/// Drops blank and whitespace-only lines, preserving the order of the rest.
///
/// Splits on line feeds; a trailing carriage return on a kept line is
/// removed, so CRLF input comes out LF-joined. Idempotent.
pub fn strip_blank_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decodes bytes as UTF-8, falling back to a one-byte-per-char Latin-1 view
/// that cannot fail.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
    }
}
