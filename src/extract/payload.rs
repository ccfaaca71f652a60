//! Base64 payload decoding with a binary-vs-text heuristic.
//!
//! Raw item payloads carry base64 data that may be source text or an opaque
//! binary object. Only payloads that decode cleanly and look like text are
//! kept; everything else is reported as "no output", never as an error.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::text::decode_text;

/// How many decoded bytes the binary heuristic inspects.
const SNIFF_WINDOW: usize = 64;
/// Control-byte ratio above which the payload is treated as binary.
const BINARY_RATIO: f64 = 0.30;

/// Decodes a base64 payload fragment into normalized text.
///
/// Returns `None` for empty input, invalid base64, empty decodes, payloads
/// the heuristic judges binary, and payloads that normalize to nothing.
/// Line endings are normalized to `\n` and the result is trimmed.
pub fn decode_payload(raw: &str) -> Option<String> {
    let clean: String = raw.split_whitespace().collect();
    if clean.is_empty() {
        return None;
    }

    let decoded = STANDARD.decode(clean.as_bytes()).ok()?;
    if decoded.is_empty() || looks_binary(&decoded) {
        return None;
    }

    let text = decode_text(decoded);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// True when too many of the first bytes are null or control characters
/// (tab, line feed, and the CR-adjacent range stay allowed).
fn looks_binary(decoded: &[u8]) -> bool {
    let head = &decoded[..decoded.len().min(SNIFF_WINDOW)];
    if head.is_empty() {
        return false;
    }
    let control = head
        .iter()
        .filter(|&&b| b < 9 || (14..32).contains(&b))
        .count();
    control as f64 / head.len() as f64 > BINARY_RATIO
}
