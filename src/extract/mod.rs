//! Content extraction
//!
//! Everything between a classified file and its cleaned output: blank-line
//! normalization, base64 payload decoding, and the markup fragment walk.

pub mod markup;
pub mod payload;
pub mod text;

pub use markup::FragmentExtractor;
pub use payload::decode_payload;
pub use text::{decode_text, strip_blank_lines};
