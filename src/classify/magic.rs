//! Magic-header detection for binary files that slip past the extension rules.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// An ordered set of leading byte signatures.
///
/// A file matches when its header starts with any signature; order never
/// changes the outcome, only the bounded read length (the longest signature).
#[derive(Debug, Clone)]
pub struct MagicSet {
    signatures: Vec<Vec<u8>>,
    max_len: usize,
}

impl MagicSet {
    /// Builds the set from hex-encoded signature strings (whitespace allowed).
    pub fn from_hex(specs: &[String]) -> Result<Self> {
        let mut signatures = Vec::with_capacity(specs.len());
        for spec in specs {
            let compact: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
            if compact.is_empty() {
                bail!("magic signature must not be empty");
            }
            let bytes = hex::decode(&compact)
                .with_context(|| format!("invalid magic signature hex: {spec:?}"))?;
            signatures.push(bytes);
        }
        let max_len = signatures.iter().map(Vec::len).max().unwrap_or(0);
        Ok(Self {
            signatures,
            max_len,
        })
    }

    /// True iff the header starts with at least one signature.
    pub fn matches(&self, header: &[u8]) -> bool {
        !header.is_empty() && self.signatures.iter().any(|sig| header.starts_with(sig))
    }

    /// Reads at most `max_len` leading bytes and tests them.
    ///
    /// Unreadable or short files simply cannot match; this never errors.
    pub fn matches_file(&self, path: &Path) -> bool {
        if self.max_len == 0 {
            return false;
        }
        let mut header = vec![0u8; self.max_len];
        let read = match File::open(path).and_then(|mut file| file.read(&mut header)) {
            Ok(n) => n,
            Err(_) => return false,
        };
        self.matches(&header[..read])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn gif_png_jpeg() -> MagicSet {
        MagicSet::from_hex(&[
            "4749463839".to_string(),           // GIF89
            "89504E47".to_string(),             // PNG
            "FFD8FFE000104A464946".to_string(), // JPEG JFIF
        ])
        .unwrap()
    }

    #[test]
    fn test_header_matches_any_signature() {
        let magic = gif_png_jpeg();
        assert!(magic.matches(b"GIF89a...."));
        assert!(magic.matches(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a]));
        assert!(!magic.matches(b"<?xml version=\"1.0\"?>"));
    }

    #[test]
    fn test_short_header_cannot_match_longer_signature() {
        let magic = gif_png_jpeg();
        assert!(!magic.matches(b"GIF8"));
        assert!(!magic.matches(b""));
    }

    #[test]
    fn test_matches_file_reads_bounded_header() {
        let temp_dir = TempDir::new().unwrap();
        let gif = temp_dir.path().join("image.form");
        fs::write(&gif, b"GIF89a trailing data that is never read").unwrap();
        let text = temp_dir.path().join("code.lss");
        fs::write(&text, b"Dim x As Integer").unwrap();

        let magic = gif_png_jpeg();
        assert!(magic.matches_file(&gif));
        assert!(!magic.matches_file(&text));
    }

    #[test]
    fn test_unreadable_file_never_matches() {
        let magic = gif_png_jpeg();
        assert!(!magic.matches_file(std::path::Path::new("/nonexistent/nope.gif")));
    }

    #[test]
    fn test_empty_set_never_matches() {
        let magic = MagicSet::from_hex(&[]).unwrap();
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("any");
        fs::write(&file, b"GIF89a").unwrap();
        assert!(!magic.matches_file(&file));
    }

    #[test]
    fn test_invalid_hex_is_a_config_error() {
        assert!(MagicSet::from_hex(&["zz".to_string()]).is_err());
        assert!(MagicSet::from_hex(&["".to_string()]).is_err());
        assert!(MagicSet::from_hex(&["FFD".to_string()]).is_err());
    }
}
