//! File classification
//!
//! Decides, for each file the walker produces, whether to skip it, treat it
//! as markup, or treat it as plain text. Checks run in a fixed priority
//! order; later checks assume the earlier ones already failed.

pub mod magic;

pub use magic::MagicSet;

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::config::CleanConfig;
use crate::stats::Stats;

/// How many leading bytes the markup-likelihood sniff inspects.
const MARKUP_SNIFF_LEN: usize = 128;

/// Routing decision for a single input file. Exactly one per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Extension is in the ignored set.
    SkipExtension,
    /// Header matched a known binary magic signature.
    SkipHeader,
    /// Probably a markup document; goes through fragment extraction.
    Markup,
    /// Listed as always-plain-text; goes through blank-line cleanup.
    PlainText,
    /// Nothing wanted it.
    SkipUnhandled,
}

/// Combines the extension rules, the byte sniffer, and the markup sniff.
pub struct Classifier {
    ignored: HashSet<String>,
    plain_text: HashSet<String>,
    markup: HashSet<String>,
    magic: MagicSet,
}

impl Classifier {
    pub fn from_config(config: &CleanConfig) -> Result<Self> {
        Ok(Self {
            ignored: normalized_ext_set(&config.extensions.ignored),
            plain_text: normalized_ext_set(&config.extensions.plain_text),
            markup: normalized_ext_set(&config.extensions.markup),
            magic: MagicSet::from_hex(&config.magic_signatures)?,
        })
    }

    /// Lowercased extension without the leading dot; empty if the file has none.
    pub fn extension_of(path: &Path) -> String {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Classifies one file and records the decision in `stats`.
    pub fn classify(&self, path: &Path, stats: &mut Stats) -> Classification {
        stats.total_files += 1;

        let ext = Self::extension_of(path);
        let decision = self.decide(path, &ext);
        match decision {
            Classification::SkipExtension => {
                stats.skipped_files += 1;
                stats.skipped_by_ext += 1;
            }
            Classification::SkipHeader => {
                stats.skipped_files += 1;
                stats.skipped_by_header += 1;
            }
            Classification::SkipUnhandled => {
                stats.skipped_files += 1;
            }
            Classification::Markup | Classification::PlainText => {}
        }
        debug!(path = %path.display(), ?decision, "classified");
        decision
    }

    fn decide(&self, path: &Path, ext: &str) -> Classification {
        if self.ignored.contains(ext) {
            return Classification::SkipExtension;
        }
        if self.magic.matches_file(path) {
            return Classification::SkipHeader;
        }
        if self.probably_markup(path, ext) {
            return Classification::Markup;
        }
        if self.plain_text.contains(ext) {
            return Classification::PlainText;
        }
        Classification::SkipUnhandled
    }

    /// Markup by known extension, or by a document that opens with `<?xml`
    /// or an angle bracket within its first bytes.
    fn probably_markup(&self, path: &Path, ext: &str) -> bool {
        if self.markup.contains(ext) {
            return true;
        }

        let mut head = [0u8; MARKUP_SNIFF_LEN];
        let read = match File::open(path).and_then(|mut file| file.read(&mut head)) {
            Ok(n) => n,
            Err(_) => return false,
        };
        let text = String::from_utf8_lossy(&head[..read]);
        let trimmed = text.trim_start();
        trimmed.starts_with("<?xml") || trimmed.starts_with('<')
    }
}

/// Normalizes an extension for lookups: trimmed, lowercased, no leading dot.
pub fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn normalized_ext_set(items: &[String]) -> HashSet<String> {
    items.iter().map(|item| normalize_ext(item)).collect()
}
