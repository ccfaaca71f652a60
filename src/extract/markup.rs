//! Markup fragment extraction
//!
//! Walks a DXL/XML document in depth-first pre-order and keeps only the
//! text of the interesting tags, honoring the global and per-extension
//! block lists. The payload tag is special-cased through the base64
//! decoder. Malformed documents fall back to the original text untouched.

use std::collections::{HashMap, HashSet};

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::classify::normalize_ext;
use crate::config::CleanConfig;
use crate::stats::Stats;

use super::payload::decode_payload;
use super::text::strip_blank_lines;

/// Extracts the interesting fragments out of one markup document.
pub struct FragmentExtractor {
    interesting: HashSet<String>,
    payload_tag: String,
    code_tag: String,
    blocked: HashSet<String>,
    blocked_by_ext: HashMap<String, HashSet<String>>,
}

/// Traversal state for one open element.
struct Frame {
    local: String,
    /// Direct text: text events seen before the first child element.
    text: String,
    seen_child: bool,
    collected: bool,
}

impl Frame {
    fn new(local: String) -> Self {
        Self {
            local,
            text: String::new(),
            seen_child: false,
            collected: false,
        }
    }
}

/// Counter deltas buffered until the walk is known to have succeeded, so a
/// late parse failure leaves no trace in the shared stats.
#[derive(Default)]
struct WalkTally {
    payload_decoded_text: usize,
    payload_binary_or_failed: usize,
    code_lines: usize,
}

impl FragmentExtractor {
    pub fn from_config(config: &CleanConfig) -> Self {
        let tags = &config.tags;
        Self {
            interesting: tags.interesting.iter().map(|t| t.trim().to_string()).collect(),
            payload_tag: tags.payload.trim().to_string(),
            code_tag: tags.code_bearing.trim().to_string(),
            blocked: tags.blocked.iter().map(|t| t.trim().to_string()).collect(),
            blocked_by_ext: tags
                .blocked_by_extension
                .iter()
                .map(|(ext, list)| {
                    (
                        normalize_ext(ext),
                        list.iter().map(|t| t.trim().to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Reduces a markup document to its interesting fragments, joined by
    /// single line feeds, and folds the outcome counters into `stats`.
    ///
    /// A document that does not parse comes back verbatim with zero
    /// fragments collected and no counter updates.
    pub fn extract(&self, markup_text: &str, ext: &str, stats: &mut Stats) -> String {
        match self.walk(markup_text, ext) {
            Some((fragments, tally)) => {
                stats.payload_decoded_text += tally.payload_decoded_text;
                stats.payload_binary_or_failed += tally.payload_binary_or_failed;
                stats.code_lines += tally.code_lines;
                fragments.join("\n")
            }
            None => {
                debug!(ext, "markup did not parse, keeping original text");
                markup_text.to_string()
            }
        }
    }

    /// Streaming pre-order traversal. `None` means parse failure.
    ///
    /// quick-xml accepts fragments a document parser would reject, so the
    /// well-formedness a DOM build would enforce is checked here: exactly
    /// one root element, no stray top-level text, nothing open at EOF.
    fn walk(&self, markup_text: &str, ext: &str) -> Option<(Vec<String>, WalkTally)> {
        let mut reader = Reader::from_str(markup_text);
        reader.trim_text(false);

        let mut stack: Vec<Frame> = Vec::new();
        let mut fragments: Vec<String> = Vec::new();
        let mut tally = WalkTally::default();
        let mut root_closed = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if stack.is_empty() && root_closed {
                        return None; // content after the document element
                    }
                    self.enter_child(&mut stack, ext, &mut fragments, &mut tally);
                    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    stack.push(Frame::new(local));
                }
                Ok(Event::Empty(_)) => {
                    // No direct text, so nothing to collect from it; it still
                    // ends the parent's direct text like any other child.
                    if stack.is_empty() {
                        if root_closed {
                            return None;
                        }
                        root_closed = true;
                    } else {
                        self.enter_child(&mut stack, ext, &mut fragments, &mut tally);
                    }
                }
                Ok(Event::End(_)) => {
                    let mut frame = stack.pop()?;
                    self.collect(&mut frame, ext, &mut fragments, &mut tally);
                    if stack.is_empty() {
                        root_closed = true;
                    }
                }
                Ok(Event::Text(t)) => {
                    let Ok(text) = t.unescape() else {
                        return None;
                    };
                    match stack.last_mut() {
                        Some(frame) if !frame.seen_child => frame.text.push_str(&text),
                        Some(_) => {}
                        None if !text.trim().is_empty() => return None, // text outside the root
                        None => {}
                    }
                }
                Ok(Event::CData(t)) => {
                    let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                    match stack.last_mut() {
                        Some(frame) if !frame.seen_child => frame.text.push_str(&text),
                        Some(_) => {}
                        None if !text.trim().is_empty() => return None,
                        None => {}
                    }
                }
                Ok(Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(_) => return None,
            }
        }

        if !stack.is_empty() || !root_closed {
            return None; // unclosed elements, or no root element at all
        }
        Some((fragments, tally))
    }

    /// Called when an element gains its first child: the parent's direct
    /// text is complete, so its fragment is emitted ahead of the children,
    /// which is exactly the pre-order position.
    fn enter_child(
        &self,
        stack: &mut [Frame],
        ext: &str,
        fragments: &mut Vec<String>,
        tally: &mut WalkTally,
    ) {
        if let Some(parent) = stack.last_mut() {
            if !parent.seen_child {
                parent.seen_child = true;
                self.collect(parent, ext, fragments, tally);
            }
        }
    }

    fn collect(
        &self,
        frame: &mut Frame,
        ext: &str,
        fragments: &mut Vec<String>,
        tally: &mut WalkTally,
    ) {
        if frame.collected {
            return;
        }
        frame.collected = true;

        let local = frame.local.as_str();
        if self.is_blocked(local, ext) || !self.interesting.contains(local) {
            return;
        }

        let text = std::mem::take(&mut frame.text);
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if local == self.payload_tag {
            match decode_payload(text) {
                Some(decoded) => {
                    tally.payload_decoded_text += 1;
                    fragments.push(strip_blank_lines(&decoded));
                }
                None => tally.payload_binary_or_failed += 1,
            }
        } else {
            let cleaned = strip_blank_lines(text);
            if cleaned.is_empty() {
                return;
            }
            if local == self.code_tag {
                tally.code_lines += cleaned.lines().count();
            }
            fragments.push(cleaned);
        }
    }

    fn is_blocked(&self, local: &str, ext: &str) -> bool {
        self.blocked.contains(local)
            || self
                .blocked_by_ext
                .get(ext)
                .is_some_and(|set| set.contains(local))
    }
}
