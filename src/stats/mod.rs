//! Processing statistics
//!
//! A flat counter bag threaded by mutable reference through classification
//! and extraction. Counters start at zero, only increase, and are read once
//! at the end of a run. Parallel workers accumulate into private `Stats`
//! values that are folded together with [`Stats::merge`].

/// Counters for one processing run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Every file the walker produced, regardless of outcome.
    pub total_files: usize,
    /// Files routed through markup extraction or plain-text cleanup.
    pub processed_files: usize,
    /// Files dropped for any reason.
    pub skipped_files: usize,
    /// Subset of skipped files dropped by extension.
    pub skipped_by_ext: usize,
    /// Subset of skipped files dropped by magic header.
    pub skipped_by_header: usize,
    /// Files that went through the markup extractor.
    pub markup_files: usize,
    /// Payload fragments that decoded to usable text.
    pub payload_decoded_text: usize,
    /// Payload fragments that were binary or failed to decode.
    pub payload_binary_or_failed: usize,
    /// Lines of code collected from the code-bearing tag, after cleanup.
    pub code_lines: usize,
}

impl Stats {
    /// Folds another counter set into this one.
    pub fn merge(&mut self, other: &Stats) {
        self.total_files += other.total_files;
        self.processed_files += other.processed_files;
        self.skipped_files += other.skipped_files;
        self.skipped_by_ext += other.skipped_by_ext;
        self.skipped_by_header += other.skipped_by_header;
        self.markup_files += other.markup_files;
        self.payload_decoded_text += other.payload_decoded_text;
        self.payload_binary_or_failed += other.payload_binary_or_failed;
        self.code_lines += other.code_lines;
    }
}
