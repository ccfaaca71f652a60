//! Post-run reporting
//!
//! Renders the run statistics, a line census of the export tree, and a
//! file count for selected subdirectories of the input root. Pure
//! reads; nothing here feeds back into processing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ignore::WalkBuilder;

use crate::cli::Output;
use crate::stats::Stats;

/// Renders the final statistics snapshot.
pub fn print_stats(stats: &Stats, output: &Output) {
    output.header("Processing statistics");
    output.summary_stats("Total files", stats.total_files);
    output.summary_stats("Processed", stats.processed_files);
    output.summary_stats("Skipped", stats.skipped_files);
    output.summary_stats("  by extension", stats.skipped_by_ext);
    output.summary_stats("  by header", stats.skipped_by_header);
    output.summary_stats("Markup files", stats.markup_files);
    output.summary_stats("Payloads decoded as text", stats.payload_decoded_text);
    output.summary_stats("Payloads binary/failed", stats.payload_binary_or_failed);
    output.summary_stats("Code lines (after cleanup)", stats.code_lines);
}

/// File and line totals over the export tree.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LineReport {
    pub total_files: usize,
    pub total_lines: usize,
    pub lines_by_ext: HashMap<String, usize>,
}

/// Counts files and lines below `export_root`. `None` when the export
/// directory does not exist (nothing was produced).
pub fn analyze_export(export_root: &Path) -> Option<LineReport> {
    if !export_root.is_dir() {
        return None;
    }

    let mut report = LineReport::default();
    let walker = WalkBuilder::new(export_root)
        .standard_filters(false)
        .follow_links(false)
        .build();
    for entry in walker.flatten() {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        report.total_files += 1;

        let ext = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "<noext>".to_string());
        let lines = count_file_lines(entry.path());
        report.total_lines += lines;
        *report.lines_by_ext.entry(ext).or_insert(0) += lines;
    }
    Some(report)
}

/// Prints the export line analysis, optionally broken down by extension
/// (sorted by descending line count, then name).
pub fn print_line_analysis(export_root: &Path, by_extension: bool, output: &Output) {
    output.header("Export line analysis");

    let Some(report) = analyze_export(export_root) else {
        output.warning(&format!(
            "export directory does not exist: {}",
            export_root.display()
        ));
        return;
    };

    output.table_row("Export root", &export_root.display().to_string());
    output.summary_stats("Files", report.total_files);
    output.summary_stats("Total lines", report.total_lines);

    if by_extension && !report.lines_by_ext.is_empty() {
        let mut breakdown: Vec<_> = report.lines_by_ext.iter().collect();
        breakdown.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        output.info("Lines by extension:");
        for (ext, lines) in breakdown {
            let label = if ext.starts_with('<') {
                format!("  {ext}")
            } else {
                format!("  .{ext}")
            };
            output.summary_stats(&label, *lines);
        }
    }
}

/// Counts the direct (non-recursive) files of each configured subdirectory
/// of the input root; a missing directory counts zero.
pub fn print_source_census(source_root: &Path, count_dirs: &[String], output: &Output) {
    if count_dirs.is_empty() {
        return;
    }
    output.header("Files in selected source directories");
    for rel_dir in count_dirs {
        let count = count_direct_files(&source_root.join(rel_dir));
        output.summary_stats(rel_dir, count);
    }
}

fn count_direct_files(dir: &Path) -> usize {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
            .count(),
        Err(_) => 0,
    }
}

/// Counts lines the way a lenient text read would: a trailing newline does
/// not open a new line, and unreadable files count zero.
fn count_file_lines(path: &Path) -> usize {
    match fs::read(path) {
        Ok(data) if data.is_empty() => 0,
        Ok(data) => {
            let newlines = data.iter().filter(|&&b| b == b'\n').count();
            if data.ends_with(b"\n") {
                newlines
            } else {
                newlines + 1
            }
        }
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_count_file_lines() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");

        fs::write(&file, "").unwrap();
        assert_eq!(count_file_lines(&file), 0);

        fs::write(&file, "one line no newline").unwrap();
        assert_eq!(count_file_lines(&file), 1);

        fs::write(&file, "a\nb\nc\n").unwrap();
        assert_eq!(count_file_lines(&file), 3);

        fs::write(&file, "a\nb").unwrap();
        assert_eq!(count_file_lines(&file), 2);

        assert_eq!(count_file_lines(&temp_dir.path().join("missing")), 0);
    }

    #[test]
    fn test_analyze_export_totals_and_breakdown() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.lss"), "1\n2\n3\n").unwrap();
        fs::write(root.join("sub/b.lss"), "1\n").unwrap();
        fs::write(root.join("sub/c.form"), "x").unwrap();
        fs::write(root.join("noext"), "y\n").unwrap();

        let report = analyze_export(root).unwrap();
        assert_eq!(report.total_files, 4);
        assert_eq!(report.total_lines, 6);
        assert_eq!(report.lines_by_ext.get("lss"), Some(&4));
        assert_eq!(report.lines_by_ext.get("form"), Some(&1));
        assert_eq!(report.lines_by_ext.get("<noext>"), Some(&1));
    }

    #[test]
    fn test_analyze_export_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(analyze_export(&temp_dir.path().join("gone")).is_none());
    }

    #[test]
    fn test_count_direct_files_ignores_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Forms");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("a.form"), "x").unwrap();
        fs::write(dir.join("b.form"), "x").unwrap();
        fs::write(dir.join("nested/c.form"), "x").unwrap();

        assert_eq!(count_direct_files(&dir), 2);
        assert_eq!(count_direct_files(&temp_dir.path().join("Views")), 0);
    }
}
