//! End-to-end processing pipeline
//!
//! Walks the input tree, classifies each file, routes it through markup
//! extraction or plain-text cleanup, and mirrors non-empty results into
//! the export tree. Per-file failures are absorbed here and turn into
//! skipped or empty results; only a broken setup is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::warn;

use crate::classify::{Classification, Classifier};
use crate::config::CleanConfig;
use crate::extract::{FragmentExtractor, decode_text, strip_blank_lines};
use crate::stats::Stats;

pub struct Pipeline {
    classifier: Classifier,
    extractor: FragmentExtractor,
}

impl Pipeline {
    pub fn new(config: &CleanConfig) -> Result<Self> {
        Ok(Self {
            classifier: Classifier::from_config(config)?,
            extractor: FragmentExtractor::from_config(config),
        })
    }

    /// Derives the default export root: `<input>-export`, with any trailing
    /// separator stripped first so the suffix lands on the directory name.
    pub fn export_root(source_root: &Path) -> PathBuf {
        let name = source_root.to_string_lossy();
        let trimmed = name.trim_end_matches(['/', '\\']);
        PathBuf::from(format!("{trimmed}-export"))
    }

    /// Processes every file under `source_root`, mirroring results below
    /// `export_root`. `jobs > 1` spreads the per-file work over a worker
    /// pool; statistics are merged from per-file deltas either way.
    pub fn run(&self, source_root: &Path, export_root: &Path, jobs: usize) -> Result<Stats> {
        let files = collect_files(source_root);

        if jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("failed to build worker pool")?;
            let deltas: Vec<Stats> = pool.install(|| {
                files
                    .par_iter()
                    .map(|src| {
                        let mut delta = Stats::default();
                        self.process_file(src, source_root, export_root, &mut delta);
                        delta
                    })
                    .collect()
            });
            let mut stats = Stats::default();
            for delta in &deltas {
                stats.merge(delta);
            }
            Ok(stats)
        } else {
            let mut stats = Stats::default();
            for src in &files {
                self.process_file(src, source_root, export_root, &mut stats);
            }
            Ok(stats)
        }
    }

    /// Classifies and routes a single file.
    pub fn process_file(
        &self,
        src: &Path,
        source_root: &Path,
        export_root: &Path,
        stats: &mut Stats,
    ) {
        // The walker only yields children of the root.
        let Ok(rel) = src.strip_prefix(source_root) else {
            return;
        };
        let dst = export_root.join(rel);

        match self.classifier.classify(src, stats) {
            Classification::Markup => self.process_markup(src, &dst, stats),
            Classification::PlainText => self.process_plain_text(src, &dst, stats),
            Classification::SkipExtension
            | Classification::SkipHeader
            | Classification::SkipUnhandled => {}
        }
    }

    /// Markup route: extract the interesting fragments and write them out
    /// only when something was collected. An unreadable file is processed
    /// as if empty.
    fn process_markup(&self, src: &Path, dst: &Path, stats: &mut Stats) {
        let text = match read_text(src) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %src.display(), %err, "markup file unreadable, treating as empty");
                String::new()
            }
        };

        let ext = Classifier::extension_of(src);
        let extracted = self.extractor.extract(&text, &ext, stats);
        if !extracted.is_empty() {
            if let Err(err) = write_text(dst, &extracted) {
                warn!(path = %dst.display(), %err, "failed to write extraction result");
            }
        }

        stats.markup_files += 1;
        stats.processed_files += 1;
    }

    /// Plain-text route: strip blank lines and always write the result.
    fn process_plain_text(&self, src: &Path, dst: &Path, stats: &mut Stats) {
        match read_text(src) {
            Ok(text) => {
                let cleaned = strip_blank_lines(&text);
                if let Err(err) = write_text(dst, &cleaned) {
                    warn!(path = %dst.display(), %err, "failed to write cleaned text");
                }
            }
            Err(err) => {
                warn!(path = %src.display(), %err, "plain-text file unreadable, skipping content");
            }
        }
        stats.processed_files += 1;
    }
}

/// Collects every regular file under `root`, without gitignore or hidden
/// filtering; the export must see the tree exactly as it is on disk.
fn collect_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_some_and(|ft| ft.is_file()) {
                    files.push(entry.into_path());
                }
            }
            Err(err) => warn!(%err, "walk error"),
        }
    }
    files
}

fn read_text(path: &Path) -> Result<String> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(decode_text(data))
}

fn write_text(dst: &Path, text: &str) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(dst, text).with_context(|| format!("failed to write {}", dst.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tempfile::TempDir;

    fn pipeline() -> Pipeline {
        Pipeline::new(&CleanConfig::default()).unwrap()
    }

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("Forms")).unwrap();
        fs::create_dir_all(root.join("Code/ScriptLibraries")).unwrap();

        fs::write(
            root.join("Forms/main.form"),
            "<form><lotusscript>Dim x\n\nEnd</lotusscript></form>",
        )
        .unwrap();
        fs::write(
            root.join("Code/ScriptLibraries/lib.lss"),
            "Sub Init\n\n\nEnd Sub\n",
        )
        .unwrap();
        fs::write(root.join("logo.png"), "<form>looks like xml</form>").unwrap();
        fs::write(root.join("Forms/fake.form"), b"GIF89a\x01\x02").unwrap();
        fs::write(root.join("notes.dat"), b"\x00\x01\x02").unwrap();
        // Markup file with nothing interesting: must produce no output file.
        fs::write(root.join("Forms/empty.view"), "<view><noteinfo>x</noteinfo></view>").unwrap();
    }

    #[test]
    fn test_run_routes_and_counts() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        let export = temp_dir.path().join("app-export");
        fs::create_dir_all(&source).unwrap();
        build_tree(&source);

        let stats = pipeline().run(&source, &export, 1).unwrap();

        assert_eq!(stats.total_files, 6);
        assert_eq!(stats.processed_files, 3); // main.form, empty.view, lib.lss
        assert_eq!(stats.markup_files, 2);
        assert_eq!(stats.skipped_files, 3);
        assert_eq!(stats.skipped_by_ext, 1); // logo.png
        assert_eq!(stats.skipped_by_header, 1); // fake.form

        assert_eq!(
            fs::read_to_string(export.join("Forms/main.form")).unwrap(),
            "Dim x\nEnd"
        );
        assert_eq!(
            fs::read_to_string(export.join("Code/ScriptLibraries/lib.lss")).unwrap(),
            "Sub Init\nEnd Sub"
        );
        assert!(!export.join("logo.png").exists());
        assert!(!export.join("Forms/fake.form").exists());
        assert!(!export.join("notes.dat").exists());
        // Empty extraction: processed, but no file.
        assert!(!export.join("Forms/empty.view").exists());
    }

    #[test]
    fn test_parallel_run_matches_sequential_stats() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        fs::create_dir_all(&source).unwrap();
        build_tree(&source);

        let sequential = pipeline()
            .run(&source, &temp_dir.path().join("seq"), 1)
            .unwrap();
        let parallel = pipeline()
            .run(&source, &temp_dir.path().join("par"), 4)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_payload_decoding_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        let export = temp_dir.path().join("out");
        fs::create_dir_all(&source).unwrap();

        let encoded = STANDARD.encode(b"Sub Foo\nEnd Sub");
        fs::write(
            source.join("agent.fa"),
            format!("<agent><rawitemdata>{encoded}</rawitemdata></agent>"),
        )
        .unwrap();

        let stats = pipeline().run(&source, &export, 1).unwrap();
        assert_eq!(stats.payload_decoded_text, 1);
        assert_eq!(
            fs::read_to_string(export.join("agent.fa")).unwrap(),
            "Sub Foo\nEnd Sub"
        );
    }

    #[test]
    fn test_unparsable_markup_is_copied_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        let export = temp_dir.path().join("out");
        fs::create_dir_all(&source).unwrap();

        let raw = "not <really xml\nat all";
        fs::write(source.join("broken.form"), raw).unwrap();

        let stats = pipeline().run(&source, &export, 1).unwrap();
        assert_eq!(stats.markup_files, 1);
        assert_eq!(fs::read_to_string(export.join("broken.form")).unwrap(), raw);
    }

    #[test]
    fn test_hidden_files_are_still_processed() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        let export = temp_dir.path().join("out");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join(".hidden.lss"), "Dim h\n\n").unwrap();

        let stats = pipeline().run(&source, &export, 1).unwrap();
        assert_eq!(stats.total_files, 1);
        assert!(export.join(".hidden.lss").exists());
    }

    #[test]
    fn test_export_root_derivation() {
        assert_eq!(
            Pipeline::export_root(Path::new("/data/app")),
            PathBuf::from("/data/app-export")
        );
        assert_eq!(
            Pipeline::export_root(Path::new("/data/app/")),
            PathBuf::from("/data/app-export")
        );
    }

    #[test]
    fn test_plain_text_always_writes_even_when_empty() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        let export = temp_dir.path().join("out");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("blank.lss"), "\n\n  \n").unwrap();

        pipeline().run(&source, &export, 1).unwrap();
        assert_eq!(fs::read_to_string(export.join("blank.lss")).unwrap(), "");
    }
}
