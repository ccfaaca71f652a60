//! Configuration management for dxlclean
//!
//! All rule sets are resolved once at startup and stay immutable for the
//! run. Built-in defaults are layered under an optional `dxlclean.toml`
//! (or an explicit `--config` file) and `DXLCLEAN_` environment variables.

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Config file picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "dxlclean.toml";

/// Main configuration structure for dxlclean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Input root used when no directory is passed on the command line
    pub source_dir: Option<String>,

    /// Extension-based routing rules
    pub extensions: ExtensionConfig,

    /// Hex-encoded magic headers of binary files to drop regardless of extension
    pub magic_signatures: Vec<String>,

    /// Markup tag selection and blocking rules
    pub tags: TagConfig,

    /// Post-run reporting configuration
    pub report: ReportConfig,
}

/// Extension rule sets. Entries are matched case-insensitively and may be
/// written with or without the leading dot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Extensions that are never copied or processed
    pub ignored: Vec<String>,

    /// Extensions always treated as plain text and cleaned of blank lines
    pub plain_text: Vec<String>,

    /// Extensions known to hold DXL/XML markup
    pub markup: Vec<String>,
}

/// Which markup tags are worth extracting, and which are blocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    /// Local tag names eligible for extraction
    pub interesting: Vec<String>,

    /// The one interesting tag whose text is base64-encoded data
    pub payload: String,

    /// The one interesting tag whose extracted lines are tallied separately
    pub code_bearing: String,

    /// Tags blocked in every markup file
    pub blocked: Vec<String>,

    /// Extra blocked tags, keyed by file extension
    pub blocked_by_extension: HashMap<String, Vec<String>>,
}

/// Post-run reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Subdirectories of the input root whose direct files are counted
    pub count_dirs: Vec<String>,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            ignored: to_strings(&["png", "jpg", "jpeg", "gif", "metadata", "xml"]),
            plain_text: to_strings(&["lss", "lsa"]),
            markup: to_strings(&[
                "fa", "form", "column", "wsdl", "lsdb", "folder", "formset", "page", "view",
                "field", "outline", "subform", "javalib",
            ]),
        }
    }
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            interesting: to_strings(&["lotusscript", "formula", "rawitemdata", "java"]),
            payload: "rawitemdata".to_string(),
            code_bearing: "java".to_string(),
            blocked: vec![],
            blocked_by_extension: HashMap::new(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            count_dirs: to_strings(&[
                "Forms",
                "Views",
                "Folders",
                "Framesets",
                "Pages",
                "SharedElements/Subforms",
                "SharedElements/Fields",
                "SharedElements/Columns",
                "SharedElements/Outlines",
                "Code/Agents",
                "Code/ScriptLibraries",
            ]),
        }
    }
}

/// Default magic headers: GIF89, PNG, and JPEG/JFIF.
fn default_magic_signatures() -> Vec<String> {
    to_strings(&["4749463839", "89504E47", "FFD8FFE000104A464946"])
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl CleanConfig {
    /// Loads the layered configuration.
    ///
    /// Priority, lowest first: built-in defaults, then `dxlclean.toml` in
    /// the working directory (or the explicit `custom` file, which must
    /// exist), then `DXLCLEAN_` environment variables.
    pub fn load(custom: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        figment = match custom {
            Some(path) => figment.merge(Toml::file_exact(path)),
            None => figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        };

        figment
            .merge(Env::prefixed("DXLCLEAN_").split("__"))
            .extract()
            .context("failed to load configuration")
    }
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            extensions: ExtensionConfig::default(),
            magic_signatures: default_magic_signatures(),
            tags: TagConfig::default(),
            report: ReportConfig::default(),
        }
    }
}
