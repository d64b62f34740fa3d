//! Build configuration for sitebuild.
//!
//! Config lives at `sitebuild.toml` in the project root. CLI flags override
//! config file values, which override defaults. The defaults reproduce the
//! conventional layout: sources under `src/`, derived output under `docs/`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SitebuildError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitebuild.toml";

// ---------------------------------------------------------------------------
// Config structs (matching sitebuild.toml schema)
// ---------------------------------------------------------------------------

/// Top-level build config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site metadata used for the output banner.
    #[serde(default)]
    pub site: SiteConfig,

    /// Input/output roots.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Stylesheet pipeline settings.
    #[serde(default)]
    pub styles: StylesConfig,

    /// Script pipeline settings.
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Media copy settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// HTML copy settings.
    #[serde(default)]
    pub html: HtmlConfig,

    /// Preview server settings.
    #[serde(default)]
    pub serve: ServeConfig,

    /// Vendor libraries to copy into the output tree.
    #[serde(default)]
    pub vendor: Vec<VendorEntry>,
}

/// `[site]` section — metadata interpolated into the output banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Package-style name (used in the license URL).
    #[serde(default)]
    pub name: String,

    /// Human-readable title.
    #[serde(default)]
    pub title: String,

    /// Version string.
    #[serde(default = "default_version")]
    pub version: String,

    /// Author/attribution line.
    #[serde(default)]
    pub author: String,

    /// License identifier (e.g., "MIT").
    #[serde(default = "default_license")]
    pub license: String,

    /// Project homepage URL.
    #[serde(default)]
    pub homepage: String,

    /// First copyright year; the banner renders `start-current` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_start_year: Option<i32>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            version: default_version(),
            author: String::new(),
            license: default_license(),
            homepage: String::new(),
            copyright_start_year: None,
        }
    }
}

fn default_version() -> String {
    "0.1.0".into()
}
fn default_license() -> String {
    "MIT".into()
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Source root, relative to the project root.
    #[serde(default = "default_input")]
    pub input: String,

    /// Output root, relative to the project root. Fully derived — safe to
    /// delete and regenerate.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
        }
    }
}

fn default_input() -> String {
    "src".into()
}
fn default_output() -> String {
    "docs".into()
}

/// `[styles]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Stylesheet source directory, relative to the input root.
    #[serde(default = "default_styles_input")]
    pub input: String,

    /// Compiled CSS directory, relative to the output root.
    #[serde(default = "default_styles_output")]
    pub output: String,

    /// Extra `@use`/`@import` search paths, relative to the project root.
    #[serde(default)]
    pub load_paths: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            input: default_styles_input(),
            output: default_styles_output(),
            load_paths: Vec::new(),
        }
    }
}

fn default_styles_input() -> String {
    "scss".into()
}
fn default_styles_output() -> String {
    "css".into()
}

/// `[scripts]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Script source directory, relative to the input root.
    #[serde(default = "default_scripts_dir")]
    pub input: String,

    /// Minified output directory, relative to the output root.
    #[serde(default = "default_scripts_dir")]
    pub output: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            input: default_scripts_dir(),
            output: default_scripts_dir(),
        }
    }
}

fn default_scripts_dir() -> String {
    "js".into()
}

/// `[media]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Glob patterns relative to the input root; matches are copied to the
    /// output root preserving relative structure.
    #[serde(default = "default_media_patterns")]
    pub patterns: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            patterns: default_media_patterns(),
        }
    }
}

fn default_media_patterns() -> Vec<String> {
    vec!["img/*".into(), "mp4/*".into()]
}

/// `[html]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    /// Glob patterns relative to the input root.
    #[serde(default = "default_html_patterns")]
    pub patterns: Vec<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            patterns: default_html_patterns(),
        }
    }
}

fn default_html_patterns() -> Vec<String> {
    vec!["**/*.html".into()]
}

/// `[serve]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Port for the live-reload preview server.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

/// `[[vendor]]` entry — a third-party library to copy into the output tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorEntry {
    /// Source directory, relative to the project root.
    pub source: String,
    /// Destination directory, relative to the output root.
    pub dest: String,
    /// Glob patterns (relative to `source`) to skip.
    #[serde(default)]
    pub exclude: Vec<String>,
}

// ---------------------------------------------------------------------------
// Resolved paths
// ---------------------------------------------------------------------------

impl Config {
    /// Absolute source root.
    pub fn input_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.paths.input)
    }

    /// Absolute output root.
    pub fn output_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.paths.output)
    }

    /// Absolute stylesheet source directory.
    pub fn styles_input(&self, project_root: &Path) -> PathBuf {
        self.input_root(project_root).join(&self.styles.input)
    }

    /// Absolute compiled CSS directory.
    pub fn styles_output(&self, project_root: &Path) -> PathBuf {
        self.output_root(project_root).join(&self.styles.output)
    }

    /// Absolute script source directory.
    pub fn scripts_input(&self, project_root: &Path) -> PathBuf {
        self.input_root(project_root).join(&self.scripts.input)
    }

    /// Absolute minified script directory.
    pub fn scripts_output(&self, project_root: &Path) -> PathBuf {
        self.output_root(project_root).join(&self.scripts.output)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config file (`<project_root>/sitebuild.toml`).
pub fn config_file_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE_NAME)
}

/// Load the build config from the project root. Returns defaults if the
/// file does not exist.
pub fn load_config(project_root: &Path) -> Result<Config> {
    let path = config_file_path(project_root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(Config::default());
    }

    load_config_from(&path)
}

/// Load the build config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| SitebuildError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SitebuildError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a starter `sitebuild.toml` mirroring the conventional vendor set.
/// Returns the path to the created file.
pub fn init_config(project_root: &Path) -> Result<PathBuf> {
    let path = config_file_path(project_root);
    if path.exists() {
        return Err(SitebuildError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let mut config = Config::default();
    config.vendor = vec![
        VendorEntry {
            source: "node_modules/bootstrap/dist".into(),
            dest: "vendor/bootstrap".into(),
            exclude: vec![],
        },
        VendorEntry {
            source: "node_modules/@fortawesome/fontawesome-free/css".into(),
            dest: "vendor/fontawesome-free/css".into(),
            exclude: vec![],
        },
        VendorEntry {
            source: "node_modules/@fortawesome/fontawesome-free/webfonts".into(),
            dest: "vendor/fontawesome-free/webfonts".into(),
            exclude: vec![],
        },
        VendorEntry {
            source: "node_modules/jquery/dist".into(),
            dest: "vendor/jquery".into(),
            exclude: vec!["core.js".into()],
        },
    ];

    let content =
        toml::to_string_pretty(&config).map_err(|e| SitebuildError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SitebuildError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
