//! Stylesheet pipeline: Sass → expanded CSS → vendor prefixes → minify → banner.
//!
//! Compiles every non-partial `.scss`/`.sass` source with `grass`, then runs
//! the result through `lightningcss` for vendor prefixing and minification,
//! prepends the attribution banner, and writes `<stem>.min.css` preserving
//! the source directory structure.

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use sitebuild_shared::{Result, SitebuildError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for a stylesheet build.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Directory holding `.scss`/`.sass` sources.
    pub input_dir: PathBuf,
    /// Directory for compiled `.min.css` output.
    pub output_dir: PathBuf,
    /// Extra `@use`/`@import` search paths.
    pub load_paths: Vec<PathBuf>,
    /// Banner prepended to every compiled stylesheet.
    pub banner: String,
}

/// One compiled stylesheet.
#[derive(Debug, Clone)]
pub struct CompiledStyle {
    /// Source file the output was compiled from.
    pub source: PathBuf,
    /// The written `.min.css` file.
    pub output: PathBuf,
    /// Size of the written output in bytes.
    pub size_bytes: usize,
    /// SHA-256 of the written output, for change detection.
    pub sha256: String,
}

/// Result of a stylesheet build.
#[derive(Debug, Clone, Default)]
pub struct StylesReport {
    /// Outputs written, in source order.
    pub outputs: Vec<CompiledStyle>,
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Compile all stylesheet sources under `opts.input_dir`.
///
/// A missing input directory is not an error — the task is simply a no-op,
/// so projects without stylesheets still build.
#[instrument(skip_all, fields(input = %opts.input_dir.display()))]
pub fn build(opts: &StyleOptions) -> Result<StylesReport> {
    if !opts.input_dir.is_dir() {
        debug!("no stylesheet directory, skipping");
        return Ok(StylesReport::default());
    }

    let mut sources = Vec::new();
    collect_sources(&opts.input_dir, &mut sources)?;
    sources.sort();

    let mut report = StylesReport::default();

    for source in &sources {
        let compiled = build_one(source, opts)?;
        report.outputs.push(compiled);
    }

    info!(count = report.outputs.len(), "stylesheet build complete");
    Ok(report)
}

/// Compile a single stylesheet source.
fn build_one(source: &Path, opts: &StyleOptions) -> Result<CompiledStyle> {
    let src_display = source.display().to_string();

    let expanded = compile_sass(source, &opts.load_paths)?;
    let minified = prefix_and_minify(&expanded, &src_display)?;

    let css = format!("{}{minified}", opts.banner);

    let output = output_path(source, &opts.input_dir, &opts.output_dir);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SitebuildError::io(parent, e))?;
    }
    std::fs::write(&output, &css).map_err(|e| SitebuildError::io(&output, e))?;

    let mut hasher = Sha256::new();
    hasher.update(css.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(
        source = %src_display,
        output = %output.display(),
        size = css.len(),
        "wrote stylesheet"
    );

    Ok(CompiledStyle {
        source: source.to_path_buf(),
        output,
        size_bytes: css.len(),
        sha256,
    })
}

/// Compile Sass to expanded CSS via grass.
fn compile_sass(source: &Path, load_paths: &[PathBuf]) -> Result<String> {
    let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
    if let Some(parent) = source.parent() {
        options = options.load_path(parent.to_path_buf());
    }
    for path in load_paths {
        options = options.load_path(path.clone());
    }

    grass::from_path(source, &options)
        .map_err(|e| SitebuildError::style(source.display().to_string(), e.to_string()))
}

/// Add vendor prefixes for the supported-browser set and minify.
fn prefix_and_minify(css: &str, file: &str) -> Result<String> {
    let targets = browser_targets();

    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| SitebuildError::style(file, e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..Default::default()
        })
        .map_err(|e| SitebuildError::style(file, e.to_string()))?;

    let out = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..Default::default()
        })
        .map_err(|e| SitebuildError::style(file, e.to_string()))?;

    Ok(out.code)
}

/// Browser support matrix for prefixing. Versions are encoded as
/// `major << 16 | minor << 8 | patch`.
fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(90 << 16),
        edge: Some(90 << 16),
        firefox: Some(88 << 16),
        safari: Some(14 << 16 | 1 << 8),
        ios_saf: Some(14 << 16),
        ..Browsers::default()
    })
}

/// Recursively collect compilable sources, skipping `_partial` files.
fn collect_sources(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| SitebuildError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| SitebuildError::io(dir, e))?;
        let path = entry.path();

        if path.is_dir() {
            collect_sources(&path, out)?;
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "skipping non-UTF-8 file name");
            continue;
        };

        if name.starts_with('_') {
            continue;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("scss") | Some("sass") => out.push(path),
            _ => {}
        }
    }

    Ok(())
}

/// Map a source path to its `.min.css` output path, preserving the
/// directory structure relative to the input root.
fn output_path(source: &Path, input_dir: &Path, output_dir: &Path) -> PathBuf {
    let rel = source.strip_prefix(input_dir).unwrap_or(source);
    let stem = rel
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("styles");

    match rel.parent() {
        Some(parent) if parent != Path::new("") => {
            output_dir.join(parent).join(format!("{stem}.min.css"))
        }
        _ => output_dir.join(format!("{stem}.min.css")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BANNER: &str = "/*!\n * Test v1.0.0\n */\n\n";

    fn make_opts(tmp: &TempDir) -> StyleOptions {
        StyleOptions {
            input_dir: tmp.path().join("scss"),
            output_dir: tmp.path().join("css"),
            load_paths: vec![],
            banner: BANNER.into(),
        }
    }

    fn write_source(tmp: &TempDir, name: &str, content: &str) {
        let dir = tmp.path().join("scss");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn compiles_scss_to_minified_css() {
        let tmp = TempDir::new().unwrap();
        write_source(
            &tmp,
            "site.scss",
            "$accent: #ff0000;\nbody {\n  color: $accent;\n  margin: 0;\n}\n",
        );

        let report = build(&make_opts(&tmp)).unwrap();
        assert_eq!(report.outputs.len(), 1);

        let out = &report.outputs[0];
        assert_eq!(out.output, tmp.path().join("css/site.min.css"));
        assert_eq!(out.sha256.len(), 64);

        let css = std::fs::read_to_string(&out.output).unwrap();
        assert!(css.starts_with(BANNER));
        assert!(css.contains("body"));
        // Minified: the variable was resolved and expanded whitespace stripped.
        assert!(!css.contains("$accent"));
        assert!(!css[BANNER.len()..].contains("\n  "));
    }

    #[test]
    fn partials_are_inlined_not_emitted() {
        let tmp = TempDir::new().unwrap();
        write_source(&tmp, "_variables.scss", "$accent: #00ff00;\n");
        write_source(
            &tmp,
            "site.scss",
            "@import \"variables\";\nh1 { color: $accent; }\n",
        );

        let report = build(&make_opts(&tmp)).unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert!(!tmp.path().join("css/_variables.min.css").exists());

        let css = std::fs::read_to_string(&report.outputs[0].output).unwrap();
        assert!(css.contains("h1"));
    }

    #[test]
    fn nested_sources_keep_structure() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("scss/pages");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("about.scss"), "p { margin: 0; }\n").unwrap();

        let report = build(&make_opts(&tmp)).unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(
            report.outputs[0].output,
            tmp.path().join("css/pages/about.min.css")
        );
    }

    #[test]
    fn malformed_stylesheet_reports_the_file() {
        let tmp = TempDir::new().unwrap();
        write_source(&tmp, "broken.scss", "body { color: $undefined-variable; }\n");

        let err = build(&make_opts(&tmp)).unwrap_err();
        assert!(err.to_string().contains("broken.scss"));
    }

    #[test]
    fn missing_input_dir_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let report = build(&make_opts(&tmp)).unwrap();
        assert!(report.outputs.is_empty());
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        write_source(&tmp, "site.scss", "body { margin: 0; padding: 0; }\n");
        let opts = make_opts(&tmp);

        let first = build(&opts).unwrap();
        let bytes1 = std::fs::read(&first.outputs[0].output).unwrap();
        let second = build(&opts).unwrap();
        let bytes2 = std::fs::read(&second.outputs[0].output).unwrap();

        assert_eq!(bytes1, bytes2);
        assert_eq!(first.outputs[0].sha256, second.outputs[0].sha256);
    }
}
