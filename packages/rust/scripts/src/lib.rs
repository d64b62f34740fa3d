//! Script pipeline: minify → banner → `<stem>.min.js`.
//!
//! Mirrors the stylesheet pipeline for JavaScript sources. Inputs are read
//! non-recursively from the scripts directory; sources already carrying a
//! `.min.js` suffix are passed through with the banner only.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use sitebuild_shared::{Result, SitebuildError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for a script build.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// Directory holding `.js` sources.
    pub input_dir: PathBuf,
    /// Directory for minified output.
    pub output_dir: PathBuf,
    /// Banner prepended to every output script.
    pub banner: String,
}

/// One minified script.
#[derive(Debug, Clone)]
pub struct MinifiedScript {
    /// Source file.
    pub source: PathBuf,
    /// The written `.min.js` file.
    pub output: PathBuf,
    /// Size of the written output in bytes.
    pub size_bytes: usize,
    /// SHA-256 of the written output, for change detection.
    pub sha256: String,
}

/// Result of a script build.
#[derive(Debug, Clone, Default)]
pub struct ScriptsReport {
    /// Outputs written, in source order.
    pub outputs: Vec<MinifiedScript>,
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Minify all script sources in `opts.input_dir`.
///
/// A missing input directory is a no-op, matching the stylesheet task.
#[instrument(skip_all, fields(input = %opts.input_dir.display()))]
pub fn build(opts: &ScriptOptions) -> Result<ScriptsReport> {
    if !opts.input_dir.is_dir() {
        debug!("no script directory, skipping");
        return Ok(ScriptsReport::default());
    }

    let mut sources = Vec::new();
    let entries =
        std::fs::read_dir(&opts.input_dir).map_err(|e| SitebuildError::io(&opts.input_dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| SitebuildError::io(&opts.input_dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("js") {
            sources.push(path);
        }
    }
    sources.sort();

    let mut report = ScriptsReport::default();
    for source in &sources {
        report.outputs.push(build_one(source, opts)?);
    }

    info!(count = report.outputs.len(), "script build complete");
    Ok(report)
}

/// Minify a single script source.
fn build_one(source: &Path, opts: &ScriptOptions) -> Result<MinifiedScript> {
    let src_display = source.display().to_string();

    let content =
        std::fs::read_to_string(source).map_err(|e| SitebuildError::io(source, e))?;

    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SitebuildError::script(&src_display, "non-UTF-8 file name"))?;

    let (out_name, body) = if name.ends_with(".min.js") {
        // Already minified upstream; keep the name, only add attribution.
        (name.to_string(), content)
    } else {
        let stem = name.strip_suffix(".js").unwrap_or(name);
        let minified = minifier::js::minify(&content).to_string();
        if minified.is_empty() && !content.trim().is_empty() {
            warn!(source = %src_display, "minifier produced empty output, passing through");
            (format!("{stem}.min.js"), content)
        } else {
            (format!("{stem}.min.js"), minified)
        }
    };

    let js = format!("{}{body}", opts.banner);

    std::fs::create_dir_all(&opts.output_dir)
        .map_err(|e| SitebuildError::io(&opts.output_dir, e))?;
    let output = opts.output_dir.join(out_name);
    std::fs::write(&output, &js).map_err(|e| SitebuildError::io(&output, e))?;

    let mut hasher = Sha256::new();
    hasher.update(js.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(
        source = %src_display,
        output = %output.display(),
        size = js.len(),
        "wrote script"
    );

    Ok(MinifiedScript {
        source: source.to_path_buf(),
        output,
        size_bytes: js.len(),
        sha256,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BANNER: &str = "/*!\n * Test v1.0.0\n */\n\n";

    fn make_opts(tmp: &TempDir) -> ScriptOptions {
        ScriptOptions {
            input_dir: tmp.path().join("js"),
            output_dir: tmp.path().join("out"),
            banner: BANNER.into(),
        }
    }

    fn write_source(tmp: &TempDir, name: &str, content: &str) {
        let dir = tmp.path().join("js");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn minifies_and_renames() {
        let tmp = TempDir::new().unwrap();
        write_source(
            &tmp,
            "site.js",
            "function greet(name) {\n    return 'hello ' + name;\n}\nwindow.greet = greet;\n",
        );

        let report = build(&make_opts(&tmp)).unwrap();
        assert_eq!(report.outputs.len(), 1);

        let out = &report.outputs[0];
        assert_eq!(out.output, tmp.path().join("out/site.min.js"));

        let js = std::fs::read_to_string(&out.output).unwrap();
        assert!(js.starts_with(BANNER));
        assert!(js.contains("greet"));
        assert!(js.len() <= BANNER.len() + 100);
    }

    #[test]
    fn preminified_source_keeps_name() {
        let tmp = TempDir::new().unwrap();
        write_source(&tmp, "lib.min.js", "var a=1;var b=2;");

        let report = build(&make_opts(&tmp)).unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.outputs[0].output, tmp.path().join("out/lib.min.js"));

        let js = std::fs::read_to_string(&report.outputs[0].output).unwrap();
        assert!(js.starts_with(BANNER));
        assert!(js.ends_with("var a=1;var b=2;"));
    }

    #[test]
    fn non_js_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write_source(&tmp, "site.js", "var x = 1;");
        write_source(&tmp, "notes.txt", "not a script");

        let report = build(&make_opts(&tmp)).unwrap();
        assert_eq!(report.outputs.len(), 1);
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
        write_source(&tmp, "site.js", "var counter = 0;\nfunction tick() { counter += 1; }\n");
        let opts = make_opts(&tmp);

        let first = build(&opts).unwrap();
        let second = build(&opts).unwrap();
        assert_eq!(first.outputs[0].sha256, second.outputs[0].sha256);
    }
}
