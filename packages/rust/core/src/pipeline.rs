//! End-to-end build pipeline: clean → vendor → styles ∥ scripts ∥ media ∥ HTML.
//!
//! Ordering: `clean` must precede `vendor`, and `vendor` must precede the
//! rest. The four remaining tasks read disjoint inputs and write disjoint
//! outputs, so they run in unordered parallel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use sitebuild_assets::CopyReport;
use sitebuild_scripts::{ScriptOptions, ScriptsReport};
use sitebuild_shared::{banner, Config, Result, SitebuildError};
use sitebuild_styles::{StyleOptions, StylesReport};

// ---------------------------------------------------------------------------
// Context and results
// ---------------------------------------------------------------------------

/// Everything a build needs: the project root plus the loaded config.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Directory holding `sitebuild.toml` and the source tree.
    pub project_root: PathBuf,
    /// Loaded build configuration.
    pub config: Config,
}

impl BuildContext {
    pub fn new(project_root: PathBuf, config: Config) -> Self {
        Self {
            project_root,
            config,
        }
    }

    fn style_options(&self) -> StyleOptions {
        StyleOptions {
            input_dir: self.config.styles_input(&self.project_root),
            output_dir: self.config.styles_output(&self.project_root),
            load_paths: self
                .config
                .styles
                .load_paths
                .iter()
                .map(|p| self.project_root.join(p))
                .collect(),
            banner: banner::render(&self.config.site),
        }
    }

    fn script_options(&self) -> ScriptOptions {
        ScriptOptions {
            input_dir: self.config.scripts_input(&self.project_root),
            output_dir: self.config.scripts_output(&self.project_root),
            banner: banner::render(&self.config.site),
        }
    }
}

/// Result of a full build.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Vendor files copied.
    pub vendor_files: usize,
    /// Compiled stylesheet outputs.
    pub styles: StylesReport,
    /// Minified script outputs.
    pub scripts: ScriptsReport,
    /// Media files copied.
    pub media_files: usize,
    /// HTML files copied.
    pub html_files: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the build completes.
    fn done(&self, summary: &BuildSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _summary: &BuildSummary) {}
}

// ---------------------------------------------------------------------------
// Individual tasks
// ---------------------------------------------------------------------------

/// Delete the output directory. Everything under it is derived.
#[instrument(skip_all)]
pub fn clean(ctx: &BuildContext) -> Result<()> {
    let output = ctx.config.output_root(&ctx.project_root);
    if output.exists() {
        std::fs::remove_dir_all(&output).map_err(|e| SitebuildError::io(&output, e))?;
        info!(path = %output.display(), "output directory removed");
    }
    Ok(())
}

/// Copy configured vendor libraries into the output tree.
pub fn vendor(ctx: &BuildContext) -> Result<CopyReport> {
    sitebuild_assets::copy_vendor(
        &ctx.project_root,
        &ctx.config.output_root(&ctx.project_root),
        &ctx.config.vendor,
    )
}

/// Compile stylesheets.
pub fn styles(ctx: &BuildContext) -> Result<StylesReport> {
    sitebuild_styles::build(&ctx.style_options())
}

/// Minify scripts.
pub fn scripts(ctx: &BuildContext) -> Result<ScriptsReport> {
    sitebuild_scripts::build(&ctx.script_options())
}

/// Copy media files.
pub fn media(ctx: &BuildContext) -> Result<CopyReport> {
    sitebuild_assets::copy_matching(
        &ctx.config.input_root(&ctx.project_root),
        &ctx.config.output_root(&ctx.project_root),
        &ctx.config.media.patterns,
    )
}

/// Copy HTML files.
pub fn html(ctx: &BuildContext) -> Result<CopyReport> {
    sitebuild_assets::copy_matching(
        &ctx.config.input_root(&ctx.project_root),
        &ctx.config.output_root(&ctx.project_root),
        &ctx.config.html.patterns,
    )
}

// ---------------------------------------------------------------------------
// Full build
// ---------------------------------------------------------------------------

/// Run the full build.
///
/// 1. Clean the output directory
/// 2. Copy vendor libraries
/// 3. Styles, scripts, media, and HTML in parallel
#[instrument(skip_all, fields(root = %ctx.project_root.display()))]
pub async fn run_build(
    ctx: &BuildContext,
    progress: &dyn ProgressReporter,
) -> Result<BuildSummary> {
    let start = Instant::now();

    progress.phase("Cleaning output directory");
    clean(ctx)?;

    progress.phase("Copying vendor libraries");
    let vendor_report = vendor(ctx)?;

    progress.phase("Building styles, scripts, media, and HTML");
    let ctx = Arc::new(ctx.clone());

    let styles_task = {
        let ctx = Arc::clone(&ctx);
        tokio::task::spawn_blocking(move || styles(&ctx))
    };
    let scripts_task = {
        let ctx = Arc::clone(&ctx);
        tokio::task::spawn_blocking(move || scripts(&ctx))
    };
    let media_task = {
        let ctx = Arc::clone(&ctx);
        tokio::task::spawn_blocking(move || media(&ctx))
    };
    let html_task = {
        let ctx = Arc::clone(&ctx);
        tokio::task::spawn_blocking(move || html(&ctx))
    };

    let (styles_res, scripts_res, media_res, html_res) =
        tokio::try_join!(styles_task, scripts_task, media_task, html_task)
            .map_err(|e| SitebuildError::validation(format!("build task panicked: {e}")))?;

    let summary = BuildSummary {
        vendor_files: vendor_report.files,
        styles: styles_res?,
        scripts: scripts_res?,
        media_files: media_res?.files,
        html_files: html_res?.files,
        elapsed: start.elapsed(),
    };

    progress.done(&summary);

    info!(
        vendor = summary.vendor_files,
        styles = summary.styles.outputs.len(),
        scripts = summary.scripts.outputs.len(),
        media = summary.media_files,
        html = summary.html_files,
        elapsed_ms = summary.elapsed.as_millis(),
        "build complete"
    );

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
