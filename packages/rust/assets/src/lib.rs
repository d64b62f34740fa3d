//! Straight-copy tasks: vendor libraries, media, and HTML.
//!
//! All three are structure-preserving file copies. Vendor entries copy a
//! whole third-party directory into the output tree (with per-entry exclude
//! globs); media and HTML select files under the input root by glob pattern
//! and mirror them into the output root.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info, instrument};

use sitebuild_shared::{Result, SitebuildError, VendorEntry};

/// Result of a copy task.
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    /// Number of files copied.
    pub files: usize,
}

// ---------------------------------------------------------------------------
// Vendor copy
// ---------------------------------------------------------------------------

/// Copy each configured vendor library into the output tree.
///
/// A missing vendor source directory is an error — a stale `[[vendor]]`
/// entry should fail loudly rather than silently produce a broken site.
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn copy_vendor(
    project_root: &Path,
    output_root: &Path,
    entries: &[VendorEntry],
) -> Result<CopyReport> {
    let mut report = CopyReport::default();

    for entry in entries {
        let source = project_root.join(&entry.source);
        if !source.is_dir() {
            return Err(SitebuildError::Copy(format!(
                "vendor source not found: {}",
                source.display()
            )));
        }

        let exclude = build_globset(&entry.exclude)?;
        let dest = output_root.join(&entry.dest);

        let copied = copy_tree(&source, &dest, &|rel| !exclude.is_match(rel))?;
        debug!(
            source = %source.display(),
            dest = %dest.display(),
            copied,
            "vendor entry copied"
        );
        report.files += copied;
    }

    info!(files = report.files, "vendor copy complete");
    Ok(report)
}

// ---------------------------------------------------------------------------
// Pattern copy (media, HTML)
// ---------------------------------------------------------------------------

/// Copy files under `input_root` matching `patterns` into `output_root`,
/// preserving relative structure. Anything already inside `output_root`
/// is never treated as a source.
#[instrument(skip_all, fields(input = %input_root.display()))]
pub fn copy_matching(
    input_root: &Path,
    output_root: &Path,
    patterns: &[String],
) -> Result<CopyReport> {
    if !input_root.is_dir() {
        debug!("input root missing, skipping copy");
        return Ok(CopyReport::default());
    }

    let include = build_globset(patterns)?;
    let files = copy_tree(input_root, output_root, &|rel| {
        include.is_match(rel)
    })?;

    info!(files, "copy complete");
    Ok(CopyReport { files })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Compile glob patterns into a matcher set.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            SitebuildError::validation(format!("bad glob pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SitebuildError::validation(format!("glob set: {e}")))
}

/// Recursively copy `source` into `dest`, keeping files whose path relative
/// to `source` satisfies `keep`. Returns the number of files copied.
fn copy_tree(
    source: &Path,
    dest: &Path,
    keep: &dyn Fn(&Path) -> bool,
) -> Result<usize> {
    let mut copied = 0;
    let mut stack = vec![source.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| SitebuildError::io(&dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| SitebuildError::io(&dir, e))?;
            let path = entry.path();

            // Never descend into the destination if it is nested under the
            // source tree.
            if path == dest {
                continue;
            }

            if path.is_dir() {
                stack.push(path);
                continue;
            }

            let rel = path.strip_prefix(source).map_err(|_| {
                SitebuildError::Copy(format!("path escapes source root: {}", path.display()))
            })?;

            if !keep(rel) {
                continue;
            }

            let target = dest.join(rel);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| SitebuildError::io(parent, e))?;
            }
            std::fs::copy(&path, &target).map_err(|e| SitebuildError::io(&path, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
