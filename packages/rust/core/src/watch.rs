//! Watch mode: rebuild on source changes, notify preview clients.
//!
//! Runs a full build, starts the preview server, then watches the input
//! tree. Change events are debounced and classified by path: stylesheet
//! sources re-run the styles task, script sources the scripts task, HTML
//! sources are re-copied with a full reload. A failed rebuild is logged and
//! the loop continues; the process is terminated externally.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use sitebuild_livereload::{ReloadHub, server};
use sitebuild_shared::{Result, SitebuildError};

use crate::pipeline::{self, BuildContext, ProgressReporter};

/// Window for absorbing bursts of change events (editors often emit
/// several per save).
const DEBOUNCE: Duration = Duration::from_millis(150);

/// Which rebuild a change event maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TaskKind {
    Styles,
    Scripts,
    Html,
}

/// Last-written output hashes, used to suppress no-op notifications.
#[derive(Default)]
struct WatchState {
    style_hashes: HashMap<PathBuf, String>,
    script_hashes: HashMap<PathBuf, String>,
}

/// Build, serve, and watch until the process is terminated.
#[instrument(skip_all, fields(root = %ctx.project_root.display()))]
pub async fn run_watch(ctx: &BuildContext, progress: &dyn ProgressReporter) -> Result<()> {
    // Initial full build; a broken source at startup is fatal, matching
    // plain build mode.
    let summary = pipeline::run_build(ctx, progress).await?;

    let mut state = WatchState::default();
    for out in &summary.styles.outputs {
        state.style_hashes.insert(out.output.clone(), out.sha256.clone());
    }
    for out in &summary.scripts.outputs {
        state.script_hashes.insert(out.output.clone(), out.sha256.clone());
    }

    let input_root = ctx.config.input_root(&ctx.project_root);
    if !input_root.is_dir() {
        return Err(SitebuildError::Watch(format!(
            "input root not found: {}",
            input_root.display()
        )));
    }

    // Preview server.
    let hub = ReloadHub::new();
    let listener = server::bind(ctx.config.serve.port).await?;
    let output_root = ctx.config.output_root(&ctx.project_root);
    tokio::spawn(server::run(listener, output_root, hub.clone()));
    println!(
        "Serving {} on http://127.0.0.1:{}",
        ctx.config.paths.output, ctx.config.serve.port
    );

    // Bridge notify's callback thread into the async loop.
    let (tx, mut rx) = mpsc::channel::<notify::Result<Event>>(64);
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.blocking_send(res);
        },
        notify::Config::default(),
    )
    .map_err(|e| SitebuildError::Watch(e.to_string()))?;

    watcher
        .watch(&input_root, RecursiveMode::Recursive)
        .map_err(|e| SitebuildError::Watch(e.to_string()))?;

    info!(input = %input_root.display(), "watching for changes");
    progress.phase("Watching for changes (ctrl-C to stop)");

    while let Some(res) = rx.recv().await {
        let mut pending = BTreeSet::new();
        absorb(res, ctx, &mut pending);

        // Debounce: keep absorbing until the burst goes quiet.
        loop {
            match tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                Ok(Some(res)) => absorb(res, ctx, &mut pending),
                Ok(None) => break,
                Err(_) => break,
            }
        }

        for task in pending {
            rebuild(ctx, task, &hub, &mut state);
        }
    }

    Ok(())
}

/// Fold one watcher result into the pending task set.
fn absorb(res: notify::Result<Event>, ctx: &BuildContext, pending: &mut BTreeSet<TaskKind>) {
    match res {
        Ok(event) => {
            if is_change(&event.kind) {
                pending.extend(classify(&event.paths, ctx));
            }
        }
        Err(e) => warn!(error = %e, "watcher event error"),
    }
}

/// Only content-affecting events trigger rebuilds.
fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Map changed paths to the tasks that consume them.
fn classify(paths: &[PathBuf], ctx: &BuildContext) -> BTreeSet<TaskKind> {
    let styles_input = ctx.config.styles_input(&ctx.project_root);
    let scripts_input = ctx.config.scripts_input(&ctx.project_root);
    let input_root = ctx.config.input_root(&ctx.project_root);

    let mut tasks = BTreeSet::new();
    for path in paths {
        if path.starts_with(&styles_input) {
            tasks.insert(TaskKind::Styles);
        } else if path.starts_with(&scripts_input) {
            tasks.insert(TaskKind::Scripts);
        } else if path.starts_with(&input_root) && is_html(path) {
            tasks.insert(TaskKind::Html);
        }
    }
    tasks
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html") | Some("htm")
    )
}

/// Re-run one task. Failures are logged, never fatal — the developer fixes
/// the source and the loop keeps going.
fn rebuild(ctx: &BuildContext, task: TaskKind, hub: &ReloadHub, state: &mut WatchState) {
    match task {
        TaskKind::Styles => match pipeline::styles(ctx) {
            Ok(report) => {
                for out in &report.outputs {
                    let changed = state
                        .style_hashes
                        .insert(out.output.clone(), out.sha256.clone())
                        .is_none_or(|prev| prev != out.sha256);

                    if changed {
                        let name = file_name(&out.output);
                        info!(file = %name, "stylesheet rebuilt");
                        hub.notify_styles(name);
                    }
                }
            }
            Err(e) => error!(error = %e, "stylesheet rebuild failed"),
        },
        TaskKind::Scripts => match pipeline::scripts(ctx) {
            Ok(report) => {
                let mut changed = false;
                for out in &report.outputs {
                    changed |= state
                        .script_hashes
                        .insert(out.output.clone(), out.sha256.clone())
                        .is_none_or(|prev| prev != out.sha256);
                }
                if changed {
                    info!(count = report.outputs.len(), "scripts rebuilt");
                    hub.notify_full();
                }
            }
            Err(e) => error!(error = %e, "script rebuild failed"),
        },
        TaskKind::Html => match pipeline::html(ctx) {
            Ok(report) => {
                info!(files = report.files, "HTML recopied");
                hub.notify_full();
            }
            Err(e) => error!(error = %e, "HTML copy failed"),
        },
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use sitebuild_livereload::ReloadEvent;
    use sitebuild_shared::Config;
    use tempfile::TempDir;

    fn sample_ctx(tmp: &TempDir) -> BuildContext {
        let root = tmp.path();
        let write = |rel: &str, content: &str| {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        };
        write("src/scss/site.scss", "body { margin: 0; }\n");
        write("src/js/site.js", "var x = 1;\n");
        write("src/index.html", "<html><body></body></html>");

        BuildContext::new(root.to_path_buf(), Config::default())
    }

    #[test]
    fn classify_routes_paths_to_tasks() {
        let tmp = TempDir::new().unwrap();
        let ctx = sample_ctx(&tmp);
        let root = &ctx.project_root;

        let tasks = classify(&[root.join("src/scss/site.scss")], &ctx);
        assert_eq!(tasks, BTreeSet::from([TaskKind::Styles]));

        let tasks = classify(&[root.join("src/js/site.js")], &ctx);
        assert_eq!(tasks, BTreeSet::from([TaskKind::Scripts]));

        let tasks = classify(&[root.join("src/pages/about.html")], &ctx);
        assert_eq!(tasks, BTreeSet::from([TaskKind::Html]));

        // Unrelated files map to nothing.
        let tasks = classify(&[root.join("src/img/logo.png")], &ctx);
        assert!(tasks.is_empty());

        // A burst touching everything yields each task once.
        let tasks = classify(
            &[
                root.join("src/scss/site.scss"),
                root.join("src/scss/_vars.scss"),
                root.join("src/js/site.js"),
                root.join("src/index.html"),
            ],
            &ctx,
        );
        assert_eq!(tasks.len(), 3);
    }

    #[test]
    fn only_content_events_count() {
        assert!(is_change(&EventKind::Create(notify::event::CreateKind::File)));
        assert!(is_change(&EventKind::Modify(notify::event::ModifyKind::Any)));
        assert!(is_change(&EventKind::Remove(notify::event::RemoveKind::File)));
        assert!(!is_change(&EventKind::Access(notify::event::AccessKind::Any)));
    }

    #[tokio::test]
    async fn styles_rebuild_notifies_only_on_change() {
        let tmp = TempDir::new().unwrap();
        let ctx = sample_ctx(&tmp);

        let summary = pipeline::run_build(&ctx, &SilentProgress).await.unwrap();
        let mut state = WatchState::default();
        for out in &summary.styles.outputs {
            state.style_hashes.insert(out.output.clone(), out.sha256.clone());
        }

        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        // Source unchanged: rebuild produces identical bytes, no event.
        rebuild(&ctx, TaskKind::Styles, &hub, &mut state);
        assert!(rx.try_recv().is_err());

        // Real change: one styles event for the rebuilt output.
        std::fs::write(
            ctx.project_root.join("src/scss/site.scss"),
            "body { margin: 0; padding: 1px; }\n",
        )
        .unwrap();
        rebuild(&ctx, TaskKind::Styles, &hub, &mut state);
        assert_eq!(
            rx.try_recv().unwrap(),
            ReloadEvent::Styles {
                name: "site.min.css".into()
            }
        );
    }

    #[tokio::test]
    async fn html_rebuild_requests_full_reload() {
        let tmp = TempDir::new().unwrap();
        let ctx = sample_ctx(&tmp);
        pipeline::run_build(&ctx, &SilentProgress).await.unwrap();

        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        let mut state = WatchState::default();

        std::fs::write(
            ctx.project_root.join("src/index.html"),
            "<html><body><p>new</p></body></html>",
        )
        .unwrap();
        rebuild(&ctx, TaskKind::Html, &hub, &mut state);

        assert_eq!(rx.try_recv().unwrap(), ReloadEvent::Full);
        let copied = std::fs::read_to_string(
            ctx.config.output_root(&ctx.project_root).join("index.html"),
        )
        .unwrap();
        assert!(copied.contains("<p>new</p>"));
    }

    #[tokio::test]
    async fn broken_rebuild_does_not_panic() {
        let tmp = TempDir::new().unwrap();
        let ctx = sample_ctx(&tmp);
        pipeline::run_build(&ctx, &SilentProgress).await.unwrap();

        std::fs::write(
            ctx.project_root.join("src/scss/site.scss"),
            "body { color: $nope; }",
        )
        .unwrap();

        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        let mut state = WatchState::default();

        // Logged, not fatal, and no notification goes out.
        rebuild(&ctx, TaskKind::Styles, &hub, &mut state);
        assert!(rx.try_recv().is_err());
    }
}
