//! Debounced watch loop over the routes directory.
//!
//! Each debounced batch of changes triggers one pipeline run over the changed
//! files. A run is awaited to completion before the next batch is taken, so
//! runs never overlap; changes made during a run are picked up afterwards.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_full::notify::{Event, EventKind, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, new_debouncer};
use routemig_scan::{has_route_extension, is_hidden};
use tokio::sync::mpsc;

use crate::errors::{MigratorError, Result};
use crate::pipeline::{Pipeline, RunReport};
use crate::tooling::CommandRunner;

/// Route files touched by a batch of create/modify events.
///
/// Paths are kept in first-seen order without duplicates. Paths outside
/// `root`, hidden paths (relative to `root`) and files without a route
/// extension are dropped. `root` should be canonical; event paths that do not
/// start with it are canonicalized before the comparison.
pub fn changed_files<'a, S: AsRef<str>>(
    events: impl IntoIterator<Item = &'a Event>,
    root: &Path,
    extensions: &[S],
) -> Vec<PathBuf> {
    let mut changed: Vec<PathBuf> = Vec::new();
    for event in events {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            continue;
        }
        for path in &event.paths {
            let Some(relative) = relative_to(root, path) else {
                continue;
            };
            if is_hidden(&relative) || !has_route_extension(path, extensions) {
                continue;
            }
            if !changed.contains(path) {
                changed.push(path.clone());
            }
        }
    }
    changed
}

fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(relative) = path.strip_prefix(root) {
        return Some(relative.to_path_buf());
    }
    let canonical = path.canonicalize().ok()?;
    canonical.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Watch until Ctrl+C.
pub async fn watch<R, F>(pipeline: &Pipeline<R>, debounce: Duration, on_run: F) -> Result<()>
where
    R: CommandRunner,
    F: FnMut(&[PathBuf], &Result<RunReport>),
{
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };
    watch_until(pipeline, debounce, shutdown, on_run).await
}

/// Watch until `shutdown` completes.
///
/// `on_run` receives the changed files and the outcome of every run. A failed
/// run does not stop the loop.
pub async fn watch_until<R, F, S>(
    pipeline: &Pipeline<R>,
    debounce: Duration,
    shutdown: S,
    mut on_run: F,
) -> Result<()>
where
    R: CommandRunner,
    F: FnMut(&[PathBuf], &Result<RunReport>),
    S: Future<Output = ()>,
{
    let settings = pipeline.settings();
    let routes_dir = tokio::fs::canonicalize(&settings.routes_dir)
        .await
        .map_err(|source| MigratorError::io(&settings.routes_dir, source))?;
    if !routes_dir.is_dir() {
        return Err(MigratorError::io(
            &routes_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "routes directory not found"),
        ));
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
        let _ = tx.send(result);
    })?;
    debouncer.watch(&routes_dir, RecursiveMode::Recursive)?;
    log::info!("watching {}", routes_dir.display());

    tokio::pin!(shutdown);
    loop {
        let batch = tokio::select! {
            _ = &mut shutdown => break,
            batch = rx.recv() => batch,
        };

        let events = match batch {
            Some(Ok(events)) => events,
            Some(Err(errors)) => {
                for err in errors {
                    log::warn!("watch error: {err}");
                }
                continue;
            }
            None => break,
        };

        let mut changed = changed_files(events.iter().map(|event| &event.event), &routes_dir, &settings.extensions);
        changed.retain(|path| path.is_file());
        if changed.is_empty() {
            continue;
        }

        log::info!("{} route file(s) changed", changed.len());
        let outcome = pipeline.run(&changed).await;
        if let Err(err) = &outcome {
            log::error!("run failed: {err}");
        }
        on_run(&changed, &outcome);
    }

    log::info!("stopped watching {}", routes_dir.display());
    Ok(())
}
