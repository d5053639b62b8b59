use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use routemig::{Pipeline, ProjectContext, RunReport};

use super::{ProjectArgs, RunArgs, display_path, overrides};
use crate::examples::ExampleGroup;
use crate::output::OutputManager;
use crate::theme::ICONS;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Watch Mode",
        commands: &[
            "routemig watch                             # Watch ./routes, migrate on every change",
            "routemig watch -r src/routes -s prisma/schema.prisma",
            "routemig watch --debounce-ms 1000          # Wait longer for editors to settle",
        ],
    },
    ExampleGroup {
        title: "Without Migrations",
        commands: &[
            "routemig watch --skip-migrate              # Keep schema.prisma in sync only",
            "routemig watch --dry-run                   # Print the schema after each change",
        ],
    },
];

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub run: RunArgs,

    /// Quiet period before a batch of changes is processed [default: 500]
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,
}

pub async fn handle_watch(args: WatchArgs, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find().context("Failed to load project context")?;
    if ctx.has_config_file() {
        output.verbose(&format!("Using {}", ctx.config_path.display()));
    }

    let settings = ctx.pipeline_settings(&overrides(&args.project, &args.run));
    let debounce = Duration::from_millis(args.debounce_ms.unwrap_or(ctx.config.watch.debounce_ms));
    let mode = if settings.dry_run {
        "dry run"
    } else if settings.skip_migrate {
        "schema only"
    } else {
        "schema + prisma migrate"
    };

    output.heading("Watching route files");
    output.key_value("Routes", &display_path(&settings.routes_dir, &ctx.root));
    output.key_value("Schema", &display_path(&settings.schema_path, &ctx.root));
    output.key_value("Mode", mode);
    output.info("Press Ctrl+C to stop");

    let pipeline = Pipeline::with_processes(settings);
    routemig::watch(&pipeline, debounce, |changed, outcome| {
        report_run(output, changed, outcome, &ctx.root);
    })
    .await
    .context("Watcher stopped unexpectedly")?;

    output.success("Stopped watching");
    Ok(())
}

fn report_run(output: &OutputManager, changed: &[PathBuf], outcome: &routemig::Result<RunReport>, root: &Path) {
    let now = chrono::Local::now().format("%H:%M:%S");

    match outcome {
        Ok(report) => {
            let models: Vec<&str> = report.models.iter().map(|m| m.model_name.as_str()).collect();
            output.success(&format!(
                "[{now}] {} file(s), {} route(s) -> {}",
                changed.len(),
                report.routes.len(),
                if models.is_empty() { "no models".to_string() } else { models.join(", ") }
            ));
            for path in changed {
                output.indented(ICONS.changed, &display_path(path, root));
            }
            for skipped in &report.skipped {
                output.warning(&format!("Skipped {}: {}", display_path(&skipped.path, root), skipped.reason));
            }
            if !report.written {
                output.raw(&report.rendered);
            } else if !report.migrated.is_empty() {
                output.indented(ICONS.success, &report.migrated.join(", "));
            }
        }
        Err(err) => {
            output.error(&format!("[{now}] {err}"));
            for path in changed {
                output.indented(ICONS.changed, &display_path(path, root));
            }
        }
    }
}
