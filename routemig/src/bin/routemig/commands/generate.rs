use anyhow::{Context, Result};
use clap::Args;
use routemig::{Pipeline, ProjectContext};

use super::{ProjectArgs, RunArgs, display_path, overrides, print_run_report};
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "One-off Runs",
        commands: &[
            "routemig generate                          # Rebuild models from ./routes and migrate",
            "routemig generate -r src/api -s db/schema.prisma",
            "routemig generate --name add_orders        # Custom migration name",
        ],
    },
    ExampleGroup {
        title: "Preview",
        commands: &[
            "routemig generate --dry-run                # Print the schema, write nothing",
            "routemig generate --skip-migrate           # Write the schema, skip prisma",
            "routemig --output json generate --dry-run  # Machine-readable report",
        ],
    },
];

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

pub async fn handle_generate(args: GenerateArgs, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find().context("Failed to load project context")?;
    if ctx.has_config_file() {
        output.verbose(&format!("Using {}", ctx.config_path.display()));
    }

    let settings = ctx.pipeline_settings(&overrides(&args.project, &args.run));
    output.heading("Generating Prisma models from routes");
    output.key_value("Routes", &display_path(&settings.routes_dir, &ctx.root));
    output.key_value("Schema", &display_path(&settings.schema_path, &ctx.root));

    let pipeline = Pipeline::with_processes(settings);

    output.progress("Scanning route files");
    let files = pipeline.discover();
    output.clear_line();
    let files = files.context("Failed to scan route files")?;

    if files.is_empty() {
        output.warning("No route files found, the schema will keep only its header");
    } else {
        output.info(&format!("Found {} route file(s)", files.len()));
    }

    output.progress("Extracting routes and rewriting schema");
    let report = pipeline.run(&files).await;
    output.clear_line();
    let report = report.context("Generation failed")?;

    print_run_report(output, &report, &ctx.root)
}
