pub mod generate;
pub mod infer;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use routemig::{ModelDescriptor, Overrides, RunReport};

use crate::output::{GlobalOptions, OutputManager, TableDisplay, table_header, themed_table};
use crate::theme::ICONS;

/// Where the routes and the schema live
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Directory containing route files [default: ./routes]
    #[arg(short = 'r', long = "routes", value_name = "DIR", env = "ROUTEMIG_ROUTES_DIR")]
    pub routes_dir: Option<PathBuf>,

    /// Prisma schema to rewrite [default: ./prisma/schema.prisma]
    #[arg(short = 's', long = "schema", value_name = "FILE", env = "ROUTEMIG_SCHEMA")]
    pub schema_path: Option<PathBuf>,
}

/// How a run treats the schema and the Prisma toolchain
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Print the schema that would be written without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Rewrite the schema but do not run prisma
    #[arg(long)]
    pub skip_migrate: bool,

    /// Name passed to `prisma migrate dev --name` [default: route_changes]
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub migration_name: Option<String>,
}

pub fn overrides(project: &ProjectArgs, run: &RunArgs) -> Overrides {
    Overrides {
        routes_dir: project.routes_dir.clone(),
        schema_path: project.schema_path.clone(),
        migration_name: run.migration_name.clone(),
        dry_run: run.dry_run,
        skip_migrate: run.skip_migrate,
    }
}

/// `path` relative to `root` when it lies inside it
pub fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// One row per model: name, fields, relations
pub fn models_table(options: &GlobalOptions, models: &[ModelDescriptor]) -> Table {
    let mut table = themed_table(options);
    table_header(&mut table, options, &["Model", "Fields", "Relations"]);

    if models.is_empty() {
        table.add_row(vec![Cell::new("No models inferred"), Cell::new(""), Cell::new("")]);
        return table;
    }

    for model in models {
        let fields: Vec<String> = model
            .fields
            .iter()
            .map(|field| {
                let optional = if field.optional { "?" } else { "" };
                format!("{}: {}{optional}", field.name, field.field_type.prisma_type())
            })
            .collect();
        let relations: Vec<String> = model
            .relations
            .iter()
            .map(|relation| format!("{} {} {}", relation.name, ICONS.arrow, relation.related_model))
            .collect();
        table.add_row(vec![
            Cell::new(&model.model_name),
            Cell::new(fields.join("\n")),
            Cell::new(relations.join("\n")),
        ]);
    }
    table
}

impl TableDisplay for RunReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        models_table(options, &self.models)
    }

    fn to_compact(&self) -> String {
        let models: Vec<&str> = self.models.iter().map(|m| m.model_name.as_str()).collect();
        format!(
            "files={} skipped={} routes={} models={} written={} migrated={}",
            self.files.len(),
            self.skipped.len(),
            self.routes.len(),
            if models.is_empty() { "-".to_string() } else { models.join(",") },
            self.written,
            !self.migrated.is_empty()
        )
    }
}

/// Print a finished run: skipped files, models, schema and toolchain outcome
pub fn print_run_report(output: &OutputManager, report: &RunReport, root: &Path) -> Result<()> {
    for skipped in &report.skipped {
        output.warning(&format!("Skipped {}: {}", display_path(&skipped.path, root), skipped.reason));
    }

    output.display(report)?;

    if !report.written {
        output.heading("Schema (dry run, not written)");
        output.raw(&report.rendered);
        return Ok(());
    }

    output.success(&format!(
        "Wrote {} model(s) to {}",
        report.models.len(),
        display_path(&report.schema_path, root)
    ));
    if !report.replaced_models.is_empty() {
        output.verbose(&format!("Replaced: {}", report.replaced_models.join(", ")));
    }

    if report.migrated.is_empty() {
        output.info("Prisma toolchain skipped");
    } else {
        for step in &report.migrated {
            output.indented(ICONS.success, step);
        }
    }
    Ok(())
}
