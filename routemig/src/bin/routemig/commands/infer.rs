use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use routemig::{
    ModelDescriptor, Overrides, ParseErrorPolicy, ProjectContext, RouteDescriptor, SchemaInferrer, extract_file,
};
use routemig_scan::discover_route_files;
use serde::Serialize;

use super::{display_path, models_table};
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputFormat, OutputManager, TableDisplay, table_header, themed_table};
use crate::theme::ICONS;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Inspect Routes",
        commands: &[
            "routemig infer                             # Routes and models under ./routes",
            "routemig infer -r src/api                  # Another routes directory",
            "routemig infer routes/users.js             # Only the given files",
        ],
    },
    ExampleGroup {
        title: "Scripting",
        commands: &[
            "routemig --output json infer               # Routes and models as JSON",
            "routemig --output compact infer            # One-line summary",
        ],
    },
];

#[derive(Args, Debug, Clone)]
pub struct InferArgs {
    /// Directory containing route files [default: ./routes]
    #[arg(short = 'r', long = "routes", value_name = "DIR", env = "ROUTEMIG_ROUTES_DIR")]
    pub routes_dir: Option<PathBuf>,

    /// Route files to inspect instead of the whole directory
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

/// A route together with the file it was declared in
#[derive(Debug, Serialize)]
pub struct FileRoute {
    pub file: String,
    #[serde(flatten)]
    pub route: RouteDescriptor,
}

#[derive(Debug, Serialize)]
pub struct InferReport {
    pub routes: Vec<FileRoute>,
    pub models: Vec<ModelDescriptor>,
    pub skipped: Vec<String>,
}

impl TableDisplay for InferReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options);
        table_header(&mut table, options, &["File", "Method", "Path", "Params", "Body"]);

        if self.routes.is_empty() {
            table.add_row(vec![Cell::new("No routes found")]);
            return table;
        }

        for entry in &self.routes {
            let route = &entry.route;
            let body = match (route.uses_request_body, route.uses_response_body) {
                (true, true) => "req, res",
                (true, false) => "req",
                (false, true) => "res",
                (false, false) => "",
            };
            table.add_row(vec![
                Cell::new(&entry.file),
                Cell::new(route.method),
                Cell::new(&route.path),
                Cell::new(route.path_params.join(", ")),
                Cell::new(body),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let models: Vec<&str> = self.models.iter().map(|m| m.model_name.as_str()).collect();
        format!("routes={} models={}", self.routes.len(), models.join(","))
    }
}

pub async fn handle_infer(args: InferArgs, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find().context("Failed to load project context")?;
    let overrides = Overrides {
        routes_dir: args.routes_dir.clone(),
        ..Overrides::default()
    };
    let settings = ctx.pipeline_settings(&overrides);

    let files = if args.files.is_empty() {
        discover_route_files(&settings.routes_dir, &settings.extensions)
            .with_context(|| format!("Failed to scan {}", settings.routes_dir.display()))?
    } else {
        args.files.iter().map(|file| ctx.resolve(file)).collect()
    };

    output.heading("Inferring models from routes");
    output.progress(&format!("Parsing {} file(s)", files.len()));

    let mut routes = Vec::new();
    let mut skipped = Vec::new();
    for path in &files {
        let file = display_path(path, &ctx.root);
        match extract_file(path).await {
            Ok(found) => {
                output.verbose(&format!("{file}: {} route(s)", found.len()));
                routes.extend(found.into_iter().map(|route| FileRoute { file: file.clone(), route }));
            }
            Err(err) if settings.on_parse_error == ParseErrorPolicy::Skip => {
                skipped.push(err.to_string());
            }
            Err(err) => {
                output.clear_line();
                return Err(err).context("Route extraction failed");
            }
        }
    }
    output.clear_line();

    let descriptors: Vec<RouteDescriptor> = routes.iter().map(|entry| entry.route.clone()).collect();
    let models = SchemaInferrer::new(settings.inference).infer(&descriptors);
    let report = InferReport {
        routes,
        models,
        skipped,
    };

    for reason in &report.skipped {
        output.warning(&format!("Skipped {reason}"));
    }
    output.display(&report)?;

    if output.options.output_format == OutputFormat::Table && !output.options.quiet {
        println!();
        output.indented(ICONS.file, "Models");
        println!("{}", models_table(&output.options, &report.models));
    }
    Ok(())
}
