//! One extract -> infer -> write -> migrate run.

use std::path::{Path, PathBuf};

use routemig_scan::{RouteDescriptor, SourceKind, discover_route_files, extract_routes_as};
use serde::Serialize;

use crate::config::ParseErrorPolicy;
use crate::errors::{MigratorError, Result};
use crate::infer::{InferenceOptions, SchemaInferrer};
use crate::schema_file::{render_schema_file, rewrite_schema_file};
use crate::tooling::{CommandRunner, MigrationStep, MigrationToolchain, ProcessRunner, ToolchainSettings};
use crate::types::ModelDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub routes_dir: PathBuf,
    pub extensions: Vec<String>,
    pub schema_path: PathBuf,
    pub on_parse_error: ParseErrorPolicy,
    pub inference: InferenceOptions,
    pub toolchain: ToolchainSettings,
    /// Render the schema without writing it or running the toolchain.
    pub dry_run: bool,
    pub skip_migrate: bool,
}

/// A route file left out of a run because it failed to parse.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Files whose routes were extracted.
    pub files: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    pub routes: Vec<RouteDescriptor>,
    pub models: Vec<ModelDescriptor>,
    /// Models that were in the schema before the rewrite.
    pub replaced_models: Vec<String>,
    pub schema_path: PathBuf,
    /// Schema text written, or that would have been written on a dry run.
    pub rendered: String,
    pub written: bool,
    /// Toolchain steps that completed.
    pub migrated: Vec<String>,
}

/// Read a route file and extract its route declarations.
///
/// `.ts` files use the TypeScript grammar, everything else JavaScript.
pub async fn extract_file(path: &Path) -> Result<Vec<RouteDescriptor>> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MigratorError::io(path, source))?;
    extract_routes_as(&source, SourceKind::from_path(path)).map_err(|source| MigratorError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub struct Pipeline<R = ProcessRunner> {
    settings: PipelineSettings,
    inferrer: SchemaInferrer,
    toolchain: MigrationToolchain<R>,
}

impl Pipeline<ProcessRunner> {
    pub fn with_processes(settings: PipelineSettings) -> Self {
        Self::new(settings, ProcessRunner)
    }
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(settings: PipelineSettings, runner: R) -> Self {
        let inferrer = SchemaInferrer::new(settings.inference);
        let toolchain = MigrationToolchain::new(runner, settings.toolchain.clone());
        Self {
            settings,
            inferrer,
            toolchain,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Every route file currently under the routes directory.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let settings = &self.settings;
        discover_route_files(&settings.routes_dir, &settings.extensions)
            .map_err(|source| MigratorError::io(&settings.routes_dir, source))
    }

    /// Run over every route file under the routes directory.
    pub async fn run_all(&self) -> Result<RunReport> {
        let files = self.discover()?;
        self.run(&files).await
    }

    /// Run over one batch of files.
    ///
    /// The schema is rebuilt from this batch alone: models not inferred from
    /// these files are dropped from the schema.
    pub async fn run(&self, files: &[PathBuf]) -> Result<RunReport> {
        let settings = &self.settings;

        log::info!("extracting routes from {} file(s)", files.len());
        let mut scanned = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();
        let mut routes = Vec::new();
        for path in files {
            match extract_file(path).await {
                Ok(found) => {
                    log::debug!("{}: {} route(s)", path.display(), found.len());
                    routes.extend(found);
                    scanned.push(path.clone());
                }
                Err(err @ MigratorError::Parse { .. }) if settings.on_parse_error == ParseErrorPolicy::Skip => {
                    log::warn!("skipping {err}");
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let models = self.inferrer.infer(&routes);
        log::info!("inferred {} model(s) from {} route(s)", models.len(), routes.len());
        for model in &models {
            log::debug!(
                "{}: {} field(s), {} relation(s)",
                model.model_name,
                model.fields.len(),
                model.relations.len()
            );
        }

        let rewrite = if settings.dry_run {
            render_schema_file(&settings.schema_path, &models).await?
        } else {
            rewrite_schema_file(&settings.schema_path, &models).await?
        };
        if !rewrite.replaced_models.is_empty() {
            log::info!("replacing models: {}", rewrite.replaced_models.join(", "));
        }
        if !settings.dry_run {
            log::info!("wrote {}", settings.schema_path.display());
        }

        let migrated: Vec<MigrationStep> = if settings.dry_run || settings.skip_migrate {
            log::info!("migration skipped");
            Vec::new()
        } else {
            self.toolchain.run().await?
        };

        Ok(RunReport {
            files: scanned,
            skipped,
            routes,
            models,
            replaced_models: rewrite.replaced_models,
            schema_path: settings.schema_path.clone(),
            rendered: rewrite.rendered,
            written: !settings.dry_run,
            migrated: migrated.iter().map(ToString::to_string).collect(),
        })
    }
}
