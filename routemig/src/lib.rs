//! Watch Express route files, infer Prisma models from them and keep
//! `schema.prisma` and its migrations in step.
//!
//! A run extracts routes with [`routemig_scan`], folds them into
//! [`ModelDescriptor`]s, rewrites the model blocks of the schema file and then
//! runs `prisma generate`, `prisma migrate dev --create-only` and
//! `prisma migrate deploy`.

pub mod config;
pub mod errors;
pub mod infer;
pub mod pipeline;
pub mod schema_file;
pub mod tooling;
pub mod types;
pub mod watch;

pub use config::{CONFIG_FILE, Overrides, ParseErrorPolicy, ProjectContext, RoutemigConfig};
pub use errors::{MigratorError, Result};
pub use infer::{BodyFieldHeuristic, InferenceOptions, PresenceOnly, SchemaInferrer, base_noun, model_name};
pub use pipeline::{Pipeline, PipelineSettings, RunReport, SkippedFile, extract_file};
pub use schema_file::{SchemaRewrite, render_schema, rewrite_schema_file, split_header};
pub use tooling::{CommandOutput, CommandRunner, MigrationStep, MigrationToolchain, ProcessRunner, ToolchainSettings};
pub use types::{FieldDescriptor, FieldType, ModelDescriptor, RelationDescriptor, RelationKind};
pub use watch::{changed_files, watch, watch_until};

pub use routemig_scan::{HttpMethod, ParseError, RouteDescriptor};
