use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{MigratorError, Result};
use crate::infer::InferenceOptions;
use crate::pipeline::PipelineSettings;
use crate::tooling::{ToolchainSettings, default_client_dir};

/// Name of the optional configuration file in the project root.
pub const CONFIG_FILE: &str = "routemig.toml";

/// Project context for routemig operations
pub struct ProjectContext {
    /// Directory every relative path is resolved against
    pub root: PathBuf,
    /// Path to routemig.toml (may not exist)
    pub config_path: PathBuf,
    /// Loaded configuration, defaults when the file is absent
    pub config: RoutemigConfig,
}

/// Configuration stored in routemig.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutemigConfig {
    #[serde(default)]
    pub routes: RoutesSettings,
    #[serde(default)]
    pub schema: SchemaSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub migrate: MigrateSettings,
    #[serde(default)]
    pub watch: WatchSettings,
}

/// What to do with a route file that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Log the file and continue with the rest of the batch.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesSettings {
    #[serde(default = "default_routes_dir")]
    pub dir: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub on_parse_error: ParseErrorPolicy,
}

impl Default for RoutesSettings {
    fn default() -> Self {
        Self {
            dir: default_routes_dir(),
            extensions: default_extensions(),
            on_parse_error: ParseErrorPolicy::default(),
        }
    }
}

fn default_routes_dir() -> String {
    "./routes".to_string()
}

fn default_extensions() -> Vec<String> {
    routemig_scan::DEFAULT_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSettings {
    #[serde(default = "default_schema_path")]
    pub path: String,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
        }
    }
}

fn default_schema_path() -> String {
    "./prisma/schema.prisma".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSettings {
    #[serde(default = "default_true")]
    pub relations: bool,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self { relations: true }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateSettings {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_migration_name")]
    pub migration_name: String,
    /// Defaults to `<schema dir>/../node_modules/.prisma/client`
    #[serde(default)]
    pub client_dir: Option<String>,
    #[serde(default)]
    pub skip: bool,
}

impl Default for MigrateSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            migration_name: default_migration_name(),
            client_dir: None,
            skip: false,
        }
    }
}

fn default_program() -> String {
    "npx".to_string()
}

fn default_migration_name() -> String {
    "route_changes".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

/// Command-line values that take precedence over routemig.toml.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub routes_dir: Option<PathBuf>,
    pub schema_path: Option<PathBuf>,
    pub migration_name: Option<String>,
    pub dry_run: bool,
    pub skip_migrate: bool,
}

impl ProjectContext {
    /// Load context for the current directory
    pub fn find() -> Result<Self> {
        let current_dir = std::env::current_dir()
            .map_err(|source| MigratorError::io(".", source))?;
        Self::from_root(current_dir)
    }

    /// Create context from a known project root
    pub fn from_root(root: PathBuf) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        let config = if config_path.is_file() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|source| MigratorError::io(&config_path, source))?;
            toml::from_str(&content).map_err(|err| {
                MigratorError::Config(format!("{}: {}", config_path.display(), err.message()))
            })?
        } else {
            RoutemigConfig::default()
        };

        Ok(Self {
            root,
            config_path,
            config,
        })
    }

    pub fn has_config_file(&self) -> bool {
        self.config_path.is_file()
    }

    /// Resolve a possibly relative path against the project root
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn routes_dir(&self, overrides: &Overrides) -> PathBuf {
        match &overrides.routes_dir {
            Some(dir) => self.resolve(dir),
            None => self.resolve(&self.config.routes.dir),
        }
    }

    pub fn schema_path(&self, overrides: &Overrides) -> PathBuf {
        match &overrides.schema_path {
            Some(path) => self.resolve(path),
            None => self.resolve(&self.config.schema.path),
        }
    }

    /// Settings for one pipeline run, file values overridden by `overrides`
    pub fn pipeline_settings(&self, overrides: &Overrides) -> PipelineSettings {
        let config = &self.config;
        let schema_path = self.schema_path(overrides);
        let client_dir = match &config.migrate.client_dir {
            Some(dir) => self.resolve(dir),
            None => default_client_dir(&schema_path),
        };

        PipelineSettings {
            routes_dir: self.routes_dir(overrides),
            extensions: config.routes.extensions.clone(),
            on_parse_error: config.routes.on_parse_error,
            inference: InferenceOptions {
                infer_relations: config.inference.relations,
            },
            toolchain: ToolchainSettings {
                program: config.migrate.program.clone(),
                migration_name: overrides
                    .migration_name
                    .clone()
                    .unwrap_or_else(|| config.migrate.migration_name.clone()),
                schema_path: schema_path.clone(),
                client_dir,
                working_dir: self.root.clone(),
            },
            schema_path,
            dry_run: overrides.dry_run,
            skip_migrate: overrides.skip_migrate || config.migrate.skip,
        }
    }
}
