//! External migration toolchain.
//!
//! Three Prisma commands run in order against the rewritten schema. Each must
//! exit successfully before the next starts, and the generated client
//! directory must exist before a migration is created.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::{MigratorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    GenerateClient,
    CreateMigration,
    ApplyMigration,
}

impl MigrationStep {
    pub const ALL: [MigrationStep; 3] = [Self::GenerateClient, Self::CreateMigration, Self::ApplyMigration];

    /// Arguments passed to the configured program for this step.
    pub fn args(self, schema_path: &Path, migration_name: &str) -> Vec<String> {
        let mut args: Vec<String> = match self {
            Self::GenerateClient => vec!["prisma".into(), "generate".into()],
            Self::CreateMigration => vec![
                "prisma".into(),
                "migrate".into(),
                "dev".into(),
                "--create-only".into(),
                "--name".into(),
                migration_name.to_string(),
            ],
            Self::ApplyMigration => vec!["prisma".into(), "migrate".into(), "deploy".into()],
        };
        args.push("--schema".into());
        args.push(schema_path.display().to_string());
        args
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GenerateClient => "prisma generate",
            Self::CreateMigration => "prisma migrate dev",
            Self::ApplyMigration => "prisma migrate deploy",
        };
        f.write_str(label)
    }
}

/// Captured result of an external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands to completion.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput>;
}

/// Spawns real processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainSettings {
    /// Program that hosts the Prisma CLI, `npx` by default.
    pub program: String,
    pub migration_name: String,
    pub schema_path: PathBuf,
    /// Directory `prisma generate` must produce.
    pub client_dir: PathBuf,
    /// Working directory for every command.
    pub working_dir: PathBuf,
}

/// `<schema dir>/../node_modules/.prisma/client`
pub fn default_client_dir(schema_path: &Path) -> PathBuf {
    schema_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("..")
        .join("node_modules")
        .join(".prisma")
        .join("client")
}

pub struct MigrationToolchain<R> {
    runner: R,
    settings: ToolchainSettings,
}

impl<R: CommandRunner> MigrationToolchain<R> {
    pub fn new(runner: R, settings: ToolchainSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &ToolchainSettings {
        &self.settings
    }

    /// Run every step in order, stopping at the first failure.
    pub async fn run(&self) -> Result<Vec<MigrationStep>> {
        let mut completed = Vec::with_capacity(MigrationStep::ALL.len());
        for step in MigrationStep::ALL {
            self.run_step(step).await?;
            if step == MigrationStep::GenerateClient {
                self.check_client().await?;
            }
            completed.push(step);
        }
        Ok(completed)
    }

    pub async fn run_step(&self, step: MigrationStep) -> Result<CommandOutput> {
        let settings = &self.settings;
        let args = step.args(&settings.schema_path, &settings.migration_name);
        log::info!("running {} {}", settings.program, args.join(" "));

        let output = self
            .runner
            .run(&settings.program, &args, &settings.working_dir)
            .await
            .map_err(|source| MigratorError::ToolLaunch { step, source })?;

        if !output.success() {
            return Err(MigratorError::ExternalTool {
                step,
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        if !output.stdout.trim().is_empty() {
            log::debug!("{step} stdout:\n{}", output.stdout.trim_end());
        }
        if !output.stderr.trim().is_empty() {
            log::warn!("{step} stderr:\n{}", output.stderr.trim_end());
        }
        Ok(output)
    }

    async fn check_client(&self) -> Result<()> {
        let client_dir = &self.settings.client_dir;
        match tokio::fs::try_exists(client_dir).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MigratorError::MissingArtifact {
                path: client_dir.clone(),
            }),
            Err(source) => Err(MigratorError::io(client_dir, source)),
        }
    }
}
