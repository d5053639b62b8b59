use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use routemig::{
    CommandOutput, CommandRunner, FieldDescriptor, InferenceOptions, MigrationStep, MigratorError, ModelDescriptor,
    Overrides, ParseErrorPolicy, Pipeline, PipelineSettings, ProjectContext, ToolchainSettings, watch_until,
};
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};

const HEADER: &str = r#"generator client {
  provider = "prisma-client-js"
}

datasource db {
  provider = "sqlite"
  url      = "file:dev.db"
}"#;

/// Stands in for `npx`: records every invocation and creates the client
/// directory when `prisma generate` runs.
#[derive(Clone)]
struct FakePrisma {
    calls: Arc<Mutex<Vec<String>>>,
    client_dir: PathBuf,
    fail_on: Option<&'static str>,
}

impl FakePrisma {
    fn new(client_dir: PathBuf) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            client_dir,
            fail_on: None,
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakePrisma {
    async fn run(&self, program: &str, args: &[String], _cwd: &Path) -> io::Result<CommandOutput> {
        let line = format!("{program} {}", args.join(" "));
        self.calls.lock().unwrap().push(line.clone());

        if self.fail_on.is_some_and(|verb| line.contains(verb)) {
            return Ok(CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: "Error: P1001: Can't reach database server".to_string(),
            });
        }
        if args.get(1).map(String::as_str) == Some("generate") {
            fs::create_dir_all(&self.client_dir)?;
        }
        Ok(CommandOutput {
            exit_code: Some(0),
            stdout: "done".to_string(),
            stderr: String::new(),
        })
    }
}

struct Project {
    dir: TempDir,
}

impl Project {
    fn new(schema: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::create_dir_all(dir.path().join("prisma")).unwrap();
        fs::write(dir.path().join("prisma/schema.prisma"), schema).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write_route(&self, name: &str, source: &str) -> PathBuf {
        let path = self.root().join("routes").join(name);
        fs::write(&path, source).unwrap();
        path
    }

    fn schema(&self) -> String {
        fs::read_to_string(self.root().join("prisma/schema.prisma")).unwrap()
    }

    fn client_dir(&self) -> PathBuf {
        self.root().join("node_modules/.prisma/client")
    }

    fn settings(&self) -> PipelineSettings {
        let schema_path = self.root().join("prisma/schema.prisma");
        PipelineSettings {
            routes_dir: self.root().join("routes"),
            extensions: vec!["js".to_string(), "ts".to_string()],
            schema_path: schema_path.clone(),
            on_parse_error: ParseErrorPolicy::Abort,
            inference: InferenceOptions::default(),
            toolchain: ToolchainSettings {
                program: "npx".to_string(),
                migration_name: "route_changes".to_string(),
                schema_path,
                client_dir: self.client_dir(),
                working_dir: self.root().to_path_buf(),
            },
            dry_run: false,
            skip_migrate: false,
        }
    }
}

fn items_model() -> ModelDescriptor {
    let mut model = ModelDescriptor::new("ItemsModel");
    model.fields.push(FieldDescriptor::id());
    model
}

#[tokio::test]
async fn test_single_route_end_to_end() {
    let project = Project::new(&format!("{HEADER}\n\nmodel Stale {{\n  id Int @id\n}}\n"));
    let file = project.write_route("items.js", "router.get(\"/items/:id\", handler);\n");
    let prisma = FakePrisma::new(project.client_dir());

    let pipeline = Pipeline::new(project.settings(), prisma.clone());
    let report = pipeline.run(&[file]).await.unwrap();

    assert_eq!(report.routes.len(), 1);
    assert_eq!(report.models, vec![items_model()]);
    assert_eq!(report.replaced_models, vec!["Stale"]);
    assert!(report.written);
    assert_eq!(
        report.migrated,
        MigrationStep::ALL.iter().map(ToString::to_string).collect::<Vec<_>>()
    );

    assert_eq!(
        project.schema(),
        format!("{HEADER}\n\nmodel ItemsModel {{\n  id String @id @default(uuid())\n}}\n")
    );

    let schema_arg = project.root().join("prisma/schema.prisma").display().to_string();
    assert_eq!(
        prisma.calls(),
        vec![
            format!("npx prisma generate --schema {schema_arg}"),
            format!("npx prisma migrate dev --create-only --name route_changes --schema {schema_arg}"),
            format!("npx prisma migrate deploy --schema {schema_arg}"),
        ]
    );
}

#[tokio::test]
async fn test_empty_batch_leaves_header_only() {
    let project = Project::new(&format!("{HEADER}\n\nmodel UsersModel {{\n  id String @id\n}}\n"));
    let file = project.write_route("health.js", "const express = require('express');\nmodule.exports = {};\n");

    let mut settings = project.settings();
    settings.skip_migrate = true;
    let prisma = FakePrisma::new(project.client_dir());
    let report = Pipeline::new(settings, prisma.clone()).run(&[file]).await.unwrap();

    assert!(report.models.is_empty());
    assert!(report.migrated.is_empty());
    assert_eq!(project.schema(), format!("{HEADER}\n"));
    assert!(prisma.calls().is_empty());
}

#[tokio::test]
async fn test_rewrite_is_idempotent() {
    let project = Project::new(HEADER);
    project.write_route(
        "users.js",
        "router.get('/users', list);\nrouter.put('/users/:id', (req, res) => { save(req.body); res.json({}); });\n",
    );
    project.write_route("posts.ts", "app.delete('/users/:userId/posts/:postId', remove);\n");

    let mut settings = project.settings();
    settings.skip_migrate = true;
    let pipeline = Pipeline::new(settings, FakePrisma::new(project.client_dir()));

    pipeline.run_all().await.unwrap();
    let first = project.schema();
    let report = pipeline.run_all().await.unwrap();
    assert_eq!(project.schema(), first);

    let names: Vec<_> = report.models.iter().map(|m| m.model_name.as_str()).collect();
    assert_eq!(names, vec!["PostsModel", "UsersModel"]);
    assert_eq!(report.replaced_models, vec!["PostsModel", "UsersModel"]);
    assert!(first.contains("model PostsModel {\n  id String @id @default(uuid())\n  userId String\n  postId String\n}"));
}

#[tokio::test]
async fn test_parse_error_policies() {
    let project = Project::new(HEADER);
    let broken = project.write_route("broken.js", "router.get('/a', (req, res) => {\n");
    let good = project.write_route("orders.js", "router.post('/orders', create);\n");
    let files = vec![broken.clone(), good];

    let mut settings = project.settings();
    settings.skip_migrate = true;
    let err = Pipeline::new(settings.clone(), FakePrisma::new(project.client_dir()))
        .run(&files)
        .await
        .unwrap_err();
    match err {
        MigratorError::Parse { path, .. } => assert_eq!(path, broken),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(project.schema(), HEADER);

    settings.on_parse_error = ParseErrorPolicy::Skip;
    let report = Pipeline::new(settings, FakePrisma::new(project.client_dir()))
        .run(&files)
        .await
        .unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, broken);
    assert_eq!(report.models.len(), 1);
    assert_eq!(report.models[0].model_name, "OrdersModel");
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let project = Project::new(HEADER);
    let file = project.write_route("items.js", "router.get('/items/:id', handler);\n");
    let prisma = FakePrisma::new(project.client_dir());

    let mut settings = project.settings();
    settings.dry_run = true;
    let report = Pipeline::new(settings, prisma.clone()).run(&[file]).await.unwrap();

    assert!(!report.written);
    assert!(report.rendered.contains("model ItemsModel {"));
    assert_eq!(project.schema(), HEADER);
    assert!(prisma.calls().is_empty());
}

#[tokio::test]
async fn test_tool_failure_stops_sequence() {
    let project = Project::new(HEADER);
    let file = project.write_route("items.js", "router.get('/items/:id', handler);\n");
    let mut prisma = FakePrisma::new(project.client_dir());
    prisma.fail_on = Some("migrate dev");

    let err = Pipeline::new(project.settings(), prisma.clone()).run(&[file]).await.unwrap_err();
    assert!(matches!(
        err,
        MigratorError::ExternalTool {
            step: MigrationStep::CreateMigration,
            exit_code: Some(1),
            ..
        }
    ));
    assert!(err.to_string().ends_with("Can't reach database server"));
    assert_eq!(prisma.calls().len(), 2);
    // the schema was already rewritten when the toolchain failed
    assert!(project.schema().contains("model ItemsModel"));
}

#[tokio::test]
async fn test_settings_from_project_config() {
    let project = Project::new(HEADER);
    fs::create_dir_all(project.root().join("api")).unwrap();
    fs::write(project.root().join("api/items.js"), "app.get('/items', list);\n").unwrap();
    fs::write(
        project.root().join("routemig.toml"),
        "[routes]\ndir = \"api\"\n\n[migrate]\nskip = true\n",
    )
    .unwrap();

    let context = ProjectContext::from_root(project.root().to_path_buf()).unwrap();
    let settings = context.pipeline_settings(&Overrides::default());
    assert!(settings.skip_migrate);

    let report = Pipeline::new(settings, FakePrisma::new(project.client_dir()))
        .run_all()
        .await
        .unwrap();
    assert_eq!(report.files, vec![project.root().join("api/items.js")]);
    assert_eq!(report.models, vec![items_model()]);
}

#[tokio::test]
async fn test_watch_survives_failed_run() {
    let project = Project::new(HEADER);
    let routes_dir = project.root().join("routes");
    let mut settings = project.settings();
    settings.skip_migrate = true;
    let pipeline = Pipeline::new(settings, FakePrisma::new(project.client_dir()));

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<(Vec<PathBuf>, bool)>();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let shutdown = async {
        let _ = stop_rx.await;
    };

    let watcher = watch_until(&pipeline, Duration::from_millis(100), shutdown, |changed, outcome| {
        let _ = outcome_tx.send((changed.to_vec(), outcome.is_ok()));
    });

    let edits = async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        fs::write(routes_dir.join("broken.js"), "router.get('/a', (req, res) => {\n").unwrap();

        let mut seen = Vec::new();
        while let Some((_, ok)) = outcome_rx.recv().await {
            seen.push(ok);
            if !ok {
                break;
            }
        }

        fs::write(routes_dir.join("items.js"), "router.get('/items/:id', handler);\n").unwrap();
        let mut last_ok_batch = Vec::new();
        while let Some((changed, ok)) = outcome_rx.recv().await {
            seen.push(ok);
            if ok {
                last_ok_batch = changed;
                break;
            }
        }

        let _ = stop_tx.send(());
        (seen, last_ok_batch)
    };

    let (watched, (seen, last_ok_batch)) = tokio::time::timeout(Duration::from_secs(20), async {
        tokio::join!(watcher, edits)
    })
    .await
    .expect("watch loop did not finish");

    watched.unwrap();
    assert_eq!(seen.first(), Some(&false));
    assert_eq!(seen.last(), Some(&true));
    assert_eq!(last_ok_batch.len(), 1);
    assert!(last_ok_batch[0].ends_with("items.js"));
    assert!(project.schema().contains("model ItemsModel"));
}
