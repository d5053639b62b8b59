//! Prisma schema rendering and rewriting.
//!
//! The text before the first `model` block (datasource, generator) is kept;
//! every model block is regenerated from the inferred batch.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{MigratorError, Result};
use crate::types::ModelDescriptor;

static MODEL_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*model[ \t]+(\w+)\s*\{").expect("valid model regex"));

/// Header text preceding the first model block, trimmed.
pub fn split_header(text: &str) -> &str {
    match MODEL_OPEN.find(text) {
        Some(found) => text[..found.start()].trim(),
        None => text.trim(),
    }
}

/// Names of the model blocks currently present in a schema.
pub fn existing_model_names(text: &str) -> Vec<String> {
    MODEL_OPEN
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}

pub fn render_model(model: &ModelDescriptor) -> String {
    let mut lines = Vec::with_capacity(model.fields.len() + model.relations.len() + 2);
    lines.push(format!("model {} {{", model.model_name));

    for field in &model.fields {
        let optional = if field.optional { "?" } else { "" };
        let attributes = if field.name == "id" {
            " @id @default(uuid())"
        } else if field.unique {
            " @unique"
        } else {
            ""
        };
        lines.push(format!(
            "  {} {}{optional}{attributes}",
            field.name,
            field.field_type.prisma_type()
        ));
    }

    // related models are never generated, so relations stay comments
    for relation in &model.relations {
        let optional = if relation.optional { "?" } else { "" };
        lines.push(format!(
            "  // {} {} -> {}{optional}",
            relation.kind, relation.name, relation.related_model
        ));
    }

    lines.push("}".to_string());
    lines.join("\n")
}

/// Full schema text: header, then one block per model, blank-line separated.
pub fn render_schema(header: &str, models: &[ModelDescriptor]) -> String {
    let header = header.trim();
    let mut parts: Vec<String> = Vec::with_capacity(models.len() + 1);
    if !header.is_empty() {
        parts.push(header.to_string());
    }
    parts.extend(models.iter().map(render_model));

    let mut text = parts.join("\n\n");
    text.push('\n');
    text
}

/// Result of rewriting a schema file.
#[derive(Debug, Clone)]
pub struct SchemaRewrite {
    /// Model names present before the rewrite.
    pub replaced_models: Vec<String>,
    /// Text written (or, for a dry run, that would have been written).
    pub rendered: String,
}

/// Render the schema for `models` against the header currently in `path`.
pub async fn render_schema_file(path: &Path, models: &[ModelDescriptor]) -> Result<SchemaRewrite> {
    let current = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MigratorError::io(path, source))?;

    Ok(SchemaRewrite {
        replaced_models: existing_model_names(&current),
        rendered: render_schema(split_header(&current), models),
    })
}

/// Replace every model block in the schema file at `path`.
pub async fn rewrite_schema_file(path: &Path, models: &[ModelDescriptor]) -> Result<SchemaRewrite> {
    let rewrite = render_schema_file(path, models).await?;
    tokio::fs::write(path, &rewrite.rendered)
        .await
        .map_err(|source| MigratorError::io(path, source))?;
    Ok(rewrite)
}
