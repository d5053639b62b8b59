//! Descriptor types for inferred models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar type of an inferred field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Int,
    Boolean,
    DateTime,
    /// Nested object, promoted to a relation when relation inference is on.
    Object,
}

impl FieldType {
    /// Prisma scalar used when the field is written to the schema.
    pub fn prisma_type(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Object => "Json",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Object => "Object",
        };
        f.write_str(name)
    }
}

/// Information about a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub optional: bool,

    pub unique: bool,
}

impl FieldDescriptor {
    /// Required, non-unique field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: false,
            unique: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// The primary key field every model carries.
    pub fn id() -> Self {
        Self::new("id", FieldType::String).unique()
    }

    /// Fold another sighting of the same field into this one.
    ///
    /// A field stays optional only if every sighting is optional and becomes
    /// unique if any sighting is. The first-seen type is kept.
    pub fn merge(&mut self, other: &FieldDescriptor) {
        self.optional = self.optional && other.optional;
        self.unique = self.unique || other.unique;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    ManyToMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HasOne => "hasOne",
            Self::HasMany => "hasMany",
            Self::BelongsTo => "belongsTo",
            Self::ManyToMany => "manyToMany",
        };
        f.write_str(name)
    }
}

/// Reference from one model to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub name: String,
    pub kind: RelationKind,
    pub related_model: String,
    pub optional: bool,
}

impl RelationDescriptor {
    pub fn merge(&mut self, other: &RelationDescriptor) {
        self.optional = self.optional && other.optional;
    }
}

/// Inferred model: fields and relations in first-seen order, names unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model_name: String,
    pub fields: Vec<FieldDescriptor>,
    pub relations: Vec<RelationDescriptor>,
}

impl ModelDescriptor {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    /// Add a field, merging with an existing field of the same name.
    pub fn merge_field(&mut self, field: FieldDescriptor) {
        match self.fields.iter_mut().find(|existing| existing.name == field.name) {
            Some(existing) => existing.merge(&field),
            None => self.fields.push(field),
        }
    }

    /// Add a relation, merging with an existing relation of the same name.
    pub fn merge_relation(&mut self, relation: RelationDescriptor) {
        match self.relations.iter_mut().find(|existing| existing.name == relation.name) {
            Some(existing) => existing.merge(&relation),
            None => self.relations.push(relation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_merge_rules() {
        let mut field = FieldDescriptor::new("email", FieldType::String).optional();
        field.merge(&FieldDescriptor::new("email", FieldType::Int).optional().unique());
        assert!(field.optional);
        assert!(field.unique);
        assert_eq!(field.field_type, FieldType::String);

        field.merge(&FieldDescriptor::new("email", FieldType::String));
        assert!(!field.optional);
        assert!(field.unique);
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let mut model = ModelDescriptor::new("UsersModel");
        model.merge_field(FieldDescriptor::new("b", FieldType::String));
        model.merge_field(FieldDescriptor::new("a", FieldType::String));
        model.merge_field(FieldDescriptor::new("b", FieldType::String).unique());

        let names: Vec<_> = model.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(model.field("b").unwrap().unique);
    }

    #[test]
    fn test_relation_merge() {
        let mut model = ModelDescriptor::new("PostsModel");
        let relation = RelationDescriptor {
            name: "author".to_string(),
            kind: RelationKind::HasOne,
            related_model: "Author".to_string(),
            optional: true,
        };
        model.merge_relation(relation.clone());
        model.merge_relation(RelationDescriptor {
            optional: false,
            ..relation
        });
        assert_eq!(model.relations.len(), 1);
        assert!(!model.relation("author").unwrap().optional);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(FieldDescriptor::id()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "id", "type": "String", "optional": false, "unique": true })
        );
        assert_eq!(serde_json::to_value(RelationKind::ManyToMany).unwrap(), "manyToMany");
    }
}
