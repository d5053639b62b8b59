//! Schema inference from extracted routes.
//!
//! Every route contributes to the model named after the last static segment of
//! its path. Inference is a fold over the batch: nothing is remembered between
//! calls to [`SchemaInferrer::infer`].

use routemig_scan::RouteDescriptor;

use crate::types::{FieldDescriptor, FieldType, ModelDescriptor, RelationDescriptor, RelationKind};

/// Base noun used when a path has no static segment.
pub const FALLBACK_NOUN: &str = "Custom";

/// Suffix appended to every inferred model name.
pub const MODEL_SUFFIX: &str = "Model";

/// Last non-empty, non-parameter segment of a route path.
pub fn base_noun(path: &str) -> &str {
    path.split('/')
        .filter(|segment| !segment.is_empty() && !segment.starts_with(':'))
        .next_back()
        .unwrap_or(FALLBACK_NOUN)
}

/// `/users/:id` and `/users` both give `UsersModel`.
pub fn model_name(path: &str) -> String {
    format!("{}{MODEL_SUFFIX}", capitalize(base_noun(path)))
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Source of speculative fields for routes that touch request or response bodies.
pub trait BodyFieldHeuristic {
    /// Fields implied by a handler reading `req.body`.
    fn request_fields(&self, route: &RouteDescriptor) -> Vec<FieldDescriptor>;

    /// Fields implied by a handler calling `res.json`.
    fn response_fields(&self, route: &RouteDescriptor) -> Vec<FieldDescriptor>;
}

/// Records body usage without inventing fields for it.
///
/// Handlers are only inspected for the presence of `req.body` / `res.json`,
/// so there are no field names to recover.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceOnly;

impl BodyFieldHeuristic for PresenceOnly {
    fn request_fields(&self, _route: &RouteDescriptor) -> Vec<FieldDescriptor> {
        Vec::new()
    }

    fn response_fields(&self, _route: &RouteDescriptor) -> Vec<FieldDescriptor> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Promote object-typed fields to `hasOne` relations.
    pub infer_relations: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self { infer_relations: true }
    }
}

pub struct SchemaInferrer<H = PresenceOnly> {
    heuristic: H,
    options: InferenceOptions,
}

impl SchemaInferrer<PresenceOnly> {
    pub fn new(options: InferenceOptions) -> Self {
        Self::with_heuristic(PresenceOnly, options)
    }
}

impl Default for SchemaInferrer<PresenceOnly> {
    fn default() -> Self {
        Self::new(InferenceOptions::default())
    }
}

impl<H: BodyFieldHeuristic> SchemaInferrer<H> {
    pub fn with_heuristic(heuristic: H, options: InferenceOptions) -> Self {
        Self { heuristic, options }
    }

    /// Infer the complete model set for a batch, in first-seen model order.
    pub fn infer(&self, routes: &[RouteDescriptor]) -> Vec<ModelDescriptor> {
        routes.iter().fold(Vec::new(), |models, route| self.apply(models, route))
    }

    fn apply(&self, mut models: Vec<ModelDescriptor>, route: &RouteDescriptor) -> Vec<ModelDescriptor> {
        let name = model_name(&route.path);
        let index = match models.iter().position(|model| model.model_name == name) {
            Some(index) => index,
            None => {
                models.push(ModelDescriptor::new(name));
                models.len() - 1
            }
        };
        let model = &mut models[index];

        let (fields, relations) = self.route_members(route);
        for field in fields {
            model.merge_field(field);
        }
        for relation in relations {
            model.merge_relation(relation);
        }
        ensure_id(model);

        models
    }

    fn route_members(&self, route: &RouteDescriptor) -> (Vec<FieldDescriptor>, Vec<RelationDescriptor>) {
        let mut fields: Vec<FieldDescriptor> = route
            .path_params
            .iter()
            .map(|param| FieldDescriptor::new(param.as_str(), FieldType::String))
            .collect();

        if route.uses_request_body {
            fields.extend(self.heuristic.request_fields(route).into_iter().map(FieldDescriptor::optional));
        }
        if route.uses_response_body {
            fields.extend(self.heuristic.response_fields(route).into_iter().map(FieldDescriptor::optional));
        }

        if !self.options.infer_relations {
            return (fields, Vec::new());
        }

        let (objects, scalars): (Vec<_>, Vec<_>) =
            fields.into_iter().partition(|field| field.field_type == FieldType::Object);
        let relations = objects
            .into_iter()
            .map(|field| RelationDescriptor {
                related_model: capitalize(&field.name),
                name: field.name,
                kind: RelationKind::HasOne,
                optional: field.optional,
            })
            .collect();
        (scalars, relations)
    }
}

/// Make `id` a required, unique String field at the front of the model.
fn ensure_id(model: &mut ModelDescriptor) {
    let id = match model.fields.iter().position(|field| field.name == "id") {
        Some(index) => {
            let mut id = model.fields.remove(index);
            id.merge(&FieldDescriptor::id());
            id.field_type = FieldType::String;
            id
        }
        None => FieldDescriptor::id(),
    };
    model.fields.insert(0, id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use routemig_scan::HttpMethod;

    fn inferrer() -> SchemaInferrer {
        SchemaInferrer::default()
    }

    fn route(method: HttpMethod, path: &str) -> RouteDescriptor {
        RouteDescriptor::new(method, path)
    }

    /// Emits a fixed field list for every body access.
    struct Fixed(Vec<FieldDescriptor>);

    impl BodyFieldHeuristic for Fixed {
        fn request_fields(&self, _route: &RouteDescriptor) -> Vec<FieldDescriptor> {
            self.0.clone()
        }

        fn response_fields(&self, _route: &RouteDescriptor) -> Vec<FieldDescriptor> {
            self.0.clone()
        }
    }

    #[test]
    fn test_base_noun_and_model_name() {
        assert_eq!(base_noun("/users/:id"), "users");
        assert_eq!(base_noun("/users"), "users");
        assert_eq!(base_noun("/users/:userId/posts/:postId"), "posts");
        assert_eq!(base_noun("/:id"), FALLBACK_NOUN);
        assert_eq!(base_noun("/"), FALLBACK_NOUN);
        assert_eq!(model_name("/users/:id"), "UsersModel");
        assert_eq!(model_name("/users"), "UsersModel");
        assert_eq!(model_name(""), "CustomModel");
        assert_eq!(model_name("/api/v1/orderItems/"), "OrderItemsModel");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("users"), "Users");
        assert_eq!(capitalize("élan"), "Élan");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_single_id_param_is_deduplicated() {
        let models = inferrer().infer(&[route(HttpMethod::Get, "/items/:id")]);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].model_name, "ItemsModel");
        assert_eq!(models[0].fields, vec![FieldDescriptor::id()]);
        assert!(models[0].relations.is_empty());
    }

    #[test]
    fn test_id_is_moved_to_front() {
        let models = inferrer().infer(&[route(HttpMethod::Get, "/orgs/:orgId/members/:id")]);
        let names: Vec<_> = models[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "orgId"]);
        assert_eq!(models[0].fields.iter().filter(|f| f.name == "id").count(), 1);
        assert!(models[0].fields[0].unique);
        assert!(!models[0].fields[0].optional);
    }

    #[test]
    fn test_routes_sharing_a_noun_merge() {
        let routes = [
            route(HttpMethod::Get, "/users"),
            route(HttpMethod::Get, "/posts/:slug"),
            route(HttpMethod::Put, "/users/:userId"),
            route(HttpMethod::Delete, "/users/:userId"),
        ];
        let models = inferrer().infer(&routes);
        let names: Vec<_> = models.iter().map(|m| m.model_name.as_str()).collect();
        assert_eq!(names, vec!["UsersModel", "PostsModel"]);

        let users = &models[0];
        let fields: Vec<_> = users.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["id", "userId"]);
        assert!(!users.field("userId").unwrap().optional);
    }

    #[test]
    fn test_presence_only_adds_no_fields() {
        let mut create = route(HttpMethod::Post, "/users");
        create.uses_request_body = true;
        create.uses_response_body = true;
        let models = inferrer().infer(&[create]);
        assert_eq!(models[0].fields, vec![FieldDescriptor::id()]);
    }

    #[test]
    fn test_body_fields_are_optional_and_objects_become_relations() {
        let heuristic = Fixed(vec![
            FieldDescriptor::new("email", FieldType::String),
            FieldDescriptor::new("profile", FieldType::Object),
        ]);
        let inferrer = SchemaInferrer::with_heuristic(heuristic, InferenceOptions::default());

        let mut create = route(HttpMethod::Post, "/users");
        create.uses_request_body = true;
        let models = inferrer.infer(&[create]);

        let users = &models[0];
        assert!(users.field("email").unwrap().optional);
        assert!(users.field("profile").is_none());
        assert_eq!(
            users.relations,
            vec![RelationDescriptor {
                name: "profile".to_string(),
                kind: RelationKind::HasOne,
                related_model: "Profile".to_string(),
                optional: true,
            }]
        );
    }

    #[test]
    fn test_relations_disabled_keeps_object_fields() {
        let heuristic = Fixed(vec![FieldDescriptor::new("profile", FieldType::Object)]);
        let inferrer = SchemaInferrer::with_heuristic(heuristic, InferenceOptions { infer_relations: false });

        let mut update = route(HttpMethod::Put, "/users/:id");
        update.uses_response_body = true;
        let models = inferrer.infer(&[update]);

        assert!(models[0].relations.is_empty());
        assert_eq!(models[0].field("profile").unwrap().field_type, FieldType::Object);
    }

    #[test]
    fn test_param_then_body_sighting_stays_required() {
        let heuristic = Fixed(vec![FieldDescriptor::new("slug", FieldType::String)]);
        let inferrer = SchemaInferrer::with_heuristic(heuristic, InferenceOptions::default());

        let mut update = route(HttpMethod::Put, "/posts/:slug");
        update.uses_request_body = true;
        let models = inferrer.infer(&[update]);
        assert!(!models[0].field("slug").unwrap().optional);
    }

    #[test]
    fn test_empty_batch() {
        assert!(inferrer().infer(&[]).is_empty());
    }

    #[test]
    fn test_inference_is_deterministic() {
        let routes = [
            route(HttpMethod::Get, "/a/:x"),
            route(HttpMethod::Get, "/b/:y"),
            route(HttpMethod::Get, "/a/:z"),
        ];
        let inferrer = inferrer();
        assert_eq!(inferrer.infer(&routes), inferrer.infer(&routes));
    }
}
