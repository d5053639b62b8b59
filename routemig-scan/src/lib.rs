//! Route scanning for Express-style JavaScript and TypeScript sources.
//!
//! Sources are parsed with tree-sitter. [`extract_routes`] then walks every
//! call expression looking for `app.<verb>(...)` / `router.<verb>(...)`
//! route declarations.

pub mod discovery;
pub mod error;
pub mod routes;
pub mod syntax;

pub use discovery::{DEFAULT_EXTENSIONS, discover_route_files, has_route_extension, is_hidden};
pub use error::{ParseError, ParseResult};
pub use routes::{
    HttpMethod, ROUTE_RECEIVERS, RouteDescriptor, extract_routes, extract_routes_as, path_params, routes_in_tree,
};
pub use syntax::{SourceKind, SourceTree, parse_source};
