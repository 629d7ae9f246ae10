//! Hyper-Schema route derivation
//!
//! Turns a JSON Hyper-Schema document into a sorted list of HTTP routes with
//! typed inputs, outputs and path parameters, ready to drive code or
//! documentation generation.
//!
//! # Example
//!
//! ```
//! use hyperschema_routes::{load_schema_str, parse_routes, JsonType};
//!
//! let schema = load_schema_str(r##"{
//!     "type": "object",
//!     "definitions": {
//!         "spell": {
//!             "type": "object",
//!             "definitions": { "name": { "type": "string" } },
//!             "properties": { "name": { "$ref": "#/definitions/spell/definitions/name" } },
//!             "links": [{
//!                 "href": "/spells/{(#/definitions/spell/definitions/name)}",
//!                 "rel": "one",
//!                 "method": "GET",
//!                 "targetSchema": { "$ref": "#/definitions/spell" }
//!             }]
//!         }
//!     },
//!     "properties": { "spell": { "$ref": "#/definitions/spell" } }
//! }"##).unwrap();
//!
//! let routes = parse_routes(&schema).unwrap();
//! let route = &routes.as_slice()[0];
//! assert_eq!(route.path, "/spells/{spell-name}");
//! assert_eq!(route.name, "spells.one");
//! assert_eq!(route.route_params[0].varname, "spellName");
//! assert_eq!(route.io.out_type.as_ref().and_then(JsonType::name), Some("Spell"));
//! ```
//!
//! # Derivation rules
//!
//! | Input | Output |
//! |-------|--------|
//! | Top-level property | Resource; its `links` become routes |
//! | `{(#/definitions/a/definitions/b)}` in `href` | Path variable `{a-b}`, name segment `one` |
//! | `$ref` on a schema | Type named after the ref (`#/definitions/spell` → `Spell`) |
//! | Link `schema` / `targetSchema` without ref | Type named `<Rel><Resource>In` / `Out` |
//! | Non-JSON `encType` / `mediaType` | No type, `*_is_not_json` flag set |
//!
//! Object fields are always sorted by name, and routes by path, so the same
//! document always yields the same output.

mod error;
mod loader;
mod naming;
mod parser;
mod resolver;
mod routes;
mod schema;
mod symbols;
mod template;
mod types;

pub use error::{LoadError, ParseError};
pub use loader::{
    is_url, load_schema, load_schema_auto, load_schema_str, load_schema_value, load_symbol_list,
};
pub use naming::{
    capitalize, definition_path, handler_func_name, symbol_name, to_upper_after_any,
    type_name_from_ref, variable_name,
};
pub use parser::SchemaParser;
pub use resolver::Resolver;
pub use routes::{
    method_counts, ResourceRoute, Route, RouteIo, RouteParam, RouteTypeUse, Routes, METHODS_ORDER,
};
pub use schema::{is_json_content_type, Link, Schema, DEFAULT_CONTENT_TYPE};
pub use symbols::{parse_symbol_list, ExistingSymbols};
pub use template::{
    extract_path_and_variables, href_to_path, route_name, vars_from_href, HrefTemplate,
};
pub use types::{JsonArray, JsonField, JsonObject, JsonType, Scalar};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;

/// Derive the routes of a schema document.
///
/// Shorthand for [`SchemaParser::new`] followed by [`SchemaParser::parse_routes`].
pub fn parse_routes(schema: &Schema) -> Result<Routes, ParseError> {
    SchemaParser::new(schema).parse_routes()
}

/// Derive the routes of a JSON value holding a schema document.
///
/// # Errors
///
/// `InvalidSchema` with "no schema provided" for `null`, or when the value
/// does not decode as a schema; otherwise as [`parse_routes`].
pub fn parse_routes_value(value: &serde_json::Value) -> Result<Routes, ParseError> {
    if value.is_null() {
        return Err(ParseError::invalid_schema(&Schema::default(), "no schema provided"));
    }
    let schema = Schema::from_value(value.clone()).map_err(|e| {
        ParseError::invalid_schema(&Schema::default(), format!("invalid schema document: {}", e))
    })?;
    parse_routes(&schema)
}
