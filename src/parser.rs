//! Route and type derivation.
//!
//! [`SchemaParser`] walks the root schema's properties (the resources), turns
//! every link into a [`Route`] and every request/response schema into a
//! [`JsonType`] tree.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::naming::{definition_path, symbol_name, type_name_from_ref, variable_name};
use crate::resolver::Resolver;
use crate::routes::{Route, RouteIo, RouteParam, Routes};
use crate::schema::{Link, Schema};
use crate::template::HrefTemplate;
use crate::types::{JsonArray, JsonField, JsonObject, JsonType, Scalar};

const DATE_TIME_FORMAT: &str = "date-time";

/// Derives routes and types from one schema document.
///
/// Holds the `$ref -> type` registry for the duration of one parse. The
/// registry only grows; the first registration of a ref wins.
#[derive(Debug)]
pub struct SchemaParser<'a> {
    resolver: Resolver<'a>,
    registry: HashMap<String, JsonType>,
    // refs currently being expanded, innermost last
    expanding: Vec<String>,
}

impl<'a> SchemaParser<'a> {
    pub fn new(root: &'a Schema) -> Self {
        Self {
            resolver: Resolver::new(root),
            registry: HashMap::new(),
            expanding: Vec::new(),
        }
    }

    /// The type first registered for `reference`, if any.
    pub fn registered_type(&self, reference: &str) -> Option<&JsonType> {
        self.registry.get(reference)
    }

    /// Derive every route of the document, sorted by path.
    ///
    /// # Errors
    ///
    /// Any resolution, typing or template error aborts the parse. After
    /// collection, a [`ParseError::TypeRedefinition`] is returned if one type
    /// name is bound to two different shapes.
    pub fn parse_routes(&mut self) -> Result<Routes, ParseError> {
        let root = self.resolver.root();
        if root.schema_type != "object" {
            return Err(ParseError::invalid_schema(root, "root schema is not an object"));
        }

        let mut routes = Vec::new();
        for (property_name, property) in &root.properties {
            let resource = self.resolver.resolve(property)?;
            debug!(resource = %property_name, links = resource.links.len(), "deriving resource routes");
            self.resource_routes(property_name, resource, &mut routes)?;
        }
        // stable: same-path routes keep discovery order
        routes.sort_by(|a, b| a.path.cmp(&b.path));

        let routes = Routes::new(routes);
        check_redefinitions(&routes)?;
        Ok(routes)
    }

    fn resource_routes(
        &mut self,
        property_name: &str,
        resource: &'a Schema,
        routes: &mut Vec<Route>,
    ) -> Result<(), ParseError> {
        let resource_symbol = symbol_name(property_name);
        let mut seen_rels: HashSet<&str> = HashSet::new();

        for link in &resource.links {
            if !seen_rels.insert(link.rel.as_str()) {
                return Err(ParseError::invalid_schema(
                    resource,
                    format!("duplicate link \"rel\" {:?}", link.rel),
                ));
            }
            let route = self.route_from_link(link, resource, &resource_symbol)?;
            debug!(method = %route.method, path = %route.path, name = %route.name, "derived route");
            routes.push(route);
        }
        Ok(())
    }

    fn route_from_link(
        &mut self,
        link: &'a Link,
        resource: &'a Schema,
        resource_symbol: &str,
    ) -> Result<Route, ParseError> {
        let template = HrefTemplate::parse(&link.href)?;
        let route_params = self.route_params(&template.variables, resource)?;
        let rel_symbol = symbol_name(&link.rel);

        let mut io = RouteIo {
            input_is_not_json: !link.input_is_json(),
            output_is_not_json: !link.output_is_json(),
            ..RouteIo::default()
        };
        if let Some(input) = link.schema.as_deref() {
            if !io.input_is_not_json {
                let name = format!("{}{}In", rel_symbol, resource_symbol);
                io.in_type = Some(self.type_from_schema(&name, input, ref_of(input))?);
            }
        }
        if let Some(output) = link.target_schema.as_deref() {
            if !io.output_is_not_json {
                let name = format!("{}{}Out", rel_symbol, resource_symbol);
                io.out_type = Some(self.type_from_schema(&name, output, ref_of(output))?);
            }
        }

        Ok(Route {
            path: template.path,
            name: template.name,
            route_params,
            method: link.method.to_uppercase(),
            io,
            link: link.clone().with_defaults(),
        })
    }

    /// Type each href variable by resolving it against the resource schema.
    fn route_params(
        &mut self,
        variables: &[String],
        resource: &'a Schema,
    ) -> Result<Vec<RouteParam>, ParseError> {
        let mut params = Vec::with_capacity(variables.len());
        for variable in variables {
            let name = definition_path(variable);
            let target = self.resolver.resolve_ref(variable, resource)?;
            let last_segment = variable.rsplit('/').next().unwrap_or(variable);
            let json_type = self.type_from_schema(last_segment, target, Some(variable))?;
            params.push(RouteParam {
                varname: variable_name(&name),
                name,
                json_type,
            });
        }
        Ok(params)
    }

    /// Convert `schema` into a [`JsonType`].
    ///
    /// When `reference` is set, the type is named after it and registered
    /// under it; `default_name` only names objects and arrays reached
    /// without a ref.
    pub fn type_from_schema(
        &mut self,
        default_name: &str,
        schema: &'a Schema,
        reference: Option<&str>,
    ) -> Result<JsonType, ParseError> {
        let reference = reference.filter(|r| !r.is_empty());
        let Some(reference) = reference else {
            return self.derive_type(default_name, schema, None);
        };

        if self.expanding.iter().any(|r| r == reference) {
            return Err(ParseError::CyclicReference {
                reference: reference.to_string(),
            });
        }
        self.expanding.push(reference.to_string());
        let derived = self.derive_type(default_name, schema, Some(reference));
        self.expanding.pop();

        let json_type = derived?;
        self.register(reference, &json_type);
        Ok(json_type)
    }

    fn derive_type(
        &mut self,
        default_name: &str,
        schema: &'a Schema,
        reference: Option<&str>,
    ) -> Result<JsonType, ParseError> {
        let resolved = self.resolver.resolve(schema)?;
        let name = match reference {
            Some(r) => Some(type_name_from_ref(r)),
            None if default_name.is_empty() => None,
            None => Some(default_name.to_string()),
        };
        let owned_ref = reference.map(str::to_string);

        let json_type = match resolved.schema_type.as_str() {
            "object" | "" => {
                let mut fields = Vec::with_capacity(resolved.properties.len());
                for (property_name, property) in &resolved.properties {
                    // inline properties stay anonymous; only refs name them
                    let field_type = self.type_from_schema("", property, ref_of(property))?;
                    fields.push(JsonField::new(property_name.clone(), field_type));
                }
                JsonType::Object(JsonObject::new(name, owned_ref, fields))
            }
            "array" => {
                let items = resolved.items.as_deref().ok_or_else(|| {
                    ParseError::invalid_schema(schema, "missing items property for type array")
                })?;
                let item_name = name
                    .as_deref()
                    .map(|n| format!("{}One", n))
                    .unwrap_or_default();
                let item_type = self.type_from_schema(&item_name, items, ref_of(items))?;
                JsonType::Array(JsonArray {
                    name,
                    reference: owned_ref,
                    items: Box::new(item_type),
                })
            }
            "string" if resolved.format == DATE_TIME_FORMAT => {
                JsonType::DateTime(Scalar { reference: owned_ref })
            }
            "string" => JsonType::String(Scalar { reference: owned_ref }),
            "boolean" => JsonType::Boolean(Scalar { reference: owned_ref }),
            "integer" => JsonType::Integer(Scalar { reference: owned_ref }),
            "number" => JsonType::Number(Scalar { reference: owned_ref }),
            "null" => JsonType::Null(Scalar { reference: owned_ref }),
            other => {
                return Err(ParseError::invalid_schema(
                    schema,
                    format!("unknown type {:?}", other),
                ))
            }
        };
        Ok(json_type)
    }

    fn register(&mut self, reference: &str, json_type: &JsonType) {
        match self.registry.entry(reference.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(json_type.clone());
            }
            Entry::Occupied(entry) => {
                let first = entry.get().definition();
                let again = json_type.definition();
                if first != again {
                    warn!(
                        reference,
                        first = %first,
                        redefinition = %again,
                        "$ref registered again with a different structure, keeping the first"
                    );
                }
            }
        }
    }
}

fn ref_of(schema: &Schema) -> Option<&str> {
    schema.is_ref().then_some(schema.reference.as_str())
}

/// Fails if one type name reachable from the routes is bound to different shapes.
///
/// Only the first conflicting name, in route order, is reported, with every
/// distinct redefinition of it.
fn check_redefinitions(routes: &Routes) -> Result<(), ParseError> {
    struct Seen<'r> {
        first: &'r JsonType,
        definition: String,
        redefinitions: Vec<&'r JsonType>,
    }

    let mut order: Vec<&str> = Vec::new();
    let mut seen: HashMap<&str, Seen<'_>> = HashMap::new();
    for json_type in routes.io_types() {
        json_type.walk(&mut |t| {
            let Some(name) = t.name() else {
                return;
            };
            match seen.get_mut(name) {
                None => {
                    order.push(name);
                    seen.insert(
                        name,
                        Seen {
                            first: t,
                            definition: t.definition(),
                            redefinitions: Vec::new(),
                        },
                    );
                }
                Some(entry) => {
                    let definition = t.definition();
                    if definition != entry.definition
                        && entry.redefinitions.iter().all(|r| r.definition() != definition)
                    {
                        entry.redefinitions.push(t);
                    }
                }
            }
        });
    }

    for name in order {
        let entry = &seen[name];
        if !entry.redefinitions.is_empty() {
            return Err(ParseError::TypeRedefinition {
                name: name.to_string(),
                first: Box::new(entry.first.clone()),
                redefinitions: entry.redefinitions.iter().map(|t| (*t).clone()).collect(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        Schema::from_value(value).unwrap()
    }

    #[test]
    fn simple_object_fields_are_sorted() {
        let root = schema(json!({
            "title": "Spell",
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "element": { "type": "string" },
                "power": { "type": "integer" },
                "all": { "type": "boolean" },
                "level_on": { "type": "string", "format": "date-time" }
            }
        }));
        let mut parser = SchemaParser::new(&root);
        let obj = parser.type_from_schema("Spell", &root, None).unwrap();

        let expected = JsonType::Object(JsonObject {
            name: Some("Spell".into()),
            reference: None,
            fields: vec![
                JsonField::new("all", JsonType::Boolean(Scalar::default())),
                JsonField::new("element", JsonType::String(Scalar::default())),
                JsonField::new("level_on", JsonType::DateTime(Scalar::default())),
                JsonField::new("name", JsonType::String(Scalar::default())),
                JsonField::new("power", JsonType::Integer(Scalar::default())),
            ],
        });
        assert_eq!(obj, expected);
    }

    #[test]
    fn mixed_refs_and_nested_arrays() {
        let root = schema(json!({
            "type": "object",
            "definitions": {
                "spell": {
                    "type": "object",
                    "definitions": {
                        "name": { "type": "string" },
                        "power": { "type": "integer" }
                    },
                    "properties": {
                        "name": { "$ref": "#/definitions/spell/definitions/name" },
                        "element": { "type": "string" },
                        "power": { "$ref": "#/definitions/spell/definitions/power" },
                        "combinable_spells": {
                            "type": "array",
                            "items": { "$ref": "#/definitions/spell/definitions/name" }
                        }
                    }
                }
            }
        }));
        let mut parser = SchemaParser::new(&root);
        let spell = &root.definitions["spell"];
        let obj = parser
            .type_from_schema("", spell, Some("#/definitions/spell"))
            .unwrap();

        let JsonType::Object(obj) = obj else {
            panic!("expected object, got {:?}", obj);
        };
        assert_eq!(obj.name.as_deref(), Some("Spell"));
        assert_eq!(obj.reference.as_deref(), Some("#/definitions/spell"));
        let combinable = &obj.field("combinable_spells").unwrap().json_type;
        assert_eq!(
            combinable,
            &JsonType::Array(JsonArray {
                name: None,
                reference: None,
                items: Box::new(JsonType::String(Scalar::with_ref(
                    "#/definitions/spell/definitions/name"
                ))),
            })
        );
        assert_eq!(
            obj.field("power").unwrap().json_type,
            JsonType::Integer(Scalar::with_ref("#/definitions/spell/definitions/power"))
        );
        assert!(parser.registered_type("#/definitions/spell").is_some());
        assert!(parser
            .registered_type("#/definitions/spell/definitions/name")
            .is_some());
    }

    #[test]
    fn array_without_items_is_invalid() {
        let root = schema(json!({ "type": "array" }));
        let mut parser = SchemaParser::new(&root);
        let err = parser.type_from_schema("List", &root, None).unwrap_err();
        match err {
            ParseError::InvalidSchema { message, .. } => {
                assert_eq!(message, "missing items property for type array")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn unnamed_array_items_get_one_suffix() {
        let root = schema(json!({
            "type": "array",
            "items": { "type": "object", "properties": { "id": { "type": "string" } } }
        }));
        let mut parser = SchemaParser::new(&root);
        let list = parser.type_from_schema("ListSpellOut", &root, None).unwrap();
        let JsonType::Array(list) = list else {
            panic!("expected array");
        };
        assert_eq!(list.items.name(), Some("ListSpellOutOne"));
    }

    #[test]
    fn unknown_type_is_invalid() {
        let root = schema(json!({ "type": "tuple" }));
        let mut parser = SchemaParser::new(&root);
        let err = parser.type_from_schema("X", &root, None).unwrap_err();
        assert_eq!(err.to_string(), r#"unknown type "tuple""#);
    }

    #[test]
    fn self_referencing_type_is_cyclic() {
        let root = schema(json!({
            "type": "object",
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {
                        "children": { "type": "array", "items": { "$ref": "#/definitions/node" } }
                    }
                }
            }
        }));
        let mut parser = SchemaParser::new(&root);
        let err = parser
            .type_from_schema("", &root.definitions["node"], Some("#/definitions/node"))
            .unwrap_err();
        assert!(
            matches!(err, ParseError::CyclicReference { ref reference } if reference == "#/definitions/node")
        );
    }

    #[test]
    fn first_registration_wins() {
        let root = schema(json!({
            "type": "object",
            "properties": {
                "a": { "type": "object", "properties": { "name": { "type": "string" } } },
                "b": { "type": "object", "properties": { "name": { "type": "integer" } } }
            }
        }));
        let mut parser = SchemaParser::new(&root);
        let a = &root.properties["a"];
        let b = &root.properties["b"];
        parser.type_from_schema("", &a.properties["name"], Some("name")).unwrap();
        let second = parser
            .type_from_schema("", &b.properties["name"], Some("name"))
            .unwrap();

        assert_eq!(second, JsonType::Integer(Scalar::with_ref("name")));
        assert_eq!(
            parser.registered_type("name"),
            Some(&JsonType::String(Scalar::with_ref("name")))
        );
    }

    #[test]
    fn root_must_be_object() {
        let root = schema(json!({ "type": "array", "items": { "type": "string" } }));
        let err = SchemaParser::new(&root).parse_routes().unwrap_err();
        assert_eq!(err.to_string(), "root schema is not an object");
    }

    #[test]
    fn duplicate_rel_on_one_resource() {
        let root = schema(json!({
            "type": "object",
            "properties": {
                "spell": {
                    "type": "object",
                    "links": [
                        { "href": "/spells", "rel": "list", "method": "GET" },
                        { "href": "/spells/{id}", "rel": "list", "method": "GET" }
                    ],
                    "properties": { "id": { "type": "string" } }
                }
            }
        }));
        let err = SchemaParser::new(&root).parse_routes().unwrap_err();
        match err {
            ParseError::InvalidSchema { message, .. } => {
                assert!(message.starts_with("duplicate link \"rel\""), "{}", message)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn same_rel_on_different_resources_is_allowed() {
        let root = schema(json!({
            "type": "object",
            "properties": {
                "spell": {
                    "type": "object",
                    "links": [{ "href": "/spells", "rel": "list", "method": "GET" }]
                },
                "item": {
                    "type": "object",
                    "links": [{ "href": "/items", "rel": "list", "method": "GET" }]
                }
            }
        }));
        let routes = SchemaParser::new(&root).parse_routes().unwrap();
        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/items", "/spells"]);
    }

    #[test]
    fn dangling_path_variable_aborts() {
        let root = schema(json!({
            "type": "object",
            "properties": {
                "spell": {
                    "type": "object",
                    "links": [{
                        "href": "/spells/{(#/definitions/spell/definitions/name)}",
                        "rel": "one",
                        "method": "GET"
                    }]
                }
            }
        }));
        let err = SchemaParser::new(&root).parse_routes().unwrap_err();
        assert!(matches!(err, ParseError::InvalidRef { .. }));
    }
}
