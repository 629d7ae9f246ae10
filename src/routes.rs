//! Route model and the views generators consume.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::naming::handler_func_name;
use crate::schema::Link;
use crate::symbols::ExistingSymbols;
use crate::types::JsonType;

/// Method priority for per-resource method tables.
pub const METHODS_ORDER: &[&str] = &["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// A typed variable of a route path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteParam {
    /// Hyphenated definition path, as it appears in the route path.
    pub name: String,
    /// Identifier-safe version of `name`.
    pub varname: String,
    #[serde(rename = "type")]
    pub json_type: JsonType,
}

/// JSON types coming in and going out of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteIo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_type: Option<JsonType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_type: Option<JsonType>,
    /// The request body is opaque (non-JSON `encType`).
    pub input_is_not_json: bool,
    /// The response body is opaque (non-JSON `mediaType`).
    pub output_is_not_json: bool,
}

/// One (path, method) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub path: String,
    pub name: String,
    pub route_params: Vec<RouteParam>,
    pub method: String,
    #[serde(flatten)]
    pub io: RouteIo,
    /// The link the route was derived from, content types defaulted.
    pub link: Link,
}

impl Route {
    /// Name of the handler function serving this route.
    pub fn handler_func_name(&self) -> String {
        handler_func_name(&self.method, &self.name)
    }
}

/// Routes of a document, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Routes(Vec<Route>);

impl Routes {
    pub fn new(routes: Vec<Route>) -> Self {
        Self(routes)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Route] {
        &self.0
    }

    /// Input and output types of every route, in route order.
    pub fn io_types(&self) -> impl Iterator<Item = &JsonType> {
        self.0
            .iter()
            .flat_map(|r| [r.io.in_type.as_ref(), r.io.out_type.as_ref()])
            .flatten()
    }

    /// Group routes by path, sorted by resource name then path.
    ///
    /// The name and params of the first route seen for a path are kept.
    pub fn by_resource(&self) -> Vec<ResourceRoute> {
        let mut by_path: BTreeMap<&str, ResourceRoute> = BTreeMap::new();
        for route in &self.0 {
            by_path
                .entry(route.path.as_str())
                .or_insert_with(|| ResourceRoute {
                    path: route.path.clone(),
                    name: route.name.clone(),
                    route_params: route.route_params.clone(),
                    method_routes: BTreeMap::new(),
                })
                .method_routes
                .insert(route.method.clone(), route.io.clone());
        }
        let mut resources: Vec<ResourceRoute> = by_path.into_values().collect();
        resources.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        resources
    }

    /// Every named type reachable from a route, once per name, sorted by name.
    ///
    /// When a name occurs more than once, the first occurrence in route order
    /// is returned. Anonymous types are skipped.
    pub fn named_types(&self) -> Vec<&JsonType> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut named: Vec<&JsonType> = Vec::new();
        for json_type in self.io_types() {
            json_type.walk(&mut |t| {
                if let Some(name) = t.name() {
                    if seen.insert(name) {
                        named.push(t);
                    }
                }
            });
        }
        named.sort_by(|a, b| a.name().cmp(&b.name()));
        named
    }

    /// Named object types, sorted by name.
    pub fn unique_objects(&self) -> Vec<&JsonType> {
        self.named_types()
            .into_iter()
            .filter(|t| matches!(t, JsonType::Object(_)))
            .collect()
    }

    /// Named types not already declared in the target code.
    pub fn named_types_to_generate(&self, existing: &ExistingSymbols) -> Vec<&JsonType> {
        self.named_types()
            .into_iter()
            .filter(|t| t.name().map_or(false, |name| !existing.has_type(name)))
            .collect()
    }

    /// Routes whose handler function is not declared yet.
    pub fn missing_handlers(&self, existing: &ExistingSymbols) -> Vec<&Route> {
        self.0
            .iter()
            .filter(|r| !existing.has_handler(&r.handler_func_name()))
            .collect()
    }

    pub fn all_handlers_implemented(&self, existing: &ExistingSymbols) -> bool {
        self.missing_handlers(existing).is_empty()
    }

    /// Routes taking or returning the type named `type_name`, or an array of it.
    ///
    /// Ordered by path, then by method priority.
    pub fn routes_for_type(&self, type_name: &str) -> Vec<RouteTypeUse<'_>> {
        let array_of = format!("[]{}", type_name);
        let matches = |t: &Option<JsonType>| -> Option<String> {
            let type_ref = t.as_ref()?.type_ref();
            (type_ref == type_name || type_ref == array_of).then_some(type_ref)
        };

        let mut uses = Vec::new();
        for route in &self.0 {
            if let Some(input_type_name) = matches(&route.io.in_type) {
                uses.push(RouteTypeUse {
                    route,
                    input_type_name: Some(input_type_name),
                    output_type_name: None,
                });
            }
            if let Some(output_type_name) = matches(&route.io.out_type) {
                uses.push(RouteTypeUse {
                    route,
                    input_type_name: None,
                    output_type_name: Some(output_type_name),
                });
            }
        }
        uses.sort_by(|a, b| {
            a.route
                .path
                .cmp(&b.route.path)
                .then_with(|| method_cmp(&a.route.method, &b.route.method))
        });
        uses
    }

    /// Whether any route type contains a date-time.
    pub fn needs_date_time(&self) -> bool {
        let mut found = false;
        for json_type in self.io_types() {
            json_type.walk(&mut |t| found |= matches!(t, JsonType::DateTime(_)));
        }
        found
    }
}

impl<'a> IntoIterator for &'a Routes {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A route whose input or output is a given type.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTypeUse<'a> {
    pub route: &'a Route,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type_name: Option<String>,
}

/// Routes sharing one path, keyed by method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRoute {
    pub path: String,
    pub name: String,
    pub route_params: Vec<RouteParam>,
    pub method_routes: BTreeMap<String, RouteIo>,
}

impl ResourceRoute {
    /// Methods available on the resource, in [`METHODS_ORDER`] priority.
    ///
    /// Methods outside that list come last, in lexical order.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.method_routes.keys().map(String::as_str).collect();
        methods.sort_by(|a, b| method_cmp(a, b));
        methods
    }
}

fn method_priority(method: &str) -> usize {
    METHODS_ORDER
        .iter()
        .position(|m| m.eq_ignore_ascii_case(method))
        .unwrap_or(METHODS_ORDER.len())
}

fn method_cmp(a: &str, b: &str) -> Ordering {
    method_priority(a)
        .cmp(&method_priority(b))
        .then_with(|| a.cmp(b))
}

/// Number of routes per method, for summaries.
pub fn method_counts(routes: &Routes) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for route in routes {
        *counts.entry(route.method.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(m, n)| (m.to_string(), n))
        .collect();
    counts.sort_by(|a, b| method_cmp(&a.0, &b.0));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JsonArray, JsonField, JsonObject, Scalar};

    fn spell() -> JsonType {
        JsonType::Object(JsonObject::new(
            Some("Spell".into()),
            Some("#/definitions/spell".into()),
            vec![
                JsonField::new("name", JsonType::String(Scalar::default())),
                JsonField::new("cast_at", JsonType::DateTime(Scalar::default())),
            ],
        ))
    }

    fn route(path: &str, name: &str, method: &str, io: RouteIo) -> Route {
        Route {
            path: path.into(),
            name: name.into(),
            route_params: Vec::new(),
            method: method.into(),
            io,
            link: Link::default(),
        }
    }

    fn sample() -> Routes {
        let list = JsonType::Array(JsonArray {
            name: Some("ListSpellOut".into()),
            reference: None,
            items: Box::new(spell()),
        });
        Routes::new(vec![
            route(
                "/spells",
                "spells",
                "POST",
                RouteIo {
                    in_type: Some(spell()),
                    out_type: Some(spell()),
                    ..RouteIo::default()
                },
            ),
            route(
                "/spells",
                "spells",
                "GET",
                RouteIo {
                    out_type: Some(list),
                    ..RouteIo::default()
                },
            ),
            route("/spells/{spell-name}", "spells.one", "PURGE", RouteIo::default()),
            route("/spells/{spell-name}", "spells.one", "DELETE", RouteIo::default()),
            route("/spells/{spell-name}", "spells.one", "LOCK", RouteIo::default()),
            route(
                "/spells/{spell-name}",
                "spells.one",
                "GET",
                RouteIo {
                    out_type: Some(spell()),
                    ..RouteIo::default()
                },
            ),
        ])
    }

    #[test]
    fn by_resource_groups_methods() {
        let resources = sample().by_resource();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].path, "/spells");
        assert_eq!(resources[0].methods(), ["GET", "POST"]);
        assert_eq!(resources[1].name, "spells.one");
        assert_eq!(resources[1].methods(), ["GET", "DELETE", "LOCK", "PURGE"]);
    }

    #[test]
    fn named_types_are_unique_and_sorted() {
        let routes = sample();
        let names: Vec<&str> = routes.named_types().iter().filter_map(|t| t.name()).collect();
        assert_eq!(names, ["ListSpellOut", "Spell"]);

        let objects: Vec<&str> = routes.unique_objects().iter().filter_map(|t| t.name()).collect();
        assert_eq!(objects, ["Spell"]);
    }

    #[test]
    fn existing_symbols_filter_output() {
        let routes = sample();
        let existing = ExistingSymbols::new()
            .with_handlers(["getSpells", "postSpells", "getSpellsOne"])
            .with_types(["Spell"]);

        let missing: Vec<String> = routes
            .missing_handlers(&existing)
            .iter()
            .map(|r| r.handler_func_name())
            .collect();
        assert_eq!(missing, ["purgeSpellsOne", "deleteSpellsOne", "lockSpellsOne"]);
        assert!(!routes.all_handlers_implemented(&existing));

        let to_generate: Vec<&str> = routes
            .named_types_to_generate(&existing)
            .iter()
            .filter_map(|t| t.name())
            .collect();
        assert_eq!(to_generate, ["ListSpellOut"]);
    }

    #[test]
    fn routes_for_type_includes_arrays() {
        let routes = sample();
        let uses = routes.routes_for_type("Spell");
        let summary: Vec<(&str, &str, Option<&str>, Option<&str>)> = uses
            .iter()
            .map(|u| {
                (
                    u.route.path.as_str(),
                    u.route.method.as_str(),
                    u.input_type_name.as_deref(),
                    u.output_type_name.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            [
                ("/spells", "POST", Some("Spell"), None),
                ("/spells", "POST", None, Some("Spell")),
                ("/spells/{spell-name}", "GET", None, Some("Spell")),
            ]
        );
        // the list route returns a named array, not an anonymous []Spell
        assert!(routes.routes_for_type("ListSpellOut").len() == 1);
    }

    #[test]
    fn date_time_detection() {
        assert!(sample().needs_date_time());
        assert!(!Routes::default().needs_date_time());
    }

    #[test]
    fn method_counts_in_priority_order() {
        let counts = method_counts(&sample());
        assert_eq!(counts[0], ("GET".to_string(), 2));
        assert_eq!(counts[1], ("POST".to_string(), 1));
        assert_eq!(counts.last().unwrap().0, "PURGE");
    }
}
