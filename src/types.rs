//! JSON type model derived from schemas.

use serde::Serialize;

/// A type as it flows through a route.
///
/// Only objects and arrays can be named. Every variant keeps the `$ref` it was
/// derived from, which is its identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JsonType {
    Object(JsonObject),
    Array(JsonArray),
    String(Scalar),
    Boolean(Scalar),
    Integer(Scalar),
    Number(Scalar),
    Null(Scalar),
    /// A string refined by `format: date-time`.
    DateTime(Scalar),
}

/// Payload of the scalar variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scalar {
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Scalar {
    pub fn with_ref(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
        }
    }
}

/// An object type. Fields are always sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub fields: Vec<JsonField>,
}

impl JsonObject {
    pub fn new(name: Option<String>, reference: Option<String>, mut fields: Vec<JsonField>) -> Self {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            name,
            reference,
            fields,
        }
    }

    /// Looks up a field by its JSON property name.
    pub fn field(&self, name: &str) -> Option<&JsonField> {
        self.fields
            .binary_search_by(|f| f.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.fields[idx])
    }
}

/// An array type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonArray {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub items: Box<JsonType>,
}

/// One property of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonField {
    pub name: String,
    #[serde(rename = "type")]
    pub json_type: JsonType,
}

impl JsonField {
    pub fn new(name: impl Into<String>, json_type: JsonType) -> Self {
        Self {
            name: name.into(),
            json_type,
        }
    }
}

impl JsonType {
    /// JSON Schema name of the variant (`date-time` for [`JsonType::DateTime`]).
    pub fn kind(&self) -> &'static str {
        match self {
            JsonType::Object(_) => "object",
            JsonType::Array(_) => "array",
            JsonType::String(_) => "string",
            JsonType::Boolean(_) => "boolean",
            JsonType::Integer(_) => "integer",
            JsonType::Number(_) => "number",
            JsonType::Null(_) => "null",
            JsonType::DateTime(_) => "date-time",
        }
    }

    /// The `$ref` this type was derived from, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            JsonType::Object(o) => o.reference.as_deref(),
            JsonType::Array(a) => a.reference.as_deref(),
            JsonType::String(s)
            | JsonType::Boolean(s)
            | JsonType::Integer(s)
            | JsonType::Number(s)
            | JsonType::Null(s)
            | JsonType::DateTime(s) => s.reference.as_deref(),
        }
    }

    /// Type name, for named objects and arrays.
    pub fn name(&self) -> Option<&str> {
        match self {
            JsonType::Object(o) => o.name.as_deref(),
            JsonType::Array(a) => a.name.as_deref(),
            _ => None,
        }
    }

    /// Canonical structural rendering of this type.
    ///
    /// Nested named types render as their name, so two types compare equal
    /// when they have the same shape one level down. Field names are quoted.
    ///
    /// ```
    /// use hyperschema_routes::{JsonField, JsonObject, JsonType, Scalar};
    ///
    /// let spell = JsonType::Object(JsonObject::new(
    ///     Some("Spell".into()),
    ///     None,
    ///     vec![
    ///         JsonField::new("power", JsonType::Integer(Scalar::default())),
    ///         JsonField::new("name", JsonType::String(Scalar::default())),
    ///     ],
    /// ));
    /// assert_eq!(spell.definition(), r#"{"name":string,"power":integer}"#);
    /// assert_eq!(spell.type_ref(), "Spell");
    /// ```
    pub fn definition(&self) -> String {
        match self {
            JsonType::Object(o) => {
                let fields: Vec<String> = o
                    .fields
                    .iter()
                    .map(|f| format!("{:?}:{}", f.name, f.json_type.type_ref()))
                    .collect();
                format!("{{{}}}", fields.join(","))
            }
            JsonType::Array(a) => format!("[]{}", a.items.type_ref()),
            scalar => scalar.kind().to_string(),
        }
    }

    /// How this type is referred to from another type: its name when named,
    /// its definition otherwise.
    pub fn type_ref(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => self.definition(),
        }
    }

    /// Visit this type and every type nested in it, depth first.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a JsonType),
    {
        visit(self);
        match self {
            JsonType::Object(o) => {
                for field in &o.fields {
                    field.json_type.walk(visit);
                }
            }
            JsonType::Array(a) => a.items.walk(visit),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spell() -> JsonType {
        JsonType::Object(JsonObject::new(
            Some("Spell".into()),
            Some("#/definitions/spell".into()),
            vec![
                JsonField::new("power", JsonType::Integer(Scalar::default())),
                JsonField::new("name", JsonType::String(Scalar::default())),
                JsonField::new("all", JsonType::Boolean(Scalar::default())),
            ],
        ))
    }

    #[test]
    fn object_fields_sorted_by_name() {
        let JsonType::Object(obj) = spell() else {
            panic!("expected object");
        };
        let names: Vec<&str> = obj.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["all", "name", "power"]);
        assert_eq!(obj.field("name").unwrap().json_type.kind(), "string");
        assert!(obj.field("element").is_none());
    }

    #[test]
    fn definitions_render_nested_names() {
        let list = JsonType::Array(JsonArray {
            name: Some("ListSpellOut".into()),
            reference: None,
            items: Box::new(spell()),
        });
        assert_eq!(list.definition(), "[]Spell");
        assert_eq!(list.type_ref(), "ListSpellOut");

        let anonymous = JsonType::Array(JsonArray {
            name: None,
            reference: None,
            items: Box::new(JsonType::DateTime(Scalar::default())),
        });
        assert_eq!(anonymous.type_ref(), "[]date-time");
    }

    #[test]
    fn field_names_are_quoted() {
        let tricky = JsonType::Object(JsonObject::new(
            None,
            None,
            vec![JsonField::new("a:string,b", JsonType::Integer(Scalar::default()))],
        ));
        let plain = JsonType::Object(JsonObject::new(
            None,
            None,
            vec![
                JsonField::new("a", JsonType::String(Scalar::default())),
                JsonField::new("b", JsonType::Integer(Scalar::default())),
            ],
        ));
        assert_eq!(tricky.definition(), r#"{"a:string,b":integer}"#);
        assert_eq!(plain.definition(), r#"{"a":string,"b":integer}"#);
        assert_ne!(tricky.definition(), plain.definition());
    }

    #[test]
    fn walk_visits_nested_types() {
        let list = JsonType::Array(JsonArray {
            name: Some("ListSpellOut".into()),
            reference: None,
            items: Box::new(spell()),
        });
        let mut kinds = Vec::new();
        list.walk(&mut |t| kinds.push(t.kind()));
        assert_eq!(kinds, ["array", "object", "boolean", "string", "integer"]);
    }

    #[test]
    fn scalar_accessors() {
        let t = JsonType::String(Scalar::with_ref("#/definitions/spell/definitions/name"));
        assert_eq!(t.reference(), Some("#/definitions/spell/definitions/name"));
        assert_eq!(t.name(), None);
        assert_eq!(t.definition(), "string");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let t = JsonType::String(Scalar::with_ref("#/definitions/spell/definitions/name"));
        assert_eq!(
            serde_json::to_value(&t).unwrap(),
            json!({ "kind": "string", "ref": "#/definitions/spell/definitions/name" })
        );
        let value = serde_json::to_value(spell()).unwrap();
        assert_eq!(value["kind"], "object");
        assert_eq!(value["name"], "Spell");
        assert_eq!(value["fields"][0]["name"], "all");
        assert_eq!(value["fields"][0]["type"]["kind"], "boolean");
    }
}
