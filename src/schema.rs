//! JSON Hyper-Schema document model.
//!
//! Mirrors the Draft-04 hyper-schema vocabulary. Validation keywords are kept
//! so a document round-trips, but only `type`, `$ref`, `properties`, `items`,
//! `definitions`, `format` and `links` take part in route derivation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content type assumed when a link leaves `encType` or `mediaType` unset.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero_f64(n: &f64) -> bool {
    *n == 0.0
}

fn is_zero_usize(n: &usize) -> bool {
    *n == 0
}

/// A JSON Hyper-Schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub format: String,

    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub schema_type: String,

    #[serde(rename = "$ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(rename = "$schema", skip_serializing_if = "String::is_empty")]
    pub meta_schema: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Schema>,

    #[serde(skip_serializing_if = "is_zero_f64")]
    pub multiple_of: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_maximum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_minimum: bool,

    #[serde(skip_serializing_if = "is_zero_usize")]
    pub min_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    #[serde(skip_serializing_if = "is_zero_usize")]
    pub min_properties: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pattern_properties: BTreeMap<String, Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "is_zero_usize")]
    pub min_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<Value>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Schema {
    /// Decode a schema from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Returns true if this node is only a pointer to another schema.
    pub fn is_ref(&self) -> bool {
        !self.reference.is_empty()
    }
}

/// One HTTP operation described on a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Link {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub href: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub rel: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_schema: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub enc_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub media_type: String,
}

impl Link {
    /// Effective request content type.
    pub fn enc_type(&self) -> &str {
        if self.enc_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            &self.enc_type
        }
    }

    /// Effective response content type.
    pub fn media_type(&self) -> &str {
        if self.media_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            &self.media_type
        }
    }

    /// Fill in unset content types with the JSON default.
    pub fn with_defaults(mut self) -> Self {
        if self.enc_type.is_empty() {
            self.enc_type = DEFAULT_CONTENT_TYPE.to_string();
        }
        if self.media_type.is_empty() {
            self.media_type = DEFAULT_CONTENT_TYPE.to_string();
        }
        self
    }

    /// Whether the request body takes part in the JSON type model.
    pub fn input_is_json(&self) -> bool {
        is_json_content_type(self.enc_type())
    }

    /// Whether the response body takes part in the JSON type model.
    pub fn output_is_json(&self) -> bool {
        is_json_content_type(self.media_type())
    }
}

/// Returns true for `application/json` and `+json` structured syntax types.
///
/// Parameters such as `charset` are ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == DEFAULT_CONTENT_TYPE || (essence.starts_with("application/") && essence.ends_with("+json"))
}
