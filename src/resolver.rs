//! `$ref` resolution against the root document.

use std::collections::{BTreeMap, HashSet};

use crate::error::ParseError;
use crate::schema::Schema;
use crate::template::unescape_pct;

/// Where a pointer walk currently stands: on a schema, or on a `name -> schema` map.
#[derive(Clone, Copy)]
enum Node<'a> {
    Schema(&'a Schema),
    Map(&'a BTreeMap<String, Schema>),
}

/// Follows `$ref` pointers inside one schema document.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    root: &'a Schema,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &'a Schema) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &'a Schema {
        self.root
    }

    /// Follow `schema`'s `$ref` chain until a node without a `$ref`.
    ///
    /// # Errors
    ///
    /// `InvalidRef` if a hop cannot be located, `CyclicReference` if the chain
    /// comes back to a ref it already followed.
    pub fn resolve(&self, schema: &'a Schema) -> Result<&'a Schema, ParseError> {
        let mut current = schema;
        let mut followed: HashSet<&'a str> = HashSet::new();
        while current.is_ref() {
            let reference = current.reference.as_str();
            if !followed.insert(reference) {
                return Err(ParseError::CyclicReference {
                    reference: reference.to_string(),
                });
            }
            current = self.resolve_ref(reference, current)?;
        }
        Ok(current)
    }

    /// Dereference `reference` once.
    ///
    /// Absolute refs (`#/...`) are walked from the document root. Anything else
    /// names a property of `relative_to`.
    pub fn resolve_ref(
        &self,
        reference: &str,
        relative_to: &'a Schema,
    ) -> Result<&'a Schema, ParseError> {
        if reference == "#" {
            return Ok(self.root);
        }
        match reference.strip_prefix("#/") {
            Some(pointer) => self.walk_pointer(reference, pointer),
            None => relative_to
                .properties
                .get(reference)
                .ok_or_else(|| ParseError::invalid_ref(reference, "value is not a valid Schema")),
        }
    }

    fn walk_pointer(&self, reference: &str, pointer: &str) -> Result<&'a Schema, ParseError> {
        let mut node = Node::Schema(self.root);
        for segment in pointer.split('/') {
            // JSON Pointer escapes (~1 = /, ~0 = ~)
            let key = segment.replace("~1", "/").replace("~0", "~");
            node = match node {
                Node::Schema(schema) => schema_member(schema, &key)
                    .ok_or_else(|| ParseError::invalid_ref(reference, "value is not a valid Schema"))?,
                Node::Map(map) => {
                    let key = unescape_pct(&key)
                        .map_err(|message| ParseError::invalid_ref(reference, message))?;
                    map.get(&key)
                        .map(Node::Schema)
                        .ok_or_else(|| ParseError::invalid_ref(reference, "invalid ref"))?
                }
            };
        }
        match node {
            Node::Schema(schema) => Ok(schema),
            Node::Map(_) => Err(ParseError::invalid_ref(
                reference,
                "value is not a valid Schema",
            )),
        }
    }
}

/// The schema-shaped members a pointer may step through.
fn schema_member<'a>(schema: &'a Schema, key: &str) -> Option<Node<'a>> {
    match key {
        "definitions" => Some(Node::Map(&schema.definitions)),
        "properties" => Some(Node::Map(&schema.properties)),
        "patternProperties" => Some(Node::Map(&schema.pattern_properties)),
        "items" => schema.items.as_deref().map(Node::Schema),
        "not" => schema.not.as_deref().map(Node::Schema),
        _ => None,
    }
}
