//! Start events handed to tracer hooks.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Query variables or field arguments, as decoded JSON.
pub type Variables = Map<String, Value>;

/// Schema type metadata keyed by type name.
pub type TypeMetadata = HashMap<String, Value>;

/// Data the engine supplies when a query starts resolving.
#[derive(Debug, Clone, Copy)]
pub struct QueryStart<'a> {
    pub query: &'a str,
    /// Operation name, empty for anonymous operations.
    pub operation_name: &'a str,
    pub variables: &'a Variables,
    pub types: &'a TypeMetadata,
}

/// Data the engine supplies when a field starts resolving.
#[derive(Debug, Clone, Copy)]
pub struct FieldStart<'a> {
    /// Human readable label, e.g. `GraphQL field: Query.user`.
    pub label: &'a str,
    pub type_name: &'a str,
    pub field_name: &'a str,
    /// Trivial fields resolve without a resolver call (plain struct access).
    pub trivial: bool,
    pub args: &'a Variables,
}

impl FieldStart<'_> {
    /// Composite field identity `"<TypeName>.<FieldName>"`.
    pub fn identity(&self) -> String {
        format!("{}.{}", self.type_name, self.field_name)
    }
}
