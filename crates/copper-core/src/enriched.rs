use serde::Serialize;
use serde_json::{Map, Value};

use crate::kinds::RecordKind;

/// Flattened, display-ready record: upstream scalar fields plus resolved
/// relations, synthetic fields and custom field values keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(skip)]
    kind: RecordKind,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl EnrichedRecord {
    pub fn new(kind: RecordKind, fields: Map<String, Value>) -> Self {
        Self { kind, fields }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}
