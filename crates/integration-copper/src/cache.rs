use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use copper_core::PAGE_SIZE;
use serde_json::{json, Value};

use crate::transport::ApiRequest;

/// Reference endpoints whose responses are shared across operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupKind {
    Account,
    Users,
    Pipelines,
    CustomerSources,
    LossReasons,
    ContactTypes,
    CustomFieldDefinitions,
    Companies,
    Opportunities,
}

impl LookupKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Users => "users",
            Self::Pipelines => "pipelines",
            Self::CustomerSources => "customer_sources",
            Self::LossReasons => "loss_reasons",
            Self::ContactTypes => "contact_types",
            Self::CustomFieldDefinitions => "custom_field_definitions",
            Self::Companies => "companies",
            Self::Opportunities => "opportunities",
        }
    }

    /// The upstream call that fills this lookup.
    pub fn request(self) -> ApiRequest {
        match self {
            Self::Users => ApiRequest::post("users/search", json!({ "page_size": PAGE_SIZE })),
            Self::Companies => {
                ApiRequest::post("companies/search", json!({ "page_size": PAGE_SIZE }))
            }
            Self::Opportunities => {
                ApiRequest::post("opportunities/search", json!({ "page_size": PAGE_SIZE }))
            }
            other => ApiRequest::get(other.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedLookup {
    value: Arc<Value>,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

/// TTL-bounded store of lookup responses. Fills are not coordinated:
/// concurrent misses each fetch and the last insert wins.
#[derive(Debug)]
pub struct LookupCache {
    ttl: Duration,
    entries: RwLock<HashMap<LookupKind, CachedLookup>>,
}

impl LookupCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, kind: LookupKind) -> Option<Arc<Value>> {
        self.get_at(kind, Instant::now())
    }

    pub fn insert(&self, kind: LookupKind, value: Value) -> Arc<Value> {
        self.insert_at(kind, value, Instant::now())
    }

    pub fn invalidate(&self, kind: LookupKind) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind);
    }

    fn get_at(&self, kind: LookupKind, now: Instant) -> Option<Arc<Value>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&kind)
            .filter(|entry| entry.expires_at.map_or(true, |expires_at| expires_at > now))
            .map(|entry| Arc::clone(&entry.value))
    }

    fn insert_at(&self, kind: LookupKind, value: Value, now: Instant) -> Arc<Value> {
        let value = Arc::new(value);
        let entry = CachedLookup {
            value: Arc::clone(&value),
            expires_at: now.checked_add(self.ttl),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, entry);
        value
    }
}
