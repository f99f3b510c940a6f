use std::sync::Arc;

use copper_core::{
    ActivityTypeRecord, ContactType, CopperAccount, CopperId, CopperUser, CoreError,
    CustomFieldDefinition, CustomerSource, LossReason, NamedLookup, Pipeline, RawRecord,
    RecordKind, PAGE_SIZE,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::cache::{LookupCache, LookupKind};
use crate::transport::{ApiRequest, ApiTransport};

const COMPUTED_VALUES: &str = "custom_field_computed_values";

/// Activity types come back grouped by who defined them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActivityTypeGroups {
    #[serde(default)]
    pub user: Vec<ActivityTypeRecord>,
    #[serde(default)]
    pub system: Vec<ActivityTypeRecord>,
}

/// Typed access to the Copper API with read-through caching of reference data.
#[derive(Clone)]
pub struct CopperClient {
    transport: Arc<dyn ApiTransport>,
    cache: Arc<LookupCache>,
}

impl CopperClient {
    pub fn new(transport: Arc<dyn ApiTransport>, cache: Arc<LookupCache>) -> Self {
        Self { transport, cache }
    }

    pub async fn call(&self, request: ApiRequest) -> Result<Value, CoreError> {
        self.transport.execute(request).await
    }

    /// Cached response for `kind`, fetched when absent or expired.
    pub async fn lookup_value(&self, kind: LookupKind) -> Result<Arc<Value>, CoreError> {
        if let Some(value) = self.cache.get(kind) {
            debug!(lookup = kind.as_str(), "lookup cache hit");
            return Ok(value);
        }

        debug!(lookup = kind.as_str(), "lookup cache miss");
        let value = self.call(kind.request()).await?;
        Ok(self.cache.insert(kind, value))
    }

    async fn lookup<T: DeserializeOwned>(&self, kind: LookupKind) -> Result<T, CoreError> {
        let value = self.lookup_value(kind).await?;
        T::deserialize(&*value).map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "failed to decode Copper {} lookup: {error}",
                kind.as_str()
            ))
        })
    }

    pub async fn account(&self) -> Result<CopperAccount, CoreError> {
        self.lookup(LookupKind::Account).await
    }

    pub async fn users(&self) -> Result<Vec<CopperUser>, CoreError> {
        self.lookup(LookupKind::Users).await
    }

    pub async fn pipelines(&self) -> Result<Vec<Pipeline>, CoreError> {
        self.lookup(LookupKind::Pipelines).await
    }

    pub async fn customer_sources(&self) -> Result<Vec<CustomerSource>, CoreError> {
        self.lookup(LookupKind::CustomerSources).await
    }

    pub async fn loss_reasons(&self) -> Result<Vec<LossReason>, CoreError> {
        self.lookup(LookupKind::LossReasons).await
    }

    pub async fn contact_types(&self) -> Result<Vec<ContactType>, CoreError> {
        self.lookup(LookupKind::ContactTypes).await
    }

    pub async fn custom_field_definitions(&self) -> Result<Vec<CustomFieldDefinition>, CoreError> {
        self.lookup(LookupKind::CustomFieldDefinitions).await
    }

    /// Id/name index of companies, used to label project references.
    pub async fn companies_index(&self) -> Result<Vec<NamedLookup>, CoreError> {
        self.lookup(LookupKind::Companies).await
    }

    /// Id/name index of opportunities, used to label project references.
    pub async fn opportunities_index(&self) -> Result<Vec<NamedLookup>, CoreError> {
        self.lookup(LookupKind::Opportunities).await
    }

    /// One page of `kind` in its default order.
    pub async fn search(
        &self,
        kind: RecordKind,
        page_number: u32,
    ) -> Result<Vec<RawRecord>, CoreError> {
        let (sort_by, sort_direction) = kind.default_sort();
        let mut body = json!({
            "page_size": PAGE_SIZE,
            "page_number": page_number,
            "sort_by": sort_by,
            COMPUTED_VALUES: true,
        });
        if let (Some(direction), Some(fields)) = (sort_direction, body.as_object_mut()) {
            fields.insert("sort_direction".to_owned(), json!(direction));
        }

        let path = format!("{}/search", kind.collection());
        let response = self.call(ApiRequest::post(path, body)).await?;
        let Value::Array(items) = response else {
            return Err(CoreError::DependencyUnavailable(format!(
                "Copper {} search did not return a list",
                kind.as_key()
            )));
        };

        items
            .into_iter()
            .map(|item| RawRecord::from_value(kind, item))
            .collect()
    }

    pub async fn activity_types(&self, page_number: u32) -> Result<ActivityTypeGroups, CoreError> {
        let request = ApiRequest::get(RecordKind::ActivityType.collection())
            .with_query("page_size", PAGE_SIZE.to_string())
            .with_query("page_number", page_number.to_string())
            .with_query("sort_by", RecordKind::ActivityType.default_sort().0);
        let response = self.call(request).await?;
        ActivityTypeGroups::deserialize(&response).map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "failed to decode Copper activity types: {error}"
            ))
        })
    }

    pub async fn fetch_record(
        &self,
        kind: RecordKind,
        id: &CopperId,
    ) -> Result<RawRecord, CoreError> {
        let path = record_path(kind, id)?;
        let response = self
            .call(ApiRequest::get(path).with_query(COMPUTED_VALUES, "true"))
            .await?;
        RawRecord::from_value(kind, response)
    }

    /// Writes `changes` to the record and returns the updated record.
    pub async fn update_record(
        &self,
        kind: RecordKind,
        id: &CopperId,
        mut changes: Map<String, Value>,
    ) -> Result<RawRecord, CoreError> {
        let path = record_path(kind, id)?;
        let changed = changes.keys().cloned().collect::<Vec<_>>().join(",");
        changes.insert(COMPUTED_VALUES.to_owned(), Value::Bool(true));

        let response = self
            .call(ApiRequest::put(path, Value::Object(changes)))
            .await?;
        let record = RawRecord::from_value(kind, response)?;
        info!(kind = kind.as_key(), id = %id, fields = %changed, "updated Copper record");
        Ok(record)
    }
}

fn record_path(kind: RecordKind, id: &CopperId) -> Result<String, CoreError> {
    kind.record_path(id.as_str()).ok_or_else(|| {
        CoreError::Configuration(format!(
            "{} records cannot be addressed individually.",
            kind.label()
        ))
    })
}
