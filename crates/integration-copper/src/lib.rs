mod actions;
mod autocomplete;
mod cache;
mod client;
mod config;
mod enrich;
mod getters;
mod provider;
mod schema;
mod sync;
mod transport;

#[cfg(test)]
mod test_support;

pub use actions::{
    apply_tag_change, parse_date_to_epoch_seconds, prepare_custom_field_value, TagChange,
    STATUS_OPTIONS,
};
pub use cache::{LookupCache, LookupKind};
pub use client::{ActivityTypeGroups, CopperClient};
pub use config::CopperConfig;
pub use enrich::{enrich, enrich_activity_type, EnrichmentContext, Lookups};
pub use provider::CopperProvider;
pub use schema::{
    base_schema, custom_field_property, ObjectSchema, PropertySchema, SchemaBuilder, ValueHint,
    ValueType,
};
pub use transport::{ApiMethod, ApiRequest, ApiTransport, ReqwestApiTransport};
