use std::future::Future;
use std::sync::Arc;

use copper_core::{CoreError, EnrichedRecord, RawRecord, RecordKind};

use crate::cache::LookupCache;
use crate::client::CopperClient;
use crate::config::CopperConfig;
use crate::enrich::{enrich, EnrichmentContext, Lookups};
use crate::transport::{ApiTransport, ReqwestApiTransport};

/// Host-facing entry point. Every listing, getter, action, autocomplete
/// and schema operation hangs off this type.
#[derive(Clone)]
pub struct CopperProvider {
    config: CopperConfig,
    client: CopperClient,
}

impl std::fmt::Debug for CopperProvider {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CopperProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CopperProvider {
    pub fn new(config: CopperConfig) -> Result<Self, CoreError> {
        let transport = ReqwestApiTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Settings file from `COPPER_CONFIG` layered under environment secrets.
    pub fn from_env() -> Result<Self, CoreError> {
        let settings = copper_config::load_from_env()?;
        let config = CopperConfig::from_settings(&settings)?;
        Self::new(config)
    }

    pub fn with_transport(config: CopperConfig, transport: Arc<dyn ApiTransport>) -> Self {
        let cache = Arc::new(LookupCache::new(config.lookup_cache_ttl));
        Self {
            client: CopperClient::new(transport, cache),
            config,
        }
    }

    pub fn config(&self) -> &CopperConfig {
        &self.config
    }

    pub fn client(&self) -> &CopperClient {
        &self.client
    }

    /// Fetches, concurrently, only the reference data `kind` needs.
    pub(crate) async fn lookups_for(
        &self,
        kind: RecordKind,
        with_custom_fields: bool,
        include_references: bool,
    ) -> Result<(EnrichmentContext, Lookups), CoreError> {
        let client = &self.client;
        let opportunity = kind == RecordKind::Opportunity;
        let has_contact_type = matches!(kind, RecordKind::Person | RecordKind::Lead);
        let has_customer_source = matches!(kind, RecordKind::Opportunity | RecordKind::Lead);
        let project_references = include_references && kind == RecordKind::Project;

        let (
            account,
            users,
            pipelines,
            customer_sources,
            loss_reasons,
            contact_types,
            custom_field_definitions,
            companies,
            opportunities,
        ) = tokio::try_join!(
            client.account(),
            when(kind.has_web_page(), client.users()),
            when(opportunity, client.pipelines()),
            when(has_customer_source, client.customer_sources()),
            when(opportunity, client.loss_reasons()),
            when(has_contact_type, client.contact_types()),
            when(with_custom_fields, async {
                client.custom_field_definitions().await.map(Some)
            }),
            when(project_references, client.companies_index()),
            when(project_references, client.opportunities_index()),
        )?;

        let context = EnrichmentContext::new(self.config.web_url.clone(), account.id);
        let lookups = Lookups {
            users,
            pipelines,
            customer_sources,
            loss_reasons,
            contact_types,
            custom_field_definitions,
            companies,
            opportunities,
        };
        Ok((context, lookups))
    }

    /// Full enrichment used after writes: custom fields and references included.
    pub(crate) async fn enrich_record(&self, record: RawRecord) -> Result<EnrichedRecord, CoreError> {
        let (context, lookups) = self.lookups_for(record.kind(), true, true).await?;
        enrich(&record, &context, &lookups, true)
    }
}

async fn when<T, F>(enabled: bool, fetch: F) -> Result<T, CoreError>
where
    T: Default,
    F: Future<Output = Result<T, CoreError>>,
{
    if enabled {
        fetch.await
    } else {
        Ok(T::default())
    }
}
