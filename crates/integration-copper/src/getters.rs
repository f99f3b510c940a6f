use copper_core::{check_kind, resolve_identifier, CoreError, EnrichedRecord, RecordKind};

use crate::enrich::enrich;
use crate::provider::CopperProvider;

impl CopperProvider {
    pub async fn get_opportunity(&self, url_or_id: &str) -> Result<EnrichedRecord, CoreError> {
        self.get(RecordKind::Opportunity, url_or_id).await
    }

    pub async fn get_person(&self, url_or_id: &str) -> Result<EnrichedRecord, CoreError> {
        self.get(RecordKind::Person, url_or_id).await
    }

    pub async fn get_company(&self, url_or_id: &str) -> Result<EnrichedRecord, CoreError> {
        self.get(RecordKind::Company, url_or_id).await
    }

    /// Point lookup by Copper URL or bare id. Getter output has no custom
    /// fields and no reference stubs.
    pub async fn get(&self, kind: RecordKind, url_or_id: &str) -> Result<EnrichedRecord, CoreError> {
        let reference = resolve_identifier(url_or_id)?;
        check_kind(reference.kind, kind)?;

        let (record, (context, lookups)) = tokio::try_join!(
            self.client().fetch_record(kind, &reference.id),
            self.lookups_for(kind, false, false),
        )?;
        enrich(&record, &context, &lookups, false)
    }
}
