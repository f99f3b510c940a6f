use copper_core::{Continuation, CoreError, EnrichedRecord, RecordKind, SyncPage};
use tracing::debug;

use crate::enrich::{enrich, enrich_activity_type};
use crate::provider::CopperProvider;

const USER_ACTIVITY_CATEGORY: &str = "user";
const SYSTEM_ACTIVITY_CATEGORY: &str = "system";

impl CopperProvider {
    pub async fn sync_opportunities(
        &self,
        continuation: Option<Continuation>,
    ) -> Result<SyncPage<EnrichedRecord>, CoreError> {
        self.sync_records(RecordKind::Opportunity, continuation).await
    }

    pub async fn sync_companies(
        &self,
        continuation: Option<Continuation>,
    ) -> Result<SyncPage<EnrichedRecord>, CoreError> {
        self.sync_records(RecordKind::Company, continuation).await
    }

    pub async fn sync_people(
        &self,
        continuation: Option<Continuation>,
    ) -> Result<SyncPage<EnrichedRecord>, CoreError> {
        self.sync_records(RecordKind::Person, continuation).await
    }

    pub async fn sync_leads(
        &self,
        continuation: Option<Continuation>,
    ) -> Result<SyncPage<EnrichedRecord>, CoreError> {
        self.sync_records(RecordKind::Lead, continuation).await
    }

    pub async fn sync_projects(
        &self,
        continuation: Option<Continuation>,
    ) -> Result<SyncPage<EnrichedRecord>, CoreError> {
        self.sync_records(RecordKind::Project, continuation).await
    }

    /// User-defined and system activity types, each tagged with its group.
    pub async fn sync_activity_types(
        &self,
        continuation: Option<Continuation>,
    ) -> Result<SyncPage<EnrichedRecord>, CoreError> {
        let page_number = Continuation::page_to_fetch(continuation.as_ref());
        let groups = self.client().activity_types(page_number).await?;

        let user = groups
            .user
            .iter()
            .map(|record| enrich_activity_type(record, USER_ACTIVITY_CATEGORY));
        let system = groups
            .system
            .iter()
            .map(|record| enrich_activity_type(record, SYSTEM_ACTIVITY_CATEGORY));
        let result = user.chain(system).collect::<Result<Vec<_>, _>>()?;

        debug!(
            kind = RecordKind::ActivityType.as_key(),
            page_number,
            count = result.len(),
            "synced Copper page"
        );
        Ok(SyncPage::from_page(page_number, result))
    }

    pub async fn sync(
        &self,
        kind: RecordKind,
        continuation: Option<Continuation>,
    ) -> Result<SyncPage<EnrichedRecord>, CoreError> {
        match kind {
            RecordKind::ActivityType => self.sync_activity_types(continuation).await,
            RecordKind::Task | RecordKind::Activity => Err(CoreError::Configuration(format!(
                "{} records cannot be synced.",
                kind.label()
            ))),
            _ => self.sync_records(kind, continuation).await,
        }
    }

    async fn sync_records(
        &self,
        kind: RecordKind,
        continuation: Option<Continuation>,
    ) -> Result<SyncPage<EnrichedRecord>, CoreError> {
        let page_number = Continuation::page_to_fetch(continuation.as_ref());
        let (records, (context, lookups)) = tokio::try_join!(
            self.client().search(kind, page_number),
            self.lookups_for(kind, true, true),
        )?;

        let result = records
            .iter()
            .map(|record| enrich(record, &context, &lookups, true))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            kind = kind.as_key(),
            page_number,
            count = result.len(),
            "synced Copper page"
        );
        Ok(SyncPage::from_page(page_number, result))
    }
}
