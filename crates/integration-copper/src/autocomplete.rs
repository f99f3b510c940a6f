use copper_core::{
    check_kind, definitions_for, find_by_id, resolve_identifier, CoreError, RawRecord, RecordKind,
};

use crate::provider::CopperProvider;

impl CopperProvider {
    pub async fn autocomplete_loss_reasons(&self) -> Result<Vec<String>, CoreError> {
        let reasons = self.client().loss_reasons().await?;
        Ok(reasons.into_iter().filter_map(|reason| reason.name).collect())
    }

    pub async fn autocomplete_users(&self) -> Result<Vec<String>, CoreError> {
        let users = self.client().users().await?;
        Ok(users.into_iter().map(|user| user.email).collect())
    }

    /// Stage names of the opportunity's own pipeline; empty when it has none.
    pub async fn autocomplete_pipeline_stages(
        &self,
        url_or_id: &str,
    ) -> Result<Vec<String>, CoreError> {
        let reference = resolve_identifier(url_or_id)?;
        check_kind(reference.kind, RecordKind::Opportunity)?;

        let (record, pipelines) = tokio::try_join!(
            self.client()
                .fetch_record(RecordKind::Opportunity, &reference.id),
            self.client().pipelines(),
        )?;

        let pipeline_id = match &record {
            RawRecord::Opportunity(opportunity) => opportunity.pipeline_id.as_ref(),
            _ => None,
        };
        Ok(pipeline_id
            .and_then(|pipeline_id| find_by_id(&pipelines, pipeline_id))
            .map(|pipeline| pipeline.stage_names())
            .unwrap_or_default())
    }

    pub async fn autocomplete_custom_fields(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<String>, CoreError> {
        let definitions = self.client().custom_field_definitions().await?;
        Ok(definitions_for(&definitions, kind)
            .into_iter()
            .map(|definition| definition.name)
            .collect())
    }
}
