use copper_core::text::{
    human_readable_list, initial_capital, same_ignoring_case, strip_and_lowercase,
};
use copper_core::{
    check_kind, definitions_for, find_by_id, resolve_identifier, CopperId, CoreError,
    CustomFieldDefinition, CustomFieldType, CustomFieldValue, EnrichedRecord, RawRecord,
    RecordKind,
};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime};

use crate::provider::CopperProvider;

/// Opportunity statuses Copper accepts.
pub const STATUS_OPTIONS: [&str; 4] = ["Open", "Won", "Lost", "Abandoned"];

const LOST_STATUS: &str = "Lost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagChange {
    Add,
    Remove,
}

impl CopperProvider {
    /// A loss reason is only applied when moving to `Lost`.
    pub async fn update_opportunity_status(
        &self,
        url_or_id: &str,
        status: &str,
        loss_reason: Option<&str>,
    ) -> Result<EnrichedRecord, CoreError> {
        let id = resolve_for(url_or_id, RecordKind::Opportunity)?;
        let status = initial_capital(status.trim());
        if !STATUS_OPTIONS.contains(&status.as_str()) {
            return Err(CoreError::user_input(format!(
                "New status must be {}",
                human_readable_list(&STATUS_OPTIONS)
            )));
        }

        let mut changes = Map::new();
        changes.insert("status".to_owned(), Value::String(status.clone()));

        let loss_reason = loss_reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty() && status == LOST_STATUS);
        if let Some(reason) = loss_reason {
            let reasons = self.client().loss_reasons().await?;
            let matched = reasons.iter().find(|candidate| {
                candidate
                    .name
                    .as_deref()
                    .is_some_and(|name| same_ignoring_case(name, reason))
            });
            let Some(matched) = matched else {
                let names = reasons
                    .iter()
                    .filter_map(|candidate| candidate.name.clone())
                    .collect::<Vec<_>>();
                return Err(CoreError::user_input(format!(
                    "Loss reason must be {}",
                    human_readable_list(&names)
                )));
            };
            changes.insert("loss_reason_id".to_owned(), Value::from(&matched.id));
        }

        self.write_and_enrich(RecordKind::Opportunity, &id, changes)
            .await
    }

    pub async fn update_opportunity_stage(
        &self,
        url_or_id: &str,
        stage_name: &str,
    ) -> Result<EnrichedRecord, CoreError> {
        let id = resolve_for(url_or_id, RecordKind::Opportunity)?;
        let (record, pipelines) = tokio::try_join!(
            self.client().fetch_record(RecordKind::Opportunity, &id),
            self.client().pipelines(),
        )?;

        let pipeline = match &record {
            RawRecord::Opportunity(opportunity) => opportunity
                .pipeline_id
                .as_ref()
                .and_then(|pipeline_id| find_by_id(&pipelines, pipeline_id)),
            _ => None,
        }
        .ok_or_else(|| {
            CoreError::user_input(format!(
                "Opportunity {id} is not in a known pipeline, so its stage can't be changed."
            ))
        })?;

        let wanted = stage_name.trim();
        let stage = pipeline
            .stages
            .iter()
            .find(|stage| same_ignoring_case(&stage.name, wanted))
            .ok_or_else(|| {
                CoreError::user_input(format!(
                    "Stage must be {}",
                    human_readable_list(&pipeline.stage_names())
                ))
            })?;

        let mut changes = Map::new();
        changes.insert("pipeline_stage_id".to_owned(), Value::from(&stage.id));
        self.write_and_enrich(RecordKind::Opportunity, &id, changes)
            .await
    }

    pub async fn rename_opportunity(
        &self,
        url_or_id: &str,
        new_name: &str,
    ) -> Result<EnrichedRecord, CoreError> {
        if new_name.trim().is_empty() {
            return Err(CoreError::user_input(
                "New opportunity name cannot be blank",
            ));
        }
        let id = resolve_for(url_or_id, RecordKind::Opportunity)?;

        let mut changes = Map::new();
        changes.insert("name".to_owned(), Value::String(new_name.to_owned()));
        self.write_and_enrich(RecordKind::Opportunity, &id, changes)
            .await
    }

    pub async fn assign_record(
        &self,
        kind: RecordKind,
        url_or_id: &str,
        assignee_email: &str,
    ) -> Result<EnrichedRecord, CoreError> {
        ensure_editable(kind)?;
        let id = resolve_for(url_or_id, kind)?;
        let users = self.client().users().await?;

        let wanted = assignee_email.trim();
        let Some(assignee) = users
            .iter()
            .find(|user| same_ignoring_case(user.email.trim(), wanted))
        else {
            let emails = users.iter().map(|user| user.email.clone()).collect::<Vec<_>>();
            return Err(CoreError::user_input(format!(
                "Couldn't find a Copper user with the email address \"{assignee_email}\". Try {}.",
                human_readable_list(&emails)
            )));
        };

        let mut changes = Map::new();
        changes.insert("assignee_id".to_owned(), Value::from(&assignee.id));
        self.write_and_enrich(kind, &id, changes).await
    }

    pub async fn add_or_remove_tag(
        &self,
        kind: RecordKind,
        url_or_id: &str,
        tag: &str,
        change: TagChange,
    ) -> Result<EnrichedRecord, CoreError> {
        ensure_editable(kind)?;
        let id = resolve_for(url_or_id, kind)?;
        let record = self.client().fetch_record(kind, &id).await?;

        let tags = apply_tag_change(record.tags(), tag, change);
        let mut changes = Map::new();
        changes.insert(
            "tags".to_owned(),
            Value::Array(tags.into_iter().map(Value::String).collect()),
        );
        self.write_and_enrich(kind, &id, changes).await
    }

    pub async fn update_custom_field(
        &self,
        kind: RecordKind,
        url_or_id: &str,
        field_name: &str,
        new_value: &str,
    ) -> Result<EnrichedRecord, CoreError> {
        ensure_editable(kind)?;
        let id = resolve_for(url_or_id, kind)?;
        let (record, definitions) = tokio::try_join!(
            self.client().fetch_record(kind, &id),
            self.client().custom_field_definitions(),
        )?;

        let applicable = definitions_for(&definitions, kind);
        let wanted = strip_and_lowercase(field_name);
        let Some(definition) = applicable
            .iter()
            .find(|definition| strip_and_lowercase(&definition.name) == wanted)
        else {
            let names = applicable
                .iter()
                .map(|definition| definition.name.clone())
                .collect::<Vec<_>>();
            return Err(CoreError::user_input(format!(
                "Couldn't find a custom field called \"{field_name}\" for this record type. Try {}.",
                human_readable_list(&names)
            )));
        };

        let value = prepare_custom_field_value(definition, field_name, new_value)?;
        let entries = replace_custom_field(record.custom_fields(), &definition.id, value);
        let entries = serde_json::to_value(entries).map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "failed to encode Copper custom fields: {error}"
            ))
        })?;

        let mut changes = Map::new();
        changes.insert("custom_fields".to_owned(), entries);
        self.write_and_enrich(kind, &id, changes).await
    }

    async fn write_and_enrich(
        &self,
        kind: RecordKind,
        id: &CopperId,
        changes: Map<String, Value>,
    ) -> Result<EnrichedRecord, CoreError> {
        let record = self.client().update_record(kind, id, changes).await?;
        self.enrich_record(record).await
    }
}

fn resolve_for(url_or_id: &str, kind: RecordKind) -> Result<CopperId, CoreError> {
    let reference = resolve_identifier(url_or_id)?;
    check_kind(reference.kind, kind)?;
    Ok(reference.id)
}

fn ensure_editable(kind: RecordKind) -> Result<(), CoreError> {
    match kind {
        RecordKind::Company
        | RecordKind::Person
        | RecordKind::Opportunity
        | RecordKind::Lead
        | RecordKind::Project => Ok(()),
        other => Err(CoreError::Configuration(format!(
            "{} records cannot be edited.",
            other.label()
        ))),
    }
}

/// Adding never deduplicates; removing drops every exact match.
pub fn apply_tag_change(tags: &[String], tag: &str, change: TagChange) -> Vec<String> {
    match change {
        TagChange::Add => {
            let mut tags = tags.to_vec();
            tags.push(tag.to_owned());
            tags
        }
        TagChange::Remove => tags
            .iter()
            .filter(|candidate| candidate.as_str() != tag)
            .cloned()
            .collect(),
    }
}

/// Converts user text into the value Copper stores for `definition`.
pub fn prepare_custom_field_value(
    definition: &CustomFieldDefinition,
    field_name: &str,
    input: &str,
) -> Result<Value, CoreError> {
    match definition.data_type {
        CustomFieldType::Date => parse_date_to_epoch_seconds(input).map(Value::from),
        CustomFieldType::Dropdown => {
            let wanted = strip_and_lowercase(input);
            definition
                .options
                .iter()
                .find(|option| strip_and_lowercase(&option.name) == wanted)
                .map(|option| Value::from(&option.id))
                .ok_or_else(|| {
                    CoreError::user_input(format!(
                        "{input} is not an option for the custom field \"{field_name}\". Try {}.",
                        human_readable_list(&definition.option_names())
                    ))
                })
        }
        _ => Ok(Value::String(input.to_owned())),
    }
}

/// `YYYY-MM-DD` is read as midnight UTC; RFC 3339 date-times are also accepted.
pub fn parse_date_to_epoch_seconds(input: &str) -> Result<i64, CoreError> {
    let trimmed = input.trim();
    if let Some(date) = parse_calendar_date(trimmed) {
        return Ok(date.midnight().assume_utc().unix_timestamp());
    }
    OffsetDateTime::parse(trimmed, &Rfc3339)
        .map(OffsetDateTime::unix_timestamp)
        .map_err(|_| {
            CoreError::user_input(format!(
                "Couldn't parse date \"{input}\". Please use the format \"YYYY-MM-DD\"."
            ))
        })
}

fn parse_calendar_date(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u8>().ok()?;
    let day = parts.next()?.parse::<u8>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn replace_custom_field(
    entries: &[CustomFieldValue],
    definition_id: &CopperId,
    value: Value,
) -> Vec<CustomFieldValue> {
    let mut entries = entries.to_vec();
    match entries
        .iter_mut()
        .find(|entry| &entry.custom_field_definition_id == definition_id)
    {
        Some(entry) => entry.value = value,
        None => entries.push(CustomFieldValue {
            custom_field_definition_id: definition_id.clone(),
            value,
        }),
    }
    entries
}
