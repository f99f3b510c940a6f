use copper_core::{
    find_by_id, ActivityTypeRecord, ContactType, CopperId, CopperUser, CoreError,
    CustomFieldDefinition, CustomerSource, EnrichedRecord, LeadRecord, LossReason, NamedLookup,
    OpportunityRecord, PersonRecord, Pipeline, ProjectRecord, RawRecord, RecordKind,
};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Account-level inputs needed to build Copper web links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentContext {
    pub web_url: String,
    pub account_id: CopperId,
}

impl EnrichmentContext {
    pub fn new(web_url: impl Into<String>, account_id: CopperId) -> Self {
        Self {
            web_url: web_url.into(),
            account_id,
        }
    }

    pub fn record_url(&self, kind: RecordKind, id: &CopperId) -> Option<String> {
        kind.has_web_page().then(|| {
            format!(
                "{}/companies/{}/app#/{}/{}",
                self.web_url.trim_end_matches('/'),
                self.account_id,
                kind.as_key(),
                id
            )
        })
    }
}

/// Reference collections used to resolve foreign keys. Collections left
/// empty simply resolve nothing; `custom_field_definitions` of `None` skips
/// custom field values entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookups {
    pub users: Vec<CopperUser>,
    pub pipelines: Vec<Pipeline>,
    pub customer_sources: Vec<CustomerSource>,
    pub loss_reasons: Vec<LossReason>,
    pub contact_types: Vec<ContactType>,
    pub custom_field_definitions: Option<Vec<CustomFieldDefinition>>,
    pub companies: Vec<NamedLookup>,
    pub opportunities: Vec<NamedLookup>,
}

/// Denormalizes `raw` into a display-ready record. Dangling or absent
/// foreign keys leave their display fields out; they never fail.
pub fn enrich(
    raw: &RawRecord,
    context: &EnrichmentContext,
    lookups: &Lookups,
    include_references: bool,
) -> Result<EnrichedRecord, CoreError> {
    let kind = raw.kind();
    let mut fields = raw.to_fields()?;

    if let Some(url) = context.record_url(kind, raw.id()) {
        fields.insert("url".to_owned(), Value::String(url));
    }

    if let Some(assignee_id) = raw.assignee_id() {
        match find_by_id(&lookups.users, assignee_id) {
            Some(user) => {
                fields.insert("assignee".to_owned(), user_display(user));
            }
            None => dangling(kind, "assignee_id", assignee_id),
        }
    }

    if let Some(full_address) = raw.address().and_then(|address| address.full()) {
        fields.insert("fullAddress".to_owned(), Value::String(full_address));
    }

    match raw {
        RawRecord::Opportunity(record) => {
            enrich_opportunity(record, lookups, include_references, &mut fields)
        }
        RawRecord::Person(record) => enrich_person(record, lookups, include_references, &mut fields),
        RawRecord::Lead(record) => enrich_lead(record, lookups, &mut fields),
        RawRecord::Project(record) => {
            if include_references {
                project_references(record, lookups, &mut fields);
            }
        }
        RawRecord::Company(_) | RawRecord::ActivityType(_) => {}
    }

    if let Some(definitions) = lookups.custom_field_definitions.as_deref() {
        merge_custom_fields(raw, definitions, &mut fields);
    }

    Ok(EnrichedRecord::new(kind, fields))
}

/// Activity types carry no relations; the listing group becomes `category`.
pub fn enrich_activity_type(
    record: &ActivityTypeRecord,
    category: &str,
) -> Result<EnrichedRecord, CoreError> {
    let mut fields = RawRecord::ActivityType(record.clone()).to_fields()?;
    fields.insert("category".to_owned(), Value::String(category.to_owned()));
    Ok(EnrichedRecord::new(RecordKind::ActivityType, fields))
}

fn enrich_opportunity(
    record: &OpportunityRecord,
    lookups: &Lookups,
    include_references: bool,
    fields: &mut Map<String, Value>,
) {
    let kind = RecordKind::Opportunity;
    let pipeline = record.pipeline_id.as_ref().and_then(|pipeline_id| {
        let found = find_by_id(&lookups.pipelines, pipeline_id);
        if found.is_none() {
            dangling(kind, "pipeline_id", pipeline_id);
        }
        found
    });

    if let Some(pipeline) = pipeline {
        fields.insert("pipeline".to_owned(), Value::String(pipeline.name.clone()));
    }
    if let Some(stage_id) = record.pipeline_stage_id.as_ref() {
        match pipeline.and_then(|pipeline| pipeline.stage(stage_id)) {
            Some(stage) => {
                fields.insert("pipelineStage".to_owned(), Value::String(stage.name.clone()));
            }
            None => dangling(kind, "pipeline_stage_id", stage_id),
        }
    }

    insert_named(
        fields,
        "lossReason",
        kind,
        "loss_reason_id",
        record.loss_reason_id.as_ref(),
        &lookups.loss_reasons,
    );
    insert_named(
        fields,
        "customerSource",
        kind,
        "customer_source_id",
        record.customer_source_id.as_ref(),
        &lookups.customer_sources,
    );

    if include_references {
        if let Some(person_id) = record.primary_contact_id.as_ref() {
            fields.insert(
                "primaryContact".to_owned(),
                json!({ "personId": Value::from(person_id) }),
            );
        }
        if let Some(company_id) = record.company_id.as_ref() {
            fields.insert(
                "company".to_owned(),
                company_stub(company_id, record.company_name.as_deref()),
            );
        }
    }
}

fn enrich_person(
    record: &PersonRecord,
    lookups: &Lookups,
    include_references: bool,
    fields: &mut Map<String, Value>,
) {
    insert_named(
        fields,
        "contactType",
        RecordKind::Person,
        "contact_type_id",
        record.contact_type_id.as_ref(),
        &lookups.contact_types,
    );

    if let Some(primary) = record.emails.first() {
        fields.insert(
            "primaryEmail".to_owned(),
            Value::String(primary.email.clone()),
        );
    }

    if include_references {
        if let Some(company_id) = record.company_id.as_ref() {
            fields.insert(
                "company".to_owned(),
                company_stub(company_id, record.company_name.as_deref()),
            );
        }
    }
}

fn enrich_lead(record: &LeadRecord, lookups: &Lookups, fields: &mut Map<String, Value>) {
    insert_named(
        fields,
        "contactType",
        RecordKind::Lead,
        "contact_type_id",
        record.contact_type_id.as_ref(),
        &lookups.contact_types,
    );
    insert_named(
        fields,
        "customerSource",
        RecordKind::Lead,
        "customer_source_id",
        record.customer_source_id.as_ref(),
        &lookups.customer_sources,
    );

    // Leads expose their single email and first phone as plain strings.
    match record.email.as_ref() {
        Some(email) => {
            fields.insert("email".to_owned(), Value::String(email.email.clone()));
        }
        None => {
            fields.remove("email");
        }
    }
    if let Some(phone) = record.phone_numbers.first() {
        fields.insert("phone".to_owned(), Value::String(phone.number.clone()));
    }
}

fn project_references(record: &ProjectRecord, lookups: &Lookups, fields: &mut Map<String, Value>) {
    let Some(related) = record.related_resource.as_ref() else {
        return;
    };

    match RecordKind::from_key(&related.resource_type) {
        Some(RecordKind::Company) => {
            let name = find_by_id(&lookups.companies, &related.id)
                .and_then(|company| company.name.as_deref());
            fields.insert("company".to_owned(), company_stub(&related.id, name));
        }
        Some(RecordKind::Opportunity) => {
            let mut stub = Map::new();
            stub.insert("opportunityId".to_owned(), Value::from(&related.id));
            if let Some(name) = find_by_id(&lookups.opportunities, &related.id)
                .and_then(|opportunity| opportunity.name.as_deref())
            {
                stub.insert("opportunityName".to_owned(), Value::String(name.to_owned()));
            }
            fields.insert("opportunity".to_owned(), Value::Object(stub));
        }
        _ => {}
    }
}

fn merge_custom_fields(
    raw: &RawRecord,
    definitions: &[CustomFieldDefinition],
    fields: &mut Map<String, Value>,
) {
    let kind = raw.kind();
    for definition in definitions.iter().filter(|definition| definition.applies_to(kind)) {
        if let Some(entry) = raw
            .custom_fields()
            .iter()
            .find(|entry| entry.custom_field_definition_id == definition.id)
        {
            fields.insert(definition.name.clone(), entry.value.clone());
        }
    }
}

fn user_display(user: &CopperUser) -> Value {
    let mut display = Map::new();
    display.insert("email".to_owned(), Value::String(user.email.clone()));
    if let Some(name) = user.name.as_deref() {
        display.insert("name".to_owned(), Value::String(name.to_owned()));
    }
    display.insert("copperUserId".to_owned(), Value::from(&user.id));
    Value::Object(display)
}

fn company_stub(id: &CopperId, name: Option<&str>) -> Value {
    let mut stub = Map::new();
    stub.insert("companyId".to_owned(), Value::from(id));
    if let Some(name) = name.filter(|name| !name.trim().is_empty()) {
        stub.insert("companyName".to_owned(), Value::String(name.to_owned()));
    }
    Value::Object(stub)
}

fn insert_named(
    fields: &mut Map<String, Value>,
    key: &str,
    kind: RecordKind,
    foreign_key: &str,
    id: Option<&CopperId>,
    collection: &[NamedLookup],
) {
    let Some(id) = id else {
        return;
    };
    match find_by_id(collection, id) {
        Some(entry) => {
            if let Some(name) = entry.name.as_deref() {
                fields.insert(key.to_owned(), Value::String(name.to_owned()));
            }
        }
        None => dangling(kind, foreign_key, id),
    }
}

fn dangling(kind: RecordKind, foreign_key: &str, id: &CopperId) {
    warn!(
        kind = kind.as_key(),
        foreign_key,
        id = %id,
        "Copper record references an unknown id; leaving display field empty"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::opportunity_json;

    fn context() -> EnrichmentContext {
        EnrichmentContext::new("https://app.copper.com/", CopperId::from("77"))
    }

    fn lookups() -> Lookups {
        Lookups {
            users: serde_json::from_value(json!([
                { "id": 1, "name": "Ada Lovelace", "email": "ada@example.com" }
            ]))
            .expect("users"),
            pipelines: serde_json::from_value(json!([{
                "id": 10,
                "name": "Sales",
                "stages": [{ "id": 101, "name": "Proposal" }]
            }]))
            .expect("pipelines"),
            customer_sources: serde_json::from_value(json!([{ "id": 20, "name": "Referral" }]))
                .expect("sources"),
            loss_reasons: serde_json::from_value(json!([{ "id": 30, "name": "Price" }]))
                .expect("loss reasons"),
            contact_types: serde_json::from_value(json!([{ "id": 40, "name": "Customer" }]))
                .expect("contact types"),
            custom_field_definitions: Some(
                serde_json::from_value(json!([
                    {
                        "id": 50,
                        "name": "Renewal Date",
                        "data_type": "Date",
                        "available_on": ["opportunity"]
                    },
                    {
                        "id": 51,
                        "name": "Company Only",
                        "data_type": "String",
                        "available_on": ["company"]
                    }
                ]))
                .expect("definitions"),
            ),
            companies: serde_json::from_value(json!([{ "id": 60, "name": "Initech" }]))
                .expect("companies"),
            opportunities: serde_json::from_value(json!([{ "id": 70, "name": "Renewal" }]))
                .expect("opportunities"),
        }
    }

    fn opportunity() -> RawRecord {
        let mut value = opportunity_json();
        value["custom_fields"] = json!([
            { "custom_field_definition_id": 50, "value": 1705276800 },
            { "custom_field_definition_id": 51, "value": "not for opportunities" }
        ]);
        RawRecord::from_value(RecordKind::Opportunity, value).expect("opportunity")
    }

    #[test]
    fn opportunity_relations_are_resolved() {
        let enriched = enrich(&opportunity(), &context(), &lookups(), true).expect("enrich");

        assert_eq!(
            enriched.get("url"),
            Some(&json!(
                "https://app.copper.com/companies/77/app#/opportunity/70"
            ))
        );
        assert_eq!(
            enriched.get("assignee"),
            Some(&json!({
                "email": "ada@example.com",
                "name": "Ada Lovelace",
                "copperUserId": 1
            }))
        );
        assert_eq!(enriched.get("pipeline"), Some(&json!("Sales")));
        assert_eq!(enriched.get("pipelineStage"), Some(&json!("Proposal")));
        assert_eq!(enriched.get("customerSource"), Some(&json!("Referral")));
        assert_eq!(
            enriched.get("company"),
            Some(&json!({ "companyId": 60, "companyName": "Initech" }))
        );
        assert_eq!(enriched.get("primaryContact"), Some(&json!({ "personId": 80 })));
        assert_eq!(enriched.get("monetary_value"), Some(&json!(12000)));
    }

    #[test]
    fn custom_fields_merge_only_for_applicable_definitions() {
        let enriched = enrich(&opportunity(), &context(), &lookups(), false).expect("enrich");
        assert_eq!(enriched.get("Renewal Date"), Some(&json!(1705276800)));
        assert!(!enriched.contains("Company Only"));

        let without_definitions = Lookups {
            custom_field_definitions: None,
            ..lookups()
        };
        let enriched = enrich(&opportunity(), &context(), &without_definitions, false)
            .expect("enrich");
        assert!(!enriched.contains("Renewal Date"));
    }

    #[test]
    fn references_are_left_out_unless_requested() {
        let enriched = enrich(&opportunity(), &context(), &lookups(), false).expect("enrich");
        assert!(!enriched.contains("company"));
        assert!(!enriched.contains("primaryContact"));
    }

    #[test]
    fn dangling_foreign_keys_omit_display_fields() {
        let raw = RawRecord::from_value(
            RecordKind::Opportunity,
            json!({
                "id": 71,
                "assignee_id": 999,
                "pipeline_id": 10,
                "pipeline_stage_id": 999,
                "loss_reason_id": 999,
                "customer_source_id": 999
            }),
        )
        .expect("opportunity");

        let enriched = enrich(&raw, &context(), &lookups(), true).expect("enrich");
        assert!(!enriched.contains("assignee"));
        assert!(!enriched.contains("pipelineStage"));
        assert!(!enriched.contains("lossReason"));
        assert!(!enriched.contains("customerSource"));
        assert_eq!(enriched.get("pipeline"), Some(&json!("Sales")));
        assert_eq!(enriched.get("assignee_id"), Some(&json!(999)));
    }

    #[test]
    fn stage_is_resolved_only_within_its_pipeline() {
        let raw = RawRecord::from_value(
            RecordKind::Opportunity,
            json!({ "id": 72, "pipeline_stage_id": 101 }),
        )
        .expect("opportunity");

        let enriched = enrich(&raw, &context(), &lookups(), false).expect("enrich");
        assert!(!enriched.contains("pipelineStage"));
    }

    #[test]
    fn enrichment_is_repeatable() {
        let raw = opportunity();
        let first = enrich(&raw, &context(), &lookups(), true).expect("first");
        let second = enrich(&raw, &context(), &lookups(), true).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn person_gets_contact_type_primary_email_and_address() {
        let raw = RawRecord::from_value(
            RecordKind::Person,
            json!({
                "id": 80,
                "name": "Milton",
                "company_id": 60,
                "contact_type_id": 40,
                "emails": [
                    { "email": "milton@initech.test", "category": "work" },
                    { "email": "milton@home.test", "category": "personal" }
                ],
                "address": { "street": "1 Initech Way", "city": "Austin", "state": "", "country": "US" }
            }),
        )
        .expect("person");

        let enriched = enrich(&raw, &context(), &lookups(), true).expect("enrich");
        assert_eq!(enriched.get("contactType"), Some(&json!("Customer")));
        assert_eq!(
            enriched.get("primaryEmail"),
            Some(&json!("milton@initech.test"))
        );
        assert_eq!(
            enriched.get("fullAddress"),
            Some(&json!("1 Initech Way, Austin, US"))
        );
        assert_eq!(enriched.get("company"), Some(&json!({ "companyId": 60 })));
    }

    #[test]
    fn lead_flattens_email_and_phone() {
        let raw = RawRecord::from_value(
            RecordKind::Lead,
            json!({
                "id": 90,
                "name": "Peter",
                "customer_source_id": 20,
                "email": { "email": "peter@initech.test", "category": "work" },
                "phone_numbers": [{ "number": "555-0100", "category": "mobile" }]
            }),
        )
        .expect("lead");

        let enriched = enrich(&raw, &context(), &lookups(), false).expect("enrich");
        assert_eq!(enriched.get("email"), Some(&json!("peter@initech.test")));
        assert_eq!(enriched.get("phone"), Some(&json!("555-0100")));
        assert_eq!(enriched.get("customerSource"), Some(&json!("Referral")));
        assert_eq!(
            enriched.get("url"),
            Some(&json!("https://app.copper.com/companies/77/app#/lead/90"))
        );
    }

    #[test]
    fn project_references_use_the_name_indexes() {
        let company_project = RawRecord::from_value(
            RecordKind::Project,
            json!({ "id": 5, "related_resource": { "id": 60, "type": "company" } }),
        )
        .expect("project");
        let enriched = enrich(&company_project, &context(), &lookups(), true).expect("enrich");
        assert_eq!(
            enriched.get("company"),
            Some(&json!({ "companyId": 60, "companyName": "Initech" }))
        );

        let opportunity_project = RawRecord::from_value(
            RecordKind::Project,
            json!({ "id": 6, "related_resource": { "id": 404, "type": "opportunity" } }),
        )
        .expect("project");
        let enriched =
            enrich(&opportunity_project, &context(), &lookups(), true).expect("enrich");
        assert_eq!(
            enriched.get("opportunity"),
            Some(&json!({ "opportunityId": 404 }))
        );
    }

    #[test]
    fn activity_types_get_category_and_no_url() {
        let record: ActivityTypeRecord =
            serde_json::from_value(json!({ "id": 3, "name": "Meeting", "is_disabled": false }))
                .expect("activity type");
        let enriched = enrich_activity_type(&record, "user").expect("enrich");
        assert_eq!(enriched.get("category"), Some(&json!("user")));
        assert_eq!(enriched.get("name"), Some(&json!("Meeting")));
        assert!(!enriched.contains("url"));
        assert_eq!(
            context().record_url(RecordKind::ActivityType, &CopperId::from("3")),
            None
        );
    }
}
