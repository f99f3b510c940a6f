use std::collections::BTreeMap;

use copper_core::{CoreError, CustomFieldDefinition, CustomFieldType, RecordKind};
use serde::Serialize;
use tracing::debug;

use crate::provider::CopperProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

/// Display hint layered on top of the storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueHint {
    Date,
    Url,
    Currency,
    Email,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<ValueHint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enriched record key this property is read from, when it differs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_key: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    /// Record kind a nested object points at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<RecordKind>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySchema>,
}

impl PropertySchema {
    fn of(value_type: ValueType) -> Self {
        Self {
            value_type,
            hint: None,
            description: None,
            from_key: None,
            required: false,
            items: None,
            reference: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(ValueType::String)
    }

    pub fn number() -> Self {
        Self::of(ValueType::Number)
    }

    pub fn boolean() -> Self {
        Self::of(ValueType::Boolean)
    }

    pub fn array_of(items: PropertySchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(ValueType::Array)
        }
    }

    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertySchema)>,
        K: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(key, property)| (key.into(), property))
                .collect(),
            ..Self::of(ValueType::Object)
        }
    }

    pub fn date() -> Self {
        Self::number().with_hint(ValueHint::Date)
    }

    pub fn url() -> Self {
        Self::string().with_hint(ValueHint::Url)
    }

    pub fn with_hint(mut self, hint: ValueHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn from_key(mut self, key: impl Into<String>) -> Self {
        self.from_key = Some(key.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn referencing(mut self, kind: RecordKind) -> Self {
        self.reference = Some(kind);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    pub identity: String,
    pub id_property: String,
    pub display_property: String,
    pub featured_properties: Vec<String>,
    pub properties: BTreeMap<String, PropertySchema>,
}

impl ObjectSchema {
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }
}

/// Composes a fixed property table with properties derived from custom
/// field definitions. On a name collision the custom field wins.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    base: ObjectSchema,
    custom: Vec<(String, PropertySchema)>,
}

impl SchemaBuilder {
    pub fn new(base: ObjectSchema) -> Self {
        Self {
            base,
            custom: Vec::new(),
        }
    }

    pub fn for_kind(kind: RecordKind) -> Result<Self, CoreError> {
        base_schema(kind).map(Self::new).ok_or_else(|| {
            CoreError::Configuration(format!("{} records have no schema.", kind.label()))
        })
    }

    /// Adds every definition applicable to `kind`, in upstream order.
    pub fn with_custom_fields(
        mut self,
        definitions: &[CustomFieldDefinition],
        kind: RecordKind,
    ) -> Self {
        self.custom.extend(
            definitions
                .iter()
                .filter(|definition| definition.applies_to(kind))
                .map(|definition| (definition.name.clone(), custom_field_property(definition))),
        );
        self
    }

    pub fn build(self) -> ObjectSchema {
        let mut schema = self.base;
        for (name, property) in self.custom {
            if schema.properties.insert(name.clone(), property).is_some() {
                debug!(property = %name, "custom field replaces base schema property");
            }
        }
        schema
    }
}

pub fn custom_field_property(definition: &CustomFieldDefinition) -> PropertySchema {
    match definition.data_type {
        CustomFieldType::Date => PropertySchema::date(),
        CustomFieldType::Checkbox => PropertySchema::boolean(),
        CustomFieldType::Float | CustomFieldType::Percentage => PropertySchema::number(),
        CustomFieldType::Currency => PropertySchema::number().with_hint(ValueHint::Currency),
        CustomFieldType::MultiSelect => PropertySchema::array_of(PropertySchema::string()),
        CustomFieldType::Url => PropertySchema::url(),
        CustomFieldType::String
        | CustomFieldType::Text
        | CustomFieldType::Dropdown
        | CustomFieldType::Connect
        | CustomFieldType::Other => PropertySchema::string(),
    }
}

impl CopperProvider {
    pub async fn schema_with_custom_fields(
        &self,
        kind: RecordKind,
    ) -> Result<ObjectSchema, CoreError> {
        let builder = SchemaBuilder::for_kind(kind)?;
        let definitions = self.client().custom_field_definitions().await?;
        Ok(builder.with_custom_fields(&definitions, kind).build())
    }
}

/// Static shape of an enriched record of `kind`.
pub fn base_schema(kind: RecordKind) -> Option<ObjectSchema> {
    match kind {
        RecordKind::Company => Some(company_schema()),
        RecordKind::Person => Some(person_schema()),
        RecordKind::Opportunity => Some(opportunity_schema()),
        RecordKind::Lead => Some(lead_schema()),
        RecordKind::Project => Some(project_schema()),
        RecordKind::ActivityType => Some(activity_type_schema()),
        RecordKind::Task | RecordKind::Activity => None,
    }
}

fn schema<const N: usize>(
    identity: &str,
    id_property: &str,
    display_property: &str,
    featured: &[&str],
    properties: [(&str, PropertySchema); N],
) -> ObjectSchema {
    ObjectSchema {
        identity: identity.to_owned(),
        id_property: id_property.to_owned(),
        display_property: display_property.to_owned(),
        featured_properties: featured.iter().map(|name| (*name).to_owned()).collect(),
        properties: properties
            .into_iter()
            .map(|(name, property)| (name.to_owned(), property))
            .collect(),
    }
}

fn user_property() -> PropertySchema {
    PropertySchema::object([
        ("name", PropertySchema::string()),
        ("email", PropertySchema::string().with_hint(ValueHint::Email)),
        ("copperUserId", PropertySchema::string()),
    ])
    .described("Assigned Copper user")
}

fn company_reference() -> PropertySchema {
    PropertySchema::object([
        ("companyId", PropertySchema::string().required()),
        ("companyName", PropertySchema::string()),
    ])
    .referencing(RecordKind::Company)
}

fn person_reference() -> PropertySchema {
    PropertySchema::object([
        ("personId", PropertySchema::string().required()),
        ("fullName", PropertySchema::string()),
    ])
    .referencing(RecordKind::Person)
}

fn opportunity_reference() -> PropertySchema {
    PropertySchema::object([
        ("opportunityId", PropertySchema::string().required()),
        ("opportunityName", PropertySchema::string()),
    ])
    .referencing(RecordKind::Opportunity)
}

fn tags_property() -> PropertySchema {
    PropertySchema::array_of(PropertySchema::string()).described("Tags")
}

fn phone_numbers_property() -> PropertySchema {
    PropertySchema::array_of(PropertySchema::object([
        ("number", PropertySchema::string()),
        ("category", PropertySchema::string()),
    ]))
    .from_key("phone_numbers")
}

fn websites_property() -> PropertySchema {
    PropertySchema::array_of(PropertySchema::object([
        ("url", PropertySchema::url()),
        ("category", PropertySchema::string()),
    ]))
}

fn address_part(part: &str) -> PropertySchema {
    PropertySchema::string().from_key(format!("address.{part}"))
}

fn company_schema() -> ObjectSchema {
    schema(
        "Company",
        "companyId",
        "companyName",
        &["fullAddress", "copperUrl", "websites"],
        [
            ("companyId", PropertySchema::string().required().from_key("id")),
            ("companyName", PropertySchema::string().required().from_key("name")),
            ("fullAddress", PropertySchema::string().described("Company address")),
            ("assignee", user_property()),
            ("assigneeId", PropertySchema::string().from_key("assignee_id")),
            ("tags", tags_property()),
            ("copperUrl", PropertySchema::url().from_key("url")),
            ("details", PropertySchema::string()),
            ("phoneNumbers", phone_numbers_property()),
            ("emailDomain", PropertySchema::string().from_key("email_domain")),
            ("interactionCount", PropertySchema::number().from_key("interaction_count")),
            ("websites", websites_property()),
            ("street", address_part("street")),
            ("city", address_part("city")),
            ("state", address_part("state")),
            ("postalCode", address_part("postal_code")),
            ("country", address_part("country")),
            ("contactTypeId", PropertySchema::string().from_key("contact_type_id")),
            ("dateCreated", PropertySchema::date().from_key("date_created")),
            ("dateModified", PropertySchema::date().from_key("date_modified")),
        ],
    )
}

fn person_schema() -> ObjectSchema {
    schema(
        "Person",
        "personId",
        "fullName",
        &["title", "company", "primaryEmail", "assignee", "copperUrl"],
        [
            ("personId", PropertySchema::string().required().from_key("id")),
            ("fullName", PropertySchema::string().required().from_key("name")),
            ("title", PropertySchema::string()),
            ("company", company_reference()),
            ("assignee", user_property()),
            ("copperUrl", PropertySchema::url().from_key("url")),
            ("tags", tags_property()),
            ("contactType", PropertySchema::string().described("Type of contact")),
            ("fullAddress", PropertySchema::string()),
            ("details", PropertySchema::string()),
            (
                "primaryEmail",
                PropertySchema::string().with_hint(ValueHint::Email),
            ),
            (
                "emails",
                PropertySchema::array_of(PropertySchema::object([
                    ("email", PropertySchema::string().with_hint(ValueHint::Email)),
                    ("category", PropertySchema::string()),
                ])),
            ),
            ("phoneNumbers", phone_numbers_property()),
            ("websites", websites_property()),
            ("firstName", PropertySchema::string().from_key("first_name")),
            ("lastName", PropertySchema::string().from_key("last_name")),
            ("street", address_part("street")),
            ("city", address_part("city")),
            ("state", address_part("state")),
            ("postalCode", address_part("postal_code")),
            ("country", address_part("country")),
            ("interactionCount", PropertySchema::number().from_key("interaction_count")),
            ("dateCreated", PropertySchema::date().from_key("date_created")),
            ("dateModified", PropertySchema::date().from_key("date_modified")),
        ],
    )
}

fn opportunity_schema() -> ObjectSchema {
    schema(
        "Opportunity",
        "opportunityId",
        "opportunityName",
        &["company", "primaryContact", "status", "monetaryValue", "copperUrl"],
        [
            ("opportunityId", PropertySchema::string().required().from_key("id")),
            ("opportunityName", PropertySchema::string().from_key("name")),
            ("primaryContact", person_reference()),
            ("company", company_reference()),
            ("status", PropertySchema::string()),
            ("assignee", user_property()),
            ("pipeline", PropertySchema::string()),
            ("pipelineStage", PropertySchema::string()),
            (
                "closeDate",
                PropertySchema::string()
                    .with_hint(ValueHint::Date)
                    .from_key("close_date"),
            ),
            (
                "monetaryValue",
                PropertySchema::number()
                    .with_hint(ValueHint::Currency)
                    .from_key("monetary_value"),
            ),
            ("copperUrl", PropertySchema::url().from_key("url")),
            ("priority", PropertySchema::string()),
            ("tags", tags_property()),
            ("customerSource", PropertySchema::string()),
            ("lossReason", PropertySchema::string()),
            ("details", PropertySchema::string()),
            ("interactionCount", PropertySchema::number().from_key("interaction_count")),
            ("winProbability", PropertySchema::number().from_key("win_probability")),
            (
                "dateLastContacted",
                PropertySchema::date().from_key("date_last_contacted"),
            ),
            ("dateCreated", PropertySchema::date().from_key("date_created")),
            ("dateModified", PropertySchema::date().from_key("date_modified")),
            ("primaryContactId", PropertySchema::string().from_key("primary_contact_id")),
            ("assigneeId", PropertySchema::string().from_key("assignee_id")),
            ("companyId", PropertySchema::string().from_key("company_id")),
            ("companyName", PropertySchema::string().from_key("company_name")),
        ],
    )
}

fn lead_schema() -> ObjectSchema {
    schema(
        "Lead",
        "id",
        "name",
        &["email", "phone", "status"],
        [
            ("id", PropertySchema::string().required()),
            ("name", PropertySchema::string().required()),
            ("email", PropertySchema::string().with_hint(ValueHint::Email)),
            ("phone", PropertySchema::string()),
            ("status", PropertySchema::string()),
            ("assignee", user_property()),
            ("contactType", PropertySchema::string()),
            ("customerSource", PropertySchema::string()),
            ("fullAddress", PropertySchema::string()),
            ("tags", tags_property()),
            ("copperUrl", PropertySchema::url().from_key("url")),
            ("date_created", PropertySchema::date()),
            ("date_modified", PropertySchema::date()),
        ],
    )
}

fn project_schema() -> ObjectSchema {
    schema(
        "Project",
        "id",
        "name",
        &["status", "assignee", "company", "opportunity"],
        [
            ("id", PropertySchema::string().required()),
            ("name", PropertySchema::string().required()),
            ("opportunity", opportunity_reference()),
            ("company", company_reference()),
            ("assignee", user_property()),
            ("assignee_id", PropertySchema::string()),
            (
                "status",
                PropertySchema::string().described("Open or Completed"),
            ),
            ("details", PropertySchema::string()),
            ("tags", tags_property()),
            ("copperUrl", PropertySchema::url().from_key("url")),
            ("date_created", PropertySchema::date()),
            ("date_modified", PropertySchema::date()),
        ],
    )
}

fn activity_type_schema() -> ObjectSchema {
    schema(
        "ActivityType",
        "id",
        "name",
        &[],
        [
            ("id", PropertySchema::number().required()),
            ("category", PropertySchema::string().required()),
            ("name", PropertySchema::string().required()),
            ("is_disabled", PropertySchema::boolean()),
            ("count_as_interaction", PropertySchema::boolean()),
        ],
    )
}
