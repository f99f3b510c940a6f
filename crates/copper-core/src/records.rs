use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::identifiers::CopperId;
use crate::kinds::RecordKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    /// Non-empty parts joined with `", "`.
    pub fn full(&self) -> Option<String> {
        let parts = [
            &self.street,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    pub custom_field_definition_id: CopperId,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedResource {
    pub id: CopperId,
    #[serde(rename = "type")]
    pub resource_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: CopperId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: CopperId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_type_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default)]
    pub emails: Vec<EmailAddress>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: CopperId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_type_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_source_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub id: CopperId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_contact_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_stage_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_reason_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_source_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: CopperId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<CopperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_resource: Option<RelatedResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTypeRecord {
    pub id: CopperId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_as_interaction: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A record as returned by the Copper API, typed by kind. Fields this crate
/// does not model stay in each variant's `extra` map.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Company(CompanyRecord),
    Person(PersonRecord),
    Opportunity(OpportunityRecord),
    Lead(LeadRecord),
    Project(ProjectRecord),
    ActivityType(ActivityTypeRecord),
}

impl RawRecord {
    pub fn from_value(kind: RecordKind, value: Value) -> Result<Self, CoreError> {
        let decoded = match kind {
            RecordKind::Company => serde_json::from_value(value).map(Self::Company),
            RecordKind::Person => serde_json::from_value(value).map(Self::Person),
            RecordKind::Opportunity => serde_json::from_value(value).map(Self::Opportunity),
            RecordKind::Lead => serde_json::from_value(value).map(Self::Lead),
            RecordKind::Project => serde_json::from_value(value).map(Self::Project),
            RecordKind::ActivityType => serde_json::from_value(value).map(Self::ActivityType),
            RecordKind::Task | RecordKind::Activity => {
                return Err(CoreError::Configuration(format!(
                    "{} records are not supported by this adapter.",
                    kind.label()
                )))
            }
        };
        decoded.map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "failed to decode Copper {} payload: {error}",
                kind.as_key()
            ))
        })
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Company(_) => RecordKind::Company,
            Self::Person(_) => RecordKind::Person,
            Self::Opportunity(_) => RecordKind::Opportunity,
            Self::Lead(_) => RecordKind::Lead,
            Self::Project(_) => RecordKind::Project,
            Self::ActivityType(_) => RecordKind::ActivityType,
        }
    }

    pub fn id(&self) -> &CopperId {
        match self {
            Self::Company(record) => &record.id,
            Self::Person(record) => &record.id,
            Self::Opportunity(record) => &record.id,
            Self::Lead(record) => &record.id,
            Self::Project(record) => &record.id,
            Self::ActivityType(record) => &record.id,
        }
    }

    pub fn assignee_id(&self) -> Option<&CopperId> {
        match self {
            Self::Company(record) => record.assignee_id.as_ref(),
            Self::Person(record) => record.assignee_id.as_ref(),
            Self::Opportunity(record) => record.assignee_id.as_ref(),
            Self::Lead(record) => record.assignee_id.as_ref(),
            Self::Project(record) => record.assignee_id.as_ref(),
            Self::ActivityType(_) => None,
        }
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::Company(record) => record.address.as_ref(),
            Self::Person(record) => record.address.as_ref(),
            Self::Lead(record) => record.address.as_ref(),
            _ => None,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Self::Company(record) => &record.tags,
            Self::Person(record) => &record.tags,
            Self::Opportunity(record) => &record.tags,
            Self::Lead(record) => &record.tags,
            Self::Project(record) => &record.tags,
            Self::ActivityType(_) => &[],
        }
    }

    pub fn custom_fields(&self) -> &[CustomFieldValue] {
        match self {
            Self::Company(record) => &record.custom_fields,
            Self::Person(record) => &record.custom_fields,
            Self::Opportunity(record) => &record.custom_fields,
            Self::Lead(record) => &record.custom_fields,
            Self::Project(record) => &record.custom_fields,
            Self::ActivityType(_) => &[],
        }
    }

    /// Flattened view of every upstream field, known or not.
    pub fn to_fields(&self) -> Result<Map<String, Value>, CoreError> {
        let value = match self {
            Self::Company(record) => serde_json::to_value(record),
            Self::Person(record) => serde_json::to_value(record),
            Self::Opportunity(record) => serde_json::to_value(record),
            Self::Lead(record) => serde_json::to_value(record),
            Self::Project(record) => serde_json::to_value(record),
            Self::ActivityType(record) => serde_json::to_value(record),
        }
        .map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "failed to flatten Copper {} record: {error}",
                self.kind().as_key()
            ))
        })?;

        match value {
            Value::Object(fields) => Ok(fields),
            other => Err(CoreError::DependencyUnavailable(format!(
                "Copper {} record flattened to a non-object value: {other}",
                self.kind().as_key()
            ))),
        }
    }
}
