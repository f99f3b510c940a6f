use serde::{Deserialize, Serialize};

use crate::identifiers::CopperId;
use crate::kinds::RecordKind;

/// Reference data entries that can be matched by id.
pub trait Identified {
    fn id(&self) -> &CopperId;
}

pub fn find_by_id<'a, T: Identified>(items: &'a [T], id: &CopperId) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopperAccount {
    pub id: CopperId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopperUser {
    pub id: CopperId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub id: CopperId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: CopperId,
    pub name: String,
    #[serde(default)]
    pub stages: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn stage(&self, id: &CopperId) -> Option<&PipelineStage> {
        self.stages.iter().find(|stage| &stage.id == id)
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|stage| stage.name.clone()).collect()
    }
}

/// Shape shared by customer sources, loss reasons, contact types and the
/// company/opportunity name indexes used for project references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLookup {
    pub id: CopperId,
    #[serde(default)]
    pub name: Option<String>,
}

pub type CustomerSource = NamedLookup;
pub type LossReason = NamedLookup;
pub type ContactType = NamedLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomFieldType {
    String,
    Text,
    Dropdown,
    Date,
    Checkbox,
    Float,
    Url,
    Percentage,
    Currency,
    MultiSelect,
    Connect,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldOption {
    pub id: CopperId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    pub id: CopperId,
    pub name: String,
    #[serde(alias = "type")]
    pub data_type: CustomFieldType,
    #[serde(default)]
    pub available_on: Vec<String>,
    #[serde(default)]
    pub options: Vec<CustomFieldOption>,
}

impl CustomFieldDefinition {
    pub fn applies_to(&self, kind: RecordKind) -> bool {
        self.available_on
            .iter()
            .any(|entry| RecordKind::from_key(entry) == Some(kind))
    }

    pub fn option_names(&self) -> Vec<String> {
        self.options.iter().map(|option| option.name.clone()).collect()
    }
}

/// Definitions applicable to `kind`, in upstream order.
pub fn definitions_for(
    definitions: &[CustomFieldDefinition],
    kind: RecordKind,
) -> Vec<CustomFieldDefinition> {
    definitions
        .iter()
        .filter(|definition| definition.applies_to(kind))
        .cloned()
        .collect()
}

macro_rules! identified {
    ($($name:ty),+ $(,)?) => {
        $(
            impl Identified for $name {
                fn id(&self) -> &CopperId {
                    &self.id
                }
            }
        )+
    };
}

identified!(
    CopperUser,
    Pipeline,
    PipelineStage,
    NamedLookup,
    CustomFieldDefinition,
    CustomFieldOption,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn custom_field_definitions_decode_upstream_shape() {
        let definition: CustomFieldDefinition = serde_json::from_value(json!({
            "id": 101,
            "name": "Renewal Date",
            "data_type": "Date",
            "available_on": ["opportunity", "company"]
        }))
        .expect("decode definition");

        assert_eq!(definition.data_type, CustomFieldType::Date);
        assert!(definition.applies_to(RecordKind::Company));
        assert!(!definition.applies_to(RecordKind::Person));
        assert!(definition.options.is_empty());
    }

    #[test]
    fn unknown_custom_field_types_decode_as_other() {
        let definition: CustomFieldDefinition = serde_json::from_value(json!({
            "id": 5,
            "name": "Mystery",
            "data_type": "Hologram",
            "available_on": []
        }))
        .expect("decode definition");
        assert_eq!(definition.data_type, CustomFieldType::Other);
    }

    #[test]
    fn pipeline_stage_lookup_is_scoped_to_pipeline() {
        let pipeline: Pipeline = serde_json::from_value(json!({
            "id": 1,
            "name": "Sales",
            "stages": [{ "id": 10, "name": "Qualified" }, { "id": 11, "name": "Won" }]
        }))
        .expect("decode pipeline");

        assert_eq!(
            pipeline.stage(&CopperId::from("11")).map(|stage| stage.name.as_str()),
            Some("Won")
        );
        assert!(pipeline.stage(&CopperId::from("12")).is_none());
        assert_eq!(pipeline.stage_names(), vec!["Qualified", "Won"]);
    }
}
