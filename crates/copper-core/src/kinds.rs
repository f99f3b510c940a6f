use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Company,
    Person,
    Opportunity,
    Lead,
    Project,
    ActivityType,
    Task,
    Activity,
}

impl RecordKind {
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Company,
        RecordKind::Person,
        RecordKind::Opportunity,
        RecordKind::Lead,
        RecordKind::Project,
        RecordKind::ActivityType,
        RecordKind::Task,
        RecordKind::Activity,
    ];

    /// Key used by Copper in `available_on` lists and in web URLs.
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Person => "person",
            Self::Opportunity => "opportunity",
            Self::Lead => "lead",
            Self::Project => "project",
            Self::ActivityType => "activity_type",
            Self::Task => "task",
            Self::Activity => "activity",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "company" => Some(Self::Company),
            "person" => Some(Self::Person),
            "opportunity" => Some(Self::Opportunity),
            "lead" => Some(Self::Lead),
            "project" => Some(Self::Project),
            "activitytype" => Some(Self::ActivityType),
            "task" => Some(Self::Task),
            "activity" => Some(Self::Activity),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Company => "Company",
            Self::Person => "Person",
            Self::Opportunity => "Opportunity",
            Self::Lead => "Lead",
            Self::Project => "Project",
            Self::ActivityType => "Activity type",
            Self::Task => "Task",
            Self::Activity => "Activity",
        }
    }

    /// REST collection segment, e.g. `people` for `people/{id}`.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Company => "companies",
            Self::Person => "people",
            Self::Opportunity => "opportunities",
            Self::Lead => "leads",
            Self::Project => "projects",
            Self::ActivityType => "activity_types",
            Self::Task => "tasks",
            Self::Activity => "activities",
        }
    }

    /// Endpoint for a single record. Activity types have no per-record endpoint.
    pub fn record_path(self, id: &str) -> Option<String> {
        match self {
            Self::ActivityType => None,
            _ => Some(format!("{}/{id}", self.collection())),
        }
    }

    /// Sort field and optional direction used when paging through a kind.
    pub const fn default_sort(self) -> (&'static str, Option<&'static str>) {
        match self {
            Self::Opportunity => ("date_created", Some("desc")),
            _ => ("name", None),
        }
    }

    pub const fn has_web_page(self) -> bool {
        !matches!(self, Self::ActivityType)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_key())
    }
}
