pub mod enriched;
pub mod error;
pub mod identifiers;
pub mod kinds;
pub mod lookups;
pub mod pagination;
pub mod records;
pub mod text;

pub use enriched::EnrichedRecord;
pub use error::CoreError;
pub use identifiers::{check_kind, resolve_identifier, CopperId, IdentifierReference, ParsedKind};
pub use kinds::RecordKind;
pub use lookups::{
    definitions_for, find_by_id, ContactType, CopperAccount, CopperUser, CustomFieldDefinition,
    CustomFieldOption, CustomFieldType, CustomerSource, Identified, LossReason, NamedLookup,
    Pipeline, PipelineStage,
};
pub use pagination::{Continuation, SyncPage, PAGE_SIZE};
pub use records::{
    ActivityTypeRecord, Address, CompanyRecord, CustomFieldValue, EmailAddress, LeadRecord,
    OpportunityRecord, PersonRecord, PhoneNumber, ProjectRecord, RawRecord, RelatedResource,
};
