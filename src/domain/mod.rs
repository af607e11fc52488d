// Domain layer: the migration record, its outcomes and the ports the pipeline talks through.

pub mod dual;
pub mod model;
pub mod outcome;
pub mod ports;

pub use dual::{Date, DualValue, Language, License, Type};
pub use model::{
    AgentType, BundleType, ContentFile, Contributor, EntityDescription, ExportEntry, Identity,
    Publication, PublicationInstance, Record, ResourceContent, UnreadableRecord,
};
pub use outcome::{Issue, IssueKind, Manifest, ManifestEntry, ManifestSummary, ReasonCode, RecordOutcome};
