pub mod codec;
pub mod date;
pub mod etl;
pub mod pipeline;
pub mod reconcile;
pub mod resolver;
pub mod validator;
pub mod vocabulary;

pub use crate::domain::model::Record;
pub use crate::domain::ports::{ConfigProvider, MigrationBatch, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use resolver::{MappingGap, Resolver};
pub use validator::{RecordValidator, UnknownTypePolicy, ValidatedRecord, ValidationPolicy};
pub use vocabulary::{FieldKind, Mapping, Vocabularies};
