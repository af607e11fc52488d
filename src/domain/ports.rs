use crate::domain::model::{ExportEntry, Record};
use crate::domain::outcome::Manifest;
use crate::core::validator::{ValidatedRecord, ValidationPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// Records JSON file, relative to the storage root.
    fn input_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn lookup_files(&self) -> &[String];
    fn concurrency(&self) -> usize;
    fn archive_name(&self) -> &str;
    fn validation_policy(&self) -> ValidationPolicy;
}

/// Everything the transform phase produced for one batch.
#[derive(Debug, Clone)]
pub struct MigrationBatch {
    pub migrated: Vec<ValidatedRecord>,
    /// Resolved as far as the tables allow, kept for a re-run after remediation.
    pub pending: Vec<Record>,
    pub manifest: Manifest,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ExportEntry>>;
    async fn transform(&self, entries: Vec<ExportEntry>) -> Result<MigrationBatch>;
    async fn load(&self, batch: MigrationBatch) -> Result<String>;
}
