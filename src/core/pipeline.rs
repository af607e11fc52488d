use crate::core::codec;
use crate::core::reconcile::{Disposition, Reconciler, Reconciliation};
use crate::core::resolver::Resolver;
use crate::core::validator::RecordValidator;
use crate::core::vocabulary::Vocabularies;
use crate::core::{ConfigProvider, MigrationBatch, Pipeline, Record, Storage};
use crate::domain::model::ExportEntry;
use crate::domain::outcome::{Issue, Manifest, ManifestEntry, ReasonCode, RecordOutcome};
use crate::utils::error::{MigrateError, Result};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use zip::write::{FileOptions, ZipWriter};

pub const RECORDS_ENTRY: &str = "records.json";
pub const PENDING_ENTRY: &str = "pending.json";
pub const MANIFEST_JSON_ENTRY: &str = "manifest.json";
pub const MANIFEST_CSV_ENTRY: &str = "manifest.csv";

pub struct MigrationPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    reconciler: Arc<Reconciler>,
}

impl<S: Storage, C: ConfigProvider> MigrationPipeline<S, C> {
    /// `vocabularies` must be complete: it is frozen for the whole batch.
    pub fn new(storage: S, config: C, vocabularies: Arc<Vocabularies>) -> Self {
        let validator = RecordValidator::new(config.validation_policy());
        let reconciler = Reconciler::new(Resolver::new(vocabularies), validator);
        Self {
            storage,
            config,
            reconciler: Arc::new(reconciler),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    async fn transform_with<F>(
        &self,
        entries: Vec<ExportEntry>,
        reconcile: Arc<F>,
    ) -> Result<MigrationBatch>
    where
        F: Fn(Record) -> Reconciliation + Send + Sync + 'static,
    {
        let total = entries.len();
        let duplicates = duplicate_positions(&entries);
        let concurrency = self.config.concurrency().max(1);
        let mut slots: Vec<Option<Settled>> = (0..total).map(|_| None).collect();
        let mut queued = Vec::with_capacity(total);

        tracing::debug!(
            "Reconciling {} records with up to {} concurrent tasks",
            total,
            concurrency
        );

        for (index, entry) in entries.into_iter().enumerate() {
            match entry {
                ExportEntry::Unreadable(unreadable) => {
                    slots[index] = Some(Settled::Failed(unreadable.manifest_entry()));
                }
                ExportEntry::Record(record) if duplicates.contains(&index) => {
                    tracing::warn!("Duplicate record {} rejected", record.display_id());
                    slots[index] = Some(Settled::Reconciled(rejected_duplicate(record)));
                }
                ExportEntry::Record(record) => queued.push((index, record)),
            }
        }

        reconcile_concurrently(queued, concurrency, reconcile, &mut slots).await?;

        let mut batch = MigrationBatch {
            migrated: Vec::new(),
            pending: Vec::new(),
            manifest: Manifest::default(),
        };
        for settled in slots.into_iter().flatten() {
            let reconciliation = match settled {
                Settled::Failed(entry) => {
                    batch.manifest.push(entry);
                    continue;
                }
                Settled::Reconciled(reconciliation) => reconciliation,
            };
            batch.manifest.push(reconciliation.manifest_entry());
            match reconciliation.disposition {
                Disposition::Migrated(validated) => batch.migrated.push(validated),
                Disposition::Pending(record) => batch.pending.push(record),
                Disposition::Rejected(record) => {
                    tracing::debug!("Record {} rejected", record.display_id());
                }
            }
        }

        let summary = batch.manifest.summary();
        tracing::debug!(
            "Transform done: {} migrated, {} pending, {} rejected",
            summary.migrated,
            summary.pending_mapping,
            summary.rejected
        );
        Ok(batch)
    }
}

/// Second and later occurrences of a record id in one batch.
fn duplicate_positions(entries: &[ExportEntry]) -> HashSet<usize> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            ExportEntry::Record(record) => match record.id.as_deref() {
                Some(id) if !id.is_empty() && !seen.insert(id) => Some(index),
                _ => None,
            },
            ExportEntry::Unreadable(_) => None,
        })
        .collect()
}

fn rejected_duplicate(record: Record) -> Reconciliation {
    let id = record.display_id().to_string();
    Reconciliation {
        disposition: Disposition::Rejected(record),
        issues: vec![Issue::violation("id", ReasonCode::DuplicateRecord).with_detail(id)],
    }
}

/// Final state of one input position.
enum Settled {
    Reconciled(Reconciliation),
    /// Rejected without a record to carry along.
    Failed(ManifestEntry),
}

fn failed_task(record_id: String, origin: String, error: &JoinError) -> ManifestEntry {
    ManifestEntry {
        record_id,
        origin,
        outcome: RecordOutcome::Rejected,
        issues: vec![Issue::violation("record", ReasonCode::ProcessingFailed)
            .with_detail(error.to_string())],
    }
}

/// Runs `reconcile` for every queued record with at most `concurrency` tasks in
/// flight. A task that panics settles its own position as rejected.
async fn reconcile_concurrently<F>(
    queued: Vec<(usize, Record)>,
    concurrency: usize,
    reconcile: Arc<F>,
    slots: &mut [Option<Settled>],
) -> Result<()>
where
    F: Fn(Record) -> Reconciliation + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut owners: HashMap<task::Id, (usize, String, String)> = HashMap::new();

    for (index, record) in queued {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| MigrateError::ProcessingError {
                message: format!("worker pool closed: {}", e),
            })?;
        let owner = (index, record.display_id().to_string(), record.origin.clone());
        let reconcile = Arc::clone(&reconcile);
        let handle = tasks.spawn(async move {
            let _permit = permit;
            (*reconcile)(record)
        });
        owners.insert(handle.id(), owner);
    }

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, reconciliation)) => {
                if let Some((index, _, _)) = owners.remove(&id) {
                    slots[index] = Some(Settled::Reconciled(reconciliation));
                }
            }
            Err(e) => {
                let Some((index, record_id, origin)) = owners.remove(&e.id()) else {
                    continue;
                };
                tracing::error!("Record {} failed: {}", record_id, e);
                slots[index] = Some(Settled::Failed(failed_task(record_id, origin, &e)));
            }
        }
    }

    Ok(())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MigrationPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<ExportEntry>> {
        let input = self.config.input_file();
        tracing::debug!("Reading records from {}", input);

        let bytes = self.storage.read_file(input).await?;
        let entries = codec::read_export(&bytes)?;

        tracing::debug!("Parsed {} export entries from {}", entries.len(), input);
        Ok(entries)
    }

    async fn transform(&self, entries: Vec<ExportEntry>) -> Result<MigrationBatch> {
        let reconciler = Arc::clone(&self.reconciler);
        let reconcile = move |record: Record| reconciler.reconcile(record);
        self.transform_with(entries, Arc::new(reconcile)).await
    }

    async fn load(&self, batch: MigrationBatch) -> Result<String> {
        let archive_name = self.config.archive_name();
        let output_path = format!("{}/{}", self.config.output_path(), archive_name);

        tracing::debug!(
            "Creating ZIP archive with {} migrated and {} pending records",
            batch.migrated.len(),
            batch.pending.len()
        );

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>(RECORDS_ENTRY, FileOptions::default())?;
            zip.write_all(codec::batch_to_json(&batch.migrated)?.as_bytes())?;

            zip.start_file::<_, ()>(MANIFEST_JSON_ENTRY, FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&batch.manifest)?.as_bytes())?;

            zip.start_file::<_, ()>(MANIFEST_CSV_ENTRY, FileOptions::default())?;
            zip.write_all(batch.manifest.to_csv()?.as_bytes())?;

            if !batch.pending.is_empty() {
                zip.start_file::<_, ()>(PENDING_ENTRY, FileOptions::default())?;
                zip.write_all(codec::batch_to_json(&batch.pending)?.as_bytes())?;
            }

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP archive ({} bytes) to storage", zip_data.len());
        self.storage.write_file(archive_name, &zip_data).await?;

        Ok(output_path)
    }
}
