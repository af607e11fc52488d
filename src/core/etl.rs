use crate::core::Pipeline;
use crate::domain::outcome::ManifestSummary;
use crate::utils::error::{MigrateError, Result};
use std::time::Instant;

/// What one finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub archive_path: String,
    pub summary: ManifestSummary,
}

impl MigrationReport {
    pub fn ensure_no_rejections(&self) -> Result<()> {
        if self.summary.rejected == 0 {
            return Ok(());
        }
        Err(MigrateError::ValidationError {
            message: format!(
                "{} of {} records were rejected",
                self.summary.rejected, self.summary.total
            ),
        })
    }
}

pub struct MigrationEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> MigrationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<MigrationReport> {
        let started = Instant::now();
        tracing::info!("Starting migration run");

        tracing::info!("Extracting records...");
        let entries = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", entries.len());

        tracing::info!("Resolving and validating records...");
        let batch = self.pipeline.transform(entries).await?;
        let summary = batch.manifest.summary();
        tracing::info!(
            migrated = summary.migrated,
            pending = summary.pending_mapping,
            rejected = summary.rejected,
            "Reconciled {} records",
            summary.total
        );

        tracing::info!("Writing archive...");
        let archive_path = self.pipeline.load(batch).await?;
        tracing::info!(
            "Archive saved to {} in {:.2?}",
            archive_path,
            started.elapsed()
        );

        Ok(MigrationReport {
            archive_path,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ExportEntry, Record};
    use crate::domain::outcome::{Manifest, ManifestEntry, RecordOutcome};
    use crate::domain::ports::MigrationBatch;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        phases: AtomicUsize,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<Vec<ExportEntry>> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ExportEntry::Record(Record::new(
                "https://hdl.handle.net/1/1",
                "a/1",
                "a",
                "Title",
                vec![],
                "nob",
            ))])
        }

        async fn transform(&self, entries: Vec<ExportEntry>) -> Result<MigrationBatch> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            let records: Vec<Record> = entries
                .into_iter()
                .filter_map(|entry| match entry {
                    ExportEntry::Record(record) => Some(record),
                    ExportEntry::Unreadable(_) => None,
                })
                .collect();
            let mut manifest = Manifest::default();
            for record in &records {
                manifest.push(ManifestEntry {
                    record_id: record.display_id().to_string(),
                    origin: record.origin.clone(),
                    outcome: RecordOutcome::PendingMapping,
                    issues: vec![],
                });
            }
            Ok(MigrationBatch {
                migrated: vec![],
                pending: records,
                manifest,
            })
        }

        async fn load(&self, batch: MigrationBatch) -> Result<String> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            Ok(format!("out/{}.zip", batch.pending.len()))
        }
    }

    #[tokio::test]
    async fn test_run_drives_all_phases_and_reports_summary() {
        let engine = MigrationEngine::new(CountingPipeline {
            phases: AtomicUsize::new(0),
        });

        let report = engine.run().await.unwrap();

        assert_eq!(report.archive_path, "out/1.zip");
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.pending_mapping, 1);
        assert_eq!(engine.pipeline.phases.load(Ordering::SeqCst), 3);
        assert!(report.ensure_no_rejections().is_ok());
    }

    #[test]
    fn test_rejections_surface_as_validation_error() {
        let report = MigrationReport {
            archive_path: "out/x.zip".to_string(),
            summary: ManifestSummary {
                total: 4,
                migrated: 3,
                pending_mapping: 0,
                rejected: 1,
            },
        };
        let err = report.ensure_no_rejections().unwrap_err();
        assert!(matches!(err, MigrateError::ValidationError { .. }));
        assert_eq!(err.severity(), crate::utils::error::ErrorSeverity::Medium);
    }
}
