use crate::utils::error::{MigrateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// No target value exists yet for an origin value. The record stays pending.
    MappingGap,
    /// Required field missing or malformed, or a uniqueness rule broken. The record is rejected.
    StructuralViolation,
    /// Value mapped with loss of precision. Kept for audit only.
    FormatDegradation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    MissingValue,
    EmptyValue,
    MalformedValue,
    DuplicateIdentifier,
    DuplicateRecord,
    EmptyBundle,
    MissingVenue,
    Unmapped,
    ExplicitlyUnmapped,
    UnclassifiedBundle,
    YearOnlyDate,
    YearMonthDate,
    PeriodCollapsed,
    UncertainDate,
    TimestampTruncated,
    PartialTypeMatch,
    InvalidIssn,
    InvalidIsbn,
    VolumeNotNumber,
    PageNumberFormat,
    NoContributors,
    UnreadableRecord,
    ProcessingFailed,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::MissingValue => "MISSING_VALUE",
            ReasonCode::EmptyValue => "EMPTY_VALUE",
            ReasonCode::MalformedValue => "MALFORMED_VALUE",
            ReasonCode::DuplicateIdentifier => "DUPLICATE_IDENTIFIER",
            ReasonCode::DuplicateRecord => "DUPLICATE_RECORD",
            ReasonCode::EmptyBundle => "EMPTY_BUNDLE",
            ReasonCode::MissingVenue => "MISSING_VENUE",
            ReasonCode::Unmapped => "UNMAPPED",
            ReasonCode::ExplicitlyUnmapped => "EXPLICITLY_UNMAPPED",
            ReasonCode::UnclassifiedBundle => "UNCLASSIFIED_BUNDLE",
            ReasonCode::YearOnlyDate => "YEAR_ONLY_DATE",
            ReasonCode::YearMonthDate => "YEAR_MONTH_DATE",
            ReasonCode::PeriodCollapsed => "PERIOD_COLLAPSED",
            ReasonCode::UncertainDate => "UNCERTAIN_DATE",
            ReasonCode::TimestampTruncated => "TIMESTAMP_TRUNCATED",
            ReasonCode::PartialTypeMatch => "PARTIAL_TYPE_MATCH",
            ReasonCode::InvalidIssn => "INVALID_ISSN",
            ReasonCode::InvalidIsbn => "INVALID_ISBN",
            ReasonCode::VolumeNotNumber => "VOLUME_NOT_NUMBER",
            ReasonCode::PageNumberFormat => "PAGE_NUMBER_FORMAT_NOT_RECOGNIZED",
            ReasonCode::NoContributors => "NO_CONTRIBUTORS",
            ReasonCode::UnreadableRecord => "UNREADABLE_RECORD",
            ReasonCode::ProcessingFailed => "PROCESSING_FAILED",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding about one field of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Dotted field path, e.g. `entityDescription.contributors[1].role`.
    pub path: String,
    pub reason: ReasonCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Issue {
    pub fn gap(path: impl Into<String>, reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::MappingGap,
            path: path.into(),
            reason,
            detail: Some(detail.into()),
        }
    }

    pub fn violation(path: impl Into<String>, reason: ReasonCode) -> Self {
        Self {
            kind: IssueKind::StructuralViolation,
            path: path.into(),
            reason,
            detail: None,
        }
    }

    pub fn degradation(
        path: impl Into<String>,
        reason: ReasonCode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: IssueKind::FormatDegradation,
            path: path.into(),
            reason,
            detail: Some(detail.into()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.kind, self.path, self.reason)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordOutcome {
    Migrated,
    PendingMapping,
    Rejected,
}

impl RecordOutcome {
    /// Any structural violation rejects; otherwise any gap keeps the record pending.
    pub fn classify(issues: &[Issue]) -> Self {
        if issues
            .iter()
            .any(|issue| issue.kind == IssueKind::StructuralViolation)
        {
            RecordOutcome::Rejected
        } else if issues.iter().any(|issue| issue.kind == IssueKind::MappingGap) {
            RecordOutcome::PendingMapping
        } else {
            RecordOutcome::Migrated
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordOutcome::Migrated => "migrated",
            RecordOutcome::PendingMapping => "pending-mapping",
            RecordOutcome::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub record_id: String,
    pub origin: String,
    pub outcome: RecordOutcome,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSummary {
    pub total: usize,
    pub migrated: usize,
    pub pending_mapping: usize,
    pub rejected: usize,
}

/// Per-record outcomes of one migration run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn summary(&self) -> ManifestSummary {
        let mut summary = ManifestSummary {
            total: self.entries.len(),
            ..ManifestSummary::default()
        };
        for entry in &self.entries {
            match entry.outcome {
                RecordOutcome::Migrated => summary.migrated += 1,
                RecordOutcome::PendingMapping => summary.pending_mapping += 1,
                RecordOutcome::Rejected => summary.rejected += 1,
            }
        }
        summary
    }

    /// One CSV row per issue; records without issues get one row with blank issue columns.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["record_id", "origin", "outcome", "kind", "path", "reason", "detail"])?;
        for entry in &self.entries {
            if entry.issues.is_empty() {
                writer.write_record([
                    entry.record_id.as_str(),
                    entry.origin.as_str(),
                    entry.outcome.as_str(),
                    "",
                    "",
                    "",
                    "",
                ])?;
                continue;
            }
            for issue in &entry.issues {
                let kind = format!("{:?}", issue.kind);
                writer.write_record([
                    entry.record_id.as_str(),
                    entry.origin.as_str(),
                    entry.outcome.as_str(),
                    kind.as_str(),
                    issue.path.as_str(),
                    issue.reason.as_str(),
                    issue.detail.as_deref().unwrap_or(""),
                ])?;
            }
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| MigrateError::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| MigrateError::ProcessingError {
            message: format!("manifest is not valid UTF-8: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violations_outrank_gaps() {
        let issues = vec![
            Issue::gap("type.nva", ReasonCode::Unmapped, "Poem"),
            Issue::violation("entityDescription.mainTitle", ReasonCode::EmptyValue),
        ];
        assert_eq!(RecordOutcome::classify(&issues), RecordOutcome::Rejected);
        assert_eq!(
            RecordOutcome::classify(&issues[..1]),
            RecordOutcome::PendingMapping
        );
    }

    #[test]
    fn test_degradations_alone_still_migrate() {
        let issues = vec![Issue::degradation("date.nva", ReasonCode::YearOnlyDate, "2004")];
        assert_eq!(RecordOutcome::classify(&issues), RecordOutcome::Migrated);
        assert_eq!(RecordOutcome::classify(&[]), RecordOutcome::Migrated);
    }

    #[test]
    fn test_manifest_csv_has_one_row_per_issue() {
        let mut manifest = Manifest::default();
        manifest.push(ManifestEntry {
            record_id: "https://hdl.handle.net/1/1".to_string(),
            origin: "a/1".to_string(),
            outcome: RecordOutcome::Migrated,
            issues: vec![],
        });
        manifest.push(ManifestEntry {
            record_id: "https://hdl.handle.net/1/2".to_string(),
            origin: "a/2".to_string(),
            outcome: RecordOutcome::Rejected,
            issues: vec![
                Issue::violation("id", ReasonCode::MalformedValue),
                Issue::gap("language.nva", ReasonCode::Unmapped, "klingon"),
            ],
        });

        let csv = manifest.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "record_id,origin,outcome,kind,path,reason,detail");
        assert_eq!(lines[1], "https://hdl.handle.net/1/1,a/1,migrated,,,,");
        assert!(lines[3].ends_with("MappingGap,language.nva,UNMAPPED,klingon"));

        let summary = manifest.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.migrated, 1);
        assert_eq!(summary.rejected, 1);
    }
}
