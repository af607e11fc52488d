use crate::core::resolver::Resolver;
use crate::core::validator::{RecordValidator, ValidatedRecord};
use crate::domain::model::Record;
use crate::domain::outcome::{Issue, IssueKind, ManifestEntry, RecordOutcome};
use std::collections::HashSet;

/// Where one record ended up after mapping and validation.
#[derive(Debug, Clone)]
pub enum Disposition {
    Migrated(ValidatedRecord),
    Pending(Record),
    Rejected(Record),
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub disposition: Disposition,
    pub issues: Vec<Issue>,
}

impl Reconciliation {
    pub fn outcome(&self) -> RecordOutcome {
        match self.disposition {
            Disposition::Migrated(_) => RecordOutcome::Migrated,
            Disposition::Pending(_) => RecordOutcome::PendingMapping,
            Disposition::Rejected(_) => RecordOutcome::Rejected,
        }
    }

    pub fn record(&self) -> &Record {
        match &self.disposition {
            Disposition::Migrated(validated) => validated.record(),
            Disposition::Pending(record) | Disposition::Rejected(record) => record,
        }
    }

    pub fn manifest_entry(&self) -> ManifestEntry {
        let record = self.record();
        ManifestEntry {
            record_id: record.display_id().to_string(),
            origin: record.origin.clone(),
            outcome: self.outcome(),
            issues: self.issues.clone(),
        }
    }
}

/// Runs one record through the resolver and then the validator.
#[derive(Debug, Clone)]
pub struct Reconciler {
    resolver: Resolver,
    validator: RecordValidator,
}

impl Reconciler {
    pub fn new(resolver: Resolver, validator: RecordValidator) -> Self {
        Self {
            resolver,
            validator,
        }
    }

    pub fn reconcile(&self, record: Record) -> Reconciliation {
        let resolution = self.resolver.resolve_record(record);
        let report = self.validator.validate(&resolution.record);
        let issues = merge_issues(resolution.issues, report.issues);

        let disposition = match RecordOutcome::classify(&issues) {
            RecordOutcome::Rejected => Disposition::Rejected(resolution.record),
            RecordOutcome::PendingMapping => Disposition::Pending(resolution.record),
            RecordOutcome::Migrated => match self.validator.certify(resolution.record) {
                Ok(validated) => Disposition::Migrated(validated),
                Err(uncertified) => Disposition::Rejected(uncertified.record),
            },
        };

        Reconciliation {
            disposition,
            issues,
        }
    }
}

/// Resolver findings first. A validator gap on a path the resolver already
/// reported adds nothing and is dropped.
fn merge_issues(resolved: Vec<Issue>, validated: Vec<Issue>) -> Vec<Issue> {
    let known_gaps: HashSet<String> = resolved
        .iter()
        .filter(|issue| issue.kind == IssueKind::MappingGap)
        .map(|issue| issue.path.clone())
        .collect();

    let mut issues = resolved;
    issues.extend(
        validated
            .into_iter()
            .filter(|issue| !(issue.kind == IssueKind::MappingGap && known_gaps.contains(&issue.path))),
    );
    issues
}
