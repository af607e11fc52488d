use crate::core::date::is_target_date;
use crate::domain::model::Record;
use crate::domain::outcome::{Issue, IssueKind, ReasonCode, RecordOutcome};
use crate::utils::validation::{is_valid_isbn, is_valid_issn, parse_http_url};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

static PAGE_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static PAGE_RANGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[-–|]+\d+$").unwrap());
static PAGES_SUFFIXED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+ s$").unwrap());
static SINGLE_PAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^s \d+$").unwrap());

/// Page counts (`212`), ranges (`12-25`, `12 – 25`), `212 s` and `s 14`.
/// Dots and square brackets are ignored.
pub fn is_recognized_page_number(raw: &str) -> bool {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '.' | '[' | ']'))
        .collect();
    let stripped = stripped.trim();
    let compact: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();

    PAGE_RANGE.is_match(&compact)
        || PAGE_COUNT.is_match(stripped)
        || PAGES_SUFFIXED.is_match(stripped)
        || SINGLE_PAGE.is_match(stripped)
}

/// What to do with a content file whose bundle label could not be classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum UnknownTypePolicy {
    Reject,
    #[default]
    Hold,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub unknown_type: UnknownTypePolicy,
    /// Target types that need a publisher or journal.
    pub published_work_types: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            unknown_type: UnknownTypePolicy::default(),
            published_work_types: vec![
                "JournalArticle".to_string(),
                "Vitenskapelig artikkel".to_string(),
                "Vitenskapelig monografi".to_string(),
                "Vitenskapelig kapittel".to_string(),
            ],
        }
    }
}

/// Ordered findings of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.outcome() == RecordOutcome::Migrated
    }

    pub fn outcome(&self) -> RecordOutcome {
        RecordOutcome::classify(&self.issues)
    }

    pub fn violations(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::StructuralViolation)
    }

    pub fn gaps(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::MappingGap)
    }

    /// Whether any issue of `kind` names `path`.
    pub fn names(&self, kind: IssueKind, path: &str) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.kind == kind && issue.path == path)
    }
}

/// A record handed back by [`RecordValidator::certify`] together with the reasons it was refused.
#[derive(Debug, Clone)]
pub struct Uncertified {
    pub record: Record,
    pub report: ValidationReport,
}

/// A record that passed validation. Read-only from here on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedRecord(Record);

impl ValidatedRecord {
    pub fn record(&self) -> &Record {
        &self.0
    }

    pub fn into_inner(self) -> Record {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    policy: ValidationPolicy,
}

impl RecordValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Freezes the record when every check passes.
    pub fn certify(&self, record: Record) -> Result<ValidatedRecord, Uncertified> {
        let report = self.validate(&record);
        if report.is_valid() {
            Ok(ValidatedRecord(record))
        } else {
            Err(Uncertified { record, report })
        }
    }

    /// Pure and repeatable: every problem is reported, nothing is changed.
    pub fn validate(&self, record: &Record) -> ValidationReport {
        let mut issues = Vec::new();

        self.check_identifiers(record, &mut issues);
        self.check_classification(record, &mut issues);
        self.check_description(record, &mut issues);
        self.check_publication(record, &mut issues);
        self.check_content(record, &mut issues);

        ValidationReport { issues }
    }

    fn check_identifiers(&self, record: &Record, issues: &mut Vec<Issue>) {
        if record.origin.trim().is_empty() {
            issues.push(Issue::violation("origin", ReasonCode::MissingValue));
        }
        if record.customer_id.trim().is_empty() {
            issues.push(Issue::violation("customerId", ReasonCode::MissingValue));
        }

        match record.id.as_deref() {
            None | Some("") => issues.push(Issue::violation("id", ReasonCode::MissingValue)),
            Some(id) => {
                if let Err(reason) = parse_http_url(id) {
                    issues.push(Issue::violation("id", ReasonCode::MalformedValue).with_detail(reason));
                }
            }
        }

        if let Some(doi) = record.doi.as_deref() {
            if let Err(reason) = parse_http_url(doi) {
                issues.push(Issue::violation("doi", ReasonCode::MalformedValue).with_detail(reason));
            }
        }
    }

    fn check_classification(&self, record: &Record, issues: &mut Vec<Issue>) {
        let types = &record.resource_type;
        if types.origin.iter().all(|value| value.trim().is_empty()) {
            issues.push(Issue::violation("type.brage", ReasonCode::MissingValue));
        }
        check_target(types.target(), "type.nva", &types.origin.join(", "), issues);

        let language = &record.language;
        if language.origin.trim().is_empty() {
            issues.push(Issue::violation("language.brage", ReasonCode::MissingValue));
        }
        check_target(language.target(), "language.nva", &language.origin, issues);

        if let Some(date) = &record.date {
            match date.target() {
                None => issues.push(Issue::gap("date.nva", ReasonCode::Unmapped, date.origin.clone())),
                Some(target) if !is_target_date(target) => issues.push(
                    Issue::violation("date.nva", ReasonCode::MalformedValue).with_detail(target.clone()),
                ),
                Some(_) => {}
            }
        }
    }

    fn check_description(&self, record: &Record, issues: &mut Vec<Issue>) {
        let description = &record.entity_description;
        if description.main_title.trim().is_empty() {
            issues.push(Issue::violation(
                "entityDescription.mainTitle",
                ReasonCode::EmptyValue,
            ));
        }

        if description.contributors.is_empty() {
            issues.push(Issue::degradation(
                "entityDescription.contributors",
                ReasonCode::NoContributors,
                record.display_id(),
            ));
        }

        for (index, instance) in description.publication_instance.iter().enumerate() {
            let base = format!("entityDescription.publicationInstance[{}]", index);
            if let Some(volume) = instance.volume.as_deref() {
                if volume.trim().parse::<i32>().is_err() {
                    issues.push(Issue::degradation(
                        format!("{}.volume", base),
                        ReasonCode::VolumeNotNumber,
                        volume,
                    ));
                }
            }
            if let Some(pages) = instance.page_number.as_deref() {
                if !is_recognized_page_number(pages) {
                    issues.push(Issue::degradation(
                        format!("{}.pageNumber", base),
                        ReasonCode::PageNumberFormat,
                        pages,
                    ));
                }
            }
        }

        for (index, contributor) in description.contributors.iter().enumerate() {
            let base = format!("entityDescription.contributors[{}]", index);
            if contributor.identity.name.trim().is_empty() {
                issues.push(Issue::violation(
                    format!("{}.identity.name", base),
                    ReasonCode::EmptyValue,
                ));
            }
            if contributor.brage_role.trim().is_empty() {
                issues.push(Issue::violation(
                    format!("{}.brageRole", base),
                    ReasonCode::MissingValue,
                ));
                continue;
            }
            let mapped = contributor
                .role
                .as_deref()
                .map(|role| !role.trim().is_empty())
                .unwrap_or(false);
            if !mapped {
                issues.push(Issue::gap(
                    format!("{}.role", base),
                    ReasonCode::Unmapped,
                    contributor.brage_role.clone(),
                ));
            }
        }
    }

    fn check_publication(&self, record: &Record, issues: &mut Vec<Issue>) {
        if let Some(publication) = &record.publication {
            if let Some(issn) = publication.issn.as_deref() {
                if !is_valid_issn(issn) {
                    issues.push(
                        Issue::violation("publication.issn", ReasonCode::InvalidIssn)
                            .with_detail(issn),
                    );
                }
            }
            if let Some(isbn) = publication.isbn.as_deref() {
                if !is_valid_isbn(isbn) {
                    issues.push(Issue::degradation(
                        "publication.isbn",
                        ReasonCode::InvalidIsbn,
                        isbn,
                    ));
                }
            }
        }

        let Some(target_type) = record.resource_type.target() else {
            return;
        };
        let published_work = self
            .policy
            .published_work_types
            .iter()
            .any(|kind| kind.eq_ignore_ascii_case(target_type));
        if !published_work {
            return;
        }
        let has_venue = record
            .publication
            .as_ref()
            .map(|publication| publication.has_venue())
            .unwrap_or(false);
        if !has_venue {
            issues.push(
                Issue::violation("publication", ReasonCode::MissingVenue)
                    .with_detail(format!("{} needs a publisher or journal", target_type)),
            );
        }
    }

    fn check_content(&self, record: &Record, issues: &mut Vec<Issue>) {
        let files = &record.content_bundle.content_files;
        if files.is_empty() && !record.metadata_only {
            issues.push(Issue::violation(
                "contentBundle.contentFiles",
                ReasonCode::EmptyBundle,
            ));
        }

        let mut seen = HashSet::new();
        for (index, file) in files.iter().enumerate() {
            let base = format!("contentBundle.contentFiles[{}]", index);

            if file.filename.trim().is_empty() {
                issues.push(Issue::violation(
                    format!("{}.filename", base),
                    ReasonCode::EmptyValue,
                ));
            }

            if file.identifier.trim().is_empty() {
                issues.push(Issue::violation(
                    format!("{}.identifier", base),
                    ReasonCode::EmptyValue,
                ));
            } else if !seen.insert(file.identifier.as_str()) {
                issues.push(
                    Issue::violation(format!("{}.identifier", base), ReasonCode::DuplicateIdentifier)
                        .with_detail(file.identifier.clone()),
                );
            }

            if let Some(license) = &file.license {
                check_target(
                    license.target(),
                    &format!("{}.license.nvaLicense", base),
                    &license.origin,
                    issues,
                );
            }

            if let Some(raw) = &file.unknown_type {
                let path = format!("{}.unknownType", base);
                let issue = match self.policy.unknown_type {
                    UnknownTypePolicy::Reject => {
                        Issue::violation(path, ReasonCode::UnclassifiedBundle).with_detail(raw.clone())
                    }
                    UnknownTypePolicy::Hold => {
                        Issue::gap(path, ReasonCode::UnclassifiedBundle, raw.clone())
                    }
                    UnknownTypePolicy::Warn => {
                        Issue::degradation(path, ReasonCode::UnclassifiedBundle, raw.clone())
                    }
                };
                issues.push(issue);
            }
        }
    }
}

/// Absent target is a gap; a blank target is malformed data.
fn check_target(target: Option<&String>, path: &str, origin: &str, issues: &mut Vec<Issue>) {
    match target {
        None => issues.push(Issue::gap(path, ReasonCode::Unmapped, origin)),
        Some(value) if value.trim().is_empty() => {
            issues.push(Issue::violation(path, ReasonCode::EmptyValue))
        }
        Some(_) => {}
    }
}
