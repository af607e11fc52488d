use crate::core::date::normalize_date;
use crate::core::vocabulary::{combination_key, FieldKind, Mapping, Vocabularies};
use crate::domain::model::Record;
use crate::domain::outcome::{Issue, ReasonCode};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

const CREATIVE_COMMONS_HOST: &str = "creativecommons.org";

/// An origin value with no usable target. Reportable, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no target value for '{origin}' ({reason})")]
pub struct MappingGap {
    pub origin: String,
    pub reason: ReasonCode,
}

impl MappingGap {
    pub fn new(origin: impl Into<String>, reason: ReasonCode) -> Self {
        Self {
            origin: origin.into(),
            reason,
        }
    }

    fn into_issue(self, path: impl Into<String>) -> Issue {
        Issue::gap(path, self.reason, self.origin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeResolution {
    pub target: String,
    /// Origin values that did not take part in the match.
    pub ignored: Vec<String>,
}

/// A record after the mapping pass, with every gap and degradation met on the way.
#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub record: Record,
    pub issues: Vec<Issue>,
}

/// Fills target sides from a frozen set of mapping tables.
#[derive(Debug, Clone)]
pub struct Resolver {
    vocabularies: Arc<Vocabularies>,
}

impl Resolver {
    pub fn new(vocabularies: Arc<Vocabularies>) -> Self {
        Self { vocabularies }
    }

    pub fn vocabularies(&self) -> &Vocabularies {
        &self.vocabularies
    }

    /// Deterministic single-value lookup.
    pub fn resolve(&self, kind: FieldKind, origin: &str) -> Result<String, MappingGap> {
        if origin.trim().is_empty() {
            return Err(MappingGap::new(origin, ReasonCode::EmptyValue));
        }

        if kind == FieldKind::License {
            if let Some(name) = creative_commons_name(origin) {
                if let Some(mapping) = self.vocabularies.lookup(kind, &name) {
                    return mapping_to_result(mapping, origin);
                }
            }
        }

        match self.vocabularies.lookup(kind, origin) {
            Some(mapping) => mapping_to_result(mapping, origin),
            None => Err(MappingGap::new(origin, ReasonCode::Unmapped)),
        }
    }

    /// Whole combination first, then the first single value that maps.
    pub fn resolve_type(&self, origins: &[String]) -> Result<TypeResolution, MappingGap> {
        let joined = origins.join(", ");
        let key = combination_key(origins);
        if key.is_empty() {
            return Err(MappingGap::new(joined, ReasonCode::MissingValue));
        }

        let table = match self.vocabularies.table(FieldKind::Type) {
            Some(table) => table,
            None => return Err(MappingGap::new(joined, ReasonCode::Unmapped)),
        };

        match table.get_normalized(&key) {
            Some(Mapping::Target(target)) => {
                return Ok(TypeResolution {
                    target: target.clone(),
                    ignored: Vec::new(),
                })
            }
            Some(Mapping::Unmapped) => {
                return Err(MappingGap::new(joined, ReasonCode::ExplicitlyUnmapped))
            }
            None => {}
        }

        if origins.len() < 2 {
            return Err(MappingGap::new(joined, ReasonCode::Unmapped));
        }

        for (index, origin) in origins.iter().enumerate() {
            if let Some(Mapping::Target(target)) = table.get(origin) {
                let ignored = origins
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != index)
                    .map(|(_, value)| value.clone())
                    .collect();
                return Ok(TypeResolution {
                    target: target.clone(),
                    ignored,
                });
            }
        }

        Err(MappingGap::new(joined, ReasonCode::Unmapped))
    }

    /// Fills every absent target of the record. Targets already present are kept.
    pub fn resolve_record(&self, mut record: Record) -> ResolutionReport {
        let mut issues = Vec::new();

        if record.resource_type.is_pending() {
            match self.resolve_type(&record.resource_type.origin) {
                Ok(resolution) => {
                    if !resolution.ignored.is_empty() {
                        issues.push(Issue::degradation(
                            "type.nva",
                            ReasonCode::PartialTypeMatch,
                            format!("ignored: {}", resolution.ignored.join(", ")),
                        ));
                    }
                    record.resource_type.resolve_with(resolution.target);
                }
                Err(gap) => issues.push(gap.into_issue("type.nva")),
            }
        }

        if record.language.is_pending() {
            match self.resolve(FieldKind::Language, &record.language.origin) {
                Ok(target) => {
                    record.language.resolve_with(target);
                }
                Err(gap) => issues.push(gap.into_issue("language.nva")),
            }
        }

        if let Some(date) = record.date.as_mut() {
            if date.is_pending() {
                match normalize_date(&date.origin) {
                    Ok(normalized) => {
                        for reason in normalized.degradations {
                            issues.push(Issue::degradation("date.nva", reason, date.origin.clone()));
                        }
                        date.resolve_with(normalized.value);
                    }
                    Err(gap) => issues.push(gap.into_issue("date.nva")),
                }
            }
        }

        for (index, contributor) in record
            .entity_description
            .contributors
            .iter_mut()
            .enumerate()
        {
            if contributor.role.is_some() {
                continue;
            }
            match self.resolve(FieldKind::Role, &contributor.brage_role) {
                Ok(role) => contributor.role = Some(role),
                Err(gap) => issues.push(
                    gap.into_issue(format!("entityDescription.contributors[{}].role", index)),
                ),
            }
        }

        for (index, file) in record.content_bundle.content_files.iter_mut().enumerate() {
            let Some(license) = file.license.as_mut() else {
                continue;
            };
            if !license.is_pending() {
                continue;
            }
            match self.resolve(FieldKind::License, &license.origin) {
                Ok(target) => {
                    license.resolve_with(target);
                }
                Err(gap) => issues.push(gap.into_issue(format!(
                    "contentBundle.contentFiles[{}].license.nvaLicense",
                    index
                ))),
            }
        }

        if !issues.is_empty() {
            tracing::debug!(
                "Resolved {} with {} open issues",
                record.display_id(),
                issues.len()
            );
        }

        ResolutionReport { record, issues }
    }
}

fn mapping_to_result(mapping: &Mapping, origin: &str) -> Result<String, MappingGap> {
    match mapping {
        Mapping::Target(target) => Ok(target.clone()),
        Mapping::Unmapped => Err(MappingGap::new(origin, ReasonCode::ExplicitlyUnmapped)),
    }
}

/// `https://creativecommons.org/licenses/by-nc/4.0/` → `CC BY-NC`,
/// `https://creativecommons.org/publicdomain/zero/1.0/` → `CC0`.
fn creative_commons_name(origin: &str) -> Option<String> {
    let url = Url::parse(origin.trim()).ok()?;
    let host = url.host_str()?;
    if host != CREATIVE_COMMONS_HOST && !host.ends_with(".creativecommons.org") {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["licenses", code, ..] => Some(format!("CC {}", code.to_uppercase())),
        ["publicdomain", "zero", ..] => Some("CC0".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ContentFile, Contributor, Identity};
    use crate::domain::outcome::IssueKind;
    use crate::domain::Date;

    fn vocabularies() -> Arc<Vocabularies> {
        let table = "kind,origin,target\n\
type,Book|Peer reviewed,Vitenskapelig monografi\n\
type,Book,Book\n\
type,Journal article,JournalArticle\n\
type,Others,-\n\
language,nob,http://lexvo.org/id/iso639-3/nob\n\
license,CC BY,https://creativecommons.org/licenses/by/4.0/\n\
license,CC0,https://creativecommons.org/publicdomain/zero/1.0/\n\
role,author,Writer\n\
role,advisor,Supervisor\n";
        Arc::new(Vocabularies::from_reader(table.as_bytes(), b',', "test.csv").unwrap())
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let resolver = Resolver::new(vocabularies());
        let first = resolver.resolve(FieldKind::Role, "author");
        let second = resolver.resolve(FieldKind::Role, "author");
        assert_eq!(first, Ok("Writer".to_string()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_and_sentinel_values_are_distinct_gaps() {
        let resolver = Resolver::new(vocabularies());
        assert_eq!(
            resolver.resolve(FieldKind::Role, "unknownRole").unwrap_err().reason,
            ReasonCode::Unmapped
        );
        assert_eq!(
            resolver.resolve_type(&["Others".to_string()]).unwrap_err().reason,
            ReasonCode::ExplicitlyUnmapped
        );
        assert_eq!(
            resolver.resolve(FieldKind::Language, "").unwrap_err().reason,
            ReasonCode::EmptyValue
        );
    }

    #[test]
    fn test_creative_commons_urls_resolve_through_their_name() {
        let resolver = Resolver::new(vocabularies());
        assert_eq!(
            resolver
                .resolve(FieldKind::License, "http://creativecommons.org/licenses/by/4.0/deed.no")
                .unwrap(),
            "https://creativecommons.org/licenses/by/4.0/"
        );
        assert_eq!(
            resolver
                .resolve(FieldKind::License, "https://creativecommons.org/publicdomain/zero/1.0/")
                .unwrap(),
            "https://creativecommons.org/publicdomain/zero/1.0/"
        );
        assert!(resolver
            .resolve(FieldKind::License, "https://example.org/licenses/by/4.0/")
            .is_err());
    }

    #[test]
    fn test_type_combination_wins_over_single_values() {
        let resolver = Resolver::new(vocabularies());
        let combined = resolver
            .resolve_type(&["Peer reviewed".to_string(), "Book".to_string()])
            .unwrap();
        assert_eq!(combined.target, "Vitenskapelig monografi");
        assert!(combined.ignored.is_empty());

        let partial = resolver
            .resolve_type(&["Poem".to_string(), "Journal article".to_string()])
            .unwrap();
        assert_eq!(partial.target, "JournalArticle");
        assert_eq!(partial.ignored, vec!["Poem".to_string()]);
    }

    #[test]
    fn test_resolve_record_fills_targets_and_collects_gaps() {
        let resolver = Resolver::new(vocabularies());
        let mut record = Record::new(
            "https://hdl.handle.net/11250/1",
            "uib/1",
            "uib",
            "Fjordsystemer",
            vec!["Book".to_string()],
            "nob",
        );
        record.date = Some(Date::pending("2004".to_string()));
        record.entity_description.contributors = vec![
            Contributor::new(Identity::person("Nordmann, Ola"), "author"),
            Contributor::new(Identity::person("Nordmann, Kari"), "unknownRole"),
        ];
        record.content_bundle.content_files =
            vec![ContentFile::new("book.pdf", "f1").with_license("CC BY")];

        let report = resolver.resolve_record(record);
        let record = &report.record;

        assert_eq!(record.resource_type.target().map(String::as_str), Some("Book"));
        assert_eq!(
            record.language.target().map(String::as_str),
            Some("http://lexvo.org/id/iso639-3/nob")
        );
        assert_eq!(record.date.as_ref().unwrap().target().map(String::as_str), Some("2004"));
        assert_eq!(
            record.entity_description.contributors[0].role.as_deref(),
            Some("Writer")
        );
        assert_eq!(record.entity_description.contributors[1].role, None);

        let gap = report
            .issues
            .iter()
            .find(|issue| issue.kind == IssueKind::MappingGap)
            .unwrap();
        assert_eq!(gap.path, "entityDescription.contributors[1].role");
        assert_eq!(gap.detail.as_deref(), Some("unknownRole"));
        assert!(report
            .issues
            .iter()
            .any(|issue| issue.kind == IssueKind::FormatDegradation && issue.path == "date.nva"));
    }

    #[test]
    fn test_existing_targets_are_not_overwritten() {
        let resolver = Resolver::new(vocabularies());
        let mut record = Record::new("h", "o", "c", "t", vec!["Book".to_string()], "nob");
        record.resource_type.target = Some("Anthology".to_string());

        let report = resolver.resolve_record(record);
        assert_eq!(
            report.record.resource_type.target().map(String::as_str),
            Some("Anthology")
        );
    }
}
