use brage_migrate::core::vocabulary::{FieldKind, Vocabularies};
use brage_migrate::core::Resolver;
use brage_migrate::domain::{ContentFile, Contributor, Date, Identity, IssueKind, ReasonCode, Record};
use std::sync::Arc;

fn resolver() -> Resolver {
    let vocabularies = Vocabularies::default()
        .with_mapping(FieldKind::Role, "author", "Writer")
        .and_then(|v| v.with_mapping(FieldKind::Role, "editor", "Editor"))
        .and_then(|v| v.with_unmapped(FieldKind::Role, "other"))
        .and_then(|v| v.with_mapping(FieldKind::Type, "Book", "Book"))
        .and_then(|v| v.with_mapping(FieldKind::Type, "Book|Peer reviewed", "AcademicMonograph"))
        .and_then(|v| v.with_mapping(FieldKind::Language, "nob", "http://lexvo.org/id/iso639-3/nob"))
        .and_then(|v| {
            v.with_mapping(
                FieldKind::License,
                "CC BY-NC",
                "https://creativecommons.org/licenses/by-nc/4.0/",
            )
        })
        .unwrap();
    Resolver::new(Arc::new(vocabularies))
}

fn record() -> Record {
    Record::new(
        "https://hdl.handle.net/11250/4001",
        "uio/4001",
        "uio",
        "Norsk syntaks",
        vec!["Peer reviewed".to_string(), "Book".to_string()],
        "nob",
    )
}

#[test]
fn test_role_lookup_fills_target_role() {
    let mut input = record();
    input.entity_description.contributors = vec![Contributor::new(Identity::person("Aas, Liv"), "author")];

    let report = resolver().resolve_record(input);

    assert_eq!(
        report.record.entity_description.contributors[0].role.as_deref(),
        Some("Writer")
    );
    assert!(report.issues.is_empty());
}

#[test]
fn test_unknown_role_is_a_gap() {
    let mut input = record();
    input.entity_description.contributors =
        vec![Contributor::new(Identity::person("Aas, Liv"), "unknownRole")];

    let report = resolver().resolve_record(input);

    assert_eq!(report.record.entity_description.contributors[0].role, None);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, IssueKind::MappingGap);
    assert_eq!(report.issues[0].reason, ReasonCode::Unmapped);
    assert_eq!(report.issues[0].path, "entityDescription.contributors[0].role");
}

#[test]
fn test_sentinel_row_is_an_explicit_gap() {
    let err = resolver().resolve(FieldKind::Role, "Other").unwrap_err();
    assert_eq!(err.reason, ReasonCode::ExplicitlyUnmapped);
    assert_eq!(err.origin, "Other");
}

#[test]
fn test_resolution_is_deterministic() {
    let resolver = resolver();
    let first = resolver.resolve_record(record());
    for _ in 0..10 {
        let again = resolver.resolve_record(record());
        assert_eq!(again.record, first.record);
        assert_eq!(again.issues, first.issues);
    }
    assert_eq!(
        first.record.resource_type.target.as_deref(),
        Some("AcademicMonograph")
    );
}

#[test]
fn test_creative_commons_url_maps_through_license_name() {
    let mut input = record();
    input.content_bundle.content_files = vec![ContentFile::new("book.pdf", "1")
        .with_license("http://creativecommons.org/licenses/by-nc/4.0/deed.no")];

    let report = resolver().resolve_record(input);
    let license = report.record.content_bundle.content_files[0]
        .license
        .as_ref()
        .unwrap();

    assert_eq!(
        license.target.as_deref(),
        Some("https://creativecommons.org/licenses/by-nc/4.0/")
    );
}

#[test]
fn test_existing_targets_are_not_overwritten() {
    let mut input = record();
    input.language.target = Some("http://lexvo.org/id/iso639-3/nno".to_string());
    input.date = Some(Date::pending("03.2011".to_string()));

    let report = resolver().resolve_record(input);

    assert_eq!(
        report.record.language.target.as_deref(),
        Some("http://lexvo.org/id/iso639-3/nno")
    );
    assert_eq!(
        report.record.date.as_ref().unwrap().target,
        None,
        "MM.YYYY is not a recognized shape"
    );
    assert!(report
        .issues
        .iter()
        .any(|issue| issue.path == "date.nva" && issue.reason == ReasonCode::MalformedValue));
}
