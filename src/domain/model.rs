use crate::domain::dual::{Date, Language, License, Type};
use crate::domain::outcome::{Issue, ManifestEntry, ReasonCode, RecordOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One deposited resource being migrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Persistent handle URL from the origin system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    /// Location of the item in the legacy export structure.
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embargo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rightsholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_authority: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spatial_coverage: Vec<String>,
    #[serde(rename = "type", default)]
    pub resource_type: Type,
    #[serde(default)]
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(default)]
    pub entity_description: EntityDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<Publication>,
    #[serde(default)]
    pub content_bundle: ResourceContent,
    /// Deposit without files. Only such records may have an empty bundle.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub metadata_only: bool,
}

impl Record {
    /// A freshly extracted record: every target side absent, no files, no contributors.
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        customer_id: impl Into<String>,
        main_title: impl Into<String>,
        types: Vec<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            doi: None,
            origin: origin.into(),
            customer_id: customer_id.into(),
            embargo: None,
            rightsholder: None,
            publisher_authority: None,
            spatial_coverage: Vec::new(),
            resource_type: Type::pending(types),
            language: Language::pending(language.into()),
            date: None,
            entity_description: EntityDescription::titled(main_title),
            publication: None,
            content_bundle: ResourceContent::default(),
            metadata_only: false,
        }
    }

    /// Identifier used in logs and the manifest; falls back to the origin location.
    pub fn display_id(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.origin,
        }
    }
}

/// One element of an export file.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEntry {
    Record(Record),
    /// Valid JSON that is not a record, e.g. a field of the wrong JSON type.
    Unreadable(UnreadableRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableRecord {
    /// Zero-based position in the export array.
    pub position: usize,
    /// `id`, else `origin`, else `#<position>`.
    pub record_id: String,
    pub origin: String,
    pub message: String,
}

impl UnreadableRecord {
    pub fn manifest_entry(&self) -> ManifestEntry {
        ManifestEntry {
            record_id: self.record_id.clone(),
            origin: self.origin.clone(),
            outcome: RecordOutcome::Rejected,
            issues: vec![Issue::violation("record", ReasonCode::UnreadableRecord)
                .with_detail(format!("element {}: {}", self.position, self.message))],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescription {
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub abstracts: Vec<String>,
    #[serde(default)]
    pub main_title: String,
    #[serde(default)]
    pub alternative_titles: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display and citation order.
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    #[serde(default)]
    pub publication_instance: Vec<PublicationInstance>,
}

impl EntityDescription {
    pub fn titled(main_title: impl Into<String>) -> Self {
        Self {
            main_title: main_title.into(),
            ..Self::default()
        }
    }
}

/// Kind of agent behind a contributor. Exports also carry other labels
/// (`Identity` is common); those are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentType {
    Person,
    Organization,
    Other(String),
}

impl From<String> for AgentType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Person" => AgentType::Person,
            "Organization" => AgentType::Organization,
            _ => AgentType::Other(raw),
        }
    }
}

impl From<AgentType> for String {
    fn from(agent: AgentType) -> Self {
        match agent {
            AgentType::Person => "Person".to_string(),
            AgentType::Organization => "Organization".to_string(),
            AgentType::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub agent: AgentType,
}

impl Identity {
    pub fn person(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent: AgentType::Person,
        }
    }

    pub fn organization(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent: AgentType::Organization,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub identity: Identity,
    /// Target-system role, filled by the mapping pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Origin-system role as extracted.
    #[serde(default)]
    pub brage_role: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub contribution_type: Option<String>,
}

impl Contributor {
    pub fn new(identity: Identity, brage_role: impl Into<String>) -> Self {
        Self {
            identity,
            role: None,
            brage_role: brage_role.into(),
            contribution_type: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_series: Option<String>,
    /// Series or venue identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Publication {
    pub fn has_venue(&self) -> bool {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        };
        present(&self.publisher) || present(&self.journal)
    }
}

/// Bundle classification used by the origin system's content listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BundleType {
    #[serde(rename = "ORIGINAL")]
    Original,
    #[serde(rename = "TEXT")]
    Text,
    #[serde(rename = "THUMBNAIL")]
    Thumbnail,
    #[serde(rename = "LICENSE")]
    License,
    #[serde(rename = "CC-LICENSE")]
    CcLicense,
    #[serde(rename = "ORE")]
    Ore,
    #[serde(rename = "SWORD")]
    Sword,
    #[serde(rename = "METADATA")]
    Metadata,
}

impl BundleType {
    pub const ALL: [BundleType; 8] = [
        BundleType::Original,
        BundleType::Text,
        BundleType::Thumbnail,
        BundleType::License,
        BundleType::CcLicense,
        BundleType::Ore,
        BundleType::Sword,
        BundleType::Metadata,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BundleType::Original => "ORIGINAL",
            BundleType::Text => "TEXT",
            BundleType::Thumbnail => "THUMBNAIL",
            BundleType::License => "LICENSE",
            BundleType::CcLicense => "CC-LICENSE",
            BundleType::Ore => "ORE",
            BundleType::Sword => "SWORD",
            BundleType::Metadata => "METADATA",
        }
    }

    /// Case-insensitive; `CCLICENSE` is accepted for `CC-LICENSE`.
    pub fn parse(raw: &str) -> Option<BundleType> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized == "CCLICENSE" {
            return Some(BundleType::CcLicense);
        }
        BundleType::ALL
            .into_iter()
            .find(|bundle| bundle.as_str() == normalized)
    }
}

impl fmt::Display for BundleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<BundleType>,
    /// Raw bundle label the origin system used when it is not a known `BundleType`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique within one record's bundle.
    #[serde(default)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embargo_date: Option<DateTime<Utc>>,
}

impl ContentFile {
    pub fn new(filename: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bundle_type: None,
            unknown_type: None,
            description: None,
            identifier: identifier.into(),
            license: None,
            embargo_date: None,
        }
    }

    /// Places a raw bundle label in `bundle_type`, or keeps it verbatim in
    /// `unknown_type` when it cannot be classified.
    pub fn classify_bundle(mut self, raw: &str) -> Self {
        match BundleType::parse(raw) {
            Some(bundle) => {
                self.bundle_type = Some(bundle);
                self.unknown_type = None;
            }
            None => {
                self.bundle_type = None;
                self.unknown_type = Some(raw.to_string());
            }
        }
        self
    }

    pub fn with_license(mut self, origin: impl Into<String>) -> Self {
        self.license = Some(License::pending(origin.into()));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    #[serde(default)]
    pub content_files: Vec<ContentFile>,
}

impl ResourceContent {
    pub fn new(content_files: Vec<ContentFile>) -> Self {
        Self { content_files }
    }

    pub fn is_empty(&self) -> bool {
        self.content_files.is_empty()
    }
}
