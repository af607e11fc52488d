//! Origin → target lookup tables, one per dual-valued field kind.
//!
//! Tables are CSV or TSV files with the header `kind,origin,target`. A target cell
//! holding [`NO_MAPPING`] records that the origin value is known and has no target
//! counterpart, which is different from an origin value that is missing from the table.

use crate::utils::error::{MigrateError, Result};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Target cell sentinel for "known, deliberately unmapped".
pub const NO_MAPPING: &str = "-";

/// Separator for type keys that combine several origin values.
pub const TYPE_COMBINATION_SEPARATOR: char = '|';

const EXPECTED_HEADER: [&str; 3] = ["kind", "origin", "target"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Type,
    Language,
    License,
    Role,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Type,
        FieldKind::Language,
        FieldKind::License,
        FieldKind::Role,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Type => "type",
            FieldKind::Language => "language",
            FieldKind::License => "license",
            FieldKind::Role => "role",
        }
    }

    pub fn parse(raw: &str) -> Option<FieldKind> {
        let raw = raw.trim();
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    Target(String),
    Unmapped,
}

/// Lookup keys ignore case and surrounding whitespace.
pub fn normalize_key(origin: &str) -> String {
    origin.trim().to_lowercase()
}

/// Order-insensitive key for a set of origin type values.
pub fn combination_key<S: AsRef<str>>(origins: &[S]) -> String {
    let mut parts: Vec<String> = origins
        .iter()
        .map(|origin| normalize_key(origin.as_ref()))
        .filter(|origin| !origin.is_empty())
        .collect();
    parts.sort();
    parts.dedup();
    parts.join(&TYPE_COMBINATION_SEPARATOR.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, Mapping>,
}

impl MappingTable {
    pub fn get(&self, origin: &str) -> Option<&Mapping> {
        self.entries.get(&normalize_key(origin))
    }

    pub fn get_normalized(&self, key: &str) -> Option<&Mapping> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// An identical repeat is accepted; a conflicting one is an error message.
    fn insert(&mut self, key: String, mapping: Mapping) -> std::result::Result<(), String> {
        match self.entries.get(&key) {
            Some(existing) if *existing == mapping => Ok(()),
            Some(existing) => Err(format!(
                "origin '{}' already maps to {:?}, refusing {:?}",
                key, existing, mapping
            )),
            None => {
                self.entries.insert(key, mapping);
                Ok(())
            }
        }
    }
}

/// All mapping tables for one batch. Built once, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Vocabularies {
    tables: HashMap<FieldKind, MappingTable>,
}

impl Vocabularies {
    pub fn table(&self, kind: FieldKind) -> Option<&MappingTable> {
        self.tables.get(&kind)
    }

    pub fn lookup(&self, kind: FieldKind, origin: &str) -> Option<&Mapping> {
        self.table(kind).and_then(|table| table.get(origin))
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(MappingTable::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Programmatic insert, mostly for tests and small embedded tables.
    pub fn with_mapping(mut self, kind: FieldKind, origin: &str, target: &str) -> Result<Self> {
        self.insert_row(kind, origin, target, "inline", 0)?;
        Ok(self)
    }

    pub fn with_unmapped(self, kind: FieldKind, origin: &str) -> Result<Self> {
        self.with_mapping(kind, origin, NO_MAPPING)
    }

    /// Loads every lookup file; the delimiter follows the extension (`.tsv` is tab separated).
    pub fn load_files(paths: &[String]) -> Result<Self> {
        let mut vocabularies = Vocabularies::default();
        for path in paths {
            let file = std::fs::File::open(path)?;
            let delimiter = delimiter_for(Path::new(path));
            vocabularies.extend_from_reader(file, delimiter, path)?;
            tracing::debug!("Loaded lookup file {}", path);
        }
        tracing::info!(
            "Loaded {} mappings from {} lookup files",
            vocabularies.len(),
            paths.len()
        );
        Ok(vocabularies)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8, source_name: &str) -> Result<Self> {
        let mut vocabularies = Vocabularies::default();
        vocabularies.extend_from_reader(reader, delimiter, source_name)?;
        Ok(vocabularies)
    }

    pub fn extend_from_reader<R: Read>(
        &mut self,
        reader: R,
        delimiter: u8,
        source_name: &str,
    ) -> Result<()> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let header: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|column| column.trim().to_lowercase())
            .collect();
        if header != EXPECTED_HEADER {
            return Err(MigrateError::MappingTableError {
                source_name: source_name.to_string(),
                line: 1,
                reason: format!(
                    "expected header '{}', found '{}'",
                    EXPECTED_HEADER.join(","),
                    header.join(",")
                ),
            });
        }

        for row in csv_reader.records() {
            let row = row?;
            let line = row.position().map(|position| position.line()).unwrap_or(0);
            let (kind, origin, target) = match (row.get(0), row.get(1), row.get(2)) {
                (Some(kind), Some(origin), Some(target)) => (kind, origin, target),
                _ => {
                    return Err(table_error(source_name, line, "expected three columns"));
                }
            };
            let kind = FieldKind::parse(kind).ok_or_else(|| {
                table_error(source_name, line, &format!("unknown field kind '{}'", kind))
            })?;
            self.insert_row(kind, origin, target, source_name, line)?;
        }
        Ok(())
    }

    fn insert_row(
        &mut self,
        kind: FieldKind,
        origin: &str,
        target: &str,
        source_name: &str,
        line: u64,
    ) -> Result<()> {
        let key = match kind {
            FieldKind::Type => {
                let parts: Vec<&str> = origin.split(TYPE_COMBINATION_SEPARATOR).collect();
                combination_key(&parts)
            }
            _ => normalize_key(origin),
        };
        if key.is_empty() {
            return Err(table_error(source_name, line, "origin cannot be empty"));
        }

        let target = target.trim();
        let mapping = if target == NO_MAPPING {
            Mapping::Unmapped
        } else if target.is_empty() {
            return Err(table_error(
                source_name,
                line,
                &format!("empty target for '{}', use '{}' for no mapping", origin, NO_MAPPING),
            ));
        } else {
            Mapping::Target(target.to_string())
        };

        self.tables
            .entry(kind)
            .or_default()
            .insert(key, mapping)
            .map_err(|reason| table_error(source_name, line, &reason))
    }
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

fn table_error(source_name: &str, line: u64, reason: &str) -> MigrateError {
    MigrateError::MappingTableError {
        source_name: source_name.to_string(),
        line,
        reason: reason.to_string(),
    }
}
