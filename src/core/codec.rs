//! JSON wire format for records. Values pass through untouched: no trimming, no
//! normalization, no reordering.

use crate::domain::model::{ExportEntry, Record, UnreadableRecord};
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::Value;

pub fn to_json(record: &Record) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

pub fn to_json_pretty(record: &Record) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

pub fn from_json(json: &str) -> Result<Record> {
    Ok(serde_json::from_str(json)?)
}

/// Pretty JSON array; accepts anything serializable as a record, `ValidatedRecord` included.
pub fn batch_to_json<R: Serialize>(records: &[R]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Strict: any element that is not a record fails the whole array. Use
/// [`read_export`] for origin-system exports.
pub fn batch_from_json(bytes: &[u8]) -> Result<Vec<Record>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Reads an export array element by element. Only a file that is not a JSON
/// array is an error; an element that is not a record becomes
/// [`ExportEntry::Unreadable`] and the rest of the batch is unaffected.
pub fn read_export(bytes: &[u8]) -> Result<Vec<ExportEntry>> {
    let elements: Vec<Value> = serde_json::from_slice(bytes)?;
    Ok(elements
        .into_iter()
        .enumerate()
        .map(|(position, element)| read_element(position, element))
        .collect())
}

fn read_element(position: usize, element: Value) -> ExportEntry {
    let text = |key: &str| {
        element
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let id = text("id");
    let origin = text("origin");

    match serde_json::from_value::<Record>(element) {
        Ok(record) => ExportEntry::Record(record),
        Err(e) => {
            tracing::warn!("Export element {} is not a record: {}", position, e);
            ExportEntry::Unreadable(UnreadableRecord {
                position,
                record_id: id
                    .or_else(|| origin.clone())
                    .unwrap_or_else(|| format!("#{}", position)),
                origin: origin.unwrap_or_default(),
                message: e.to_string(),
            })
        }
    }
}
