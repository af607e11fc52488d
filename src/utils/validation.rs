use crate::utils::error::{MigrateError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Parses `value` as an absolute http(s) URL. Shared by config checks and record
/// identifier checks.
pub fn parse_http_url(value: &str) -> std::result::Result<Url, String> {
    if value.is_empty() {
        return Err("URL cannot be empty".to_string());
    }
    match Url::parse(value) {
        Ok(url) => match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(url),
            "http" | "https" => Err("URL has no host".to_string()),
            scheme => Err(format!("Unsupported URL scheme: {}", scheme)),
        },
        Err(e) => Err(format!("Invalid URL format: {}", e)),
    }
}

/// `NNNN-NNNC` or `NNNNNNNC`, where `C` is the mod-11 check character (`X` for 10).
pub fn is_valid_issn(value: &str) -> bool {
    let value = value.trim();
    let value = value.strip_prefix("ISSN ").unwrap_or(value);
    let compact: Vec<char> = match value.len() {
        9 if value.as_bytes()[4] == b'-' => value.chars().filter(|c| *c != '-').collect(),
        8 => value.chars().collect(),
        _ => return false,
    };
    if compact.len() != 8 {
        return false;
    }

    let mut sum = 0;
    for (position, c) in compact[..7].iter().enumerate() {
        let Some(digit) = c.to_digit(10) else {
            return false;
        };
        sum += digit * (8 - position as u32);
    }
    let expected = (11 - sum % 11) % 11;
    match compact[7] {
        'X' | 'x' => expected == 10,
        c => c.to_digit(10) == Some(expected),
    }
}

/// ISBN-10 or ISBN-13 with a correct check digit. Hyphens and spaces are ignored.
pub fn is_valid_isbn(value: &str) -> bool {
    let compact: Vec<char> = value
        .trim()
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .collect();

    match compact.len() {
        10 => {
            let mut sum = 0;
            for (position, c) in compact.iter().enumerate() {
                let digit = match (position, c) {
                    (9, 'X' | 'x') => 10,
                    _ => match c.to_digit(10) {
                        Some(digit) => digit,
                        None => return false,
                    },
                };
                sum += digit * (10 - position as u32);
            }
            sum % 11 == 0
        }
        13 => {
            let mut sum = 0;
            for (position, c) in compact.iter().enumerate() {
                let Some(digit) = c.to_digit(10) else {
                    return false;
                };
                sum += if position % 2 == 0 { digit } else { digit * 3 };
            }
            sum % 10 == 0
        }
        _ => false,
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        if let Some(extension) = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            if !allowed_set.contains(extension) {
                return Err(MigrateError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
        } else {
            return Err(MigrateError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: file.clone(),
                reason: "File has no extension or invalid filename".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
