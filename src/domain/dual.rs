use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// One fact encoded twice: as the origin system stored it and as the target
/// system expects it.
///
/// `origin` is always present once a record has been extracted. `target` stays
/// `None` until the mapping pass fills it. On the wire the pair is
/// `{"brage": .., "nva": ..}` and an absent target omits the `nva` key, so an
/// absent target and an empty-string target survive a round trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualValue<O, T = O> {
    #[serde(rename = "brage")]
    pub origin: O,
    #[serde(
        rename = "nva",
        default = "Option::default",
        skip_serializing_if = "Option::is_none"
    )]
    pub target: Option<T>,
}

/// Publication type. The origin system may tag one item with several types.
pub type Type = DualValue<Vec<String>, String>;

/// Language code in the origin system, lexvo ISO 639-3 URI in the target system.
pub type Language = DualValue<String>;

/// Free-text origin date, `YYYY`, `YYYY-MM` or `YYYY-MM-DD` in the target system.
pub type Date = DualValue<String>;

/// License label or URL in the origin system, license URI in the target system.
///
/// Same pair as the other dual values, but the loader expects the keys
/// `brageLicense` and `nvaLicense`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LicenseFields", into = "LicenseFields")]
pub struct License(DualValue<String>);

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseFields {
    brage_license: String,
    #[serde(alias = "NvaLicense", default, skip_serializing_if = "Option::is_none")]
    nva_license: Option<String>,
}

impl From<LicenseFields> for License {
    fn from(fields: LicenseFields) -> Self {
        License(DualValue {
            origin: fields.brage_license,
            target: fields.nva_license,
        })
    }
}

impl From<License> for LicenseFields {
    fn from(license: License) -> Self {
        LicenseFields {
            brage_license: license.0.origin,
            nva_license: license.0.target,
        }
    }
}

impl License {
    pub fn pending(origin: impl Into<String>) -> Self {
        License(DualValue::pending(origin.into()))
    }

    pub fn resolved(origin: impl Into<String>, target: impl Into<String>) -> Self {
        License(DualValue::resolved(origin.into(), target.into()))
    }
}

impl Deref for License {
    type Target = DualValue<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for License {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<O, T> DualValue<O, T> {
    pub fn pending(origin: O) -> Self {
        Self {
            origin,
            target: None,
        }
    }

    pub fn resolved(origin: O, target: T) -> Self {
        Self {
            origin,
            target: Some(target),
        }
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.target.is_none()
    }

    /// Sets the target only when none is present yet. Returns whether it was set.
    pub fn resolve_with(&mut self, target: T) -> bool {
        if self.target.is_some() {
            return false;
        }
        self.target = Some(target);
        true
    }
}

impl<O> DualValue<O, String> {
    /// Target present and not blank.
    pub fn is_resolved(&self) -> bool {
        self.target
            .as_deref()
            .map(|target| !target.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_value_omits_target_on_the_wire() {
        let language = Language::pending("nob".to_string());
        let json = serde_json::to_string(&language).unwrap();
        assert_eq!(json, r#"{"brage":"nob"}"#);
    }

    #[test]
    fn test_empty_target_is_kept_distinct_from_absent_target() {
        let empty: Language = serde_json::from_str(r#"{"brage":"nob","nva":""}"#).unwrap();
        let absent: Language = serde_json::from_str(r#"{"brage":"nob"}"#).unwrap();

        assert_eq!(empty.target(), Some(&String::new()));
        assert!(absent.is_pending());
        assert!(!empty.is_pending());
        assert!(!empty.is_resolved());
        assert_ne!(empty, absent);
    }

    #[test]
    fn test_resolve_with_keeps_an_existing_target() {
        let mut kind = Type::resolved(vec!["Book".to_string()], "Book".to_string());
        assert!(!kind.resolve_with("Anthology".to_string()));
        assert_eq!(kind.target().map(String::as_str), Some("Book"));

        let mut pending = Type::pending(vec!["Report".to_string()]);
        assert!(pending.resolve_with("ReportResearch".to_string()));
        assert!(pending.is_resolved());
    }

    #[test]
    fn test_license_uses_its_own_wire_keys() {
        let pending: License = serde_json::from_str(r#"{"brageLicense":"CC BY"}"#).unwrap();
        assert_eq!(pending.origin, "CC BY");
        assert!(pending.is_pending());
        assert_eq!(
            serde_json::to_string(&pending).unwrap(),
            r#"{"brageLicense":"CC BY"}"#
        );

        let resolved = License::resolved("CC BY", "https://creativecommons.org/licenses/by/4.0/");
        assert_eq!(
            serde_json::to_string(&resolved).unwrap(),
            r#"{"brageLicense":"CC BY","nvaLicense":"https://creativecommons.org/licenses/by/4.0/"}"#
        );
    }

    #[test]
    fn test_license_accepts_capitalized_target_key() {
        let license: License =
            serde_json::from_str(r#"{"brageLicense":"CC0","NvaLicense":""}"#).unwrap();
        assert_eq!(license.target().map(String::as_str), Some(""));
        assert!(!license.is_resolved());
    }
}
