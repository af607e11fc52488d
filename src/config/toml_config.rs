use crate::core::validator::{UnknownTypePolicy, ValidationPolicy};
use crate::core::ConfigProvider;
use crate::utils::error::{MigrateError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_positive_number,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_ARCHIVE_NAME: &str = "migration.zip";

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub batch: BatchConfig,
    pub source: SourceConfig,
    pub mappings: MappingsConfig,
    pub validation: Option<ValidationConfig>,
    pub load: LoadConfig,
    pub performance: Option<PerformanceConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub name: String,
    pub description: Option<String>,
    /// Owning organization code, for the run summary.
    pub customer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingsConfig {
    pub lookup_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub unknown_type: Option<UnknownTypePolicy>,
    pub published_work_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub archive_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MigrateError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MigrateError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// `${VAR}` is replaced by the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("batch.name", &self.batch.name)?;
        validate_non_empty_string("source.input_file", &self.source.input_file)?;
        validate_path("load.output_path", &self.load.output_path)?;

        if self.mappings.lookup_files.is_empty() {
            return Err(MigrateError::MissingConfigError {
                field: "mappings.lookup_files".to_string(),
            });
        }
        validate_file_extensions(
            "mappings.lookup_files",
            &self.mappings.lookup_files,
            &["csv", "tsv"],
        )?;

        if let Some(concurrency) = self.performance.as_ref().and_then(|p| p.concurrency) {
            validate_positive_number("performance.concurrency", concurrency, 1)?;
        }

        validate_file_extensions(
            "load.archive_name",
            &[self.archive_name().to_string()],
            &["zip"],
        )?;

        if let Some(types) = self
            .validation
            .as_ref()
            .and_then(|v| v.published_work_types.as_ref())
        {
            for kind in types {
                validate_non_empty_string("validation.published_work_types", kind)?;
            }
        }

        Ok(())
    }

    pub fn concurrency(&self) -> usize {
        self.performance
            .as_ref()
            .and_then(|p| p.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn archive_name(&self) -> &str {
        self.load
            .archive_name
            .as_deref()
            .unwrap_or(DEFAULT_ARCHIVE_NAME)
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_file(&self) -> &str {
        &self.source.input_file
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn lookup_files(&self) -> &[String] {
        &self.mappings.lookup_files
    }

    fn concurrency(&self) -> usize {
        self.concurrency()
    }

    fn archive_name(&self) -> &str {
        self.archive_name()
    }

    fn validation_policy(&self) -> ValidationPolicy {
        let mut policy = ValidationPolicy::default();
        if let Some(validation) = &self.validation {
            if let Some(unknown_type) = validation.unknown_type {
                policy.unknown_type = unknown_type;
            }
            if let Some(types) = &validation.published_work_types {
                policy.published_work_types = types.clone();
            }
        }
        policy
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[batch]
name = "ntnu-2024"
customer = "ntnu"

[source]
input_file = "export/records.json"

[mappings]
lookup_files = ["tables/types.csv", "tables/roles.tsv"]

[load]
output_path = "./out"
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.batch.name, "ntnu-2024");
        assert_eq!(config.input_file(), "export/records.json");
        assert_eq!(config.lookup_files().len(), 2);
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(config.archive_name(), "migration.zip");
        assert_eq!(config.validation_policy(), ValidationPolicy::default());
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_sections_override_defaults() {
        let content = format!(
            "{}\n{}",
            BASIC,
            r#"
[validation]
unknown_type = "warn"
published_work_types = ["JournalArticle"]

[performance]
concurrency = 2

[logging]
json = true
"#
        );
        let config = TomlConfig::from_toml_str(&content).unwrap();
        let policy = config.validation_policy();

        assert_eq!(policy.unknown_type, UnknownTypePolicy::Warn);
        assert_eq!(policy.published_work_types, ["JournalArticle"]);
        assert_eq!(ConfigProvider::concurrency(&config), 2);
        assert!(config.json_logs());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BRAGE_MIGRATE_TEST_EXPORT", "/data/export.json");

        let content = BASIC.replace("export/records.json", "${BRAGE_MIGRATE_TEST_EXPORT}");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.source.input_file, "/data/export.json");

        std::env::remove_var("BRAGE_MIGRATE_TEST_EXPORT");

        let unknown = BASIC.replace("export/records.json", "${BRAGE_MIGRATE_UNSET_VAR}");
        let config = TomlConfig::from_toml_str(&unknown).unwrap();
        assert_eq!(config.source.input_file, "${BRAGE_MIGRATE_UNSET_VAR}");
    }

    #[test]
    fn test_config_validation() {
        let no_tables = BASIC.replace(
            r#"lookup_files = ["tables/types.csv", "tables/roles.tsv"]"#,
            "lookup_files = []",
        );
        let config = TomlConfig::from_toml_str(&no_tables).unwrap();
        assert!(matches!(
            config.validate(),
            Err(MigrateError::MissingConfigError { .. })
        ));

        let zero = format!("{}\n[performance]\nconcurrency = 0\n", BASIC);
        let config = TomlConfig::from_toml_str(&zero).unwrap();
        assert!(config.validate().is_err());

        let bad_policy = format!("{}\n[validation]\nunknown_type = \"ignore\"\n", BASIC);
        assert!(TomlConfig::from_toml_str(&bad_policy).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.batch.customer.as_deref(), Some("ntnu"));
    }
}
