pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::core::validator::{UnknownTypePolicy, ValidationPolicy};
    use crate::core::ConfigProvider;
    use crate::utils::error::{MigrateError, Result};
    use crate::utils::validation::{
        validate_file_extensions, validate_non_empty_string, validate_path,
        validate_positive_number, Validate,
    };
    use clap::Parser;

    pub const LOOKUP_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

    #[derive(Debug, Clone, Parser)]
    #[command(name = "brage-migrate")]
    #[command(about = "Migrates Brage records to NVA with mapping tables and validation")]
    pub struct CliConfig {
        /// Records JSON array; relative paths resolve against the output directory
        #[arg(long, default_value = "records.json")]
        pub input_file: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        /// Mapping tables (CSV or TSV, header `kind,origin,target`)
        #[arg(long, value_delimiter = ',')]
        pub lookup_files: Vec<String>,

        #[arg(long, default_value = "8")]
        pub concurrency: usize,

        #[arg(long, default_value = "migration.zip")]
        pub archive_name: String,

        /// Handling of content files with an unclassified bundle label
        #[arg(long, value_enum, default_value_t = UnknownTypePolicy::Hold)]
        pub unknown_type: UnknownTypePolicy,

        /// Target types that need a publisher or journal; the built-in list when omitted
        #[arg(long, value_delimiter = ',')]
        pub published_types: Vec<String>,

        /// Exit with an error when any record is rejected
        #[arg(long)]
        pub fail_on_rejected: bool,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    impl ConfigProvider for CliConfig {
        fn input_file(&self) -> &str {
            &self.input_file
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn lookup_files(&self) -> &[String] {
            &self.lookup_files
        }

        fn concurrency(&self) -> usize {
            self.concurrency
        }

        fn archive_name(&self) -> &str {
            &self.archive_name
        }

        fn validation_policy(&self) -> ValidationPolicy {
            let mut policy = ValidationPolicy {
                unknown_type: self.unknown_type,
                ..ValidationPolicy::default()
            };
            if !self.published_types.is_empty() {
                policy.published_work_types = self.published_types.clone();
            }
            policy
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_non_empty_string("input_file", &self.input_file)?;
            validate_path("output_path", &self.output_path)?;
            validate_positive_number("concurrency", self.concurrency, 1)?;

            if self.lookup_files.is_empty() {
                return Err(MigrateError::MissingConfigError {
                    field: "lookup_files".to_string(),
                });
            }
            validate_file_extensions("lookup_files", &self.lookup_files, &LOOKUP_EXTENSIONS)?;
            validate_file_extensions("archive_name", &[self.archive_name.clone()], &["zip"])?;
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(args: &[&str]) -> CliConfig {
            CliConfig::parse_from(std::iter::once("brage-migrate").chain(args.iter().copied()))
        }

        #[test]
        fn test_defaults_and_delimited_lookup_files() {
            let config = parse(&["--lookup-files", "types.csv,roles.tsv"]);

            assert_eq!(config.input_file(), "records.json");
            assert_eq!(config.concurrency(), 8);
            assert_eq!(config.lookup_files(), ["types.csv", "roles.tsv"]);
            assert_eq!(config.validation_policy(), ValidationPolicy::default());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_policy_flags() {
            let config = parse(&[
                "--lookup-files",
                "all.csv",
                "--unknown-type",
                "reject",
                "--published-types",
                "JournalArticle,Book",
            ]);
            let policy = config.validation_policy();

            assert_eq!(policy.unknown_type, UnknownTypePolicy::Reject);
            assert_eq!(policy.published_work_types, ["JournalArticle", "Book"]);
        }

        #[test]
        fn test_validation_failures() {
            let missing = parse(&[]);
            assert!(matches!(
                missing.validate(),
                Err(MigrateError::MissingConfigError { .. })
            ));

            let bad_extension = parse(&["--lookup-files", "types.xlsx"]);
            assert!(bad_extension.validate().is_err());

            let zero = parse(&["--lookup-files", "types.csv", "--concurrency", "0"]);
            assert!(zero.validate().is_err());

            let archive = parse(&["--lookup-files", "types.csv", "--archive-name", "out.tar"]);
            assert!(archive.validate().is_err());
        }
    }
}
