use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Mapping table {source_name} line {line}: {reason}")]
    MappingTableError {
        source_name: String,
        line: u64,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    MappingTable,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MigrateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MigrateError::ConfigError { .. }
            | MigrateError::ConfigValidationError { .. }
            | MigrateError::InvalidConfigValueError { .. }
            | MigrateError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MigrateError::MappingTableError { .. } | MigrateError::CsvError(_) => {
                ErrorCategory::MappingTable
            }
            MigrateError::IoError(_) | MigrateError::ZipError(_) => ErrorCategory::Storage,
            MigrateError::SerializationError(_)
            | MigrateError::ProcessingError { .. }
            | MigrateError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::MappingTable => ErrorSeverity::High,
            ErrorCategory::Data => match self {
                MigrateError::ValidationError { .. } => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MigrateError::MappingTableError { .. } | MigrateError::CsvError(_) => {
                "Check the lookup file: header must be kind,origin,target and every origin key unique per kind"
            }
            MigrateError::SerializationError(_) => {
                "Check that the input file is a JSON array of records produced by the extractor"
            }
            MigrateError::IoError(_) => "Check that the input exists and the output path is writable",
            MigrateError::ZipError(_) => "Check free disk space in the output directory",
            MigrateError::ConfigError { .. }
            | MigrateError::ConfigValidationError { .. }
            | MigrateError::InvalidConfigValueError { .. }
            | MigrateError::MissingConfigError { .. } => {
                "Fix the configuration value named in the message and run again"
            }
            MigrateError::ProcessingError { .. } => "Re-run with --verbose to see which record failed",
            MigrateError::ValidationError { .. } => "Inspect manifest.csv for the per-record reasons",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::MappingTable => format!("Mapping table could not be loaded: {}", self),
            ErrorCategory::Storage => format!("Could not read or write files: {}", self),
            ErrorCategory::Data => format!("Migration data problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
