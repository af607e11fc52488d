use brage_migrate::config::cli::LocalStorage;
use brage_migrate::core::ConfigProvider;
use brage_migrate::utils::error::{ErrorSeverity, MigrateError};
use brage_migrate::utils::{logger, validation::Validate};
use brage_migrate::{CliConfig, MigrationEngine, MigrationPipeline, Vocabularies};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting brage-migrate");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        tracing::error!(
            "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(mut config: CliConfig) -> Result<(), MigrateError> {
    config.input_file = std::path::absolute(&config.input_file)
        .map_err(|e| MigrateError::ConfigError {
            message: format!("cannot resolve input file '{}': {}", config.input_file, e),
        })?
        .to_string_lossy()
        .into_owned();

    let vocabularies = Arc::new(Vocabularies::load_files(config.lookup_files())?);
    let fail_on_rejected = config.fail_on_rejected;

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = MigrationPipeline::new(storage, config, vocabularies);
    let engine = MigrationEngine::new(pipeline);

    let report = engine.run().await?;
    let summary = report.summary;

    tracing::info!("✅ Migration finished");
    println!("✅ Migration finished: {}", report.archive_path);
    println!(
        "   {} records: {} migrated, {} pending mapping, {} rejected",
        summary.total, summary.migrated, summary.pending_mapping, summary.rejected
    );

    if fail_on_rejected {
        report.ensure_no_rejections()?;
    }
    Ok(())
}
