use anyhow::Context;
use brage_migrate::core::vocabulary::FieldKind;
use brage_migrate::core::ConfigProvider;
use brage_migrate::utils::{logger, validation::Validate};
use brage_migrate::{LocalStorage, MigrationEngine, MigrationPipeline, TomlConfig, Vocabularies};
use clap::Parser;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-migrate")]
#[command(about = "Brage to NVA migration driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "migrate.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the concurrency setting from config
    #[arg(long)]
    concurrency: Option<usize>,

    /// Load config and mapping tables, report what would run, write nothing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    let verbose = args.verbose || config.verbose();
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }
    tracing::info!("📁 Loaded configuration from {}", args.config);

    if let Some(concurrency) = args.concurrency {
        config
            .performance
            .get_or_insert(brage_migrate::config::toml_config::PerformanceConfig {
                concurrency: None,
            })
            .concurrency = Some(concurrency);
        tracing::info!("🔧 Concurrency overridden to {}", concurrency);
    }

    if let Err(e) = config.validate() {
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        return Err(anyhow::Error::new(e).context("configuration validation failed"));
    }

    config.source.input_file = std::path::absolute(&config.source.input_file)
        .with_context(|| format!("cannot resolve input file '{}'", config.source.input_file))?
        .to_string_lossy()
        .into_owned();

    display_config_summary(&config, &args);

    let vocabularies = Vocabularies::load_files(config.lookup_files())
        .context("failed to load mapping tables")?;

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        perform_dry_run(&config, &vocabularies);
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = MigrationPipeline::new(storage, config, Arc::new(vocabularies));
    let engine = MigrationEngine::new(pipeline);

    let report = engine.run().await.context("migration run failed")?;
    let summary = report.summary;

    println!("✅ Migration finished: {}", report.archive_path);
    println!(
        "   {} records: {} migrated, {} pending mapping, {} rejected",
        summary.total, summary.migrated, summary.pending_mapping, summary.rejected
    );

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Batch: {}", config.batch.name);
    if let Some(customer) = &config.batch.customer {
        println!("  Customer: {}", customer);
    }
    println!("  Input: {}", config.input_file());
    println!("  Output: {}/{}", config.output_path(), config.archive_name());
    println!("  Lookup files: {}", config.lookup_files().len());
    println!("  Concurrency: {}", ConfigProvider::concurrency(config));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig, vocabularies: &Vocabularies) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("🔄 Mapping tables:");
    for kind in FieldKind::ALL {
        let rows = vocabularies.table(kind).map(|table| table.len()).unwrap_or(0);
        println!("  {:<10} {} origin keys", kind.as_str(), rows);
    }

    let policy = config.validation_policy();
    println!();
    println!("🛡️ Validation policy:");
    println!("  Unknown bundle labels: {:?}", policy.unknown_type);
    println!(
        "  Types needing a venue: {}",
        policy.published_work_types.join(", ")
    );

    println!();
    println!("✅ Dry run complete. Use --verbose for more details during an actual run.");
}
