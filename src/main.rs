// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use dedupe_lib::export::write_records_csv_path;
use dedupe_lib::extraction::{extract_records, read_csv_path};
use dedupe_lib::matching::{bucket_by_company, deduplicate};
use dedupe_lib::models::{ColumnMapping, CustomerRecord, KeyStrategy};
use dedupe_lib::standardization::{
    apply_standardization, BatchOperation, CancellationToken, HttpStandardizationClient, StandardizationConfig,
    StandardizationOrchestrator, StandardizationService,
};
use dedupe_lib::utils::env::load_env;
use dedupe_lib::utils::progress_bars::progress_config::{close_bar, ProgressConfig};
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Merge customer lists and flag duplicate customers", long_about = None)]
struct Args {
    /// JSON job file listing the input CSVs and their column mappings
    #[arg(long)]
    job: PathBuf,

    /// Where to write the deduplicated CSV
    #[arg(long)]
    output: PathBuf,

    /// Grouping key: loose (name + full address) or strict (name + address line 1 + city)
    #[arg(long, default_value_t = KeyStrategy::Loose)]
    strategy: KeyStrategy,

    /// Also write customer_names.csv and customer_locations.csv into this directory
    #[arg(long)]
    buckets: Option<PathBuf>,

    /// Standardize names and addresses through the remote service
    #[arg(long)]
    standardize: bool,

    /// Ask the remote service for fuzzy duplicate groups
    #[arg(long)]
    find_duplicates: bool,

    /// Only check that the standardization service is reachable
    #[arg(long)]
    health_check: bool,
}

#[derive(Debug, Deserialize)]
struct JobConfig {
    inputs: Vec<JobInput>,
}

#[derive(Debug, Deserialize)]
struct JobInput {
    path: PathBuf,
    source: String,
    mapping: ColumnMapping,
}

fn load_job(path: &Path) -> Result<JobConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read job file {}", path.display()))?;
    let mut job: JobConfig =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse job file {}", path.display()))?;
    // input paths are relative to the job file
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for input in &mut job.inputs {
        if input.path.is_relative() {
            input.path = base.join(&input.path);
        }
    }
    Ok(job)
}

fn extract_all(job: &JobConfig) -> Result<(Vec<CustomerRecord>, usize)> {
    let mut records = Vec::new();
    let mut skipped = 0;
    for input in &job.inputs {
        let file = read_csv_path(&input.path)?;
        let extraction = extract_records(&file, &input.mapping, &input.source)
            .with_context(|| format!("Invalid column mapping for {}", input.path.display()))?;
        info!(
            "Extracted {} records from '{}' ({} rows skipped)",
            extraction.records.len(),
            input.source,
            extraction.skipped_rows
        );
        skipped += extraction.skipped_rows;
        records.extend(extraction.records);
    }
    Ok((records, skipped))
}

async fn run_health_check(config: &StandardizationConfig) -> Result<()> {
    let client = HttpStandardizationClient::new(config).context("Cannot build standardization client")?;
    let health = client.health_check().await.context("Health check failed")?;
    if health.is_healthy() {
        info!("Standardization service is healthy");
    } else {
        warn!(
            "Standardization service reports status={:?}, api_configured={}",
            health.status, health.api_configured
        );
    }
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}

async fn run_standardization(
    records: &mut [CustomerRecord],
    args: &Args,
    config: StandardizationConfig,
    progress_config: &ProgressConfig,
) -> Result<()> {
    let client = HttpStandardizationClient::new(&config).context("Cannot build standardization client")?;
    let token = CancellationToken::new();
    let on_ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current batch");
            on_ctrl_c.cancel();
        }
    });
    let pb = progress_config.create_bar("Standardization service");
    let mut orchestrator = StandardizationOrchestrator::new(client, config).with_cancellation(token);
    if let Some(pb) = &pb {
        orchestrator = orchestrator.with_progress(progress_config.callback_for(pb));
    }

    if args.standardize {
        let outcome = orchestrator.standardize_batch(records, BatchOperation::Full).await;
        for (record, result) in records.iter_mut().zip(&outcome.results) {
            apply_standardization(record, result);
        }
        info!(
            "Standardized {} of {} records ({} used local fallback)",
            outcome.results.len(),
            records.len(),
            outcome.stats.fallback_records
        );
        if let Some(cancelled) = outcome.cancelled {
            warn!("{}", cancelled);
            close_bar(pb, false, "Standardization cancelled");
            return Ok(());
        }
    }

    if args.find_duplicates {
        let outcome = orchestrator.find_duplicates(records).await;
        info!("Service reported {} fuzzy duplicate groups", outcome.groups.len());
        for group in &outcome.groups {
            let names: Vec<&str> = group
                .member_indices
                .iter()
                .map(|&i| records[i].customer_name.as_str())
                .collect();
            info!(
                "  {:.2} '{}' <- {:?} ({})",
                group.confidence, records[group.canonical_index].customer_name, names, group.reasoning
            );
        }
        if let Some(cancelled) = outcome.cancelled {
            warn!("{}", cancelled);
            close_bar(pb, false, "Duplicate finding cancelled");
            return Ok(());
        }
    }

    close_bar(pb, true, "Standardization complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    load_env();

    let run_id = Uuid::new_v4().to_string();
    info!("Starting customer dedupe run {}", run_id);
    let started = Instant::now();

    let config = StandardizationConfig::from_env();
    if args.health_check {
        config.log_config();
        return run_health_check(&config).await;
    }

    let progress_config = ProgressConfig::from_env();
    debug!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );

    let job = load_job(&args.job)?;
    let (records, skipped) = extract_all(&job)?;
    info!("Extracted {} records in total, {} rows skipped", records.len(), skipped);

    let result = deduplicate(records, args.strategy);
    info!(
        "{} unique, {} duplicates in {} groups, {} with similar addresses",
        result.stats.unique_records,
        result.stats.duplicate_records,
        result.stats.groups_with_duplicates,
        result.stats.similar_address_records
    );

    let mut selected = result.selected_records();
    if args.standardize || args.find_duplicates {
        config.log_config();
        run_standardization(&mut selected, &args, config, &progress_config).await?;
    }

    write_records_csv_path(&args.output, &selected, args.standardize)?;
    info!("Wrote {} records to {}", selected.len(), args.output.display());

    if let Some(dir) = &args.buckets {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let buckets = bucket_by_company(&selected);
        write_records_csv_path(&dir.join("customer_names.csv"), &buckets.customer_names, args.standardize)?;
        write_records_csv_path(&dir.join("customer_locations.csv"), &buckets.customer_locations, args.standardize)?;
        info!(
            "Wrote {} company rows and {} location rows to {}",
            buckets.customer_names.len(),
            buckets.customer_locations.len(),
            dir.display()
        );
    }

    info!("Run {} finished in {:.2?}", run_id, started.elapsed());
    Ok(())
}
