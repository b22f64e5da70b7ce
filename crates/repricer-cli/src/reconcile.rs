//! The `reconcile` command: load, process, render, write.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use repricer_core::{AppConfig, ColumnNames};
use repricer_engine::{ReconcileRun, RunSettings};
use repricer_ledger::{load_catalog_file, ArtifactFormat};
use repricer_scraper::MarketplaceClient;

use crate::ReconcileArgs;

/// Reconciles one catalog file end to end.
///
/// Per-identifier fetch failures are reported in the comparison report and
/// do not fail the command. Structural problems with the input, and failures
/// writing either artifact, do.
pub(crate) async fn run_reconcile(config: &AppConfig, args: ReconcileArgs) -> anyhow::Result<()> {
    let names = column_names(config, &args);
    let settings = run_settings(config, &args);
    let report_format = ArtifactFormat::from_path(&args.report)
        .with_context(|| format!("unsupported report path {}", args.report.display()))?;

    let catalog = load_catalog_file(&args.input, &names)
        .with_context(|| format!("failed to load catalog {}", args.input.display()))?;
    let ledger_format = ArtifactFormat::from(catalog.format);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, ledger_format));

    let client = MarketplaceClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build marketplace client: {e}"))?;

    tracing::info!(
        input = %args.input.display(),
        output = %output.display(),
        report = %args.report.display(),
        markdown = %settings.markdown,
        concurrency = settings.concurrency,
        "starting reconcile run"
    );

    let mut run = ReconcileRun::from_catalog(catalog);
    run.process(&client, &settings).await?;

    // Each artifact is written independently; a failure in one does not stop
    // the other from landing on disk.
    let artifacts = run.render(&config.palette, report_format)?;
    let ledger_written = artifacts.write_ledger(&output);
    let report_written = artifacts.write_report(&args.report);
    if let Err(e) = &report_written {
        tracing::error!(error = %e, path = %args.report.display(), "report not written");
    }
    ledger_written.with_context(|| format!("failed to write ledger {}", output.display()))?;
    run.mark_delivered()?;
    report_written.with_context(|| format!("failed to write report {}", args.report.display()))?;

    let summary = run.summary();
    tracing::info!(
        total = summary.total,
        updated = summary.updated,
        unchanged = summary.unchanged,
        indeterminate = summary.indeterminate,
        fetch_failed = summary.fetch_failed,
        "reconcile run complete"
    );
    println!(
        "reconciled {} rows: {} updated, {} unchanged, {} indeterminate, {} fetch failures",
        summary.total,
        summary.updated,
        summary.unchanged,
        summary.indeterminate,
        summary.fetch_failed
    );
    println!("ledger: {}", output.display());
    println!("report: {}", args.report.display());
    Ok(())
}

fn column_names(config: &AppConfig, args: &ReconcileArgs) -> ColumnNames {
    ColumnNames {
        identifier: args
            .identifier_column
            .clone()
            .unwrap_or_else(|| config.columns.identifier.clone()),
        price: args
            .price_column
            .clone()
            .unwrap_or_else(|| config.columns.price.clone()),
    }
}

fn run_settings(config: &AppConfig, args: &ReconcileArgs) -> RunSettings {
    let mut settings = RunSettings::from_app_config(config);
    if let Some(markdown) = args.markdown {
        settings.markdown = markdown;
    }
    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency.max(1);
    }
    settings
}

/// `dir/catalog.xlsx` becomes `dir/updated_catalog.xlsx`.
pub(crate) fn default_output_path(input: &Path, format: ArtifactFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "catalog".into(), |s| s.to_string_lossy());
    let ext = match format {
        ArtifactFormat::Csv => "csv",
        ArtifactFormat::Xlsx => "xlsx",
    };
    input.with_file_name(format!("updated_{stem}.{ext}"))
}
