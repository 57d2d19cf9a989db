//! CMIP6 to WRF intermediate converter.
//!
//! Reads one model's CMIP6 files over the configured ETL window and writes
//! a WRF intermediate file, plus an SST-only companion, for every output
//! timestamp.

mod timing;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cmip_common::file_stamp;
use conversion::{
    ConversionError, ConversionPipeline, ErrorKind, ModelMetadata, OutputLayout, RunConfig,
    SourceDataStore, VariableCatalog,
};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use timing::StageTimer;

#[derive(Parser, Debug)]
#[command(name = "cmip2wrf")]
#[command(about = "Convert CMIP6 model output to WRF intermediate files")]
struct Args {
    /// Run configuration file
    #[arg(short, long, env = "CMIP2WRF_CONFIG", default_value = "config/cmip2wrf.yaml")]
    config: PathBuf,

    /// Model to convert (overrides input.model_name)
    #[arg(short, long)]
    model: Option<String>,

    /// Log level (overrides logging.level)
    #[arg(long)]
    log_level: Option<String>,

    /// Do not write the SST-only files
    #[arg(long)]
    no_sst: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            // The file never told us how to log; use the defaults.
            if init_tracing("info", "json").is_err() {
                eprintln!("{:#}", e);
            }
            error!(error = %format!("{:#}", e), "Invalid configuration");
            return ExitCode::from(exit_status(&e));
        }
    };

    if let Err(e) = init_tracing(&config.logging.level, &config.logging.format) {
        eprintln!("failed to initialise logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Conversion failed");
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Load the configuration file and apply the command-line overrides.
fn load_config(args: &Args) -> Result<RunConfig> {
    let mut config = RunConfig::load(&args.config)
        .with_context(|| format!("loading configuration {}", args.config.display()))?;

    if let Some(model) = &args.model {
        config.input.model_name = model.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.to_lowercase();
    }
    if args.no_sst {
        config.output.write_sst = false;
    }
    config.validate().context("validating command-line overrides")?;
    Ok(config)
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if format == "pretty" {
        tracing::subscriber::set_global_default(builder.pretty().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    }
    Ok(())
}

fn run(config: &RunConfig) -> Result<()> {
    let mut timer = StageTimer::start();
    let (start, end) = config.etl_window()?;
    info!(
        model = %config.input.model_name,
        scenario = %config.input.scenario,
        start = %start,
        end = %end,
        "Starting conversion"
    );

    let meta = ModelMetadata::load(
        &config.input.tables_dir,
        &config.input.model_name,
        &config.input.scenario,
        &config.input.input_root,
        start,
    )
    .context("reading model metadata")?;
    let catalog = VariableCatalog::load(
        &config.input.tables_dir,
        &config.input.model_name,
        meta.group_names(),
    )
    .context("reading variable tables")?;
    info!(
        groups = ?meta.group_names().collect::<Vec<_>>(),
        variables = catalog.len(),
        "Loaded variable catalog"
    );
    timer.toc("read tables");

    let store = SourceDataStore::load(&meta, &catalog, start, end)
        .context("loading source data")?;
    timer.toc("load source data");

    let geometry = config.geometry()?;
    let series = config.time_series(&meta)?;
    info!(
        timestamps = series.len(),
        levels = geometry.levels.len(),
        "Built output time series"
    );

    let layout = OutputLayout::new(
        &config.output.output_root,
        &config.input.model_name,
        config.output.write_sst,
    );
    let reports = ConversionPipeline::new(&catalog, &store, &geometry)
        .run(&series, &layout)
        .context("converting timestamps")?;

    for report in &reports {
        timer.record(
            format!("{} convert", file_stamp(report.time)),
            report.convert_elapsed,
        );
        timer.record(
            format!("{} write", file_stamp(report.time)),
            report.write_elapsed,
        );
    }
    timer.lap();

    let records: usize = reports.iter().map(|r| r.records).sum();
    info!(
        timestamps = reports.len(),
        records,
        output = %layout.root().display(),
        "Conversion completed"
    );
    timer.log_summary();
    Ok(())
}

/// Distinct exit status per error class.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ConversionError>().map(ConversionError::kind) {
        Some(ErrorKind::Configuration) => 2,
        Some(ErrorKind::Data) => 3,
        Some(ErrorKind::Output) => 4,
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "cmip2wrf",
            "--config",
            "run.yaml",
            "--model",
            "EC-Earth3",
            "--log-level",
            "debug",
            "--no-sst",
        ]);
        assert_eq!(args.config, PathBuf::from("run.yaml"));
        assert_eq!(args.model.as_deref(), Some("EC-Earth3"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.no_sst);
    }

    #[test]
    fn test_exit_status_follows_error_kind() {
        let err = anyhow::Error::new(ConversionError::config("bad")).context("loading");
        assert_eq!(exit_status(&err), 2);
        assert_eq!(exit_status(&anyhow::anyhow!("other")), 1);
    }
}
