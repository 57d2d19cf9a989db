//! Run configuration.
//!
//! Loaded from YAML with `${VAR}` and `${VAR:-default}` substitution, then
//! validated before anything is read from disk.
//!
//! ```yaml
//! input:
//!   model_name: MPI-ESM1-2-HR
//!   scenario: ssp585
//!   input_root: ~/cmip6/MPI-ESM1-2-HR
//!   tables_dir: ./db
//! output:
//!   output_root: ${CMIP2WRF_OUTPUT:-./output}
//!   etl_start: "204001010000"
//!   etl_end: "204001020000"
//! logging:
//!   level: info
//!   format: json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use cmip_common::{
    parse_etl_timestamp, CommonMesh, Frequency, PressureLevelSet, RunGeometry, TimeSeries,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Result};
use crate::metadata::ModelMetadata;

macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err(ConversionError::config(format!($($arg)+)));
        }
    };
}

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["json", "pretty"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub model_name: String,
    pub scenario: String,
    pub input_root: PathBuf,
    /// Directory holding `cmip6_meta.csv` and the variable tables.
    pub tables_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_root: PathBuf,
    /// Window start, `YYYYMMDDHHMM`.
    pub etl_start: String,
    /// Window end (inclusive), `YYYYMMDDHHMM`.
    pub etl_end: String,
    #[serde(default = "default_write_sst")]
    pub write_sst: bool,
    /// Output step overriding the starred metadata frequency, e.g. `6H`.
    #[serde(default)]
    pub frequency: Option<String>,
}

fn default_write_sst() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Target pressure levels in hPa, surface to top.
    #[serde(default)]
    pub pressure_levels_hpa: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl RunConfig {
    /// Read, expand and validate the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConversionError::MissingFile(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let mut config: RunConfig = serde_yaml::from_str(&expanded)?;

        config.input.input_root = expand_home(&config.input.input_root)?;
        config.input.tables_dir = expand_home(&config.input.tables_dir)?;
        config.output.output_root = expand_home(&config.output.output_root)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.input.model_name.trim().is_empty(), "model_name cannot be empty");
        ensure!(!self.input.scenario.trim().is_empty(), "scenario cannot be empty");

        let (start, end) = self.etl_window()?;
        ensure!(
            start <= end,
            "etl_start {} is after etl_end {}",
            self.output.etl_start,
            self.output.etl_end
        );

        if let Some(freq) = &self.output.frequency {
            fixed_step(freq)?;
        }
        self.pressure_levels()?;

        ensure!(
            VALID_LEVELS.contains(&self.logging.level.as_str()),
            "Invalid log level: {}. Must be one of: {:?}",
            self.logging.level,
            VALID_LEVELS
        );
        ensure!(
            VALID_FORMATS.contains(&self.logging.format.as_str()),
            "Invalid log format: {}. Must be one of: {:?}",
            self.logging.format,
            VALID_FORMATS
        );
        Ok(())
    }

    /// Inclusive ETL window bounds.
    pub fn etl_window(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let start = parse_etl_timestamp(&self.output.etl_start)
            .map_err(|e| ConversionError::config(format!("etl_start: {}", e)))?;
        let end = parse_etl_timestamp(&self.output.etl_end)
            .map_err(|e| ConversionError::config(format!("etl_end: {}", e)))?;
        Ok((start, end))
    }

    pub fn pressure_levels(&self) -> Result<PressureLevelSet> {
        match &self.geometry.pressure_levels_hpa {
            Some(levels) => PressureLevelSet::from_hpa(levels)
                .map_err(|e| ConversionError::config(format!("pressure_levels_hpa: {}", e))),
            None => Ok(PressureLevelSet::standard()),
        }
    }

    /// Mesh and levels shared by every component of the run.
    pub fn geometry(&self) -> Result<RunGeometry> {
        Ok(RunGeometry::new(CommonMesh::global(), self.pressure_levels()?))
    }

    /// Output series over the ETL window, stepped by the configured
    /// frequency or the starred metadata group.
    pub fn time_series(&self, meta: &ModelMetadata) -> Result<TimeSeries> {
        let step = match &self.output.frequency {
            Some(freq) => fixed_step(freq)?,
            None => match meta.output_frequency() {
                Some(Frequency::Fixed(step)) => step,
                Some(Frequency::Monthly) => {
                    return Err(ConversionError::config(
                        "output frequency must be a fixed step, not monthly",
                    ))
                }
                None => {
                    return Err(ConversionError::config(format!(
                        "no variable group of {} is marked with the output frequency",
                        meta.model_name
                    )))
                }
            },
        };
        let (start, end) = self.etl_window()?;
        TimeSeries::new(start, end, step).map_err(|e| ConversionError::config(e.to_string()))
    }
}

fn fixed_step(freq: &str) -> Result<Duration> {
    match Frequency::parse(freq) {
        Ok(Frequency::Fixed(step)) => Ok(step),
        Ok(Frequency::Monthly) => Err(ConversionError::config(format!(
            "output frequency {} must be a fixed step",
            freq
        ))),
        Err(e) => Err(ConversionError::config(e.to_string())),
    }
}

fn expand_home(path: &Path) -> Result<PathBuf> {
    let raw = path
        .to_str()
        .ok_or_else(|| ConversionError::config(format!("path {:?} is not valid UTF-8", path)))?;
    Ok(PathBuf::from(shellexpand::tilde(raw).into_owned()))
}

/// Expand environment variables in YAML content.
/// Supports ${VAR} and ${VAR:-default} syntax.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut var_expr = String::new();
        let mut depth = 1;
        while depth > 0 {
            match chars.next() {
                Some('{') => {
                    depth += 1;
                    var_expr.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth > 0 {
                        var_expr.push('}');
                    }
                }
                Some(c) => var_expr.push(c),
                None => {
                    return Err(ConversionError::config(format!(
                        "Unclosed variable substitution: ${{{}",
                        var_expr
                    )))
                }
            }
        }
        result.push_str(&resolve_var_expr(&var_expr)?);
    }

    Ok(result)
}

/// Resolve `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).map_err(|_| {
            ConversionError::config(format!("Environment variable {} not set", expr.trim()))
        })
    }
}
