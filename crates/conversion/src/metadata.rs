//! Model metadata table (`cmip6_meta.csv`).
//!
//! One row per (model, scenario, variable group) with the file naming
//! convention and the sampling frequency of the group. A `*` on the
//! frequency marks the group that defines the output time series.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use cmip_common::Frequency;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConversionError, Result};

/// File name of the metadata table inside the tables directory.
pub const META_TABLE: &str = "cmip6_meta.csv";

/// Marker flagging the output frequency in `var_frq`.
const OUTPUT_FREQUENCY_MARK: char = '*';

#[derive(Debug, Clone, Deserialize)]
struct MetaRow {
    model_name: String,
    scenario: String,
    variable_group: String,
    naming_convention: String,
    var_frq: String,
}

/// Scenario label used in the metadata table: every `ssp*` scenario shares
/// the `ssp` rows.
pub fn meta_scenario(scenario: &str) -> &str {
    if scenario.starts_with("ssp") {
        "ssp"
    } else {
        scenario
    }
}

/// Substitute `SCENARIO`, `YYYY` and `MM` in a naming convention.
pub fn resolve_file_name(convention: &str, scenario: &str, start: NaiveDateTime) -> String {
    convention
        .replace("SCENARIO", scenario)
        .replace("YYYY", &start.format("%Y").to_string())
        .replace("MM", &start.format("%m").to_string())
}

/// One input file and the variables it provides.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableGroup {
    pub name: String,
    pub path: PathBuf,
    pub frequency: Frequency,
    /// Whether this group's frequency defines the output series.
    pub defines_output: bool,
}

impl VariableGroup {
    /// Monthly groups hold static fields that are not sliced to the window.
    pub fn is_static(&self) -> bool {
        self.frequency == Frequency::Monthly
    }
}

/// The variable groups of one model and scenario.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    pub model_name: String,
    pub scenario: String,
    groups: Vec<VariableGroup>,
}

impl ModelMetadata {
    /// Select the rows of `model_name`/`scenario` from a metadata table.
    pub fn from_reader<R: Read>(
        reader: R,
        model_name: &str,
        scenario: &str,
        input_root: &Path,
        etl_start: NaiveDateTime,
    ) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let wanted = meta_scenario(scenario);
        let mut groups = Vec::new();
        for record in csv_reader.deserialize::<MetaRow>() {
            let row = record.map_err(|source| ConversionError::Table {
                path: PathBuf::from(META_TABLE),
                source,
            })?;
            if row.model_name != model_name || row.scenario != wanted {
                continue;
            }

            let frequency = Frequency::parse(&row.var_frq).map_err(|e| {
                ConversionError::config(format!("{} group {}: {}", META_TABLE, row.variable_group, e))
            })?;
            let file_name = resolve_file_name(&row.naming_convention, scenario, etl_start);
            groups.push(VariableGroup {
                name: row.variable_group,
                path: input_root.join(file_name),
                frequency,
                defines_output: row.var_frq.contains(OUTPUT_FREQUENCY_MARK),
            });
        }

        if groups.is_empty() {
            return Err(ConversionError::InvalidScenario {
                model: model_name.to_string(),
                scenario: scenario.to_string(),
            });
        }

        Ok(Self {
            model_name: model_name.to_string(),
            scenario: scenario.to_string(),
            groups,
        })
    }

    /// Load `cmip6_meta.csv` from `tables_dir`.
    pub fn load(
        tables_dir: &Path,
        model_name: &str,
        scenario: &str,
        input_root: &Path,
        etl_start: NaiveDateTime,
    ) -> Result<Self> {
        let path = tables_dir.join(META_TABLE);
        if !path.exists() {
            return Err(ConversionError::MissingFile(path));
        }
        let meta = Self::from_reader(File::open(&path)?, model_name, scenario, input_root, etl_start)?;
        debug!(
            model = %model_name,
            scenario = %scenario,
            groups = ?meta.group_names().collect::<Vec<_>>(),
            "Loaded model metadata"
        );
        Ok(meta)
    }

    pub fn groups(&self) -> &[VariableGroup] {
        &self.groups
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    /// Frequency of the first starred group.
    pub fn output_frequency(&self) -> Option<Frequency> {
        self.groups
            .iter()
            .find(|g| g.defines_output)
            .map(|g| g.frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use test_utils::fixtures::tables::META_CSV;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2040, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_resolve_file_name() {
        let name = resolve_file_name("atm_6hrLev_M_SCENARIO_YYYYMM.nc", "ssp245", start());
        assert_eq!(name, "atm_6hrLev_M_ssp245_204001.nc");
    }

    #[test]
    fn test_select_ssp_rows() {
        let meta = ModelMetadata::from_reader(
            META_CSV.as_bytes(),
            "TESTM",
            "ssp585",
            Path::new("/data"),
            start(),
        )
        .unwrap();

        assert_eq!(meta.group_names().collect::<Vec<_>>(), vec!["atm", "lnd"]);
        let atm = &meta.groups()[0];
        assert!(atm.defines_output);
        assert_eq!(
            atm.path,
            PathBuf::from("/data/atm_6hrLev_TESTM_ssp585_204001.nc")
        );
        assert!(!meta.groups()[1].defines_output);
        assert_eq!(
            meta.output_frequency(),
            Some(Frequency::Fixed(Duration::hours(6)))
        );
    }

    #[test]
    fn test_historical_rows() {
        let meta = ModelMetadata::from_reader(
            META_CSV.as_bytes(),
            "TESTM",
            "historical",
            Path::new("/data"),
            start(),
        )
        .unwrap();
        assert_eq!(meta.groups().len(), 1);
    }

    #[test]
    fn test_invalid_scenario() {
        let err = ModelMetadata::from_reader(
            META_CSV.as_bytes(),
            "TESTM",
            "piControl",
            Path::new("/data"),
            start(),
        )
        .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidScenario { .. }));
    }

    #[test]
    fn test_monthly_group_is_static() {
        let csv = "model_name,scenario,variable_group,naming_convention,var_frq\n\
                   M,ssp,fx,fx_M.nc,1M\n";
        let meta =
            ModelMetadata::from_reader(csv.as_bytes(), "M", "ssp126", Path::new("."), start())
                .unwrap();
        assert!(meta.groups()[0].is_static());
        assert_eq!(meta.output_frequency(), None);
    }
}
