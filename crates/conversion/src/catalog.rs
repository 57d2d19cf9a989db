//! Variable tables.
//!
//! Each variable group of a model has a CSV table with the columns
//! `src_v, aim_v, type, lvlmark, units, desc`. Rows are validated when the
//! table is loaded: unknown `type` or `lvlmark` values reject the table.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use grid_processor::GridKind;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConversionError, Result};

/// Shape and grid family of a catalog variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum VariableKind {
    /// Single horizontal layer on a regular grid.
    TwoD,
    /// Emitted on every target pressure level.
    ThreeD,
    /// Soil-depth axis; one slab per soil band.
    Soil,
    /// Single layer repeated for every soil band.
    SoilRepeat,
    /// Ocean field on a curvilinear grid.
    Ocean,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::TwoD => "2d",
            VariableKind::ThreeD => "3d",
            VariableKind::Soil => "2d-soil",
            VariableKind::SoilRepeat => "2d-soil-repeat",
            VariableKind::Ocean => "ocean-2d",
        }
    }

    /// Regridding strategy for this kind.
    pub fn grid_kind(&self) -> GridKind {
        match self {
            VariableKind::TwoD | VariableKind::ThreeD => GridKind::Regular,
            VariableKind::Soil | VariableKind::SoilRepeat => GridKind::Soil,
            VariableKind::Ocean => GridKind::Curvilinear,
        }
    }
}

impl TryFrom<String> for VariableKind {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.trim() {
            "2d" => Ok(VariableKind::TwoD),
            "3d" => Ok(VariableKind::ThreeD),
            "2d-soil" => Ok(VariableKind::Soil),
            "2d-soil-repeat" => Ok(VariableKind::SoilRepeat),
            "ocean-2d" | "ocn2d" => Ok(VariableKind::Ocean),
            other => Err(format!("unknown variable type '{}'", other)),
        }
    }
}

/// Vertical coordinate of the source variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LevelMarking {
    None,
    /// Model hybrid levels (`Lev`).
    Hybrid,
    /// Pressure levels (`PlevPt`, `Plev`).
    Pressure,
}

impl TryFrom<String> for LevelMarking {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.trim() {
            "" | "None" | "none" => Ok(LevelMarking::None),
            "Lev" => Ok(LevelMarking::Hybrid),
            "PlevPt" | "Plev" => Ok(LevelMarking::Pressure),
            other => Err(format!("unknown level marking '{}'", other)),
        }
    }
}

/// One row of a variable table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableSpec {
    /// Variable name in the model files.
    #[serde(rename = "src_v")]
    pub source_name: String,
    /// Field name written to the intermediate file.
    #[serde(rename = "aim_v")]
    pub target_name: String,
    #[serde(rename = "type")]
    pub kind: VariableKind,
    #[serde(rename = "lvlmark")]
    pub level_marking: LevelMarking,
    pub units: String,
    #[serde(rename = "desc")]
    pub description: String,
    /// Variable group the row was loaded from.
    #[serde(skip)]
    pub group: String,
}

/// Parse one variable table.
pub fn read_table<R: Read>(reader: R, group: &str, path: &Path) -> Result<Vec<VariableSpec>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut specs = Vec::new();
    for record in csv_reader.deserialize::<VariableSpec>() {
        let mut spec = record.map_err(|source| ConversionError::Table {
            path: path.to_path_buf(),
            source,
        })?;
        if spec.source_name.is_empty() || spec.target_name.is_empty() {
            return Err(ConversionError::InvalidTable {
                path: path.to_path_buf(),
                reason: "src_v and aim_v must not be empty".to_string(),
            });
        }
        spec.group = group.to_string();
        specs.push(spec);
    }
    Ok(specs)
}

/// Load the table `{model}_{group}.csv` from `tables_dir`.
pub fn load_table(tables_dir: &Path, model_name: &str, group: &str) -> Result<Vec<VariableSpec>> {
    let path = tables_dir.join(format!("{}_{}.csv", model_name, group));
    if !path.exists() {
        return Err(ConversionError::MissingFile(path));
    }
    let specs = read_table(File::open(&path)?, group, &path)?;
    debug!(path = %path.display(), variables = specs.len(), "Loaded variable table");
    Ok(specs)
}

/// All variables of a run, in table order.
#[derive(Debug, Clone, Default)]
pub struct VariableCatalog {
    specs: Vec<VariableSpec>,
}

impl VariableCatalog {
    /// Build a catalog; source names must be unique.
    pub fn new(specs: Vec<VariableSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.source_name.as_str()) {
                return Err(ConversionError::config(format!(
                    "variable {} appears in more than one table row",
                    spec.source_name
                )));
            }
        }
        Ok(Self { specs })
    }

    /// Load and concatenate the tables of `groups`, in order.
    pub fn load<'a>(
        tables_dir: &Path,
        model_name: &str,
        groups: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let mut specs = Vec::new();
        for group in groups {
            specs.extend(load_table(tables_dir, model_name, group)?);
        }
        Self::new(specs)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Variables loaded from `group`.
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a VariableSpec> + 'a {
        self.specs.iter().filter(move |s| s.group == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> Result<Vec<VariableSpec>> {
        read_table(csv.as_bytes(), "atm", Path::new("TESTM_atm.csv"))
    }

    #[test]
    fn test_parse_rows() {
        let specs = parse(
            "src_v,aim_v,type,lvlmark,units,desc\n\
             ta,TT,3d,Lev,K,Temperature\n\
             tsl,ST,2d-soil,None,K,Soil temperature\n\
             tos,SST,ocn2d,,degC,Sea surface temperature\n\
             hus,SPECHUMD,2d,PlevPt,kg kg-1,Specific humidity\n",
        )
        .unwrap();

        assert_eq!(specs.len(), 4);
        assert_eq!(specs[0].kind, VariableKind::ThreeD);
        assert_eq!(specs[0].level_marking, LevelMarking::Hybrid);
        assert_eq!(specs[1].kind, VariableKind::Soil);
        assert_eq!(specs[1].level_marking, LevelMarking::None);
        assert_eq!(specs[2].kind, VariableKind::Ocean);
        assert_eq!(specs[2].level_marking, LevelMarking::None);
        assert_eq!(specs[3].level_marking, LevelMarking::Pressure);
        assert_eq!(specs[3].units, "kg kg-1");
        assert!(specs.iter().all(|s| s.group == "atm"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = parse("src_v,aim_v,type,lvlmark,units,desc\nx,X,4d,None,1,x\n").unwrap_err();
        assert!(matches!(err, ConversionError::Table { .. }));
        assert!(err.to_string().contains("4d"));
    }

    #[test]
    fn test_unknown_marking_rejected() {
        let err = parse("src_v,aim_v,type,lvlmark,units,desc\nx,X,2d,Sigma,1,x\n").unwrap_err();
        assert!(matches!(err, ConversionError::Table { .. }));
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let mut specs = parse("src_v,aim_v,type,lvlmark,units,desc\nta,TT,3d,Lev,K,T\n").unwrap();
        specs.push(specs[0].clone());
        assert!(matches!(
            VariableCatalog::new(specs),
            Err(ConversionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_grid_kinds() {
        assert_eq!(VariableKind::ThreeD.grid_kind(), GridKind::Regular);
        assert_eq!(VariableKind::SoilRepeat.grid_kind(), GridKind::Soil);
        assert_eq!(VariableKind::Ocean.grid_kind(), GridKind::Curvilinear);
    }
}
