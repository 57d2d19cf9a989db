//! Source data held for the whole run.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use grid_processor::HybridCoefficients;
use netcdf_parser::{CmipDataset, SourceField, VerticalHint};
use tracing::{debug, info};

use crate::catalog::{LevelMarking, VariableCatalog, VariableSpec};
use crate::error::{ConversionError, Result};
use crate::metadata::{ModelMetadata, VariableGroup};

/// Name of the surface pressure variable that accompanies hybrid fields.
pub const SURFACE_PRESSURE_VAR: &str = "ps";

/// What a hybrid-level field needs to be put on pressure levels.
#[derive(Debug, Clone)]
pub struct HybridInputs {
    pub coefficients: HybridCoefficients,
    pub surface_pressure: SourceField,
}

/// Per-variable source fields, sliced to the ETL window at load time.
///
/// Read-only once loaded; the pipeline takes nearest-time snapshots.
#[derive(Debug, Clone, Default)]
pub struct SourceDataStore {
    fields: HashMap<String, SourceField>,
    hybrid: Option<HybridInputs>,
}

impl SourceDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every catalog variable from the group files of `meta`.
    pub fn load(
        meta: &ModelMetadata,
        catalog: &VariableCatalog,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self> {
        let mut store = Self::new();
        for group in meta.groups() {
            let specs: Vec<&VariableSpec> = catalog.group(&group.name).collect();
            if specs.is_empty() {
                continue;
            }
            store.load_group(group, &specs, start, end)?;
        }
        Ok(store)
    }

    fn load_group(
        &mut self,
        group: &VariableGroup,
        specs: &[&VariableSpec],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<()> {
        if !group.path.exists() {
            return Err(ConversionError::MissingFile(group.path.clone()));
        }
        let dataset = CmipDataset::open(&group.path)?;
        info!(
            group = %group.name,
            path = %group.path.display(),
            variables = specs.len(),
            "Loading variable group"
        );

        let slice = |field: SourceField| -> Result<SourceField> {
            if group.is_static() {
                Ok(field)
            } else {
                Ok(field.within(start, end)?)
            }
        };

        for spec in specs {
            let hint = match spec.level_marking {
                LevelMarking::None => VerticalHint::Auto,
                LevelMarking::Hybrid => VerticalHint::Hybrid,
                LevelMarking::Pressure => VerticalHint::Pressure,
            };
            let mut field = read_variable(&dataset, &spec.source_name, hint)?;
            // Rules and labels follow the table, not the file attribute.
            field.units = spec.units.clone();
            let field = slice(field)?;

            if spec.level_marking == LevelMarking::Hybrid && self.hybrid.is_none() {
                let terms = dataset.read_hybrid_terms()?;
                let coefficients = HybridCoefficients::new(terms.ap, terms.b)?;
                let ps = read_variable(&dataset, SURFACE_PRESSURE_VAR, VerticalHint::Auto)?;
                debug!(levels = coefficients.len(), "Loaded hybrid coefficients");
                self.hybrid = Some(HybridInputs {
                    coefficients,
                    surface_pressure: slice(ps)?,
                });
            }

            debug!(
                variable = %spec.source_name,
                snapshots = field.snapshot_count(),
                "Stored source field"
            );
            self.fields.insert(spec.source_name.clone(), field);
        }
        Ok(())
    }

    pub fn insert(&mut self, field: SourceField) {
        self.fields.insert(field.name.clone(), field);
    }

    /// The stored series of `name`.
    pub fn field(&self, name: &str) -> Result<&SourceField> {
        self.fields
            .get(name)
            .ok_or_else(|| ConversionError::NotLoaded(name.to_string()))
    }

    pub fn hybrid(&self) -> Option<&HybridInputs> {
        self.hybrid.as_ref()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn read_variable(dataset: &CmipDataset, name: &str, hint: VerticalHint) -> Result<SourceField> {
    if !dataset.has_variable(name) {
        return Err(ConversionError::MissingVariable {
            variable: name.to_string(),
            path: dataset.path().to_path_buf(),
        });
    }
    Ok(dataset.read_field(name, hint)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmip_common::{NativeGrid, VerticalAxis};

    fn series(name: &str) -> SourceField {
        SourceField {
            name: name.to_string(),
            units: "K".to_string(),
            times: Vec::new(),
            grid: NativeGrid::Regular {
                lats: vec![0.0],
                lons: vec![0.0],
            },
            vertical: VerticalAxis::Single,
            data: vec![1.0],
        }
    }

    #[test]
    fn test_field_lookup() {
        let mut store = SourceDataStore::new();
        store.insert(series("tas"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.field("tas").unwrap().units, "K");
        assert!(matches!(store.field("pr"), Err(ConversionError::NotLoaded(_))));
        assert!(store.hybrid().is_none());
    }
}
