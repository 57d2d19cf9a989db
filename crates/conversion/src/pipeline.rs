//! The per-timestamp conversion pipeline.
//!
//! For each output time the pipeline converts every catalog variable
//! (nearest snapshot, hybrid to pressure, unit normalization, regrid) and
//! only then writes the slabs, so a failing variable leaves no output for
//! that time.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use cmip_common::{
    file_stamp, soil_band_index, Field, RunGeometry, TimeSeries, VerticalAxis, SOIL_BAND_LABELS,
    SURFACE_LEVEL,
};
use grid_processor::{HybridToPressure, Regridder, UnitNormalizer};
use tracing::{debug, info};
use wrf_intermediate::{IntermediateFile, OutputSlab};

use crate::catalog::{LevelMarking, VariableCatalog, VariableKind, VariableSpec};
use crate::error::{ConversionError, Result};
use crate::store::SourceDataStore;

/// Field name of the slabs copied to the SST-only file.
pub const SST_FIELD: &str = "SST";

/// Name of the file listing processed timestamps.
pub const TIMELIST_FILE: &str = "timelist";

/// Where the files of a run go.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    model_name: String,
    write_sst: bool,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, model_name: impl Into<String>, write_sst: bool) -> Self {
        Self {
            root: root.into(),
            model_name: model_name.into(),
            write_sst,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{model}:{YYYY-MM-DD_HH}`
    pub fn main_path(&self, t: NaiveDateTime) -> PathBuf {
        self.root
            .join(format!("{}:{}", self.model_name, file_stamp(t)))
    }

    /// `{root}/{model}_SST:{YYYY-MM-DD_HH}`, when SST files are written.
    pub fn sst_path(&self, t: NaiveDateTime) -> Option<PathBuf> {
        self.write_sst.then(|| {
            self.root
                .join(format!("{}_{}:{}", self.model_name, SST_FIELD, file_stamp(t)))
        })
    }

    pub fn timelist_path(&self) -> PathBuf {
        self.root.join(TIMELIST_FILE)
    }

    /// Append one stamp per line to the timelist file.
    pub fn append_timelist(&self, times: &[NaiveDateTime]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.timelist_path())?;
        for t in times {
            writeln!(file, "{}", file_stamp(*t))?;
        }
        Ok(())
    }
}

/// A catalog variable converted for one timestamp.
#[derive(Debug, Clone)]
pub struct ConvertedField<'c> {
    pub spec: &'c VariableSpec,
    pub field: Field,
}

/// Outcome of one processed timestamp.
#[derive(Debug, Clone)]
pub struct TimestampReport {
    pub time: NaiveDateTime,
    pub main_path: PathBuf,
    pub sst_path: Option<PathBuf>,
    pub records: usize,
    pub sst_records: usize,
    pub convert_elapsed: Duration,
    pub write_elapsed: Duration,
}

/// Drives conversion and encoding over the output time series.
pub struct ConversionPipeline<'a> {
    catalog: &'a VariableCatalog,
    store: &'a SourceDataStore,
    geometry: &'a RunGeometry,
    normalizer: UnitNormalizer,
}

impl<'a> ConversionPipeline<'a> {
    pub fn new(
        catalog: &'a VariableCatalog,
        store: &'a SourceDataStore,
        geometry: &'a RunGeometry,
    ) -> Self {
        Self {
            catalog,
            store,
            geometry,
            normalizer: UnitNormalizer::new(),
        }
    }

    /// Nearest snapshot, hybrid conversion, unit normalization and regrid
    /// of one variable.
    pub fn convert_variable(&self, spec: &VariableSpec, t: NaiveDateTime) -> Result<Field> {
        let mut field = self.store.field(&spec.source_name)?.nearest(t)?;

        if spec.level_marking == LevelMarking::Hybrid {
            let hybrid = self
                .store
                .hybrid()
                .ok_or_else(|| ConversionError::MissingHybridInputs(spec.source_name.clone()))?;
            let ps = hybrid.surface_pressure.nearest(t)?;
            field = HybridToPressure::new(&self.geometry.levels).convert(
                &field,
                &hybrid.coefficients,
                &ps,
            )?;
        }

        self.normalizer.normalize(&spec.source_name, &mut field);

        Ok(Regridder::new(self.geometry).regrid(field, spec.kind.grid_kind())?)
    }

    /// Convert every catalog variable for `t`, in catalog order.
    pub fn convert_timestamp(&self, t: NaiveDateTime) -> Result<Vec<ConvertedField<'a>>> {
        let catalog = self.catalog;
        catalog
            .iter()
            .map(|spec| {
                debug!(
                    variable = %spec.source_name,
                    kind = spec.kind.as_str(),
                    marking = ?spec.level_marking,
                    "Converting variable"
                );
                Ok(ConvertedField {
                    spec,
                    field: self.convert_variable(spec, t)?,
                })
            })
            .collect()
    }

    /// Labelled slabs of one converted variable, in emission order.
    pub fn slabs(&self, spec: &VariableSpec, field: &Field, t: NaiveDateTime) -> Result<Vec<OutputSlab>> {
        let mesh = &self.geometry.mesh;
        let target = spec.target_name.as_str();
        let slab = |name: String, level: f32, k: usize| {
            OutputSlab::on_mesh(
                mesh,
                t,
                name,
                field.units.clone(),
                spec.description.clone(),
                level,
                field.layer(k).to_vec(),
            )
        };
        let per_band = |k_of_band: &dyn Fn(usize) -> usize| -> Vec<OutputSlab> {
            SOIL_BAND_LABELS
                .iter()
                .enumerate()
                .map(|(b, label)| slab(format!("{}{}", target, label), SURFACE_LEVEL, k_of_band(b)))
                .collect()
        };

        let slabs = match spec.kind {
            VariableKind::ThreeD => {
                let VerticalAxis::Pressure(levels) = &field.vertical else {
                    return Err(ConversionError::unexpected_shape(
                        &spec.source_name,
                        "3d variable without pressure levels",
                    ));
                };
                levels
                    .iter()
                    .enumerate()
                    .map(|(k, p)| slab(target.to_string(), *p as f32, k))
                    .collect()
            }
            // Multi-level sources contribute their first (lowest) layer.
            VariableKind::TwoD | VariableKind::Ocean => {
                vec![slab(target.to_string(), SURFACE_LEVEL, 0)]
            }
            VariableKind::Soil => match soil_band_index(target) {
                Some(band) => {
                    self.check_layers(spec, field, band + 1)?;
                    vec![slab(target.to_string(), SURFACE_LEVEL, band)]
                }
                None => {
                    self.check_layers(spec, field, SOIL_BAND_LABELS.len())?;
                    per_band(&|b| b)
                }
            },
            VariableKind::SoilRepeat => match soil_band_index(target) {
                Some(_) => vec![slab(target.to_string(), SURFACE_LEVEL, 0)],
                None => per_band(&|_| 0),
            },
        };
        Ok(slabs)
    }

    fn check_layers(&self, spec: &VariableSpec, field: &Field, needed: usize) -> Result<()> {
        if field.nz() < needed {
            return Err(ConversionError::unexpected_shape(
                &spec.source_name,
                format!("{} soil layers, at least {} needed", field.nz(), needed),
            ));
        }
        Ok(())
    }

    /// Hand every slab of `converted` to `sink`, in catalog order.
    pub fn emit<F>(&self, converted: &[ConvertedField<'_>], t: NaiveDateTime, mut sink: F) -> Result<usize>
    where
        F: FnMut(&OutputSlab) -> Result<()>,
    {
        let mut count = 0;
        for item in converted {
            for slab in self.slabs(item.spec, &item.field, t)? {
                sink(&slab)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Convert and write the files of one timestamp.
    pub fn process_timestamp(&self, t: NaiveDateTime, layout: &OutputLayout) -> Result<TimestampReport> {
        let started = Instant::now();
        let converted = self.convert_timestamp(t)?;
        let convert_elapsed = started.elapsed();

        let started = Instant::now();
        let main_path = layout.main_path(t);
        let sst_path = layout.sst_path(t);
        let mut main = IntermediateFile::create(&main_path)?;
        let mut sst = sst_path.as_ref().map(IntermediateFile::create).transpose()?;

        let records = self.emit(&converted, t, |slab| {
            main.write_slab(slab)?;
            if let Some(sst) = sst.as_mut().filter(|_| slab.field == SST_FIELD) {
                sst.write_slab(slab)?;
            }
            Ok(())
        })?;

        let sst_records = sst.as_ref().map_or(0, |f| f.slab_count());
        main.persist()?;
        if let Some(sst) = sst {
            sst.persist()?;
        }
        let write_elapsed = started.elapsed();

        info!(
            time = %file_stamp(t),
            path = %main_path.display(),
            records,
            sst_records,
            convert_ms = convert_elapsed.as_millis() as u64,
            write_ms = write_elapsed.as_millis() as u64,
            "Wrote intermediate files"
        );

        Ok(TimestampReport {
            time: t,
            main_path,
            sst_path,
            records,
            sst_records,
            convert_elapsed,
            write_elapsed,
        })
    }

    /// Process every timestamp of `series` in order, then append the
    /// processed stamps to the timelist.
    pub fn run(&self, series: &TimeSeries, layout: &OutputLayout) -> Result<Vec<TimestampReport>> {
        let mut reports = Vec::with_capacity(series.len());
        for t in series.iter() {
            info!(time = %t, "Processing timestamp");
            reports.push(self.process_timestamp(t, layout)?);
        }
        layout.append_timelist(series.as_slice())?;
        Ok(reports)
    }
}
