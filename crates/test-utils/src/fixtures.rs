//! Common test fixtures for cmip2wrf tests.
//!
//! This module provides the CSV tables and timestamps of a small synthetic
//! model (`TESTM`) used by the catalog, pipeline and CLI tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Model name used by every fixture table.
pub const MODEL_NAME: &str = "TESTM";

/// Scenario used by the fixtures; matches the `ssp` meta rows.
pub const SCENARIO: &str = "ssp585";

/// Metadata table rows for `TESTM`.
pub mod tables {
    /// `cmip6_meta.csv` with an atmosphere group (defining the 6-hourly
    /// output series) and a land group.
    pub const META_CSV: &str = "\
model_name,scenario,variable_group,naming_convention,var_frq
TESTM,ssp,atm,atm_6hrLev_TESTM_SCENARIO_YYYYMM.nc,6H*
TESTM,ssp,lnd,lnd_6hr_TESTM_SCENARIO_YYYYMM.nc,6H
TESTM,historical,atm,atm_6hrLev_TESTM_historical_YYYYMM.nc,6H*
OTHER,ssp,atm,other_SCENARIO.nc,3H*
";

    /// Atmosphere group: one hybrid-level 3-D variable.
    pub const ATM_TABLE_CSV: &str = "\
src_v,aim_v,type,lvlmark,units,desc
ta,TT,3d,Lev,K,Temperature
";

    /// Land group: one soil variable on a soil-depth axis.
    pub const LND_TABLE_CSV: &str = "\
src_v,aim_v,type,lvlmark,units,desc
tsl,ST,2d-soil,None,K,Soil temperature
";

    /// Ocean group with a Celsius sea-surface temperature.
    pub const OCN_TABLE_CSV: &str = "\
src_v,aim_v,type,lvlmark,units,desc
tos,SST,ocn2d,None,degC,Sea surface temperature
";
}

/// Common time values for testing.
pub mod time {
    /// ETL window start (`YYYYMMDDHHMM`).
    pub const ETL_START: &str = "204001010000";

    /// ETL window end; two 6-hourly steps after the start.
    pub const ETL_END: &str = "204001011200";

    /// CF units of fixture time axes.
    pub const TIME_UNITS: &str = "hours since 2040-01-01 00:00:00";

    /// Hours since the reference of a 6-hourly axis covering the window.
    pub const SIX_HOURLY: [f64; 3] = [0.0, 6.0, 12.0];
}

/// Hybrid coefficients with three model levels near 900, 700 and 500 hPa.
pub mod hybrid {
    /// `ap` in Pa.
    pub const AP: [f64; 3] = [0.0, 20000.0, 30000.0];

    /// `b`; with `ps = 100000 Pa` levels sit at 900, 700 and 500 hPa.
    pub const B: [f64; 3] = [0.9, 0.5, 0.2];
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_text(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write fixture file");
    path
}

/// Write the standard `TESTM` tables into `dir`.
pub fn write_tables(dir: &Path) {
    write_text(dir, "cmip6_meta.csv", tables::META_CSV);
    write_text(dir, "TESTM_atm.csv", tables::ATM_TABLE_CSV);
    write_text(dir, "TESTM_lnd.csv", tables::LND_TABLE_CSV);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hybrid_levels_descend() {
        let p: Vec<f64> = (0..3).map(|k| 100000.0 * hybrid::B[k] + hybrid::AP[k]).collect();
        assert_eq!(p, vec![90000.0, 70000.0, 50000.0]);
    }

    #[test]
    fn test_write_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        assert!(dir.path().join("cmip6_meta.csv").exists());
        assert!(dir.path().join("TESTM_lnd.csv").exists());
    }
}
