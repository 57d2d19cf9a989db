//! Runs the `cmip2wrf` binary against a synthetic land-only model.

use std::path::Path;
use std::process::Command;

use test_utils::fixtures::{time, write_text, MODEL_NAME};
use test_utils::{coarse_global_axes, NcFixture};

fn cmip2wrf() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cmip2wrf"));
    cmd.env_remove("CMIP2WRF_CONFIG");
    cmd
}

fn write_model(root: &Path) -> std::path::PathBuf {
    let tables = root.join("db");
    let input = root.join("in");
    std::fs::create_dir_all(&tables).unwrap();
    std::fs::create_dir_all(&input).unwrap();

    write_text(
        &tables,
        "cmip6_meta.csv",
        "model_name,scenario,variable_group,naming_convention,var_frq\n\
         TESTM,ssp,lnd,lnd_TESTM_SCENARIO_YYYYMM.nc,6H*\n",
    );
    write_text(
        &tables,
        "TESTM_lnd.csv",
        "src_v,aim_v,type,lvlmark,units,desc\n\
         tsl,ST,2d-soil,None,K,Soil temperature\n",
    );

    let (lats, lons) = coarse_global_axes(4, 8);
    let depths = vec![0.05, 0.25, 0.7, 1.5];
    let n = lats.len() * lons.len() * depths.len() * time::SIX_HOURLY.len();
    NcFixture::new()
        .time_axis(&time::SIX_HOURLY, time::TIME_UNITS, "standard")
        .lat_lon(&lats, &lons)
        .dimension("depth", depths.len())
        .coordinate("depth", &["depth"], depths)
        .data("tsl", &["time", "depth", "lat", "lon"], vec![285.0; n])
        .write(&input, "lnd_TESTM_ssp585_204001.nc");

    let config = format!(
        "input:
  model_name: OTHER
  scenario: ssp585
  input_root: {}
  tables_dir: {}
output:
  output_root: {}
  etl_start: \"{}\"
  etl_end: \"{}\"
logging:
  level: warn
",
        input.display(),
        tables.display(),
        root.join("out").display(),
        time::ETL_START,
        time::ETL_END,
    );
    write_text(root, "run.yaml", &config)
}

#[test]
fn converts_model_named_on_command_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_model(dir.path());

    let status = cmip2wrf()
        .arg("--config")
        .arg(&config)
        .args(["--model", MODEL_NAME, "--no-sst"])
        .status()
        .unwrap();
    assert!(status.success());

    let out = dir.path().join("out");
    for stamp in ["2040-01-01_00", "2040-01-01_06", "2040-01-01_12"] {
        assert!(out.join(format!("TESTM:{}", stamp)).is_file());
        assert!(!out.join(format!("TESTM_SST:{}", stamp)).exists());
    }
    let timelist = std::fs::read_to_string(out.join("timelist")).unwrap();
    assert_eq!(timelist.lines().count(), 3);
}

#[test]
fn unknown_model_exits_with_configuration_status() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_model(dir.path());

    let status = cmip2wrf().arg("--config").arg(&config).status().unwrap();
    assert_eq!(status.code(), Some(2));
}

#[test]
fn missing_config_file_exits_with_configuration_status() {
    let dir = tempfile::tempdir().unwrap();
    let status = cmip2wrf()
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(2));
}

#[test]
fn invalid_log_level_override_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_model(dir.path());

    let status = cmip2wrf()
        .arg("--config")
        .arg(&config)
        .args(["--model", MODEL_NAME, "--log-level", "verbose"])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(2));
}
