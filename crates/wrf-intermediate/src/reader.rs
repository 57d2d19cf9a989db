//! Decoding of intermediate files, used to verify written output.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bytes::Buf;
use chrono::NaiveDateTime;

use crate::error::{Result, WrfError};
use crate::record::{
    unpad_string, LatLonProjection, OutputSlab, DESC_LEN, FIELD_LEN, HDATE_LEN, HEADER_LEN, IFV,
    MAP_SOURCE_LEN, PROJECTION_LATLON, PROJECTION_LEN, START_LOCATION, START_LOCATION_LEN,
    UNITS_LEN,
};

/// Read a 4-byte marker; `None` on a clean end of stream.
fn read_marker<R: Read>(r: &mut R) -> Result<Option<u32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(WrfError::invalid_record("truncated record marker"));
        }
        filled += n;
    }
    Ok(Some(u32::from_be_bytes(buf)))
}

/// Read one Fortran record payload; `None` at end of stream.
pub fn read_record<R: Read>(r: &mut R) -> Result<Option<Vec<u8>>> {
    let Some(len) = read_marker(r)? else {
        return Ok(None);
    };
    let mut payload = vec![0u8; len as usize];
    r.read_exact(&mut payload)
        .map_err(|_| WrfError::invalid_record(format!("record of {} bytes is truncated", len)))?;
    match read_marker(r)? {
        Some(trailer) if trailer == len => Ok(Some(payload)),
        Some(trailer) => Err(WrfError::invalid_record(format!(
            "leading marker {} does not match trailing marker {}",
            len, trailer
        ))),
        None => Err(WrfError::invalid_record("missing trailing record marker")),
    }
}

fn expect_record<R: Read>(r: &mut R, what: &str, len: usize) -> Result<Vec<u8>> {
    let payload = read_record(r)?
        .ok_or_else(|| WrfError::invalid_record(format!("stream ends before {} record", what)))?;
    if payload.len() != len {
        return Err(WrfError::invalid_record(format!(
            "{} record has {} bytes, expected {}",
            what,
            payload.len(),
            len
        )));
    }
    Ok(payload)
}

fn take_string(buf: &mut &[u8], len: usize) -> String {
    let s = unpad_string(&buf[..len]);
    buf.advance(len);
    s
}

/// Read the next slab; `None` when the stream is exhausted.
pub fn read_slab<R: Read>(r: &mut R) -> Result<Option<OutputSlab>> {
    let Some(version) = read_record(r)? else {
        return Ok(None);
    };
    if version.len() != 4 || (&version[..]).get_u32() != IFV {
        return Err(WrfError::invalid_record(format!(
            "unsupported format version record {:?}",
            version
        )));
    }

    let header = expect_record(r, "header", HEADER_LEN)?;
    let mut h = &header[..];
    let hdate = take_string(&mut h, HDATE_LEN);
    let forecast_hours = h.get_f32();
    let source = take_string(&mut h, MAP_SOURCE_LEN);
    let field = take_string(&mut h, FIELD_LEN);
    let units = take_string(&mut h, UNITS_LEN);
    let description = take_string(&mut h, DESC_LEN);
    let level = h.get_f32();
    let nx = h.get_i32();
    let ny = h.get_i32();
    let iproj = h.get_i32();

    if iproj != PROJECTION_LATLON {
        return Err(WrfError::invalid_record(format!("unsupported projection {}", iproj)));
    }
    if nx <= 0 || ny <= 0 {
        return Err(WrfError::invalid_record(format!("grid size {}x{}", nx, ny)));
    }
    let valid_time = parse_hdate(&hdate)?;

    let proj = expect_record(r, "projection", PROJECTION_LEN)?;
    let mut p = &proj[..];
    let start_location = take_string(&mut p, START_LOCATION_LEN);
    if start_location != START_LOCATION {
        return Err(WrfError::invalid_record(format!(
            "unsupported start location '{}'",
            start_location
        )));
    }
    let projection = LatLonProjection {
        start_lat: p.get_f32(),
        start_lon: p.get_f32(),
        dlat: p.get_f32(),
        dlon: p.get_f32(),
        earth_radius: p.get_f32(),
    };

    let winds = expect_record(r, "wind flag", 4)?;
    let earth_relative_winds = (&winds[..]).get_u32() != 0;

    let (nx, ny) = (nx as usize, ny as usize);
    let values = expect_record(r, "slab", nx * ny * 4)?;
    let mut v = &values[..];
    let data = (0..nx * ny).map(|_| v.get_f32()).collect();

    Ok(Some(OutputSlab {
        valid_time,
        forecast_hours,
        source,
        field,
        units,
        description,
        level,
        nx,
        ny,
        projection,
        earth_relative_winds,
        data,
    }))
}

fn parse_hdate(hdate: &str) -> Result<NaiveDateTime> {
    let stamp = hdate.get(..19).unwrap_or(hdate);
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d_%H:%M:%S")
        .map_err(|e| WrfError::invalid_record(format!("header date '{}': {}", hdate, e)))
}

/// Read every slab of a stream.
pub fn read_all<R: Read>(r: &mut R) -> Result<Vec<OutputSlab>> {
    let mut slabs = Vec::new();
    while let Some(slab) = read_slab(r)? {
        slabs.push(slab);
    }
    Ok(slabs)
}

/// Read every slab of the file at `path`.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<OutputSlab>> {
    let mut reader = BufReader::new(File::open(path)?);
    read_all(&mut reader)
}
