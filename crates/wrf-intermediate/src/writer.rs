//! Encoding of slabs into Fortran sequential records.
//!
//! Every record is framed as `[len: u32 BE][payload][len: u32 BE]`; all
//! numbers inside payloads are big-endian regardless of the host.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};
use cmip_common::hdate;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, WrfError};
use crate::record::{
    pad_string, OutputSlab, DESC_LEN, FIELD_LEN, HDATE_LEN, HEADER_LEN, IFV, MAP_SOURCE_LEN,
    PROJECTION_LATLON, PROJECTION_LEN, START_LOCATION, START_LOCATION_LEN, UNITS_LEN,
};

/// Append one Fortran record around `payload`.
fn put_record(buf: &mut BytesMut, payload: &[u8]) {
    let len = payload.len() as u32;
    buf.put_u32(len);
    buf.put_slice(payload);
    buf.put_u32(len);
}

fn header_payload(slab: &OutputSlab) -> BytesMut {
    let mut header = BytesMut::with_capacity(HEADER_LEN);
    header.put_slice(&pad_string(&hdate(slab.valid_time), HDATE_LEN));
    header.put_f32(slab.forecast_hours);
    header.put_slice(&pad_string(&slab.source, MAP_SOURCE_LEN));
    header.put_slice(&pad_string(&slab.field, FIELD_LEN));
    header.put_slice(&pad_string(&slab.units, UNITS_LEN));
    header.put_slice(&pad_string(&slab.description, DESC_LEN));
    header.put_f32(slab.level);
    header.put_i32(slab.nx as i32);
    header.put_i32(slab.ny as i32);
    header.put_i32(PROJECTION_LATLON);
    header
}

fn projection_payload(slab: &OutputSlab) -> BytesMut {
    let p = &slab.projection;
    let mut proj = BytesMut::with_capacity(PROJECTION_LEN);
    proj.put_slice(&pad_string(START_LOCATION, START_LOCATION_LEN));
    proj.put_f32(p.start_lat);
    proj.put_f32(p.start_lon);
    proj.put_f32(p.dlat);
    proj.put_f32(p.dlon);
    proj.put_f32(p.earth_radius);
    proj
}

/// Encode the five records of one slab.
pub fn encode_slab(slab: &OutputSlab) -> Result<Bytes> {
    let expected = slab.nx * slab.ny;
    if slab.data.len() != expected {
        return Err(WrfError::SlabShape {
            field: slab.field.clone(),
            expected,
            got: slab.data.len(),
        });
    }

    let payload_len = expected * 4;
    let mut buf = BytesMut::with_capacity(5 * 8 + 4 + HEADER_LEN + PROJECTION_LEN + 4 + payload_len);

    // 1. Format version
    put_record(&mut buf, &IFV.to_be_bytes());

    // 2. Header
    put_record(&mut buf, &header_payload(slab));

    // 3. Projection
    put_record(&mut buf, &projection_payload(slab));

    // 4. Wind rotation flag
    put_record(&mut buf, &u32::from(slab.earth_relative_winds).to_be_bytes());

    // 5. Slab values
    let mut values = BytesMut::with_capacity(payload_len);
    for v in &slab.data {
        values.put_f32(*v);
    }
    put_record(&mut buf, &values);

    Ok(buf.freeze())
}

/// Append one slab to `w`.
pub fn write_slab<W: Write>(w: &mut W, slab: &OutputSlab) -> Result<()> {
    let encoded = encode_slab(slab)?;
    w.write_all(&encoded)?;
    Ok(())
}

/// An intermediate file being written.
///
/// Slabs go to a temporary file next to the target; [`IntermediateFile::persist`]
/// renames it into place, so an abandoned file never appears under the
/// target name.
pub struct IntermediateFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
    slabs: usize,
}

impl IntermediateFile {
    /// Start a file that will be published at `target`.
    pub fn create(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let temp = NamedTempFile::new_in(&dir)?;
        Ok(Self {
            target,
            writer: BufWriter::new(temp),
            slabs: 0,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Number of slabs written so far.
    pub fn slab_count(&self) -> usize {
        self.slabs
    }

    pub fn write_slab(&mut self, slab: &OutputSlab) -> Result<()> {
        write_slab(&mut self.writer, slab)?;
        self.slabs += 1;
        Ok(())
    }

    /// Flush, sync and atomically move the file to its target path.
    pub fn persist(self) -> Result<PathBuf> {
        let temp = self.writer.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.target).map_err(|e| WrfError::Persist {
            path: self.target.clone(),
            source: e.error,
        })?;

        debug!(path = %self.target.display(), slabs = self.slabs, "Wrote intermediate file");
        Ok(self.target)
    }
}
