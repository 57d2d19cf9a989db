//! Encode/decode tests against the documented byte layout.

use chrono::{NaiveDate, NaiveDateTime};
use cmip_common::{CommonMesh, SURFACE_LEVEL};
use wrf_intermediate::{encode_slab, read_all, read_file, IntermediateFile, OutputSlab, WrfError};

fn valid_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2040, 7, 15)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap()
}

fn patterned_data() -> Vec<f32> {
    // Values that are not exactly representable in decimal plus signed zero.
    let mut data: Vec<f32> = (0..181 * 360).map(|i| (i as f32).sin() * 300.1).collect();
    data[1] = -0.0;
    data[2] = f32::MIN_POSITIVE;
    data
}

#[test]
fn slab_round_trip_is_bit_exact() {
    let mesh = CommonMesh::global();
    let slab = OutputSlab::on_mesh(
        &mesh,
        valid_time(),
        "SM000010",
        "m3 m-3",
        "Soil moisture",
        SURFACE_LEVEL,
        patterned_data(),
    );

    let bytes = encode_slab(&slab).unwrap();
    let decoded = read_all(&mut &bytes[..]).unwrap();

    assert_eq!(decoded.len(), 1);
    let back = &decoded[0];
    assert_eq!(back.field, "SM000010");
    assert_eq!(back.units, "m3 m-3");
    assert_eq!(back.description, "Soil moisture");
    assert_eq!(back.source, "CMIP6");
    assert_eq!(back.level.to_bits(), SURFACE_LEVEL.to_bits());
    assert_eq!(back.valid_time, valid_time());
    assert_eq!((back.nx, back.ny), (360, 181));
    assert_eq!(back.projection, slab.projection);
    assert!(!back.earth_relative_winds);
    assert!(back.is_surface());
    assert!(back
        .data
        .iter()
        .zip(&slab.data)
        .all(|(a, b)| a.to_bits() == b.to_bits()));
}

#[test]
fn header_fields_sit_at_documented_offsets() {
    let mesh = CommonMesh::global();
    let slab = OutputSlab::on_mesh(&mesh, valid_time(), "TT", "K", "Temperature", 85000.0, vec![0.0; 65160]);
    let bytes = encode_slab(&slab).unwrap();

    // Header payload starts after the IFV record (12 bytes) and its own marker.
    let h = &bytes[16..16 + 156];
    assert_eq!(&h[0..24], b"2040-07-15_18:00:00:0000");
    assert_eq!(&h[24..28], &0.0f32.to_be_bytes());
    assert_eq!(&h[28..60], format!("{:<32}", "CMIP6").as_bytes());
    assert_eq!(&h[60..69], b"TT       ");
    assert_eq!(&h[69..94], format!("{:<25}", "K").as_bytes());
    assert_eq!(&h[94..140], format!("{:<46}", "Temperature").as_bytes());
    assert_eq!(&h[140..144], &85000.0f32.to_be_bytes());
    assert_eq!(&h[144..148], &360i32.to_be_bytes());
    assert_eq!(&h[148..152], &181i32.to_be_bytes());
    assert_eq!(&h[152..156], &0i32.to_be_bytes());

    // Projection payload.
    let p = &bytes[12 + 164 + 4..12 + 164 + 4 + 28];
    assert_eq!(&p[0..8], b"SWCORNER");
    assert_eq!(&p[8..12], &(-90.0f32).to_be_bytes());
    assert_eq!(&p[12..16], &0.0f32.to_be_bytes());
    assert_eq!(&p[16..20], &1.0f32.to_be_bytes());
    assert_eq!(&p[20..24], &1.0f32.to_be_bytes());
    assert_eq!(&p[24..28], &6371.229f32.to_be_bytes());
}

#[test]
fn long_labels_are_truncated() {
    let mesh = CommonMesh::global();
    let slab = OutputSlab::on_mesh(
        &mesh,
        valid_time(),
        "SOILMOIST100200",
        "K",
        "x".repeat(60),
        SURFACE_LEVEL,
        vec![0.0; 65160],
    );
    let back = read_all(&mut &encode_slab(&slab).unwrap()[..]).unwrap();
    assert_eq!(back[0].field, "SOILMOIST");
    assert_eq!(back[0].description.len(), 46);
}

#[test]
fn file_with_several_slabs() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = CommonMesh::global();
    let target = dir.path().join("TESTM:2040-07-15_18");

    let mut file = IntermediateFile::create(&target).unwrap();
    for (i, level) in [100000.0f32, 92500.0, 85000.0].iter().enumerate() {
        let slab = OutputSlab::on_mesh(
            &mesh,
            valid_time(),
            "TT",
            "K",
            "Temperature",
            *level,
            vec![i as f32; 65160],
        );
        file.write_slab(&slab).unwrap();
    }
    file.persist().unwrap();

    let slabs = read_file(&target).unwrap();
    let levels: Vec<f32> = slabs.iter().map(|s| s.level).collect();
    assert_eq!(levels, vec![100000.0, 92500.0, 85000.0]);
    assert_eq!(slabs[2].data[65159], 2.0);
}

#[test]
fn truncated_file_is_rejected() {
    let mesh = CommonMesh::global();
    let slab = OutputSlab::on_mesh(&mesh, valid_time(), "TT", "K", "", 85000.0, vec![0.0; 65160]);
    let bytes = encode_slab(&slab).unwrap();
    let cut = &bytes[..bytes.len() - 10];
    assert!(matches!(read_all(&mut &cut[..]), Err(WrfError::InvalidRecord(_))));
}
