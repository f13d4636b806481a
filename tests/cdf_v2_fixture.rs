//! A CDF 2.6 file (32-bit offsets, IBMPC little-endian values) laid out
//! field by field from the CDF internal format description. The crate's own
//! writer only produces v3 files, so this exercises the reader against an
//! independent layout.

use chrono::NaiveDate;

use swis_plot::data::cdf::{CdfFile, DataType, Encoding};

const CDR: usize = 8;
const GDR: usize = 312;
const ZVDR_EPOCH: usize = 372;
const ZVDR_DENSITY: usize = 504;
const ZVDR_ENERGY: usize = 636;
const VXR_EPOCH: usize = 776;
const VVR_EPOCH: usize = 808;
const VXR_DENSITY: usize = 832;
const VVR_DENSITY: usize = 864;
const VXR_ENERGY: usize = 880;
const VVR_ENERGY: usize = 912;
const EOF: usize = 944;

/// 2025-05-22T00:00:00 and 00:05:00 as CDF_EPOCH milliseconds since 0000-01-01.
const EPOCHS: [f64; 2] = [63_915_091_200_000.0, 63_915_091_500_000.0];

struct Image(Vec<u8>);

impl Image {
    fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn zeros(&mut self, n: usize) -> &mut Self {
        self.0.extend(std::iter::repeat(0u8).take(n));
        self
    }

    fn name(&mut self, name: &str) -> &mut Self {
        self.0.extend_from_slice(name.as_bytes());
        self.zeros(64 - name.len())
    }

    fn at(&self, offset: usize) {
        assert_eq!(self.0.len(), offset, "record layout drifted");
    }

    #[allow(clippy::too_many_arguments)]
    fn zvdr(
        &mut self,
        next: usize,
        data_type: i32,
        max_rec: i32,
        vxr: usize,
        record_varies: bool,
        name: &str,
        dims: &[i32],
    ) {
        self.i32(132 + 8 * dims.len() as i32)
            .i32(8) // zVDR
            .i32(next as i32)
            .i32(data_type)
            .i32(max_rec)
            .i32(vxr as i32) // VXRhead
            .i32(vxr as i32) // VXRtail
            .i32(record_varies as i32) // Flags
            .i32(0) // SRecords
            .i32(0) // rfuB
            .i32(-1) // rfuC
            .i32(-1) // rfuF
            .i32(1) // NumElems
            .i32(0) // Num
            .i32(0) // CPRorSPRoffset
            .i32(0) // BlockingFactor
            .name(name)
            .i32(dims.len() as i32);
        for &d in dims {
            self.i32(d);
        }
        for _ in dims {
            self.i32(-1); // DimVarys: VARY
        }
    }

    fn vxr(&mut self, first: i32, last: i32, vvr: usize) {
        self.i32(32).i32(6).i32(0).i32(1).i32(1).i32(first).i32(last).i32(vvr as i32);
    }

    fn vvr(&mut self, values: &[u8]) {
        self.i32(8 + values.len() as i32).i32(7);
        self.0.extend_from_slice(values);
    }
}

fn fixture() -> Vec<u8> {
    let mut img = Image(Vec::new());
    img.0.extend_from_slice(&[0xCD, 0xF2, 0x60, 0x02, 0x00, 0x00, 0xFF, 0xFF]);

    img.at(CDR);
    img.i32(304)
        .i32(1) // CDR
        .i32(GDR as i32)
        .i32(2) // Version
        .i32(7) // Release
        .i32(6) // Encoding: IBMPC
        .i32(0b11) // Flags: row major, single file
        .i32(0)
        .i32(0)
        .i32(0) // Increment
        .i32(-1)
        .i32(-1)
        .zeros(256); // copyright

    img.at(GDR);
    img.i32(60)
        .i32(2) // GDR
        .i32(0) // rVDRhead
        .i32(ZVDR_EPOCH as i32)
        .i32(0) // ADRhead
        .i32(EOF as i32)
        .i32(0) // NrVars
        .i32(0) // NumAttr
        .i32(-1) // rMaxRec
        .i32(0) // rNumDims
        .i32(3) // NzVars
        .i32(0) // UIRhead
        .i32(0)
        .i32(-1)
        .i32(-1);

    img.at(ZVDR_EPOCH);
    img.zvdr(ZVDR_DENSITY, 31, 1, VXR_EPOCH, true, "Epoch", &[]);
    img.at(ZVDR_DENSITY);
    img.zvdr(ZVDR_ENERGY, 21, 1, VXR_DENSITY, true, "proton_density", &[]);
    img.at(ZVDR_ENERGY);
    img.zvdr(0, 22, 0, VXR_ENERGY, false, "energy_center_mod", &[3]);

    img.at(VXR_EPOCH);
    img.vxr(0, 1, VVR_EPOCH);
    img.at(VVR_EPOCH);
    let epochs: Vec<u8> = EPOCHS.iter().flat_map(|e| e.to_le_bytes()).collect();
    img.vvr(&epochs);

    img.at(VXR_DENSITY);
    img.vxr(0, 1, VVR_DENSITY);
    img.at(VVR_DENSITY);
    let density: Vec<u8> = [4.5f32, 1e31].iter().flat_map(|v| v.to_le_bytes()).collect();
    img.vvr(&density);

    img.at(VXR_ENERGY);
    img.vxr(0, 0, VVR_ENERGY);
    img.at(VVR_ENERGY);
    let energy: Vec<u8> = [0.1f64, 1.0, 10.0].iter().flat_map(|v| v.to_le_bytes()).collect();
    img.vvr(&energy);

    img.at(EOF);
    img.0
}

#[test]
fn v2_header_is_decoded() {
    let cdf = CdfFile::from_bytes(fixture()).unwrap();
    assert_eq!(cdf.version(), (2, 7));
    assert_eq!(cdf.encoding(), Encoding::LittleEndian);
    assert!(cdf.is_row_major());
    let names: Vec<_> = cdf.variable_names().collect();
    assert_eq!(names, ["Epoch", "proton_density", "energy_center_mod"]);
}

#[test]
fn v2_epoch_values_are_calendar_times() {
    let cdf = CdfFile::from_bytes(fixture()).unwrap();
    let epoch = cdf.variable("Epoch").unwrap();
    assert_eq!(epoch.data_type, DataType::Epoch);
    let start = NaiveDate::from_ymd_opt(2025, 5, 22).unwrap();
    assert_eq!(
        epoch.to_datetimes().unwrap(),
        vec![start.and_hms_opt(0, 0, 0).unwrap(), start.and_hms_opt(0, 5, 0).unwrap()]
    );
}

#[test]
fn v2_little_endian_reals_and_fill() {
    let cdf = CdfFile::from_bytes(fixture()).unwrap();
    let density = cdf.variable("proton_density").unwrap();
    assert_eq!(density.data_type, DataType::Real4);
    assert_eq!(density.num_records, 2);
    let values = density.as_real().unwrap();
    assert_eq!(values[0], 4.5);
    assert!(values[1] > 1e30);
}

#[test]
fn v2_non_record_varying_vector() {
    let cdf = CdfFile::from_bytes(fixture()).unwrap();
    let energy = cdf.variable("energy_center_mod").unwrap();
    assert_eq!(energy.shape, vec![3]);
    assert_eq!(energy.num_records, 1);
    assert_eq!(energy.as_real().unwrap(), &[0.1, 1.0, 10.0]);
}
