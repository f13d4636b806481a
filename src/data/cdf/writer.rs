use std::io::Write;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use flate2::write::GzEncoder;

use super::reader::{record, reorder, MAGIC_COMPRESSED, MAGIC_UNCOMPRESSED, MAGIC_V3};
use super::types::{DataType, Encoding, Values};
use super::CdfError;

const CDR_LEN: u64 = 312;
const GDR_LEN: u64 = 84;
const ZVDR_BASE_LEN: u64 = 344;
const CPR_LEN: u64 = 28;
const VXR_LEN: u64 = 44;
const VVR_HEADER_LEN: u64 = 12;
const CVVR_HEADER_LEN: u64 = 24;
const CCR_HEADER_LEN: u64 = 32;

const GZIP_LEVEL: u32 = 6;
const COPYRIGHT: &str = "Common Data Format (CDF)\nhttps://cdf.gsfc.nasa.gov\n";

/// How much of the output is GZIP-compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriterCompression {
    #[default]
    None,
    /// Each variable's records go into a CVVR.
    Variables,
    /// The whole file body goes into a CCR.
    File,
}

#[derive(Debug, Clone)]
struct PendingVariable {
    name: String,
    data_type: DataType,
    dims: Vec<usize>,
    num_records: usize,
    values: Values,
}

/// Writes single-file CDF v3 images holding zVariables.
///
/// Every variable gets one VXR with one entry pointing at all its records.
#[derive(Debug, Clone, Default)]
pub struct CdfWriter {
    encoding: Encoding,
    column_major: bool,
    compression: WriterCompression,
    variables: Vec<PendingVariable>,
}

impl CdfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn column_major(mut self, column_major: bool) -> Self {
        self.column_major = column_major;
        self
    }

    pub fn compression(mut self, compression: WriterCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Add a REAL8 variable; `values` holds whole records of shape `dims`.
    pub fn add_real8(
        &mut self,
        name: &str,
        dims: &[usize],
        values: &[f64],
    ) -> Result<&mut Self, CdfError> {
        self.push(name, DataType::Real8, dims, Values::Real(values.to_vec()))
    }

    pub fn add_real4(
        &mut self,
        name: &str,
        dims: &[usize],
        values: &[f64],
    ) -> Result<&mut Self, CdfError> {
        self.push(name, DataType::Real4, dims, Values::Real(values.to_vec()))
    }

    pub fn add_epoch(&mut self, name: &str, millis: &[f64]) -> Result<&mut Self, CdfError> {
        self.push(name, DataType::Epoch, &[], Values::Real(millis.to_vec()))
    }

    pub fn add_tt2000(&mut self, name: &str, nanos: &[i64]) -> Result<&mut Self, CdfError> {
        self.push(name, DataType::TimeTt2000, &[], Values::Tt2000(nanos.to_vec()))
    }

    fn push(
        &mut self,
        name: &str,
        data_type: DataType,
        dims: &[usize],
        values: Values,
    ) -> Result<&mut Self, CdfError> {
        let record_len: usize = dims.iter().product();
        let count = values.len();
        if record_len == 0 || count % record_len != 0 {
            return Err(CdfError::Shape { name: name.to_string(), count, record_len });
        }
        self.variables.push(PendingVariable {
            name: name.to_string(),
            data_type,
            dims: dims.to_vec(),
            num_records: count / record_len,
            values,
        });
        Ok(self)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), CdfError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CdfError> {
        let image = self.uncompressed_image()?;
        match self.compression {
            WriterCompression::File => compress_file(&image),
            _ => Ok(image),
        }
    }

    fn encode_records(&self, var: &PendingVariable) -> Vec<u8> {
        let mut raw = match self.encoding {
            Encoding::BigEndian => encode::<BigEndian>(&var.values, var.data_type),
            Encoding::LittleEndian => encode::<LittleEndian>(&var.values, var.data_type),
        };
        if self.column_major && var.dims.len() > 1 {
            let record_bytes = var.dims.iter().product::<usize>() * var.data_type.size();
            for rec in raw.chunks_exact_mut(record_bytes) {
                let reordered = reorder(rec, &var.dims, var.data_type.size(), true);
                rec.copy_from_slice(&reordered);
            }
        }
        raw
    }

    fn uncompressed_image(&self) -> Result<Vec<u8>, CdfError> {
        let compress_vars = self.compression == WriterCompression::Variables;
        let gdr_offset = 8 + CDR_LEN;
        let first_vdr = gdr_offset + GDR_LEN;

        // Lay out every variable block before writing so offsets are known.
        struct Block {
            vdr: u64,
            cpr: u64,
            vxr: u64,
            data: u64,
            next: u64,
            payload: Vec<u8>,
        }
        let mut blocks = Vec::with_capacity(self.variables.len());
        let mut offset = first_vdr;
        for var in &self.variables {
            let raw = self.encode_records(var);
            let payload = if compress_vars { gzip(&raw)? } else { raw };
            let vdr = offset;
            let vdr_len = ZVDR_BASE_LEN + 8 * var.dims.len() as u64;
            let cpr = if compress_vars { vdr + vdr_len } else { 0 };
            let mut end = vdr + vdr_len + if compress_vars { CPR_LEN } else { 0 };
            let (vxr, data) = if var.num_records > 0 {
                let vxr = end;
                let data = vxr + VXR_LEN;
                let header = if compress_vars { CVVR_HEADER_LEN } else { VVR_HEADER_LEN };
                end = data + header + payload.len() as u64;
                (vxr, data)
            } else {
                (0, 0)
            };
            blocks.push(Block { vdr, cpr, vxr, data, next: 0, payload });
            offset = end;
        }
        for i in 1..blocks.len() {
            blocks[i - 1].next = blocks[i].vdr;
        }
        let eof = offset;

        let mut out = Vec::with_capacity(eof as usize);
        out.write_u32::<BigEndian>(MAGIC_V3)?;
        out.write_u32::<BigEndian>(MAGIC_UNCOMPRESSED)?;

        // CDR
        out.write_i64::<BigEndian>(CDR_LEN as i64)?;
        out.write_i32::<BigEndian>(record::CDR)?;
        out.write_i64::<BigEndian>(gdr_offset as i64)?;
        out.write_i32::<BigEndian>(3)?; // version
        out.write_i32::<BigEndian>(9)?; // release
        out.write_i32::<BigEndian>(self.encoding.code())?;
        out.write_i32::<BigEndian>(if self.column_major { 0b10 } else { 0b11 })?;
        out.write_i32::<BigEndian>(0)?; // rfuA
        out.write_i32::<BigEndian>(0)?; // rfuB
        out.write_i32::<BigEndian>(0)?; // increment
        out.write_i32::<BigEndian>(3)?; // identifier
        out.write_i32::<BigEndian>(-1)?; // rfuE
        write_padded(&mut out, COPYRIGHT, 256)?;

        // GDR
        out.write_i64::<BigEndian>(GDR_LEN as i64)?;
        out.write_i32::<BigEndian>(record::GDR)?;
        out.write_i64::<BigEndian>(0)?; // rVDRhead
        out.write_i64::<BigEndian>(blocks.first().map_or(0, |b| b.vdr) as i64)?;
        out.write_i64::<BigEndian>(0)?; // ADRhead
        out.write_i64::<BigEndian>(eof as i64)?;
        out.write_i32::<BigEndian>(0)?; // NrVars
        out.write_i32::<BigEndian>(0)?; // NumAttr
        out.write_i32::<BigEndian>(-1)?; // rMaxRec
        out.write_i32::<BigEndian>(0)?; // rNumDims
        out.write_i32::<BigEndian>(self.variables.len() as i32)?;
        out.write_i64::<BigEndian>(0)?; // UIRhead
        out.write_i32::<BigEndian>(0)?; // rfuC
        out.write_i32::<BigEndian>(20170101)?; // leap second table stamp
        out.write_i32::<BigEndian>(-1)?; // rfuE

        for (num, (var, block)) in self.variables.iter().zip(&blocks).enumerate() {
            debug_assert_eq!(out.len() as u64, block.vdr);
            let flags = 0x1 | if compress_vars { 0x4 } else { 0 };
            out.write_i64::<BigEndian>((ZVDR_BASE_LEN + 8 * var.dims.len() as u64) as i64)?;
            out.write_i32::<BigEndian>(record::ZVDR)?;
            out.write_i64::<BigEndian>(block.next as i64)?;
            out.write_i32::<BigEndian>(var.data_type.code())?;
            out.write_i32::<BigEndian>(var.num_records as i32 - 1)?;
            out.write_i64::<BigEndian>(block.vxr as i64)?;
            out.write_i64::<BigEndian>(block.vxr as i64)?;
            out.write_i32::<BigEndian>(flags)?;
            out.write_i32::<BigEndian>(0)?; // SRecords
            out.write_i32::<BigEndian>(0)?; // rfuB
            out.write_i32::<BigEndian>(-1)?; // rfuC
            out.write_i32::<BigEndian>(-1)?; // rfuF
            out.write_i32::<BigEndian>(1)?; // NumElems
            out.write_i32::<BigEndian>(num as i32)?;
            out.write_i64::<BigEndian>(if compress_vars { block.cpr as i64 } else { -1 })?;
            out.write_i32::<BigEndian>(0)?; // BlockingFactor
            write_padded(&mut out, &var.name, 256)?;
            out.write_i32::<BigEndian>(var.dims.len() as i32)?;
            for &d in &var.dims {
                out.write_i32::<BigEndian>(d as i32)?;
            }
            for _ in &var.dims {
                out.write_i32::<BigEndian>(-1)?;
            }

            if compress_vars {
                out.write_i64::<BigEndian>(CPR_LEN as i64)?;
                out.write_i32::<BigEndian>(record::CPR)?;
                out.write_i32::<BigEndian>(5)?; // GZIP
                out.write_i32::<BigEndian>(0)?; // rfuA
                out.write_i32::<BigEndian>(1)?; // pCount
                out.write_i32::<BigEndian>(GZIP_LEVEL as i32)?;
            }

            if var.num_records == 0 {
                continue;
            }
            out.write_i64::<BigEndian>(VXR_LEN as i64)?;
            out.write_i32::<BigEndian>(record::VXR)?;
            out.write_i64::<BigEndian>(0)?; // VXRnext
            out.write_i32::<BigEndian>(1)?; // Nentries
            out.write_i32::<BigEndian>(1)?; // NusedEntries
            out.write_i32::<BigEndian>(0)?;
            out.write_i32::<BigEndian>(var.num_records as i32 - 1)?;
            out.write_i64::<BigEndian>(block.data as i64)?;

            if compress_vars {
                out.write_i64::<BigEndian>((CVVR_HEADER_LEN + block.payload.len() as u64) as i64)?;
                out.write_i32::<BigEndian>(record::CVVR)?;
                out.write_i32::<BigEndian>(0)?; // rfuA
                out.write_i64::<BigEndian>(block.payload.len() as i64)?;
            } else {
                out.write_i64::<BigEndian>((VVR_HEADER_LEN + block.payload.len() as u64) as i64)?;
                out.write_i32::<BigEndian>(record::VVR)?;
            }
            out.extend_from_slice(&block.payload);
        }
        debug_assert_eq!(out.len() as u64, eof);
        Ok(out)
    }
}

fn write_padded(out: &mut Vec<u8>, text: &str, len: usize) -> Result<(), CdfError> {
    let bytes = text.as_bytes();
    let n = bytes.len().min(len);
    out.write_all(&bytes[..n])?;
    out.resize(out.len() + (len - n), 0);
    Ok(())
}

fn gzip(raw: &[u8]) -> Result<Vec<u8>, CdfError> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::new(GZIP_LEVEL));
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

/// Wrap an uncompressed image (minus its magic numbers) in a CCR.
fn compress_file(image: &[u8]) -> Result<Vec<u8>, CdfError> {
    let body = &image[8..];
    let packed = gzip(body)?;
    let ccr_len = CCR_HEADER_LEN + packed.len() as u64;
    let cpr_offset = 8 + ccr_len;

    let mut out = Vec::with_capacity((cpr_offset + CPR_LEN) as usize);
    out.write_u32::<BigEndian>(MAGIC_V3)?;
    out.write_u32::<BigEndian>(MAGIC_COMPRESSED)?;
    out.write_i64::<BigEndian>(ccr_len as i64)?;
    out.write_i32::<BigEndian>(record::CCR)?;
    out.write_i64::<BigEndian>(cpr_offset as i64)?;
    out.write_i64::<BigEndian>(body.len() as i64)?;
    out.write_i32::<BigEndian>(0)?; // rfuA
    out.extend_from_slice(&packed);
    out.write_i64::<BigEndian>(CPR_LEN as i64)?;
    out.write_i32::<BigEndian>(record::CPR)?;
    out.write_i32::<BigEndian>(5)?;
    out.write_i32::<BigEndian>(0)?;
    out.write_i32::<BigEndian>(1)?;
    out.write_i32::<BigEndian>(GZIP_LEVEL as i32)?;
    Ok(out)
}

fn encode<B: ByteOrder>(values: &Values, data_type: DataType) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * data_type.size()];
    match (values, data_type) {
        (Values::Real(v), DataType::Real4 | DataType::Float) => {
            for (chunk, &x) in out.chunks_exact_mut(4).zip(v) {
                B::write_f32(chunk, x as f32);
            }
        }
        (Values::Real(v), _) => {
            for (chunk, &x) in out.chunks_exact_mut(8).zip(v) {
                B::write_f64(chunk, x);
            }
        }
        (Values::Tt2000(v), _) => {
            for (chunk, &x) in out.chunks_exact_mut(8).zip(v) {
                B::write_i64(chunk, x);
            }
        }
        (Values::Epoch16(v), _) => {
            for (chunk, x) in out.chunks_exact_mut(16).zip(v) {
                B::write_f64(&mut chunk[..8], x[0]);
                B::write_f64(&mut chunk[8..], x[1]);
            }
        }
        (Values::Text(v), _) => {
            for (byte, s) in out.iter_mut().zip(v) {
                *byte = s.bytes().next().unwrap_or(b' ');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cdf::CdfFile;

    #[test]
    fn rejects_partial_records() {
        let mut writer = CdfWriter::new();
        let err = writer.add_real8("flux", &[4], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, CdfError::Shape { count: 3, record_len: 4, .. }));
    }

    #[test]
    fn empty_variable_has_no_records() {
        let mut writer = CdfWriter::new();
        writer.add_real8("density", &[], &[]).unwrap();
        let cdf = CdfFile::from_bytes(writer.to_bytes().unwrap()).unwrap();
        let var = cdf.variable("density").unwrap();
        assert_eq!(var.num_records, 0);
        assert!(var.values.is_empty());
    }
}
