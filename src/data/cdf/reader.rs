use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use chrono::NaiveDateTime;
use flate2::read::GzDecoder;

use super::epoch;
use super::types::{Compression, DataType, Encoding, Values};
use super::CdfError;

// ---------------------------------------------------------------------------
// On-disk constants
// ---------------------------------------------------------------------------

pub(crate) const MAGIC_V3: u32 = 0xCDF3_0001;
pub(crate) const MAGIC_V2_6: u32 = 0xCDF2_6002;
pub(crate) const MAGIC_V2: u32 = 0x0000_FFFF;
pub(crate) const MAGIC_UNCOMPRESSED: u32 = 0x0000_FFFF;
pub(crate) const MAGIC_COMPRESSED: u32 = 0xCCCC_0001;

pub(crate) mod record {
    pub const CDR: i32 = 1;
    pub const GDR: i32 = 2;
    pub const RVDR: i32 = 3;
    pub const VXR: i32 = 6;
    pub const VVR: i32 = 7;
    pub const ZVDR: i32 = 8;
    pub const CCR: i32 = 10;
    pub const CPR: i32 = 11;
    pub const CVVR: i32 = 13;
}

const CDR_ROW_MAJOR: i32 = 0x1;
const VDR_RECORD_VARIES: i32 = 0x1;
const VDR_PAD_VALUE: i32 = 0x2;
const VDR_COMPRESSED: i32 = 0x4;

/// VXR trees deeper than this are treated as corrupt.
const MAX_VXR_DEPTH: usize = 32;

/// Smallest decode budget per variable, whatever the file size.
const MIN_DECODE_BYTES: usize = 1 << 20;
/// Upper bound on the DEFLATE expansion ratio.
const GZIP_MAX_RATIO: usize = 1032;
/// Room for pad-filled records that are not stored in the file.
const SPARSE_SLACK: usize = 4;

/// Field widths that differ between CDF v2 (32-bit) and v3 (64-bit) files.
#[derive(Debug, Clone, Copy)]
struct Layout {
    wide: bool,
}

impl Layout {
    fn header_len(self) -> u64 {
        if self.wide { 12 } else { 8 }
    }

    fn name_len(self) -> usize {
        if self.wide { 256 } else { 64 }
    }
}

// ---------------------------------------------------------------------------
// Record cursor
// ---------------------------------------------------------------------------

/// Big-endian cursor positioned just past a record's size/type header.
struct Record<'a> {
    cur: Cursor<&'a [u8]>,
    layout: Layout,
    offset: u64,
    kind: i32,
    size: u64,
}

impl<'a> Record<'a> {
    fn at(data: &'a [u8], offset: u64, layout: Layout) -> Result<Self, CdfError> {
        if offset >= data.len() as u64 {
            return Err(CdfError::Truncated(offset));
        }
        let mut cur = Cursor::new(data);
        cur.set_position(offset);
        let size = if layout.wide {
            cur.read_i64::<BigEndian>()
        } else {
            cur.read_i32::<BigEndian>().map(i64::from)
        }
        .map_err(|_| CdfError::Truncated(offset))?;
        let kind = cur
            .read_i32::<BigEndian>()
            .map_err(|_| CdfError::Truncated(offset))?;
        if size < layout.header_len() as i64 || offset + size as u64 > data.len() as u64 {
            return Err(CdfError::Truncated(offset));
        }
        Ok(Record { cur, layout, offset, kind, size: size as u64 })
    }

    fn expect_kind(self, kind: i32, expected: &'static str) -> Result<Self, CdfError> {
        if self.kind != kind {
            return Err(CdfError::RecordType { offset: self.offset, expected, found: self.kind });
        }
        Ok(self)
    }

    /// Fail unless `n` more bytes fit inside this record.
    fn ensure(&self, n: u64) -> Result<(), CdfError> {
        let end = self.cur.position().checked_add(n).ok_or(CdfError::Truncated(self.offset))?;
        if end > self.offset + self.size {
            return Err(CdfError::Truncated(self.offset));
        }
        Ok(())
    }

    fn int(&mut self) -> Result<i32, CdfError> {
        self.ensure(4)?;
        self.cur
            .read_i32::<BigEndian>()
            .map_err(|_| CdfError::Truncated(self.offset))
    }

    /// Non-negative count or dimension size.
    fn count(&mut self) -> Result<usize, CdfError> {
        let v = self.int()?;
        usize::try_from(v)
            .map_err(|_| CdfError::Corrupt(format!("negative count {v} at offset {}", self.offset)))
    }

    /// File offset; negative values (used as "none") come back as 0.
    fn offset(&mut self) -> Result<u64, CdfError> {
        self.ensure(if self.layout.wide { 8 } else { 4 })?;
        let v = if self.layout.wide {
            self.cur.read_i64::<BigEndian>()
        } else {
            self.cur.read_i32::<BigEndian>().map(i64::from)
        }
        .map_err(|_| CdfError::Truncated(self.offset))?;
        Ok(v.max(0) as u64)
    }

    fn skip(&mut self, n: u64) {
        let pos = self.cur.position();
        self.cur.set_position(pos + n);
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], CdfError> {
        let start = self.cur.position() as usize;
        let end = start.checked_add(n).ok_or(CdfError::Truncated(self.offset))?;
        if end as u64 > self.offset + self.size {
            return Err(CdfError::Truncated(self.offset));
        }
        let data: &'a [u8] = *self.cur.get_ref();
        self.cur.set_position(end as u64);
        Ok(&data[start..end])
    }

    /// Everything left in the record.
    fn rest(&mut self) -> Result<&'a [u8], CdfError> {
        let used = self.cur.position() - self.offset;
        let left = self.size.checked_sub(used).ok_or(CdfError::Truncated(self.offset))?;
        self.bytes(left as usize)
    }

    fn name(&mut self) -> Result<String, CdfError> {
        let raw = self.bytes(self.layout.name_len())?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).trim_end().to_string())
    }
}

// ---------------------------------------------------------------------------
// Variable descriptors (rVDR / zVDR)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Descriptor {
    name: String,
    data_type: i32,
    num_elems: usize,
    max_rec: i32,
    record_varies: bool,
    dims: Vec<usize>,
    dim_varies: Vec<bool>,
    vxr_head: u64,
    compression: Compression,
    pad: Option<Vec<u8>>,
}

/// A decoded variable: every record, flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data_type: DataType,
    /// Per-record shape; empty for scalars.
    pub shape: Vec<usize>,
    pub num_records: usize,
    pub values: Values,
}

impl Variable {
    /// Number of values in one record.
    pub fn record_len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn as_real(&self) -> Result<&[f64], CdfError> {
        match &self.values {
            Values::Real(v) if !self.data_type.is_time() => Ok(v.as_slice()),
            _ => Err(self.wrong_type("a numeric type")),
        }
    }

    /// Convert an EPOCH, EPOCH16 or TT2000 variable to UTC calendar time.
    pub fn to_datetimes(&self) -> Result<Vec<NaiveDateTime>, CdfError> {
        let converted: Option<Vec<_>> = match (&self.values, self.data_type) {
            (Values::Real(v), DataType::Epoch) => {
                v.iter().map(|&ms| epoch::epoch_to_datetime(ms)).collect()
            }
            (Values::Epoch16(v), _) => v.iter().map(|&e| epoch::epoch16_to_datetime(e)).collect(),
            (Values::Tt2000(v), _) => v.iter().map(|&ns| epoch::tt2000_to_datetime(ns)).collect(),
            _ => return Err(self.wrong_type("an epoch type")),
        };
        converted.ok_or_else(|| CdfError::InvalidEpoch(self.name.clone()))
    }

    fn wrong_type(&self, expected: &'static str) -> CdfError {
        CdfError::WrongType { name: self.name.clone(), data_type: self.data_type, expected }
    }
}

// ---------------------------------------------------------------------------
// CdfFile
// ---------------------------------------------------------------------------

/// An opened CDF file, held in memory.
///
/// The file is read into a buffer in one go, so no OS handle outlives
/// [`CdfFile::open`].
#[derive(Debug)]
pub struct CdfFile {
    data: Vec<u8>,
    layout: Layout,
    version: (i32, i32),
    encoding: Encoding,
    row_major: bool,
    variables: Vec<Descriptor>,
}

impl CdfFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CdfError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CdfError> {
        if bytes.len() < 8 {
            return Err(CdfError::Truncated(0));
        }
        let magic = BigEndian::read_u32(&bytes[0..4]);
        let compressed = BigEndian::read_u32(&bytes[4..8]);
        let layout = match magic {
            MAGIC_V3 => Layout { wide: true },
            MAGIC_V2_6 | MAGIC_V2 => Layout { wide: false },
            other => return Err(CdfError::BadMagic(other)),
        };
        let data = match compressed {
            MAGIC_UNCOMPRESSED => bytes,
            MAGIC_COMPRESSED => inflate_file(&bytes, layout)?,
            other => return Err(CdfError::BadMagic(other)),
        };

        let mut cdr = Record::at(&data, 8, layout)?.expect_kind(record::CDR, "CDR")?;
        let gdr_offset = cdr.offset()?;
        let version = cdr.int()?;
        let release = cdr.int()?;
        let encoding = Encoding::from_code(cdr.int()?)?;
        let flags = cdr.int()?;

        let mut gdr = Record::at(&data, gdr_offset, layout)?.expect_kind(record::GDR, "GDR")?;
        let rvdr_head = gdr.offset()?;
        let zvdr_head = gdr.offset()?;
        let _adr_head = gdr.offset()?;
        let _eof = gdr.offset()?;
        let nr_vars = gdr.count()?;
        let _num_attr = gdr.int()?;
        let _r_max_rec = gdr.int()?;
        let r_num_dims = gdr.count()?;
        let nz_vars = gdr.count()?;
        let _uir_head = gdr.offset()?;
        gdr.skip(12); // rfuC, leap second stamp / rfuD, rfuE
        let r_dims = (0..r_num_dims)
            .map(|_| gdr.count())
            .collect::<Result<Vec<_>, _>>()?;

        let mut file = CdfFile {
            data,
            layout,
            version: (version, release),
            encoding,
            row_major: flags & CDR_ROW_MAJOR != 0,
            variables: Vec::new(),
        };
        let mut variables = file.read_vdr_chain(rvdr_head, nr_vars, false, &r_dims)?;
        variables.extend(file.read_vdr_chain(zvdr_head, nz_vars, true, &r_dims)?);
        file.variables = variables;
        Ok(file)
    }

    /// `(version, release)` from the CDR.
    pub fn version(&self) -> (i32, i32) {
        self.version
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn is_row_major(&self) -> bool {
        self.row_major
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v.name == name)
    }

    // -- descriptors --

    fn read_vdr_chain(
        &self,
        head: u64,
        count: usize,
        z: bool,
        r_dims: &[usize],
    ) -> Result<Vec<Descriptor>, CdfError> {
        let mut out = Vec::new();
        let mut offset = head;
        for _ in 0..count {
            if offset == 0 {
                return Err(CdfError::Corrupt(format!(
                    "variable chain ends after {} of {count} entries",
                    out.len()
                )));
            }
            let (descriptor, next) = self.read_vdr(offset, z, r_dims)?;
            out.push(descriptor);
            offset = next;
        }
        Ok(out)
    }

    fn read_vdr(
        &self,
        offset: u64,
        z: bool,
        r_dims: &[usize],
    ) -> Result<(Descriptor, u64), CdfError> {
        let mut vdr = if z {
            Record::at(&self.data, offset, self.layout)?.expect_kind(record::ZVDR, "zVDR")?
        } else {
            Record::at(&self.data, offset, self.layout)?.expect_kind(record::RVDR, "rVDR")?
        };
        let next = vdr.offset()?;
        let data_type = vdr.int()?;
        let max_rec = vdr.int()?;
        let vxr_head = vdr.offset()?;
        let _vxr_tail = vdr.offset()?;
        let flags = vdr.int()?;
        let _s_records = vdr.int()?;
        vdr.skip(12); // rfuB, rfuC, rfuF
        let num_elems = vdr.count()?.max(1);
        let _num = vdr.int()?;
        let cpr_offset = vdr.offset()?;
        let _blocking_factor = vdr.int()?;
        let name = vdr.name()?;
        let dims = if z {
            let n = vdr.count()?;
            (0..n).map(|_| vdr.count()).collect::<Result<Vec<_>, _>>()?
        } else {
            r_dims.to_vec()
        };
        let dim_varies = dims
            .iter()
            .map(|_| vdr.int().map(|v| v != 0))
            .collect::<Result<Vec<_>, _>>()?;

        let pad = match DataType::from_code(data_type) {
            Some(dt) if flags & VDR_PAD_VALUE != 0 => {
                Some(vdr.bytes(dt.size() * num_elems)?.to_vec())
            }
            _ => None,
        };
        let compression = if flags & VDR_COMPRESSED != 0 && cpr_offset != 0 {
            self.read_cpr(cpr_offset)?
        } else {
            Compression::None
        };

        let descriptor = Descriptor {
            name,
            data_type,
            num_elems,
            max_rec,
            record_varies: flags & VDR_RECORD_VARIES != 0,
            dims,
            dim_varies,
            vxr_head,
            compression,
            pad,
        };
        Ok((descriptor, next))
    }

    fn read_cpr(&self, offset: u64) -> Result<Compression, CdfError> {
        read_cpr(&self.data, offset, self.layout)
    }

    // -- values --

    /// Decode every record of the named variable.
    pub fn variable(&self, name: &str) -> Result<Variable, CdfError> {
        let desc = self
            .variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| CdfError::VariableNotFound(name.to_string()))?;
        let data_type = DataType::from_code(desc.data_type)
            .ok_or(CdfError::UnsupportedDataType(desc.data_type))?;

        let mut shape: Vec<usize> = desc
            .dims
            .iter()
            .zip(&desc.dim_varies)
            .filter(|(_, varies)| **varies)
            .map(|(&d, _)| d)
            .collect();
        let too_large = || CdfError::Corrupt(format!("'{name}' is too large"));
        let element_size = data_type.size().checked_mul(desc.num_elems).ok_or_else(too_large)?;
        let elements_per_record = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(too_large)?;
        let record_bytes = element_size.checked_mul(elements_per_record).ok_or_else(too_large)?;

        let mut num_records = if desc.max_rec < 0 { 0 } else { desc.max_rec as usize + 1 };
        if !desc.record_varies {
            num_records = num_records.min(1);
        }
        let total = num_records.checked_mul(record_bytes).ok_or_else(too_large)?;
        let limit = self.decode_limit(desc.compression);
        if total > limit || num_records > limit {
            return Err(CdfError::Corrupt(format!(
                "'{name}' claims {num_records} records of {record_bytes} bytes in a {} byte file",
                self.data.len()
            )));
        }

        let mut fill = RecordFill {
            buf: match &desc.pad {
                Some(pad) => pad.iter().copied().cycle().take(total).collect(),
                None => vec![0; total],
            },
            written: vec![false; num_records],
            record_bytes,
        };
        if num_records > 0 && record_bytes > 0 && desc.vxr_head != 0 {
            self.read_vxr_chain(desc.vxr_head, desc.compression, &mut fill, 0)?;
        }

        if !self.row_major && shape.len() > 1 {
            for rec in fill.buf.chunks_exact_mut(record_bytes.max(1)) {
                let reordered = reorder(rec, &shape, element_size, false);
                rec.copy_from_slice(&reordered);
            }
        }

        let mut values = match self.encoding {
            Encoding::BigEndian => decode::<BigEndian>(&fill.buf, data_type, desc.num_elems),
            Encoding::LittleEndian => decode::<LittleEndian>(&fill.buf, data_type, desc.num_elems),
        };
        // Records never written and without a declared pad value are missing.
        if let (Values::Real(v), None) = (&mut values, &desc.pad) {
            if !data_type.is_time() {
                let per_record = elements_per_record * desc.num_elems;
                for rec in (0..num_records).filter(|&rec| !fill.written[rec]) {
                    v[rec * per_record..(rec + 1) * per_record].fill(f64::NAN);
                }
            }
        }
        if !data_type.is_text() && desc.num_elems > 1 {
            shape.push(desc.num_elems);
        }

        Ok(Variable { name: desc.name.clone(), data_type, shape, num_records, values })
    }

    /// Most bytes a variable may decode to: what the file could hold once
    /// inflated, plus slack for pad-filled records.
    fn decode_limit(&self, compression: Compression) -> usize {
        let ratio = match compression {
            Compression::None => SPARSE_SLACK,
            _ => GZIP_MAX_RATIO,
        };
        self.data.len().max(MIN_DECODE_BYTES).saturating_mul(ratio)
    }

    fn read_vxr_chain(
        &self,
        head: u64,
        compression: Compression,
        fill: &mut RecordFill,
        depth: usize,
    ) -> Result<(), CdfError> {
        if depth > MAX_VXR_DEPTH {
            return Err(CdfError::Corrupt("VXR tree too deep".into()));
        }
        let mut offset = head;
        let mut visited = 0usize;
        while offset != 0 {
            visited += 1;
            if visited > self.data.len() {
                return Err(CdfError::Corrupt("VXR chain loops".into()));
            }
            let mut vxr =
                Record::at(&self.data, offset, self.layout)?.expect_kind(record::VXR, "VXR")?;
            let next = vxr.offset()?;
            let n_entries = vxr.count()?;
            let n_used = vxr.count()?.min(n_entries);
            let firsts = (0..n_entries).map(|_| vxr.int()).collect::<Result<Vec<_>, _>>()?;
            let lasts = (0..n_entries).map(|_| vxr.int()).collect::<Result<Vec<_>, _>>()?;
            let children = (0..n_entries).map(|_| vxr.offset()).collect::<Result<Vec<_>, _>>()?;

            for i in 0..n_used {
                if firsts[i] < 0 || lasts[i] < firsts[i] {
                    continue;
                }
                let first = firsts[i] as usize;
                let count = (lasts[i] - firsts[i]) as usize + 1;
                self.read_block(children[i], first, count, compression, fill, depth)?;
            }
            offset = next;
        }
        Ok(())
    }

    fn read_block(
        &self,
        offset: u64,
        first: usize,
        count: usize,
        compression: Compression,
        fill: &mut RecordFill,
        depth: usize,
    ) -> Result<(), CdfError> {
        let mut rec = Record::at(&self.data, offset, self.layout)?;
        match rec.kind {
            record::VXR => self.read_vxr_chain(offset, compression, fill, depth + 1),
            record::VVR => fill.copy(first, count, rec.rest()?, offset),
            record::CVVR => {
                let _rfu = rec.int()?;
                let c_size = rec.offset()? as usize;
                let raw = inflate(compression, rec.bytes(c_size)?)?;
                fill.copy(first, count, &raw, offset)
            }
            found => Err(CdfError::RecordType { offset, expected: "VVR", found }),
        }
    }
}

/// Output buffer for a variable's records plus which ones were written.
struct RecordFill {
    buf: Vec<u8>,
    written: Vec<bool>,
    record_bytes: usize,
}

impl RecordFill {
    fn copy(
        &mut self,
        first: usize,
        count: usize,
        src: &[u8],
        offset: u64,
    ) -> Result<(), CdfError> {
        let rb = self.record_bytes;
        for k in 0..count {
            let rec = first + k;
            if rec >= self.written.len() {
                break;
            }
            let chunk = src.get(k * rb..(k + 1) * rb).ok_or(CdfError::Truncated(offset))?;
            self.buf[rec * rb..(rec + 1) * rb].copy_from_slice(chunk);
            self.written[rec] = true;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compression helpers
// ---------------------------------------------------------------------------

fn read_cpr(data: &[u8], offset: u64, layout: Layout) -> Result<Compression, CdfError> {
    let mut cpr = Record::at(data, offset, layout)?.expect_kind(record::CPR, "CPR")?;
    let kind = cpr.int()?;
    let _rfu = cpr.int()?;
    let p_count = cpr.count()?;
    let level = if p_count > 0 { cpr.int()? } else { 0 };
    Compression::from_cpr(kind, level)
}

fn inflate(compression: Compression, raw: &[u8]) -> Result<Vec<u8>, CdfError> {
    match compression {
        Compression::None => Ok(raw.to_vec()),
        Compression::Gzip(_) => {
            let mut out = Vec::new();
            GzDecoder::new(raw).read_to_end(&mut out)?;
            Ok(out)
        }
        Compression::Rle => Err(CdfError::UnsupportedCompression(1)),
        Compression::Huffman => Err(CdfError::UnsupportedCompression(2)),
        Compression::AdaptiveHuffman => Err(CdfError::UnsupportedCompression(3)),
    }
}

/// Expand a whole-file compressed CDF (CCR) into an uncompressed image.
fn inflate_file(bytes: &[u8], layout: Layout) -> Result<Vec<u8>, CdfError> {
    let mut ccr = Record::at(bytes, 8, layout)?.expect_kind(record::CCR, "CCR")?;
    let cpr_offset = ccr.offset()?;
    let uncompressed_size = ccr.offset()? as usize;
    let _rfu = ccr.int()?;
    let compressed = ccr.rest()?;
    let compression = read_cpr(bytes, cpr_offset, layout)?;

    let body = inflate(compression, compressed)?;
    if body.len() != uncompressed_size {
        log::debug!(
            "CCR declares {uncompressed_size} bytes, inflated to {}",
            body.len()
        );
    }
    let mut image = Vec::with_capacity(body.len() + 8);
    image.extend_from_slice(&bytes[0..4]);
    image.extend_from_slice(&MAGIC_UNCOMPRESSED.to_be_bytes());
    image.extend_from_slice(&body);
    Ok(image)
}

// ---------------------------------------------------------------------------
// Value decoding
// ---------------------------------------------------------------------------

fn decode<B: ByteOrder>(bytes: &[u8], data_type: DataType, num_elems: usize) -> Values {
    use DataType::*;
    match data_type {
        Int1 | Byte => Values::Real(bytes.iter().map(|&b| b as i8 as f64).collect()),
        Uint1 => Values::Real(bytes.iter().map(|&b| b as f64).collect()),
        Int2 => Values::Real(bytes.chunks_exact(2).map(|c| B::read_i16(c) as f64).collect()),
        Uint2 => Values::Real(bytes.chunks_exact(2).map(|c| B::read_u16(c) as f64).collect()),
        Int4 => Values::Real(bytes.chunks_exact(4).map(|c| B::read_i32(c) as f64).collect()),
        Uint4 => Values::Real(bytes.chunks_exact(4).map(|c| B::read_u32(c) as f64).collect()),
        Int8 => Values::Real(bytes.chunks_exact(8).map(|c| B::read_i64(c) as f64).collect()),
        Real4 | Float => {
            Values::Real(bytes.chunks_exact(4).map(|c| B::read_f32(c) as f64).collect())
        }
        Real8 | Double | Epoch => Values::Real(bytes.chunks_exact(8).map(B::read_f64).collect()),
        TimeTt2000 => Values::Tt2000(bytes.chunks_exact(8).map(B::read_i64).collect()),
        Epoch16 => Values::Epoch16(
            bytes
                .chunks_exact(16)
                .map(|c| [B::read_f64(&c[..8]), B::read_f64(&c[8..])])
                .collect(),
        ),
        Char | Uchar => Values::Text(
            bytes
                .chunks_exact(num_elems.max(1))
                .map(|c| {
                    let end = c.iter().position(|&b| b == 0).unwrap_or(c.len());
                    String::from_utf8_lossy(&c[..end]).trim_end().to_string()
                })
                .collect(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Majority
// ---------------------------------------------------------------------------

/// Column-major offset of the element at row-major position `index`.
fn column_major_index(mut index: usize, shape: &[usize]) -> usize {
    let mut stride = shape.iter().product::<usize>();
    let mut column = 0;
    let mut column_stride = 1;
    for &dim in shape {
        stride /= dim.max(1);
        let i = index / stride.max(1);
        index %= stride.max(1);
        column += i * column_stride;
        column_stride *= dim;
    }
    column
}

/// Reorder one record between column-major and row-major element order.
pub(crate) fn reorder(
    record: &[u8],
    shape: &[usize],
    element_size: usize,
    to_column: bool,
) -> Vec<u8> {
    let n: usize = shape.iter().product();
    let mut out = vec![0u8; record.len()];
    for row in 0..n {
        let col = column_major_index(row, shape);
        let (src, dst) = if to_column { (row, col) } else { (col, row) };
        out[dst * element_size..(dst + 1) * element_size]
            .copy_from_slice(&record[src * element_size..(src + 1) * element_size]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major_index_of_2x3() {
        // Row-major [[a b c] [d e f]] is column-major [a d b e c f].
        let got: Vec<usize> = (0..6).map(|i| column_major_index(i, &[2, 3])).collect();
        assert_eq!(got, vec![0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn reorder_round_trips() {
        let rec: Vec<u8> = (0u8..6).collect();
        let col = reorder(&rec, &[2, 3], 1, true);
        assert_eq!(col, vec![0, 3, 1, 4, 2, 5]);
        assert_eq!(reorder(&col, &[2, 3], 1, false), rec);
    }

    #[test]
    fn rejects_bad_magic() {
        let err = CdfFile::from_bytes(vec![0x50, 0x4b, 0x03, 0x04, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, CdfError::BadMagic(0x504b_0304)));
    }

    /// Offset of the first zVDR in a file made by the writer.
    fn first_zvdr(bytes: &[u8]) -> usize {
        let gdr = BigEndian::read_i64(&bytes[20..28]) as usize;
        BigEndian::read_i64(&bytes[gdr + 20..gdr + 28]) as usize
    }

    #[test]
    fn implausible_record_count_is_corrupt() {
        let mut writer = crate::data::cdf::CdfWriter::new();
        writer.add_real8("proton_density", &[], &[1.0, 2.0, 3.0]).unwrap();
        let mut bytes = writer.to_bytes().unwrap();
        let max_rec = first_zvdr(&bytes) + 24;
        assert_eq!(BigEndian::read_i32(&bytes[max_rec..max_rec + 4]), 2);

        BigEndian::write_i32(&mut bytes[max_rec..max_rec + 4], 20_000_000);
        let cdf = CdfFile::from_bytes(bytes).unwrap();
        let err = cdf.variable("proton_density").unwrap_err();
        assert!(matches!(err, CdfError::Corrupt(_)), "{err}");
    }

    #[test]
    fn huge_dimensions_are_corrupt() {
        let mut writer = crate::data::cdf::CdfWriter::new();
        writer.add_real8("integrated_flux_mod", &[2], &[1.0, 2.0]).unwrap();
        let mut bytes = writer.to_bytes().unwrap();
        // zNumDims sits after the 256-byte name; the one dimension follows it.
        let dim = first_zvdr(&bytes) + 344;
        assert_eq!(BigEndian::read_i32(&bytes[dim..dim + 4]), 2);

        BigEndian::write_i32(&mut bytes[dim..dim + 4], i32::MAX);
        let cdf = CdfFile::from_bytes(bytes).unwrap();
        assert!(matches!(cdf.variable("integrated_flux_mod"), Err(CdfError::Corrupt(_))));
    }

    #[test]
    fn fields_past_record_end_are_truncation() {
        // Compressed v3 file whose CCR claims to be only a header long.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC_V3.to_be_bytes());
        bytes.extend_from_slice(&MAGIC_COMPRESSED.to_be_bytes());
        bytes.extend_from_slice(&12i64.to_be_bytes());
        bytes.extend_from_slice(&record::CCR.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 64]);
        assert!(matches!(CdfFile::from_bytes(bytes), Err(CdfError::Truncated(8))));
    }

    #[test]
    fn rest_of_overread_record_is_truncation() {
        let mut data = Vec::new();
        data.extend_from_slice(&16i64.to_be_bytes());
        data.extend_from_slice(&record::VVR.to_be_bytes());
        data.extend_from_slice(&[0u8; 16]);
        let mut rec = Record::at(&data, 0, Layout { wide: true }).unwrap();
        rec.skip(8);
        assert!(matches!(rec.rest(), Err(CdfError::Truncated(0))));
        assert!(matches!(rec.int(), Err(CdfError::Truncated(0))));
    }

    #[test]
    fn rejects_short_input() {
        assert!(matches!(CdfFile::from_bytes(vec![0xCD]), Err(CdfError::Truncated(0))));
    }
}
