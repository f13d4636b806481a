use super::CdfError;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// CDF data types, identified on disk by their numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int1,
    Int2,
    Int4,
    Int8,
    Uint1,
    Uint2,
    Uint4,
    Real4,
    Real8,
    /// Milliseconds since 0000-01-01T00:00:00, stored as a double.
    Epoch,
    /// Seconds since 0000-01-01 plus picoseconds, stored as two doubles.
    Epoch16,
    Byte,
    Float,
    Double,
    /// Nanoseconds since J2000 (TT), leap seconds included.
    TimeTt2000,
    Char,
    Uchar,
}

impl DataType {
    pub fn from_code(code: i32) -> Option<Self> {
        use DataType::*;
        Some(match code {
            1 => Int1,
            2 => Int2,
            4 => Int4,
            8 => Int8,
            11 => Uint1,
            12 => Uint2,
            14 => Uint4,
            21 => Real4,
            22 => Real8,
            31 => Epoch,
            32 => Epoch16,
            33 => TimeTt2000,
            41 => Byte,
            44 => Float,
            45 => Double,
            51 => Char,
            52 => Uchar,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        use DataType::*;
        match self {
            Int1 => 1,
            Int2 => 2,
            Int4 => 4,
            Int8 => 8,
            Uint1 => 11,
            Uint2 => 12,
            Uint4 => 14,
            Real4 => 21,
            Real8 => 22,
            Epoch => 31,
            Epoch16 => 32,
            TimeTt2000 => 33,
            Byte => 41,
            Float => 44,
            Double => 45,
            Char => 51,
            Uchar => 52,
        }
    }

    /// Size in bytes of one element.
    pub fn size(self) -> usize {
        use DataType::*;
        match self {
            Int1 | Uint1 | Byte | Char | Uchar => 1,
            Int2 | Uint2 => 2,
            Int4 | Uint4 | Real4 | Float => 4,
            Int8 | Real8 | Double | Epoch | TimeTt2000 => 8,
            Epoch16 => 16,
        }
    }

    pub fn is_time(self) -> bool {
        matches!(self, DataType::Epoch | DataType::Epoch16 | DataType::TimeTt2000)
    }

    pub fn is_text(self) -> bool {
        matches!(self, DataType::Char | DataType::Uchar)
    }
}

// ---------------------------------------------------------------------------
// Encodings
// ---------------------------------------------------------------------------

/// Byte order of variable values. Internal records are always big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    BigEndian,
    LittleEndian,
}

impl Encoding {
    /// Map a CDR encoding code onto a byte order.
    ///
    /// VAX and the VMS D/G float encodings are not IEEE and are rejected.
    pub fn from_code(code: i32) -> Result<Self, CdfError> {
        match code {
            // NETWORK, SUN, SGi, IBMRS, PPC, HP, NeXT, ARM_BIG
            1 | 2 | 5 | 7 | 9 | 11 | 12 | 18 => Ok(Encoding::BigEndian),
            // DECSTATION, IBMPC, ALPHAOSF1, ALPHAVMSi, ARM_LITTLE, IA64VMSi
            4 | 6 | 13 | 16 | 17 | 19 => Ok(Encoding::LittleEndian),
            other => Err(CdfError::UnsupportedEncoding(other)),
        }
    }

    /// Code written into the CDR by the writer.
    pub fn code(self) -> i32 {
        match self {
            Encoding::BigEndian => 1,
            Encoding::LittleEndian => 6,
        }
    }
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

/// Compression algorithm named by a CPR record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Rle,
    Huffman,
    AdaptiveHuffman,
    Gzip(i32),
}

impl Compression {
    pub fn from_cpr(kind: i32, level: i32) -> Result<Self, CdfError> {
        match kind {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Rle),
            2 => Ok(Compression::Huffman),
            3 => Ok(Compression::AdaptiveHuffman),
            5 => Ok(Compression::Gzip(level)),
            other => Err(CdfError::UnsupportedCompression(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoded values
// ---------------------------------------------------------------------------

/// Values of one variable across all its records, flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// Integer, real and CDF_EPOCH types widened to `f64`.
    Real(Vec<f64>),
    /// TIME_TT2000 kept as integers; `f64` would lose nanoseconds.
    Tt2000(Vec<i64>),
    /// CDF_EPOCH16 as `[seconds, picoseconds]`.
    Epoch16(Vec<[f64; 2]>),
    /// One string per element, trailing NULs and blanks trimmed.
    Text(Vec<String>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Real(v) => v.len(),
            Values::Tt2000(v) => v.len(),
            Values::Epoch16(v) => v.len(),
            Values::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_codes_round_trip() {
        for code in [1, 2, 4, 8, 11, 12, 14, 21, 22, 31, 32, 33, 41, 44, 45, 51, 52] {
            let dt = DataType::from_code(code).unwrap();
            assert_eq!(dt.code(), code);
        }
        assert!(DataType::from_code(3).is_none());
    }

    #[test]
    fn vax_encodings_are_rejected() {
        assert!(matches!(
            Encoding::from_code(3),
            Err(CdfError::UnsupportedEncoding(3))
        ));
        assert_eq!(Encoding::from_code(6).unwrap(), Encoding::LittleEndian);
        assert_eq!(Encoding::from_code(1).unwrap(), Encoding::BigEndian);
    }
}
