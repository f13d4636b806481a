/// Native reader (and a small writer) for NASA's Common Data Format.
///
/// Layout of a CDF file as walked by [`CdfFile`]:
/// ```text
///  magic numbers
///        │
///        ▼
///   ┌─────┐     ┌─────┐     ┌──────────────┐     ┌───────────┐
///   │ CDR │ ──▶ │ GDR │ ──▶ │ rVDR / zVDR  │ ──▶ │ VXR tree  │ ──▶ VVR / CVVR
///   └─────┘     └─────┘     │  (chained)   │     └───────────┘
///                           └──────────────┘
/// ```
/// Internal records are big-endian; variable values use the file encoding.
pub mod epoch;
pub mod reader;
pub mod types;
pub mod writer;

pub use reader::{CdfFile, Variable};
pub use types::{Compression, DataType, Encoding, Values};
pub use writer::{CdfWriter, WriterCompression};

/// Errors raised while decoding or encoding CDF files.
#[derive(Debug, thiserror::Error)]
pub enum CdfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a CDF file (magic number {0:#010x})")]
    BadMagic(u32),

    #[error("truncated record at offset {0}")]
    Truncated(u64),

    #[error("expected {expected} record at offset {offset}, found record type {found}")]
    RecordType {
        offset: u64,
        expected: &'static str,
        found: i32,
    },

    #[error("unsupported encoding {0}")]
    UnsupportedEncoding(i32),

    #[error("unsupported data type {0}")]
    UnsupportedDataType(i32),

    #[error("unsupported compression type {0}")]
    UnsupportedCompression(i32),

    #[error("variable '{0}' not found")]
    VariableNotFound(String),

    #[error("variable '{name}' has type {data_type:?}, expected {expected}")]
    WrongType {
        name: String,
        data_type: DataType,
        expected: &'static str,
    },

    #[error("variable '{0}' holds an epoch outside the calendar range")]
    InvalidEpoch(String),

    #[error("{count} values do not fill whole records of {record_len} for '{name}'")]
    Shape {
        name: String,
        count: usize,
        record_len: usize,
    },

    #[error("corrupt file: {0}")]
    Corrupt(String),
}
