//! Replay trace parser.
//!
//! One record per line:
//!
//! ```text
//! @<pc> <P|V> <W|C> <addr> <size> <data> <tick>
//! ```
//!
//! Numeric fields are hexadecimal with an optional `0x` prefix. `P` marks a
//! store to the target region and `V` any other store; `W` is a write and `C`
//! a flush. `data` holds up to eight bytes as a little-endian integer. Blank
//! lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::data::{Pc, StoreKind, StoreOp, Tick};
use crate::common::error::TraceError;

/// Largest payload a record can carry.
const MAX_RECORD_BYTES: u64 = 8;

/// One parsed trace record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    /// Store PC.
    pub pc: Pc,
    /// The record was tagged as a target-region store.
    pub persistent: bool,
    /// Write or flush.
    pub kind: StoreKind,
    /// Virtual address.
    pub addr: u64,
    /// Payload size in bytes.
    pub size: u64,
    /// Payload as a little-endian integer.
    pub data: u64,
    /// Issue tick.
    pub tick: Tick,
}

impl TraceRecord {
    /// Converts the record to the operation the engine observes.
    pub fn to_store_op(&self) -> StoreOp {
        match self.kind {
            StoreKind::Flush => StoreOp::flush(self.tick, self.pc, self.addr),
            StoreKind::Write => {
                let bytes = self.data.to_le_bytes();
                StoreOp::write(self.tick, self.pc, self.addr, &bytes[..self.size as usize])
            }
        }
    }
}

/// Parses one trace line. `line_no` is one-based and only used in errors.
///
/// Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns [`TraceError::Malformed`] if the record does not have seven fields
/// or has an unknown tag, and [`TraceError::BadNumber`] if a numeric field is
/// not hexadecimal.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<TraceRecord>, TraceError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let malformed = |reason: &str| TraceError::Malformed {
        line: line_no,
        reason: reason.to_owned(),
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    let [pc, region, kind, addr, size, data, tick] = fields.as_slice() else {
        return Err(malformed(&format!("expected 7 fields, found {}", fields.len())));
    };
    let Some(pc) = pc.strip_prefix('@') else {
        return Err(malformed("pc field must start with `@`"));
    };
    let persistent = match *region {
        "P" => true,
        "V" => false,
        other => return Err(malformed(&format!("unknown region tag `{other}`"))),
    };
    let kind = match *kind {
        "W" => StoreKind::Write,
        "C" => StoreKind::Flush,
        other => return Err(malformed(&format!("unknown operation tag `{other}`"))),
    };

    let record = TraceRecord {
        pc: hex(line_no, "pc", pc)?,
        persistent,
        kind,
        addr: hex(line_no, "addr", addr)?,
        size: hex(line_no, "size", size)?,
        data: hex(line_no, "data", data)?,
        tick: hex(line_no, "tick", tick)?,
    };
    if record.size > MAX_RECORD_BYTES {
        return Err(malformed(&format!(
            "size {} exceeds {MAX_RECORD_BYTES} bytes",
            record.size
        )));
    }
    Ok(Some(record))
}

/// Reads every record of the trace at `path`.
///
/// # Errors
///
/// Returns the first parse error, or [`TraceError::Io`] if the file cannot be read.
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<TraceRecord>, TraceError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        if let Some(record) = parse_line(i + 1, &line?)? {
            records.push(record);
        }
    }
    Ok(records)
}

fn hex(line: usize, field: &'static str, text: &str) -> Result<u64, TraceError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|_| TraceError::BadNumber {
        line,
        field,
        text: text.to_owned(),
    })
}
