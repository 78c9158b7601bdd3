//! `.npy` codec for persisted alignment paths.
//!
//! numpy format v1.0, dtype `<i8`, C order, shape `(2, L)`: row 0 is the A
//! index, row 1 the B index. Files load directly with `numpy.load`.

use std::io::{Read, Write};

use contracts::{AlignmentPath, SyncError};
use thiserror::Error;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;

/// Artifact codec errors
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed npy: {0}")]
    Format(String),

    #[error("invalid alignment path: {0}")]
    InvalidPath(#[from] SyncError),
}

impl ArtifactError {
    fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}

/// Serialize `path` as a `(2, L)` int64 array
pub fn write_npy<W: Write>(mut writer: W, path: &AlignmentPath) -> Result<(), ArtifactError> {
    let mut header = format!(
        "{{'descr': '<i8', 'fortran_order': False, 'shape': (2, {}), }}",
        path.len()
    );
    // magic(6) + version(2) + header_len(2) + header, padded to ALIGN, ending in '\n'
    let unpadded = MAGIC.len() + 4 + header.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let header_len = u16::try_from(header.len())
        .map_err(|_| ArtifactError::format("header too long"))?;

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(header.as_bytes())?;

    let mut data = Vec::with_capacity(path.len() * 16);
    for row in [path.idx_a(), path.idx_b()] {
        for &idx in row {
            data.extend_from_slice(&(idx as i64).to_le_bytes());
        }
    }
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

/// Parse a `(2, L)` int64 array back into a validated path
pub fn read_npy<R: Read>(mut reader: R) -> Result<AlignmentPath, ArtifactError> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(ArtifactError::format("bad magic"));
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        other => return Err(ArtifactError::format(format!("unsupported version {other}"))),
    };

    let header = read_exactly(&mut reader, header_len)?;
    let header = String::from_utf8(header)
        .map_err(|_| ArtifactError::format("header is not utf-8"))?;
    let header = Header::parse(&header)?;

    if header.descr != "<i8" {
        return Err(ArtifactError::format(format!(
            "expected dtype '<i8', found '{}'",
            header.descr
        )));
    }
    let len = match header.shape.as_slice() {
        [2, len] => *len,
        other => {
            return Err(ArtifactError::format(format!(
                "expected shape (2, L), found {other:?}"
            )))
        }
    };

    let byte_len = len
        .checked_mul(2 * 8)
        .ok_or_else(|| ArtifactError::format(format!("shape (2, {len}) overflows")))?;
    let data = read_exactly(&mut reader, byte_len)?;
    let mut values = data
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            let value = i64::from_le_bytes(bytes);
            usize::try_from(value)
                .map_err(|_| ArtifactError::format(format!("negative index {value}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (idx_a, idx_b) = if header.fortran_order {
        let a = values.iter().step_by(2).copied().collect();
        let b = values.iter().skip(1).step_by(2).copied().collect();
        (a, b)
    } else {
        let b = values.split_off(len);
        (values, b)
    };

    Ok(AlignmentPath::new(idx_a, idx_b)?)
}

/// Read `len` bytes, growing the buffer only as data actually arrives
fn read_exactly<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>, ArtifactError> {
    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(ArtifactError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {len} bytes, found {}", buf.len()),
        )));
    }
    Ok(buf)
}

/// The three keys of a numpy header dict
#[derive(Debug)]
struct Header {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

impl Header {
    fn parse(text: &str) -> Result<Self, ArtifactError> {
        let descr = value_after(text, "'descr'")?
            .trim_start()
            .strip_prefix('\'')
            .and_then(|rest| rest.split('\'').next())
            .ok_or_else(|| ArtifactError::format("unreadable descr"))?
            .to_string();

        let order = value_after(text, "'fortran_order'")?.trim_start();
        let fortran_order = if order.starts_with("True") {
            true
        } else if order.starts_with("False") {
            false
        } else {
            return Err(ArtifactError::format("unreadable fortran_order"));
        };

        let shape_text = value_after(text, "'shape'")?
            .trim_start()
            .strip_prefix('(')
            .and_then(|rest| rest.split(')').next())
            .ok_or_else(|| ArtifactError::format("unreadable shape"))?;
        let shape = shape_text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.trim_end_matches('L')
                    .parse::<usize>()
                    .map_err(|_| ArtifactError::format(format!("bad shape entry '{s}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            descr,
            fortran_order,
            shape,
        })
    }
}

/// Text following `key:` in the header dict
fn value_after<'a>(text: &'a str, key: &str) -> Result<&'a str, ArtifactError> {
    let start = text
        .find(key)
        .ok_or_else(|| ArtifactError::format(format!("missing key {key}")))?;
    text[start + key.len()..]
        .trim_start()
        .strip_prefix(':')
        .ok_or_else(|| ArtifactError::format(format!("missing ':' after {key}")))
}
