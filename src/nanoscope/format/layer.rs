//! # Image Layer Decoding
//!
//! Turns one layer's raw 16-bit samples into a calibrated matrix.
//!
//! ## Layout
//! Samples are stored so that a sequential read fills the matrix column by
//! column: the row index advances fastest and the column index advances after
//! every `rows` samples. Scaling the filled matrix and rotating it 90 degrees
//! counter-clockwise yields the physical orientation of the scanned surface,
//! so for a stored `rows x cols` layer the result is `cols x rows` with
//! `out[i][j] = scale * stored[j][cols - 1 - i]`.
//!
//! ## Truncated data
//! A sample that cannot be read leaves its cell at zero and decoding still
//! succeeds. Only the count of skipped samples is reported, via `warn!`.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use log::{debug, info, warn};
use ndarray::Array2;

use crate::nanoscope::types::{
    error::{NanoscopeError, Result},
    models::{LayerMatrix, SampleByteOrder, ScanRecord},
};

pub const DATA_OFFSET_FIELD: &str = "Data offset";
pub const ROWS_FIELD: &str = "Number of lines";
pub const COLS_FIELD: &str = "Samps/line";

/// Width in bytes of one stored sample.
pub const SAMPLE_SIZE: u64 = 2;

/// How far a layer's declared data may run past the end of the file before
/// the geometry is rejected instead of zero-filled.
pub const TRUNCATION_ALLOWANCE: u64 = 64 * 1024 * 1024;

/// Where a layer's samples live and how many there are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerGeometry {
    pub data_offset: u64,
    pub rows: usize,
    pub cols: usize,
}

impl LayerGeometry {
    /// Reads `Data offset`, `Number of lines` and `Samps/line` from a record.
    pub fn from_record(record: &ScanRecord) -> Result<Self> {
        let data_offset = record.require_int(DATA_OFFSET_FIELD)?;
        let rows = to_usize(record.require_int(ROWS_FIELD)?, ROWS_FIELD)?;
        let cols = to_usize(record.require_int(COLS_FIELD)?, COLS_FIELD)?;
        Ok(Self {
            data_offset,
            rows,
            cols,
        })
    }

    /// Declared size of the layer's sample data in bytes.
    pub fn byte_len(&self) -> Result<u64> {
        (self.rows as u64)
            .checked_mul(self.cols as u64)
            .and_then(|n| n.checked_mul(SAMPLE_SIZE))
            .ok_or_else(|| {
                NanoscopeError::InvalidFormat(format!(
                    "Layer size overflows: {} x {}",
                    self.rows, self.cols
                ))
            })
    }

    /// Rejects a layer whose declared data runs more than
    /// [`TRUNCATION_ALLOWANCE`] bytes past the end of a `file_len`-byte file.
    pub fn check_against_file(&self, file_len: u64) -> Result<()> {
        let declared = self.byte_len()?;
        let available = file_len.saturating_sub(self.data_offset);
        if declared > available.saturating_add(TRUNCATION_ALLOWANCE) {
            return Err(NanoscopeError::InvalidFormat(format!(
                "Layer of {} x {} samples ({} bytes) at offset {} exceeds file length {}",
                self.rows, self.cols, declared, self.data_offset, file_len
            )));
        }
        Ok(())
    }
}

fn to_usize(value: u64, field: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        NanoscopeError::InvalidFormat(format!("Field '{}' is too large: {}", field, value))
    })
}

/// Decodes the layer described by `record` from the file at `path`.
///
/// The file is opened, read and released within this call.
pub fn read_layer(
    path: &Path,
    record: &ScanRecord,
    scale: f64,
    byte_order: SampleByteOrder,
) -> Result<LayerMatrix> {
    let geometry = LayerGeometry::from_record(record)?;
    debug!(
        "Layer geometry: offset={}, rows={}, cols={}, scale={}",
        geometry.data_offset, geometry.rows, geometry.cols, scale
    );

    let mut file = File::open(path)?;
    geometry.check_against_file(file.metadata()?.len())?;
    file.seek(SeekFrom::Start(geometry.data_offset))?;
    let mut reader = BufReader::new(file);

    let mut matrix = decode_samples(&mut reader, geometry.rows, geometry.cols, byte_order)?;
    matrix.mapv_inplace(|v| v * scale);
    let rotated = rotate90(&matrix);

    info!(
        "Decoded layer at offset {}: {} x {} samples",
        geometry.data_offset, geometry.rows, geometry.cols
    );
    Ok(rotated)
}

/// Reads `rows * cols` samples from `reader` into a `rows x cols` matrix in
/// column-major fill order. Unscaled and unrotated.
///
/// Running out of data is not an error: the remaining cells stay zero.
pub fn decode_samples<R: Read>(
    reader: &mut R,
    rows: usize,
    cols: usize,
    byte_order: SampleByteOrder,
) -> Result<Array2<f64>> {
    let total = rows
        .checked_mul(cols)
        .filter(|n| {
            n.checked_mul(size_of::<f64>())
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or_else(|| {
            NanoscopeError::InvalidFormat(format!("Layer size overflows: {} x {}", rows, cols))
        })?;
    let mut matrix = Array2::<f64>::zeros((rows, cols));

    let (mut row, mut col) = (0, 0);
    for index in 0..total {
        match read_sample(reader, byte_order) {
            Ok(sample) => matrix[[row, col]] = f64::from(sample),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(
                    "Sample data truncated: {} of {} sample(s) left at zero",
                    total - index,
                    total
                );
                break;
            }
            Err(e) => return Err(e.into()),
        }

        if row == rows - 1 {
            row = 0;
            col += 1;
        } else {
            row += 1;
        }
    }

    Ok(matrix)
}

fn read_sample<R: Read>(reader: &mut R, byte_order: SampleByteOrder) -> io::Result<i16> {
    match byte_order {
        SampleByteOrder::Little => reader.read_i16::<LittleEndian>(),
        SampleByteOrder::Big => reader.read_i16::<BigEndian>(),
    }
}

/// Rotates a matrix 90 degrees counter-clockwise.
///
/// An `r x c` input becomes `c x r` with `out[i][j] = m[j][c - 1 - i]`.
pub fn rotate90(matrix: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = matrix.dim();
    Array2::from_shape_fn((cols, rows), |(i, j)| matrix[[j, cols - 1 - i]])
}
