//! Core data structures for Nanoscope file components.
//!
//! This module defines the fundamental types used throughout the library:
//! - The raw header and the per-layer scan records built from it
//! - Calibration constants and scan geometry
//! - Decoder configuration

use encoding_rs::{Encoding, WINDOWS_1252};
use ndarray::Array2;

use super::error::{NanoscopeError, Result};

/// A decoded, calibrated image layer.
///
/// After decoding, the matrix has been scaled to physical units and rotated,
/// so its shape is `cols x rows` relative to the header's geometry.
pub type LayerMatrix = Array2<f64>;

/// The textual header, one entry per physical line.
///
/// Lines have trailing whitespace and every backslash removed. The last line
/// is the `*File list end` sentinel when the file carries one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeader {
    lines: Vec<String>,
}

impl RawHeader {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates, in header order, over every line containing `marker`.
    pub fn lines_containing<'a>(&'a self, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(move |line| line.contains(marker))
    }
}

/// The key/value fields of one `*Ciao image list` section, in header order.
///
/// A bare `Key` line is kept as present-with-no-value, which is distinct
/// from a key that never appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRecord {
    fields: Vec<(String, Option<String>)>,
}

impl ScanRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a field. A later duplicate key replaces the earlier value but
    /// keeps the position of its first appearance.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.fields.iter().position(|(k, _)| *k == key) {
            Some(i) => self.fields[i].1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// `None` if the key is absent, `Some(None)` if it is present without a value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    /// The field's value, if the key is present and carries one.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).flatten()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in the order they first appeared in the header.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// The field's value, failing with `MissingField` when the key is absent
    /// or has no value.
    pub fn require_value(&self, key: &str) -> Result<&str> {
        self.value(key).ok_or_else(|| NanoscopeError::missing(key))
    }

    /// Parses a required field as an unsigned integer.
    pub fn require_int(&self, key: &str) -> Result<u64> {
        let raw = self.require_value(key)?;
        raw.trim().parse::<u64>().map_err(|e| {
            NanoscopeError::InvalidFormat(format!("Field '{}' is not an integer ({:?}): {}", key, raw, e))
        })
    }
}

/// All scan records in the order their section markers appear in the header.
/// Index `n` is layer `n`.
pub type ScanRegistry = Vec<ScanRecord>;

/// Instrument calibration constants computed once from the header.
///
/// Every value falls back to `1.0` when its marker line is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Primary Z sensitivity (nm/V).
    pub zsens: f64,
    /// Secondary Z sensitivity (nm/V).
    pub zsens2: f64,
    pub stage_x: f64,
    pub stage_y: f64,
    pub stage_z: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            zsens: 1.0,
            zsens2: 1.0,
            stage_x: 1.0,
            stage_y: 1.0,
            stage_z: 1.0,
        }
    }
}

/// Scan size and offsets. Unlike [`Calibration`], these have no default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanGeometry {
    pub scan_size: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl ScanGeometry {
    /// `(scan_size, x_offset, y_offset)`
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.scan_size, self.x_offset, self.y_offset)
    }
}

/// Summary of one layer's location and calibration, without its samples.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub index: usize,
    pub name: String,
    /// Absolute byte offset of the first sample.
    pub data_offset: u64,
    /// `Number of lines`
    pub rows: usize,
    /// `Samps/line`
    pub cols: usize,
    /// Physical units per raw sample.
    pub scale: f64,
}

/// Byte order of the 16-bit samples in the binary region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SampleByteOrder {
    #[default]
    Little,
    Big,
}

/// Options controlling how a file is read.
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    pub byte_order: SampleByteOrder,
    /// Encoding used to turn header bytes into text.
    pub header_encoding: &'static Encoding,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            byte_order: SampleByteOrder::Little,
            header_encoding: WINDOWS_1252,
        }
    }
}

impl ReaderOptions {
    pub fn with_byte_order(mut self, byte_order: SampleByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Resolves `label` (e.g. `"utf-8"`, `"latin1"`) to an encoding.
    /// Unknown labels fail with `InvalidFormat`.
    pub fn with_header_encoding(mut self, label: &str) -> Result<Self> {
        self.header_encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            NanoscopeError::InvalidFormat(format!("Unknown header encoding: {}", label))
        })?;
        Ok(self)
    }
}
