use std::path::{Path, PathBuf};

use log::{debug, info};

use super::format::{extract, header, layer, scans};
use super::types::error::{NanoscopeError, Result};
use super::types::models::*;

/// The main reader for Nanoscope SPM files.
///
/// Construction reads the text header once, builds the scan registry and
/// computes the instrument calibration. Layer samples are read on demand;
/// each call opens the file and releases it before returning, so the reader
/// itself holds no file handle.
#[derive(Debug)]
pub struct NanoscopeReader {
    file_path: PathBuf,
    options: ReaderOptions,
    header: RawHeader,
    scans: ScanRegistry,
    calibration: Calibration,
}

impl NanoscopeReader {
    /// Opens a Nanoscope file with default options (little-endian samples,
    /// Windows-1252 header text).
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened or read
    /// - A calibration line is present but its value is not a number
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, ReaderOptions::default())
    }

    /// Opens a Nanoscope file with explicit options.
    pub fn with_options(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Nanoscope file: {}", path.display());

        let header = header::read_header(path, options.header_encoding)?;
        let scans = scans::build_registry(&header);
        let calibration = extract::calibration(&header)?;

        debug!(
            "Calibration: zsens={}, zsens2={}, stage=({}, {}, {})",
            calibration.zsens,
            calibration.zsens2,
            calibration.stage_x,
            calibration.stage_y,
            calibration.stage_z
        );
        info!(
            "Nanoscope file opened: {} header line(s), {} layer(s)",
            header.len(),
            scans.len()
        );

        Ok(Self {
            file_path: path.to_path_buf(),
            options,
            header,
            scans,
            calibration,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// The raw header lines.
    pub fn header(&self) -> &RawHeader {
        &self.header
    }

    /// All scan records, indexed by layer.
    pub fn scans(&self) -> &[ScanRecord] {
        &self.scans
    }

    pub fn num_layers(&self) -> usize {
        self.scans.len()
    }

    /// Sensitivities and stage position, computed at construction.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Every header line containing `marker`, in header order.
    pub fn find_in_header<'a>(&'a self, marker: &'a str) -> Vec<&'a str> {
        extract::find_in_header(&self.header, marker)
    }

    /// Returns the scan record for `layer`.
    pub fn scan(&self, layer: usize) -> Result<&ScanRecord> {
        self.scans.get(layer).ok_or(NanoscopeError::LayerOutOfRange {
            layer,
            count: self.scans.len(),
        })
    }

    /// Physical units per raw sample for `layer`.
    ///
    /// Looks up the `layer`-th Z scale line of the header and falls back
    /// to `1.0` when there are not that many.
    pub fn scale(&self, layer: usize) -> Result<f64> {
        extract::layer_scale(&self.header, layer)
    }

    /// Scan size and X/Y offset. Any of the three lines missing is an error.
    pub fn size(&self) -> Result<ScanGeometry> {
        extract::scan_geometry(&self.header)
    }

    /// Display name of `layer`, e.g. `"Height"`.
    pub fn layer_name(&self, layer: usize) -> Result<String> {
        extract::layer_name(self.scan(layer)?)
    }

    /// Location, size, name and scale of `layer`, without reading samples.
    pub fn layer_info(&self, layer: usize) -> Result<LayerInfo> {
        let record = self.scan(layer)?;
        let geometry = layer::LayerGeometry::from_record(record)?;
        Ok(LayerInfo {
            index: layer,
            name: extract::layer_name(record)?,
            data_offset: geometry.data_offset,
            rows: geometry.rows,
            cols: geometry.cols,
            scale: self.scale(layer)?,
        })
    }

    /// [`layer_info`](Self::layer_info) for every layer.
    pub fn layers(&self) -> Result<Vec<LayerInfo>> {
        (0..self.num_layers()).map(|i| self.layer_info(i)).collect()
    }

    /// Decodes `layer` into a calibrated, correctly oriented matrix.
    ///
    /// The result has shape `Samps/line x Number of lines`.
    pub fn read_layer(&self, layer: usize) -> Result<LayerMatrix> {
        let record = self.scan(layer)?;
        let scale = self.scale(layer)?;
        layer::read_layer(&self.file_path, record, scale, self.options.byte_order)
    }

    /// Decodes every layer in registry order.
    pub fn read_all_layers(&self) -> Result<Vec<LayerMatrix>> {
        (0..self.num_layers()).map(|i| self.read_layer(i)).collect()
    }
}
