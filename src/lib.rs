//! # nanoscope-reader
//!
//! A reader for Nanoscope SPM files: a text header of
//! `\Key: value` annotations grouped into `*Ciao image list` sections,
//! followed by raw 16-bit image layers.
//!
//! ```no_run
//! use nanoscope_reader::NanoscopeReader;
//!
//! let reader = NanoscopeReader::new("sample.spm")?;
//! println!("Z sensitivity: {} nm/V", reader.calibration().zsens);
//! for info in reader.layers()? {
//!     let matrix = reader.read_layer(info.index)?;
//!     println!("{}: {:?}", info.name, matrix.dim());
//! }
//! # Ok::<(), nanoscope_reader::NanoscopeError>(())
//! ```
pub mod nanoscope;

// Re-export the main types for convenience
pub use nanoscope::{
    NanoscopeError, NanoscopeReader, Result,
    types::models::{
        Calibration, LayerInfo, LayerMatrix, RawHeader, ReaderOptions, SampleByteOrder,
        ScanGeometry, ScanRecord, ScanRegistry,
    },
};
