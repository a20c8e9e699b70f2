//! Parsers for the pieces of a Nanoscope file.
//!
//! A file opens with backslash-prefixed text lines. `*File list`,
//! `*Scanner list` and similar lines head groups of `Key: value` fields.
//! Each `*Ciao image list` line starts the fields of one image layer, in
//! layer order. The text stops at `*File list end`. Each layer's `Data offset`
//! field gives the absolute position of its samples, which are signed 16-bit
//! integers stored column by column, `Samps/line * Number of lines` of them.
//!
//! - [`header`] collects the text lines up to and including the sentinel.
//! - [`scans`] turns each `*Ciao image list` group into a scan record.
//! - [`extract`] finds calibration values by marker anywhere in the text.
//! - [`layer`] seeks to a layer's offset and decodes its samples.

pub mod extract;
pub mod header;
pub mod layer;
pub mod scans;
