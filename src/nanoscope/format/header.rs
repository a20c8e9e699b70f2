//! Nanoscope text header reading.
//!
//! The header is a line-oriented block of `\Key: value` annotations that
//! precedes the binary sample region. It logically ends at the first line
//! containing `*File list end`; everything after that belongs to the
//! binary layers.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use encoding_rs::Encoding;
use log::{debug, info, trace, warn};

use crate::nanoscope::types::{error::Result, models::RawHeader};

/// Substring marking the final header line.
pub const HEADER_END: &str = "*File list end";

/// Reads the header of the file at `path`.
///
/// The file is opened for the duration of this call only.
pub fn read_header(path: &Path, encoding: &'static Encoding) -> Result<RawHeader> {
    info!("Reading Nanoscope header: {}", path.display());
    let file = File::open(path)?;
    parse(&mut BufReader::new(file), encoding)
}

/// Reads header lines from `reader` until the sentinel line (inclusive).
///
/// Each line is decoded with `encoding`, stripped of trailing whitespace
/// and of every `\` continuation marker. If the sentinel never appears the
/// whole stream becomes the header.
pub fn parse<R: BufRead>(reader: &mut R, encoding: &'static Encoding) -> Result<RawHeader> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            warn!(
                "Header sentinel '{}' not found; consumed {} line(s) as header",
                HEADER_END,
                lines.len()
            );
            break;
        }

        let (decoded, _) = encoding.decode_without_bom_handling(&buf);
        let line = decoded.trim_end().replace('\\', "");
        trace!("Header line {}: {}", lines.len(), line);

        let is_end = line.contains(HEADER_END);
        lines.push(line);
        if is_end {
            debug!("Header sentinel found at line {}", lines.len() - 1);
            break;
        }
    }

    Ok(RawHeader::new(lines))
}
