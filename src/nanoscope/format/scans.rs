//! Segments the raw header into per-layer scan records.

use log::{debug, trace};

use crate::nanoscope::types::models::{RawHeader, ScanRecord, ScanRegistry};

/// Header line opening one layer's metadata section.
pub const SECTION_MARKER: &str = "*Ciao image list";

const FIELD_SEPARATOR: &str = ": ";

/// Builds the scan registry in one pass over the header.
///
/// Every `*Ciao image list` line opens a new record. Lines not starting with
/// `*` are fields of the most recent record; lines seen before the first
/// marker have no owner and are dropped.
pub fn build_registry(header: &RawHeader) -> ScanRegistry {
    let mut registry: ScanRegistry = Vec::new();

    for line in header.lines() {
        if line == SECTION_MARKER {
            registry.push(ScanRecord::new());
            continue;
        }
        if line.starts_with('*') {
            continue;
        }

        let Some(current) = registry.last_mut() else {
            trace!("Discarding field outside any image section: {}", line);
            continue;
        };

        match line.split_once(FIELD_SEPARATOR) {
            Some((key, value)) => current.insert(key, Some(value.to_string())),
            None => current.insert(line.as_str(), None),
        }
    }

    debug!("Scan registry built: {} layer(s)", registry.len());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(lines: &[&str]) -> RawHeader {
        RawHeader::new(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn one_record_per_marker_in_order() {
        let h = header(&[
            "*File list",
            "Version: 0x09200000",
            "*Ciao image list",
            "Data offset: 40960",
            "*Ciao image list",
            "Data offset: 172032",
            "*Ciao image list",
            "Data offset: 303104",
            "*File list end",
        ]);
        let registry = build_registry(&h);
        assert_eq!(registry.len(), 3);
        let offsets: Vec<_> = registry.iter().map(|r| r.value("Data offset").unwrap()).collect();
        assert_eq!(offsets, ["40960", "172032", "303104"]);
    }

    #[test]
    fn fields_before_first_marker_are_dropped() {
        let h = header(&["Data offset: 1", "*Ciao image list", "Samps/line: 4"]);
        let registry = build_registry(&h);
        assert_eq!(registry.len(), 1);
        assert!(!registry[0].contains("Data offset"));
        assert_eq!(registry[0].value("Samps/line"), Some("4"));
    }

    #[test]
    fn bare_key_is_present_without_value() {
        let h = header(&["*Ciao image list", "Valid data start X"]);
        let record = &build_registry(&h)[0];
        assert_eq!(record.get("Valid data start X"), Some(None));
        assert_eq!(record.get("Absent"), None);
    }

    #[test]
    fn splits_on_first_separator_and_last_duplicate_wins() {
        let h = header(&[
            "*Ciao image list",
            "@2:Z scale: V [Sens. Zsens] (0.006 V/LSB) 2.0 V",
            "Samps/line: 256",
            "Samps/line: 512",
        ]);
        let record = &build_registry(&h)[0];
        assert_eq!(record.value("@2:Z scale"), Some("V [Sens. Zsens] (0.006 V/LSB) 2.0 V"));
        assert_eq!(record.value("Samps/line"), Some("512"));
    }

    #[test]
    fn fields_iterate_in_header_order() {
        let h = header(&[
            "*Ciao image list",
            "Data offset: 40960",
            "Samps/line: 256",
            "Number of lines: 256",
            "Valid data start X",
            "Samps/line: 512",
            "@2:Image Data: S [Height] \"Height\"",
        ]);
        let record = &build_registry(&h)[0];
        let keys: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            ["Data offset", "Samps/line", "Number of lines", "Valid data start X", "@2:Image Data"]
        );
        assert_eq!(record.len(), 5);
        assert_eq!(record.iter().nth(1), Some(("Samps/line", Some("512"))));
    }

    #[test]
    fn other_star_lines_do_not_open_sections() {
        let h = header(&["*Ciao image list", "Samps/line: 8", "*Ciao scan list", "Lines: 8"]);
        let registry = build_registry(&h);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry[0].value("Lines"), Some("8"));
    }
}
