//! Pattern-based metadata extraction from the raw header.
//!
//! Nanoscope annotations embed their numbers inside free-form text such as
//! `\@Sens. Zsens: V 95.64 nm/V`. Rather than a grammar, each value is found
//! by a literal marker substring, isolated with a fixed delimiter rule, then
//! parsed. Every extractor is declared as an explicit [`Extractor`] so the
//! behavior of each field can be audited on its own.
//!
//! These lookups scan the raw header lines, not the scan registry.

use log::trace;

use crate::nanoscope::types::{
    error::{NanoscopeError, Result},
    models::{Calibration, RawHeader, ScanGeometry, ScanRecord},
};
use crate::nanoscope::utils;

/// How the numeric text is isolated from a matching line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Text between two delimiters, see [`utils::between`].
    Between(&'static str, &'static str),
    /// Text after the last delimiter, see [`utils::after`].
    After(&'static str),
    /// First number in the text following the first delimiter.
    FirstNumberAfter(&'static str),
}

/// What to do when no header line contains the marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Default(f64),
    Required,
}

/// A `(marker, rule, fallback)` triple describing one header value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extractor {
    pub marker: &'static str,
    pub rule: Rule,
    pub fallback: Fallback,
}

pub const Z_SCALE: Extractor = Extractor {
    marker: "@2:Z scale: V [Sens.",
    rule: Rule::Between("(", " V/LSB)"),
    fallback: Fallback::Default(1.0),
};

pub const ZSENS: Extractor = Extractor {
    marker: "Zsens:",
    rule: Rule::Between("V ", " nm/V"),
    fallback: Fallback::Default(1.0),
};

pub const ZSENS_SENS: Extractor = Extractor {
    marker: "ZsensSens:",
    rule: Rule::Between("V ", " nm/V"),
    fallback: Fallback::Default(1.0),
};

pub const STAGE_X: Extractor = Extractor {
    marker: "Stage X:",
    rule: Rule::After(": "),
    fallback: Fallback::Default(1.0),
};

pub const STAGE_Y: Extractor = Extractor {
    marker: "Stage Y:",
    rule: Rule::After(": "),
    fallback: Fallback::Default(1.0),
};

pub const STAGE_Z: Extractor = Extractor {
    marker: "Stage Z:",
    rule: Rule::After(": "),
    fallback: Fallback::Default(1.0),
};

pub const SCAN_SIZE: Extractor = Extractor {
    marker: "Scan Size",
    rule: Rule::FirstNumberAfter(": "),
    fallback: Fallback::Required,
};

pub const X_OFFSET: Extractor = Extractor {
    marker: "X Offset",
    rule: Rule::FirstNumberAfter(": "),
    fallback: Fallback::Required,
};

pub const Y_OFFSET: Extractor = Extractor {
    marker: "Y Offset",
    rule: Rule::FirstNumberAfter(": "),
    fallback: Fallback::Required,
};

/// Record field holding a layer's display name.
pub const IMAGE_DATA_FIELD: &str = "@2:Image Data";

/// All header lines containing `marker`, in header order.
pub fn find_in_header<'a>(header: &'a RawHeader, marker: &'a str) -> Vec<&'a str> {
    header.lines_containing(marker).collect()
}

/// Applies `extractor` to the first matching header line.
pub fn extract_first(header: &RawHeader, extractor: &Extractor) -> Result<f64> {
    extract_nth(header, extractor, 0)
}

/// Applies `extractor` to the `n`-th (0-based) matching header line.
///
/// Fewer than `n + 1` matches is treated like an absent marker.
pub fn extract_nth(header: &RawHeader, extractor: &Extractor, n: usize) -> Result<f64> {
    match header.lines_containing(extractor.marker).nth(n) {
        Some(line) => {
            let value = apply_rule(line, extractor)?;
            trace!("'{}' #{} -> {}", extractor.marker, n, value);
            Ok(value)
        }
        None => match extractor.fallback {
            Fallback::Default(value) => {
                trace!("'{}' #{} not found, using default {}", extractor.marker, n, value);
                Ok(value)
            }
            Fallback::Required => Err(NanoscopeError::missing(extractor.marker)),
        },
    }
}

fn apply_rule(line: &str, extractor: &Extractor) -> Result<f64> {
    match extractor.rule {
        Rule::Between(left, right) => parse_float(utils::between(left, right, line), extractor),
        Rule::After(delimiter) => parse_float(utils::after(delimiter, line), extractor),
        Rule::FirstNumberAfter(delimiter) => {
            let (_, rest) = line.split_once(delimiter).ok_or_else(|| {
                NanoscopeError::InvalidFormat(format!(
                    "'{}' line has no '{}' separator: {}",
                    extractor.marker, delimiter, line
                ))
            })?;
            utils::extract_numbers(rest).first().copied().ok_or_else(|| {
                NanoscopeError::InvalidFormat(format!(
                    "'{}' line has no numeric value: {}",
                    extractor.marker, line
                ))
            })
        }
    }
}

fn parse_float(text: &str, extractor: &Extractor) -> Result<f64> {
    text.trim().parse::<f64>().map_err(|e| {
        NanoscopeError::InvalidFormat(format!(
            "'{}' value {:?} is not a number: {}",
            extractor.marker, text, e
        ))
    })
}

/// Per-layer scale factor: the `layer`-th Z scale line, else `1.0`.
pub fn layer_scale(header: &RawHeader, layer: usize) -> Result<f64> {
    extract_nth(header, &Z_SCALE, layer)
}

/// Computes the sensitivities and stage position.
pub fn calibration(header: &RawHeader) -> Result<Calibration> {
    Ok(Calibration {
        zsens: extract_first(header, &ZSENS)?,
        zsens2: extract_first(header, &ZSENS_SENS)?,
        stage_x: extract_first(header, &STAGE_X)?,
        stage_y: extract_first(header, &STAGE_Y)?,
        stage_z: extract_first(header, &STAGE_Z)?,
    })
}

/// Scan size and X/Y offset. Fails if any of the three lines is missing.
pub fn scan_geometry(header: &RawHeader) -> Result<ScanGeometry> {
    Ok(ScanGeometry {
        scan_size: extract_first(header, &SCAN_SIZE)?,
        x_offset: extract_first(header, &X_OFFSET)?,
        y_offset: extract_first(header, &Y_OFFSET)?,
    })
}

/// Display name of a layer: the quoted text of its `@2:Image Data` field.
pub fn layer_name(record: &ScanRecord) -> Result<String> {
    let data = record.require_value(IMAGE_DATA_FIELD)?;
    Ok(utils::between("\"", "\"", data).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(lines: &[&str]) -> RawHeader {
        RawHeader::new(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn absent_markers_default_to_one() {
        let h = header(&["*File list", "*File list end"]);
        assert_eq!(calibration(&h).unwrap(), Calibration::default());
        assert_eq!(layer_scale(&h, 0).unwrap(), 1.0);
    }

    #[test]
    fn z_scale_reads_volts_per_lsb() {
        let h = header(&["@2:Z scale: V [Sens. Zsens] (3.5 V/LSB) 229.4 V"]);
        assert_eq!(layer_scale(&h, 0).unwrap(), 3.5);
    }

    #[test]
    fn z_scale_is_indexed_by_layer() {
        let h = header(&[
            "@2:Z scale: V [Sens. Zsens] (0.5 V/LSB) 1 V",
            "@2:Z scale: V [Sens. Zsens] (0.25 V/LSB) 1 V",
        ]);
        assert_eq!(layer_scale(&h, 0).unwrap(), 0.5);
        assert_eq!(layer_scale(&h, 1).unwrap(), 0.25);
        assert_eq!(layer_scale(&h, 2).unwrap(), 1.0);
    }

    #[test]
    fn sensitivities_and_stage_use_first_match() {
        let h = header(&[
            "@Sens. Zsens: V 95.64 nm/V",
            "@Sens. ZsensSens: V 2.5 nm/V",
            "@Sens. Zsens: V 1000 nm/V",
            "Stage X: -12.5",
            "Stage Y: 7",
            "Stage Z: 0.125",
        ]);
        let cal = calibration(&h).unwrap();
        assert_eq!(cal.zsens, 95.64);
        assert_eq!(cal.zsens2, 2.5);
        assert_eq!(cal.stage_x, -12.5);
        assert_eq!(cal.stage_y, 7.0);
        assert_eq!(cal.stage_z, 0.125);
    }

    #[test]
    fn present_but_malformed_value_is_an_error() {
        let h = header(&["Stage X: n/a"]);
        assert!(matches!(
            extract_first(&h, &STAGE_X),
            Err(NanoscopeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn geometry_takes_first_number() {
        let h = header(&["Scan Size: 5000 5000 nm", "X Offset: -120.5 nm", "Y Offset: 33 nm"]);
        assert_eq!(scan_geometry(&h).unwrap().as_tuple(), (5000.0, -120.5, 33.0));
    }

    #[test]
    fn missing_scan_size_is_fatal() {
        let h = header(&["X Offset: 0 nm", "Y Offset: 0 nm"]);
        match scan_geometry(&h) {
            Err(NanoscopeError::MissingField { field }) => assert_eq!(field, "Scan Size"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn scan_size_without_separator_is_invalid() {
        let h = header(&["Scan Size 5000 nm", "X Offset: 0 nm", "Y Offset: 0 nm"]);
        assert!(matches!(scan_geometry(&h), Err(NanoscopeError::InvalidFormat(_))));
    }

    #[test]
    fn scan_size_without_number_is_invalid() {
        let h = header(&["Scan Size: ~m", "X Offset: 0 nm", "Y Offset: 0 nm"]);
        match scan_geometry(&h) {
            Err(NanoscopeError::InvalidFormat(msg)) => assert!(msg.contains("Scan Size"), "{}", msg),
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn each_offset_is_required() {
        let cases = [
            (["Scan Size: 5 um", "Y Offset: 0 nm"], "X Offset"),
            (["Scan Size: 5 um", "X Offset: 0 nm"], "Y Offset"),
        ];
        for (lines, missing) in cases {
            match scan_geometry(&header(&lines)) {
                Err(NanoscopeError::MissingField { field }) => assert_eq!(field, missing),
                other => panic!("expected MissingField({}), got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn find_in_header_keeps_order() {
        let h = header(&["a Stage X: 1", "b", "c Stage X: 2"]);
        assert_eq!(find_in_header(&h, "Stage X:"), ["a Stage X: 1", "c Stage X: 2"]);
    }

    #[test]
    fn layer_name_is_quoted_text() {
        let mut record = ScanRecord::new();
        record.insert(IMAGE_DATA_FIELD, Some("S [Height] \"Height\"".to_string()));
        assert_eq!(layer_name(&record).unwrap(), "Height");
    }

    #[test]
    fn layer_name_requires_image_data() {
        let mut record = ScanRecord::new();
        record.insert(IMAGE_DATA_FIELD, None);
        assert!(matches!(layer_name(&record), Err(NanoscopeError::MissingField { .. })));
    }
}
