//! Substring and number extraction helpers shared by the header extractors.

/// Returns the text strictly between the first `left` and the first `right`
/// that follows it.
///
/// - `left` absent: empty string.
/// - `right` absent after `left`: everything after `left`.
pub fn between<'a>(left: &str, right: &str, text: &'a str) -> &'a str {
    let Some((_, rest)) = text.split_once(left) else {
        return "";
    };
    match rest.split_once(right) {
        Some((inner, _)) => inner,
        None => rest,
    }
}

/// Returns the text following the last occurrence of `marker`, or an empty
/// string if `marker` is absent or ends the text.
pub fn after<'a>(marker: &str, text: &'a str) -> &'a str {
    match text.rfind(marker) {
        Some(pos) if pos + marker.len() < text.len() => &text[pos + marker.len()..],
        _ => "",
    }
}

/// Parses every whitespace-separated token that is a valid float, in order.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    text.split_whitespace()
        .filter_map(|token| token.parse::<f64>().ok())
        .collect()
}
