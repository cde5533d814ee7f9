use tracing::debug;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Markers the upstream exports use for an absent value.
pub fn is_missing_marker(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("na")
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("null")
}

/// Largest integer an `f64` holds exactly (2^53).
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Parse a case count cell. Plain integers are taken as-is; counts exported
/// as floats (`500.0`) are accepted when integral, non-negative and exactly
/// representable. Everything else is missing.
pub fn parse_count(raw: Option<&str>) -> Option<u64> {
    let cleaned = clean_str(raw?);
    if is_missing_marker(&cleaned) {
        return None;
    }
    if let Ok(n) = cleaned.parse::<u64>() {
        return Some(n);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= MAX_EXACT_F64_INT => {
            Some(v as u64)
        }
        Ok(v) => {
            debug!(value = v, "count is not an exact non-negative integer; treating as missing");
            None
        }
        Err(_) => {
            debug!(cell = %cleaned, "unparsable count; treating as missing");
            None
        }
    }
}
