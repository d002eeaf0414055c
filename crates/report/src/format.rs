//! Number formatting shared by both renderers.

/// Decimals shown for non-integral values.
const DECIMALS: usize = 4;

/// Format a value: integers without a fraction, others with up to four
/// decimals and no trailing zeros.
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let fixed = format!("{:.*}", DECIMALS, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "0" || trimmed == "-0" {
        // Too small for the fixed precision.
        return value.to_string();
    }
    trimmed.to_string()
}

/// Format a delta with an explicit sign for positive values.
pub fn format_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{}", format_value(delta))
    } else {
        format_value(delta)
    }
}

/// Format an optional baseline, using `-` when absent.
pub fn format_baseline(baseline: Option<f64>) -> String {
    baseline.map_or_else(|| "-".to_string(), format_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1.0), "1");
        assert_eq!(format_value(-3.0), "-3");
        assert_eq!(format_value(12.5), "12.5");
        assert_eq!(format_value(0.1 + 0.2), "0.3");
        assert_eq!(format_value(-0.0), "0");
        assert_eq!(format_value(1234567.0), "1234567");
        assert_eq!(format_value(0.00001), "0.00001");
    }

    #[test]
    fn test_format_delta_sign() {
        assert_eq!(format_delta(2.0), "+2");
        assert_eq!(format_delta(-1.25), "-1.25");
        assert_eq!(format_delta(0.0), "0");
    }

    #[test]
    fn test_format_baseline() {
        assert_eq!(format_baseline(None), "-");
        assert_eq!(format_baseline(Some(4.0)), "4");
    }
}
