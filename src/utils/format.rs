// src/utils/format.rs

/// Formats an optional indicator value for log lines, `n/a` when missing.
pub fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_present_and_missing() {
        assert_eq!(fmt_opt(Some(12.3456), 2), "12.35");
        assert_eq!(fmt_opt(None, 2), "n/a");
        assert_eq!(fmt_opt(Some(f64::NAN), 1), "n/a");
    }
}
