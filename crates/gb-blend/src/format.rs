//! Value ± uncertainty strings for display.

/// Format `value ± uncertainty unit` with magnitude-dependent precision.
///
/// | |value|              | format                 |
/// |----------------------|------------------------|
/// | < 0.01 or > 10 000   | `1.234e-03 ± 5.60e-05` |
/// | < 1                  | 4 decimals             |
/// | < 10                 | 3 decimals             |
/// | < 100                | 2 decimals             |
/// | otherwise            | 1 decimal              |
pub fn format_with_uncertainty(value: f64, uncertainty: f64, unit: &str) -> String {
    let magnitude = value.abs();
    let body = if magnitude < 0.01 || magnitude > 10_000.0 {
        format!("{} ± {}", scientific(value, 3), scientific(uncertainty, 2))
    } else if magnitude < 1.0 {
        format!("{value:.4} ± {uncertainty:.4}")
    } else if magnitude < 10.0 {
        format!("{value:.3} ± {uncertainty:.3}")
    } else if magnitude < 100.0 {
        format!("{value:.2} ± {uncertainty:.2}")
    } else {
        format!("{value:.1} ± {uncertainty:.1}")
    };
    format!("{body} {unit}").trim().to_string()
}

/// Scientific notation with a signed, two-digit exponent (`1.500e-03`).
fn scientific(v: f64, precision: usize) -> String {
    let s = format!("{v:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            Err(_) => s,
        },
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_follow_magnitude() {
        assert_eq!(format_with_uncertainty(100.0, 0.8, "ppm"), "100.0 ± 0.8 ppm");
        assert_eq!(
            format_with_uncertainty(10.2, 0.01, "mL/min"),
            "10.20 ± 0.01 mL/min"
        );
        assert_eq!(format_with_uncertainty(5.0, 0.25, "ppm"), "5.000 ± 0.250 ppm");
        assert_eq!(format_with_uncertainty(0.5, 0.001, ""), "0.5000 ± 0.0010");
    }

    #[test]
    fn scientific_outside_display_range() {
        assert_eq!(
            format_with_uncertainty(0.001, 0.0001, "ppm"),
            "1.000e-03 ± 1.00e-04 ppm"
        );
        assert_eq!(
            format_with_uncertainty(20_000.0, 15.0, "ppm"),
            "2.000e+04 ± 1.50e+01 ppm"
        );
        assert_eq!(format_with_uncertainty(0.0, 0.0, ""), "0.000e+00 ± 0.00e+00");
    }

    #[test]
    fn negative_values_use_magnitude() {
        assert_eq!(format_with_uncertainty(-50.0, 1.0, "ppm"), "-50.00 ± 1.00 ppm");
    }
}
