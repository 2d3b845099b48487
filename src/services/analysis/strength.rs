/// Five-level ladder used for locally computed pairwise coefficients.
pub fn strength_detailed(abs_r: f64) -> &'static str {
    match abs_r {
        v if v >= 0.8 => "Very Strong",
        v if v >= 0.6 => "Strong",
        v if v >= 0.4 => "Moderate",
        v if v >= 0.2 => "Weak",
        _ => "Very Weak",
    }
}

/// Four-level ladder used when ranking service-computed correlations. The two
/// ladders use different cut points and must not be merged.
pub fn strength_coarse(abs_r: f64) -> &'static str {
    match abs_r {
        v if v >= 0.7 => "Strong",
        v if v >= 0.5 => "Moderate",
        v if v >= 0.3 => "Weak",
        _ => "Very Weak",
    }
}

/// A coefficient of exactly zero reads as "Negative".
pub fn direction(r: f64) -> &'static str {
    if r > 0.0 {
        "Positive"
    } else {
        "Negative"
    }
}
