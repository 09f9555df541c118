/// Round `value` to `decimals` decimal places.
///
/// Rounding is performed on the exact decimal expansion of the binary value,
/// so `2.675` (stored as `2.67499999…`) rounds down, matching what a
/// correctly-rounded decimal printer produces. Negative zero is normalised to
/// `0.0`; non-finite input is returned unchanged.
///
/// # Examples
///
/// ```
/// use claims_core::formatting::round_to;
///
/// assert_eq!(round_to(10.0, 2), 10.0);
/// assert_eq!(round_to(3.14159, 2), 3.14);
/// assert_eq!(round_to(2.675, 2), 2.67);
/// assert_eq!(round_to(-0.001, 2), 0.0);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let rounded = format!("{:.prec$}", value, prec = decimals as usize)
        .parse::<f64>()
        .unwrap_or(value);
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round a currency amount to cents.
pub fn round_currency(amount: f64) -> f64 {
    round_to(amount, 2)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
