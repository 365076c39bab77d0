//! Canonical number text shared by key canonicalization, the JSON writer and
//! the YAML emitter.
//!
//! Floats print with the shortest digits that round-trip. Magnitudes below
//! `1e-6` or at and above `1e21` use exponential form with an explicit exponent
//! sign (`1e+36`, `5e-7`); everything else prints as a plain decimal. Integral
//! floats print without a fractional part (`3.0` → `3`), except negative zero,
//! which prints as `-0.0` so that it does not read back as the integer `0`.

use serde_json::Number;

/// Format a finite float in canonical form.
///
/// Non-finite values print in YAML spelling (`.inf`, `-.inf`, `.nan`); they
/// never reach the JSON writer because the converter rejects them.
///
/// # Examples
/// ```
/// use yamlbridge_core::number::format_float;
/// assert_eq!(format_float(1e36), "1e+36");
/// assert_eq!(format_float(0.5), "0.5");
/// assert_eq!(format_float(2.5e-7), "2.5e-7");
/// ```
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return ".nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    if value == 0.0 && value.is_sign_negative() {
        return "-0.0".to_string();
    }
    let abs = value.abs();
    if abs == 0.0 || (1e-6..1e21).contains(&abs) {
        return format!("{}", value);
    }
    let exp = format!("{:e}", value);
    match exp.split_once('e') {
        Some((mantissa, exponent)) => match exponent.strip_prefix('-') {
            Some(digits) => format!("{mantissa}e-{digits}"),
            None => format!("{mantissa}e+{exponent}"),
        },
        None => exp,
    }
}

/// Canonical text of a JSON number: integers as decimal, floats via
/// [`format_float`].
pub fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    n.as_f64().map(format_float).unwrap_or_else(|| n.to_string())
}

/// Narrow a parsed integer to a JSON number. Integers outside the 64-bit
/// range become floats.
pub fn integer(value: i128) -> Number {
    if let Ok(i) = i64::try_from(value) {
        return Number::from(i);
    }
    if let Ok(u) = u64::try_from(value) {
        return Number::from(u);
    }
    // Always finite: |i128| < f64::MAX.
    Number::from_f64(value as f64).unwrap_or_else(|| Number::from(0))
}

/// A JSON number for a float, or `None` when the float is not finite.
pub fn float(value: f64) -> Option<Number> {
    Number::from_f64(value)
}
