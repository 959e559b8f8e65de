//! Rate and ratio helpers shared by the aggregation pass and the scoring rules.

/// Divide, yielding `0.0` whenever the denominator is zero or not finite, or
/// the quotient itself is not finite.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        0.0
    }
}

/// Rate denominator for a minute: minute zero is treated as minute one.
pub fn minute_safe(minute: i64) -> f64 {
    minute.max(1) as f64
}

/// `value` per minute at `minute`.
pub fn per_minute(value: f64, minute: i64) -> f64 {
    safe_divide(value, minute_safe(minute))
}
