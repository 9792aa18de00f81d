//! Saturating helpers for the bounded gauges (oxygen, CO2) and readings.

/// Add a signed amount to a gauge value, keeping the result inside `[0, cap]`.
pub fn saturating_add(value: f64, amount: f64, cap: f64) -> f64 {
    let cap = cap.max(0.0);
    let next = value + amount;
    if next.is_nan() {
        return value.clamp(0.0, cap);
    }
    next.clamp(0.0, cap)
}

/// Remove an amount from a gauge value, flooring the result at zero.
pub fn saturating_sub(value: f64, amount: f64, cap: f64) -> f64 {
    saturating_add(value, -amount, cap)
}

/// Convert a gauge level to a `[0.0, 1.0]` fill ratio.
pub fn level_ratio(value: f64, cap: f64) -> f64 {
    if cap <= 0.0 {
        return 0.0;
    }
    (value / cap).clamp(0.0, 1.0)
}

/// Round a reading to one decimal place, ties to even.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
