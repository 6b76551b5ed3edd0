//! Numeric conversion helpers centralizing safe numeric casts.

use chrono::TimeDelta;
use num_traits::cast::cast;

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Length of a time delta in fractional seconds, millisecond precision.
#[must_use]
pub fn delta_secs(delta: TimeDelta) -> f64 {
    i64_to_f64(delta.num_milliseconds()) / 1000.0
}

/// Build a time delta from fractional seconds, returning zero for non-finite input.
#[must_use]
pub fn secs_to_delta(secs: f64) -> TimeDelta {
    if !secs.is_finite() {
        return TimeDelta::zero();
    }
    let millis = (secs * 1000.0).round();
    let min = cast::<i64, f64>(i64::MIN / 1000).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX / 1000).unwrap_or(f64::MAX);
    let clamped = millis.clamp(min, max);
    TimeDelta::try_milliseconds(cast::<f64, i64>(clamped).unwrap_or(0)).unwrap_or_default()
}

/// Truncate fractional seconds toward zero, returning 0 for NaN values.
#[must_use]
pub fn truncate_secs(secs: f64) -> i64 {
    if secs.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    cast::<f64, i64>(secs.clamp(min, max).trunc()).unwrap_or(0)
}

/// Share of `part` in `total` as a percentage; 0.0 when `total` is zero.
#[must_use]
pub fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(total) * 100.0
}
