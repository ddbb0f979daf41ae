//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Clamp a value into the range `[min, max]`.
///
/// NaN values do not compare against the limits and are returned unchanged.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Rescale a value about a reference point.
///
/// The distance between `value` and `reference` is multiplied by `scale`, so
/// a scale below one draws the value in towards the reference.
pub fn rescale_about<T>(value: T, scale: T, reference: T) -> T
where
    T: Float,
{
    (value - reference) * scale + reference
}
