//! Gap smoothing for derived feature columns.
//!
//! After windowed statistics are computed for a group, isolated missing
//! values remain wherever backtracking found no data. Those gaps are reduced
//! by averaging a forward-filled and a backward-filled copy of each column:
//!
//! ```text
//! column   [ 8.0  NaN  NaN  4.0 ]
//! ffill    [ 8.0  8.0  8.0  4.0 ]
//! bfill    [ 8.0  4.0  4.0  4.0 ]
//! average  [ 8.0  6.0  6.0  4.0 ]
//! ```
//!
//! The average propagates NaN: a position with no defined value on one side
//! (a leading or trailing gap) stays missing. A column with no gaps at all is
//! left bit-for-bit unchanged. Smearing neighboring values into gaps trades
//! a little variance for coverage; downstream model training prefers a dense
//! table over scattered holes.

/// Forward-fill copy: each NaN takes the nearest earlier defined value.
pub fn forward_fill(values: &[f64]) -> Vec<f64> {
    let mut filled = Vec::with_capacity(values.len());
    let mut last = f64::NAN;
    for &v in values {
        if !v.is_nan() {
            last = v;
        }
        filled.push(last);
    }
    filled
}

/// Backward-fill copy: each NaN takes the nearest later defined value.
pub fn backward_fill(values: &[f64]) -> Vec<f64> {
    let mut filled = vec![f64::NAN; values.len()];
    let mut next = f64::NAN;
    for (i, &v) in values.iter().enumerate().rev() {
        if !v.is_nan() {
            next = v;
        }
        filled[i] = next;
    }
    filled
}

/// Replace every value with the average of its forward-filled and
/// backward-filled counterparts, in place.
pub fn fill_and_average(values: &mut [f64]) {
    let forward = forward_fill(values);
    let backward = backward_fill(values);
    for (i, v) in values.iter_mut().enumerate() {
        // NaN + x = NaN, so one-sided gaps stay missing.
        *v = (forward[i] + backward[i]) / 2.0;
    }
}
