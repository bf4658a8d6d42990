//! Constraint expressions for DAP2 data requests.

use std::fmt::Write;
use std::ops::Range;

/// A projection of whole variables, e.g. `time,lat,lon`.
pub fn projection(variables: &[&str]) -> String {
    variables.join(",")
}

/// A hyperslab selection `var[a:b][c:d]` with inclusive index bounds.
///
/// `slab` holds half-open ranges; empty ranges have no DAP2 form and
/// return `None`.
pub fn hyperslab(variable: &str, slab: &[Range<usize>]) -> Option<String> {
    let mut out = String::from(variable);
    for range in slab {
        if range.start >= range.end {
            return None;
        }
        // Writing to a String cannot fail.
        let _ = write!(out, "[{}:{}]", range.start, range.end - 1);
    }
    Some(out)
}
