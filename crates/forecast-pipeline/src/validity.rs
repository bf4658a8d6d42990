//! Rejecting regions with no data.

use gfs_common::{RegionField, ViewerError, ViewerResult};

/// Fail with `AllMissing` when every value of `field` is NaN.
pub fn check(field: &RegionField, parameter: &str, lead: usize) -> ViewerResult<()> {
    if field.is_all_missing() {
        return Err(ViewerError::AllMissing {
            parameter: parameter.to_string(),
            lead,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_nan_passes() {
        let field = RegionField::new(vec![0.0], vec![95.0, 95.25], vec![f32::NAN, 1.0]).unwrap();
        assert!(check(&field, "tmp2m", 0).is_ok());
    }

    #[test]
    fn test_all_nan_fails() {
        let field = RegionField::new(vec![0.0], vec![95.0, 95.25], vec![f32::NAN; 2]).unwrap();
        let err = check(&field, "tmp2m", 7).unwrap_err();
        assert!(matches!(err, ViewerError::AllMissing { lead: 7, .. }));
        assert!(err.hint().is_some());
    }
}
