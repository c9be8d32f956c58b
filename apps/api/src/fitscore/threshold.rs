use serde::Serialize;

use crate::fitscore::errors::FitScoreError;

pub const MIN_THRESHOLD: f64 = 0.40;
pub const MAX_THRESHOLD: f64 = 0.80;

/// A job's FitScore cutoff, guaranteed to lie in [0.40, 0.80].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self, FitScoreError> {
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&value) {
            return Err(FitScoreError::OutOfRangeThreshold(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Inclusive: a score exactly at the threshold is admitted.
    pub fn admits(&self, fitscore: f64) -> bool {
        fitscore >= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(crate::fitscore::model::DEFAULT_THRESHOLD)
    }
}

/// Keeps only the items whose score passes the threshold, preserving input order.
pub fn filter_admitted<T, F>(items: Vec<T>, threshold: Threshold, score_of: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items
        .into_iter()
        .filter(|item| threshold.admits(score_of(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Threshold::new(0.40).is_ok());
        assert!(Threshold::new(0.80).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(
            Threshold::new(0.39),
            Err(FitScoreError::OutOfRangeThreshold(0.39))
        );
        assert!(Threshold::new(0.81).is_err());
        assert!(Threshold::new(f64::NAN).is_err());
    }

    #[test]
    fn test_score_at_threshold_is_admitted() {
        let t = Threshold::new(0.60).unwrap();
        assert!(t.admits(0.60));
        assert!(t.admits(0.61));
        assert!(!t.admits(0.5999));
    }

    #[test]
    fn test_default_is_product_default() {
        assert_eq!(Threshold::default().value(), 0.60);
    }

    #[test]
    fn test_filter_admitted_keeps_order() {
        let t = Threshold::new(0.5).unwrap();
        let kept = filter_admitted(vec![0.9, 0.2, 0.5, 0.7], t, |s| *s);
        assert_eq!(kept, vec![0.9, 0.5, 0.7]);
    }
}
