use thiserror::Error;

/// Errors raised by the FitScore engine.
///
/// `InvalidPreset` and `OutOfRangeThreshold` indicate caller misuse and abort a whole
/// request. The remaining kinds are local to one (coach, job) pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitScoreError {
    #[error("Invalid weighting preset: {0}")]
    InvalidPreset(String),

    #[error("Requirement not met: missing required certifications [{}]", missing.join(", "))]
    RequirementNotMet { missing: Vec<String> },

    #[error("FitScore threshold {0} is outside [0.40, 0.80]")]
    OutOfRangeThreshold(f64),

    #[error("Malformed coach profile: {0}")]
    MalformedProfile(String),

    #[error("Malformed job posting: {0}")]
    MalformedJob(String),
}

impl FitScoreError {
    /// Stable machine-readable code, shared by HTTP bodies and batch failure reports.
    pub fn code(&self) -> &'static str {
        match self {
            FitScoreError::InvalidPreset(_) => "INVALID_PRESET",
            FitScoreError::RequirementNotMet { .. } => "REQUIREMENT_NOT_MET",
            FitScoreError::OutOfRangeThreshold(_) => "OUT_OF_RANGE_THRESHOLD",
            FitScoreError::MalformedProfile(_) => "MALFORMED_PROFILE",
            FitScoreError::MalformedJob(_) => "MALFORMED_JOB",
        }
    }

    /// Configuration errors are fatal to a request rather than to a single pair.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FitScoreError::InvalidPreset(_) | FitScoreError::OutOfRangeThreshold(_)
        )
    }
}
