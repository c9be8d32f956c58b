// FitScore Engine
// Pure scoring, preset weighting, threshold filtering and ranking of coach/job pairs.
// No I/O happens in this module; candidate sets are fetched by the caller.

pub mod engine;
pub mod errors;
pub mod model;
pub mod presets;
pub mod ranker;
pub mod scoring;
pub mod settings;
pub mod threshold;
pub mod validation;
