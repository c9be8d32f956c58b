// Matching service
// Loads coaches and jobs, runs the FitScore engine, and serves ranked results over HTTP.

pub mod cache;
pub mod handlers;
pub mod store;
