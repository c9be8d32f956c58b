pub mod coach;
pub mod job;
