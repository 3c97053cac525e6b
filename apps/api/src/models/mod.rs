pub mod company;
pub mod job;
pub mod profile;
pub mod target_job;
