pub mod candidate;
pub mod candidate_event;
pub mod job;
pub mod job_application;
