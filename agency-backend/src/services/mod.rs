pub mod application_service;
pub mod candidate_service;
pub mod event_service;
pub mod export_service;
pub mod extraction_service;
pub mod intake_service;
pub mod job_service;
pub mod mailbox_service;
pub mod report_service;
