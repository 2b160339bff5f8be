pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    application_service::ApplicationService,
    candidate_service::CandidateService,
    event_service::CandidateEventService,
    extraction_service::TextExtractor,
    intake_service::{EmailIntake, IntakeService, PgIntakeStore},
    job_service::JobService,
    mailbox_service::ImapMailbox,
    report_service::ReportService,
};
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt_secret: Arc<str>,
    pub uploads_dir: PathBuf,
    pub candidate_service: CandidateService,
    pub event_service: CandidateEventService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub report_service: ReportService,
    pub extractor: TextExtractor,
    /// `None` when no mailbox is configured.
    pub intake: Option<Arc<EmailIntake>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let candidate_service = CandidateService::new(pool.clone());
        let event_service = CandidateEventService::new(pool.clone());
        let job_service = JobService::new(pool.clone());
        let application_service = ApplicationService::new(pool.clone());
        let report_service = ReportService::new(pool.clone());
        let extractor = TextExtractor::new(config.extraction.clone());
        let uploads_dir = PathBuf::from(&config.uploads_dir);

        let intake = config.imap.clone().map(|imap| {
            let store = PgIntakeStore::new(
                candidate_service.clone(),
                event_service.clone(),
                job_service.clone(),
                application_service.clone(),
            );
            Arc::new(IntakeService::new(
                ImapMailbox::new(imap),
                store,
                extractor.clone(),
                uploads_dir.clone(),
            ))
        });

        Self {
            pool,
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            uploads_dir,
            candidate_service,
            event_service,
            job_service,
            application_service,
            report_service,
            extractor,
            intake,
        }
    }
}
