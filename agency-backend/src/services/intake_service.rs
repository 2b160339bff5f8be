//! Email CV intake: poll the mailbox, pick out CV attachments, extract
//! contact details and file a candidate for each one.
//!
//! Every stage logs and swallows its own failures so one bad message never
//! stops the rest of the cycle. Candidate, event and application writes are
//! separate statements; a failure between them leaves the earlier rows.
//! Intake does not check for existing candidates, so a message delivered
//! twice produces two candidates.

use crate::error::Result;
use crate::models::candidate::{Candidate, NewCandidate, SOURCE_EMAIL, STATUS_NEW};
use crate::models::candidate_event::{
    CandidateEvent, NewCandidateEvent, EVENT_CANDIDATE_CREATED,
};
use crate::models::job::Job;
use crate::models::job_application::{JobApplication, STATUS_SUBMITTED};
use crate::services::application_service::ApplicationService;
use crate::services::candidate_service::CandidateService;
use crate::services::event_service::CandidateEventService;
use crate::services::extraction_service::TextExtractor;
use crate::services::job_service::JobService;
use crate::services::mailbox_service::{ImapMailbox, MailSource, RawMessage};
use crate::utils::attachments::{self, Attachment, InboundEmail};
use crate::utils::cv_fields;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// Persistence needed by the intake pipeline.
pub trait IntakeStore: Send + Sync {
    fn create_candidate(
        &self,
        candidate: NewCandidate,
    ) -> impl Future<Output = Result<Candidate>> + Send;

    fn record_event(
        &self,
        event: NewCandidateEvent,
    ) -> impl Future<Output = Result<CandidateEvent>> + Send;

    fn find_job_by_code(&self, code: &str) -> impl Future<Output = Result<Option<Job>>> + Send;

    fn create_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: &str,
        notes: &str,
    ) -> impl Future<Output = Result<JobApplication>> + Send;
}

#[derive(Clone)]
pub struct PgIntakeStore {
    candidates: CandidateService,
    events: CandidateEventService,
    jobs: JobService,
    applications: ApplicationService,
}

impl PgIntakeStore {
    pub fn new(
        candidates: CandidateService,
        events: CandidateEventService,
        jobs: JobService,
        applications: ApplicationService,
    ) -> Self {
        Self {
            candidates,
            events,
            jobs,
            applications,
        }
    }
}

impl IntakeStore for PgIntakeStore {
    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        self.candidates.create(candidate).await
    }

    async fn record_event(&self, event: NewCandidateEvent) -> Result<CandidateEvent> {
        self.events.record(event).await
    }

    async fn find_job_by_code(&self, code: &str) -> Result<Option<Job>> {
        self.jobs.find_by_code(code).await
    }

    async fn create_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: &str,
        notes: &str,
    ) -> Result<JobApplication> {
        self.applications
            .create(candidate_id, job_id, status, Some(notes))
            .await
    }
}

pub type EmailIntake = IntakeService<ImapMailbox, PgIntakeStore>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub messages_fetched: usize,
    pub messages_without_cv: usize,
    pub candidates_created: usize,
    pub applications_created: usize,
    pub failures: usize,
    pub error: Option<String>,
}

impl CycleReport {
    fn absorb(&mut self, outcome: &MessageOutcome) {
        if outcome.no_cv {
            self.messages_without_cv += 1;
        }
        self.candidates_created += outcome.candidates_created;
        self.applications_created += outcome.applications_created;
        self.failures += outcome.failures;
    }
}

#[derive(Debug, Default)]
struct MessageOutcome {
    /// Parsed fine but carried no CV attachment. Parse failures count as
    /// failures only.
    no_cv: bool,
    candidates_created: usize,
    applications_created: usize,
    failures: usize,
}

pub struct IntakeService<M, S> {
    mailbox: M,
    store: S,
    extractor: TextExtractor,
    uploads_dir: PathBuf,
    cycle_lock: Mutex<()>,
    last_report: Mutex<Option<CycleReport>>,
}

impl<M, S> IntakeService<M, S> {
    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<M: MailSource, S: IntakeStore> IntakeService<M, S> {
    pub fn new(
        mailbox: M,
        store: S,
        extractor: TextExtractor,
        uploads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mailbox,
            store,
            extractor,
            uploads_dir: uploads_dir.into(),
            cycle_lock: Mutex::new(()),
            last_report: Mutex::new(None),
        }
    }

    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.lock().await.clone()
    }

    /// One poll: fetch unseen mail and process every message concurrently.
    /// Cycles are serialised, so a manual trigger waits for a running one.
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle_lock.lock().await;
        let mut report = CycleReport {
            started_at: Some(Utc::now()),
            ..CycleReport::default()
        };

        match self.mailbox.fetch_unseen().await {
            Ok(messages) => {
                report.messages_fetched = messages.len();
                if messages.is_empty() {
                    tracing::debug!("No unseen messages");
                }

                let outcomes =
                    futures::future::join_all(messages.iter().map(|m| self.process_message(m)))
                        .await;
                for outcome in &outcomes {
                    report.absorb(outcome);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Mailbox poll failed");
                report.error = Some(e.to_string());
            }
        }

        report.finished_at = Some(Utc::now());
        tracing::info!(
            fetched = report.messages_fetched,
            without_cv = report.messages_without_cv,
            candidates = report.candidates_created,
            applications = report.applications_created,
            failures = report.failures,
            "Email intake cycle finished"
        );
        *self.last_report.lock().await = Some(report.clone());
        report
    }

    async fn process_message(&self, raw: &RawMessage) -> MessageOutcome {
        let mut outcome = MessageOutcome::default();

        let email = match attachments::parse_message(&raw.body) {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(
                    seq = raw.seq,
                    uid = ?raw.uid,
                    error = %e,
                    "Could not parse message"
                );
                outcome.failures += 1;
                return outcome;
            }
        };

        let cvs: Vec<&Attachment> = email
            .attachments
            .iter()
            .filter(|a| a.looks_like_cv())
            .collect();
        if cvs.is_empty() {
            tracing::info!(
                seq = raw.seq,
                subject = %email.subject,
                from = %email.from,
                attachments = email.attachments.len(),
                "Message has no CV attachment, skipping"
            );
            outcome.no_cv = true;
            return outcome;
        }

        let job_code = attachments::job_code_from_subject(&email.subject);
        for attachment in cvs {
            match self.ingest_attachment(&email, attachment, job_code.as_deref()).await {
                Ok(application_created) => {
                    outcome.candidates_created += 1;
                    if application_created {
                        outcome.applications_created += 1;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        subject = %email.subject,
                        attachment = %attachment.filename,
                        error = %e,
                        "Failed to create candidate from attachment"
                    );
                    outcome.failures += 1;
                }
            }
        }
        outcome
    }

    /// Store the file, extract text and fields, write the candidate and its
    /// creation event, then link a job when the subject names one. Returns
    /// whether an application was created.
    async fn ingest_attachment(
        &self,
        email: &InboundEmail,
        attachment: &Attachment,
        job_code: Option<&str>,
    ) -> Result<bool> {
        let (disk_path, cv_path) =
            save_cv_file(&self.uploads_dir, &attachment.filename, &attachment.data).await?;
        let text = self.extractor.extract_text_from_file(&disk_path).await;
        let fields = cv_fields::parse_cv_text(&text);

        tracing::info!(
            attachment = %attachment.filename,
            text_len = text.len(),
            found = ?fields.found(),
            "Parsed CV attachment"
        );

        let found = fields.found();
        let candidate = self
            .store
            .create_candidate(NewCandidate {
                first_name: fields.first_name.unwrap_or_default(),
                last_name: fields.last_name.unwrap_or_default(),
                email: fields.email,
                mobile: fields.mobile,
                phone: fields.phone,
                city: None,
                profession: fields.profession,
                cv_path: Some(cv_path.clone()),
                cv_content: (!text.is_empty()).then(|| text.clone()),
                status: STATUS_NEW.to_string(),
                recruitment_source: Some(SOURCE_EMAIL.to_string()),
                notes: Some(format!("Received by email from {}", email.from)),
            })
            .await?;

        tracing::info!(
            candidate_id = %candidate.id,
            subject = %email.subject,
            "Candidate created from email"
        );

        let event = NewCandidateEvent {
            candidate_id: candidate.id,
            event_type: EVENT_CANDIDATE_CREATED.to_string(),
            description: format!(
                "Candidate created from email \"{}\" sent by {}",
                email.subject, email.from
            ),
            metadata: Some(json!({
                "message_id": email.message_id,
                "from": email.from,
                "from_address": email.from_address,
                "subject": email.subject,
                "attachment": attachment.filename,
                "content_type": attachment.content_type,
                "size": attachment.data.len(),
                "sha256": hex::encode(Sha256::digest(&attachment.data)),
                "cv_path": cv_path,
                "extracted_fields": found,
                "job_code": job_code,
            })),
        };
        if let Err(e) = self.store.record_event(event).await {
            tracing::error!(
                candidate_id = %candidate.id,
                error = %e,
                "Failed to record candidate event"
            );
        }

        let Some(code) = job_code else {
            return Ok(false);
        };
        match self.store.find_job_by_code(code).await {
            Ok(Some(job)) => {
                let note = format!(
                    "Application created automatically from email \"{}\" (job code {})",
                    email.subject, code
                );
                match self
                    .store
                    .create_application(candidate.id, job.id, STATUS_SUBMITTED, &note)
                    .await
                {
                    Ok(application) => {
                        tracing::info!(
                            candidate_id = %candidate.id,
                            job_id = %job.id,
                            application_id = %application.id,
                            "Job application created from email"
                        );
                        Ok(true)
                    }
                    Err(e) => {
                        tracing::error!(
                            candidate_id = %candidate.id,
                            job_code = code,
                            error = %e,
                            "Failed to create job application"
                        );
                        Ok(false)
                    }
                }
            }
            Ok(None) => {
                tracing::info!(job_code = code, "No job matches code in subject");
                Ok(false)
            }
            Err(e) => {
                tracing::error!(job_code = code, error = %e, "Job lookup failed");
                Ok(false)
            }
        }
    }
}

/// Writes under `<uploads>/cv/` as `<uuid>_<sanitised name>` and returns
/// `(disk path, public path)`.
pub async fn save_cv_file(
    uploads_dir: &Path,
    filename: &str,
    data: &[u8],
) -> Result<(PathBuf, String)> {
    let dir = uploads_dir.join("cv");
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = format!("{}_{}", Uuid::new_v4(), attachments::sanitize_filename(filename));
    let disk_path = dir.join(&file_name);
    tokio::fs::write(&disk_path, data).await?;

    Ok((disk_path, format!("/uploads/cv/{}", file_name)))
}

/// Run a cycle now and then on every `interval`. The loop awaits each cycle,
/// so a slow cycle delays the next tick instead of overlapping it.
pub fn spawn_email_poller<M, S>(
    intake: Arc<IntakeService<M, S>>,
    interval: Duration,
) -> JoinHandle<()>
where
    M: MailSource + 'static,
    S: IntakeStore + 'static,
{
    tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs(), "Email poller started");
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            intake.run_cycle().await;
        }
    })
}
