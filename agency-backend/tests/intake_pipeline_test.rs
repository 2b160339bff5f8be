use std::path::Path;
use std::sync::Mutex;

use agency_backend::config::ExtractionSettings;
use agency_backend::error::{Error, Result};
use agency_backend::models::candidate::{Candidate, NewCandidate};
use agency_backend::models::candidate_event::{CandidateEvent, NewCandidateEvent};
use agency_backend::models::job::Job;
use agency_backend::models::job_application::JobApplication;
use agency_backend::services::extraction_service::TextExtractor;
use agency_backend::services::intake_service::{IntakeService, IntakeStore};
use agency_backend::services::mailbox_service::{MailSource, RawMessage};
use chrono::Utc;
use uuid::Uuid;

const JOHN_CV: &str = "John Cohen\r\nProfession: Software Engineer\r\nEmail: John.Cohen@Example.com\r\nMobile: 052-123-4567\r\n";

/// Hands out queued messages once, the way a mailbox stops returning
/// messages after they are flagged seen.
#[derive(Default)]
struct QueuedMailbox {
    queue: Mutex<Vec<RawMessage>>,
    failure: Option<String>,
}

impl QueuedMailbox {
    fn deliver(&self, body: Vec<u8>) {
        let mut queue = self.queue.lock().unwrap();
        let seq = queue.len() as u32 + 1;
        queue.push(RawMessage {
            seq,
            uid: Some(seq),
            body,
        });
    }
}

impl MailSource for QueuedMailbox {
    async fn fetch_unseen(&self) -> Result<Vec<RawMessage>> {
        if let Some(reason) = &self.failure {
            return Err(Error::Timeout(reason.clone()));
        }
        Ok(std::mem::take(&mut *self.queue.lock().unwrap()))
    }
}

#[derive(Default)]
struct MemoryStore {
    candidates: Mutex<Vec<Candidate>>,
    events: Mutex<Vec<CandidateEvent>>,
    jobs: Vec<Job>,
    applications: Mutex<Vec<JobApplication>>,
}

impl MemoryStore {
    fn with_job(code: &str) -> Self {
        Self {
            jobs: vec![Job {
                id: Uuid::new_v4(),
                job_code: Some(code.to_string()),
                title: "Backend Developer".to_string(),
                company: Some("Acme".to_string()),
                location: Some("Tel Aviv".to_string()),
                description: None,
                requirements: None,
                salary_from: None,
                salary_to: None,
                status: "open".to_string(),
                created_at: Some(Utc::now()),
                updated_at: None,
            }],
            ..Self::default()
        }
    }
}

impl IntakeStore for MemoryStore {
    async fn create_candidate(&self, c: NewCandidate) -> Result<Candidate> {
        let candidate = Candidate {
            id: Uuid::new_v4(),
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            mobile: c.mobile,
            phone: c.phone,
            city: c.city,
            profession: c.profession,
            cv_path: c.cv_path,
            cv_content: c.cv_content,
            status: c.status,
            recruitment_source: c.recruitment_source,
            notes: c.notes,
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        self.candidates.lock().unwrap().push(candidate.clone());
        Ok(candidate)
    }

    async fn record_event(&self, e: NewCandidateEvent) -> Result<CandidateEvent> {
        let event = CandidateEvent {
            id: Uuid::new_v4(),
            candidate_id: e.candidate_id,
            event_type: e.event_type,
            description: e.description,
            metadata: e.metadata,
            created_at: Some(Utc::now()),
        };
        self.events.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn find_job_by_code(&self, code: &str) -> Result<Option<Job>> {
        Ok(self
            .jobs
            .iter()
            .find(|j| j.job_code.as_deref() == Some(code))
            .cloned())
    }

    async fn create_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: &str,
        notes: &str,
    ) -> Result<JobApplication> {
        let application = JobApplication {
            id: Uuid::new_v4(),
            candidate_id,
            job_id,
            status: status.to_string(),
            notes: Some(notes.to_string()),
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        self.applications.lock().unwrap().push(application.clone());
        Ok(application)
    }
}

/// multipart/mixed message with a short text body and the given
/// `(filename, content type, content)` attachments.
fn raw_email(subject: &str, attachments: &[(&str, &str, &str)]) -> Vec<u8> {
    let mut out = format!(
        "From: John Cohen <John@Example.com>\r\n\
         To: jobs@agency.test\r\n\
         Subject: {}\r\n\
         Message-ID: <{}@mail.test>\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/mixed; boundary=\"BOUNDARY\"\r\n\
         \r\n\
         --BOUNDARY\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         Hello, please find my CV attached.\r\n",
        subject,
        Uuid::new_v4()
    );
    for (filename, content_type, content) in attachments {
        out.push_str(&format!(
            "--BOUNDARY\r\n\
             Content-Type: {}; name=\"{}\"\r\n\
             Content-Disposition: attachment; filename=\"{}\"\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             {}\r\n",
            content_type, filename, filename, content
        ));
    }
    out.push_str("--BOUNDARY--\r\n");
    out.into_bytes()
}

fn intake(
    mailbox: QueuedMailbox,
    store: MemoryStore,
    uploads: &Path,
) -> IntakeService<QueuedMailbox, MemoryStore> {
    IntakeService::new(
        mailbox,
        store,
        TextExtractor::new(ExtractionSettings::default()),
        uploads,
    )
}

#[tokio::test]
async fn cv_with_job_code_creates_candidate_event_and_application() {
    let uploads = tempfile::tempdir().unwrap();
    let mailbox = QueuedMailbox::default();
    mailbox.deliver(raw_email(
        "Application 1234",
        &[("cv_john.txt", "text/plain", JOHN_CV)],
    ));
    let service = intake(mailbox, MemoryStore::with_job("1234"), uploads.path());

    let report = service.run_cycle().await;
    assert_eq!(report.messages_fetched, 1);
    assert_eq!(report.candidates_created, 1);
    assert_eq!(report.applications_created, 1);
    assert_eq!(report.failures, 0);
    assert!(report.error.is_none());

    let store = service.store();
    let candidates = store.candidates.lock().unwrap();
    assert_eq!(candidates.len(), 1);
    let candidate = &candidates[0];
    assert_eq!(candidate.first_name, "John");
    assert_eq!(candidate.last_name, "Cohen");
    assert_eq!(candidate.email.as_deref(), Some("john.cohen@example.com"));
    assert_eq!(candidate.mobile.as_deref(), Some("0521234567"));
    assert_eq!(candidate.profession.as_deref(), Some("Software Engineer"));
    assert_eq!(candidate.status, "new");
    assert_eq!(candidate.recruitment_source.as_deref(), Some("email"));
    assert!(candidate.cv_content.as_deref().unwrap().contains("John Cohen"));

    let cv_path = candidate.cv_path.as_deref().unwrap();
    assert!(cv_path.starts_with("/uploads/cv/"));
    assert!(cv_path.ends_with("_cv_john.txt"));
    let stored = uploads
        .path()
        .join("cv")
        .join(cv_path.trim_start_matches("/uploads/cv/"));
    assert!(stored.exists());

    let events = store.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].candidate_id, candidate.id);
    assert_eq!(events[0].event_type, "candidate_created");
    let metadata = events[0].metadata.as_ref().unwrap();
    assert_eq!(metadata["job_code"], "1234");
    assert_eq!(metadata["attachment"], "cv_john.txt");
    assert_eq!(metadata["from_address"], "john@example.com");

    let applications = store.applications.lock().unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].candidate_id, candidate.id);
    assert_eq!(applications[0].job_id, store.jobs[0].id);
    assert_eq!(applications[0].status, "submitted");
}

#[tokio::test]
async fn unreadable_pdf_still_files_candidate_and_application() {
    let uploads = tempfile::tempdir().unwrap();
    let mailbox = QueuedMailbox::default();
    mailbox.deliver(raw_email(
        "Application 1234",
        &[("cv_john.pdf", "application/pdf", "%PDF-1.4 scanned")],
    ));
    let service = IntakeService::new(
        mailbox,
        MemoryStore::with_job("1234"),
        TextExtractor::new(ExtractionSettings {
            pdftotext_path: "/nonexistent/pdftotext".to_string(),
            ..ExtractionSettings::default()
        }),
        uploads.path(),
    );

    let report = service.run_cycle().await;
    assert_eq!(report.candidates_created, 1);
    assert_eq!(report.applications_created, 1);

    let store = service.store();
    let candidates = store.candidates.lock().unwrap();
    assert_eq!(candidates[0].first_name, "");
    assert!(candidates[0].email.is_none());
    assert!(candidates[0].cv_content.is_none());
    assert!(candidates[0].cv_path.as_deref().unwrap().ends_with("_cv_john.pdf"));

    let applications = store.applications.lock().unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].status, "submitted");
    assert!(applications[0].notes.as_deref().unwrap().contains("1234"));
}

#[tokio::test]
async fn message_without_attachments_is_skipped_quietly() {
    let uploads = tempfile::tempdir().unwrap();
    let mailbox = QueuedMailbox::default();
    mailbox.deliver(raw_email("Hello there", &[]));
    let service = intake(mailbox, MemoryStore::default(), uploads.path());

    let report = service.run_cycle().await;
    assert_eq!(report.messages_fetched, 1);
    assert_eq!(report.messages_without_cv, 1);
    assert_eq!(report.candidates_created, 0);
    assert_eq!(report.failures, 0);
    assert!(report.error.is_none());
    assert!(service.store().candidates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_cv_attachments_are_ignored() {
    let uploads = tempfile::tempdir().unwrap();
    let mailbox = QueuedMailbox::default();
    mailbox.deliver(raw_email(
        "Invoice 5555",
        &[("invoice.xlsx", "application/vnd.ms-excel", "not a cv")],
    ));
    let service = intake(mailbox, MemoryStore::with_job("5555"), uploads.path());

    let report = service.run_cycle().await;
    assert_eq!(report.messages_without_cv, 1);
    assert_eq!(report.candidates_created, 0);
    assert!(service.store().applications.lock().unwrap().is_empty());
}

#[tokio::test]
async fn each_cv_attachment_becomes_its_own_candidate() {
    let uploads = tempfile::tempdir().unwrap();
    let mailbox = QueuedMailbox::default();
    mailbox.deliver(raw_email(
        "Two candidates",
        &[
            ("cv_john.txt", "text/plain", JOHN_CV),
            ("resume_dana.txt", "text/plain", "Dana Levi\r\nEmail: dana@example.com\r\n"),
        ],
    ));
    let service = intake(mailbox, MemoryStore::default(), uploads.path());

    let report = service.run_cycle().await;
    assert_eq!(report.candidates_created, 2);
    assert_eq!(report.applications_created, 0);

    let store = service.store();
    let mut emails: Vec<_> = store
        .candidates
        .lock()
        .unwrap()
        .iter()
        .filter_map(|c| c.email.clone())
        .collect();
    emails.sort();
    assert_eq!(emails, ["dana@example.com", "john.cohen@example.com"]);
    assert_eq!(store.events.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_job_code_still_creates_candidate() {
    let uploads = tempfile::tempdir().unwrap();
    let mailbox = QueuedMailbox::default();
    mailbox.deliver(raw_email(
        "Application 9999",
        &[("cv_john.txt", "text/plain", JOHN_CV)],
    ));
    let service = intake(mailbox, MemoryStore::with_job("1234"), uploads.path());

    let report = service.run_cycle().await;
    assert_eq!(report.candidates_created, 1);
    assert_eq!(report.applications_created, 0);
    assert_eq!(report.failures, 0);
    assert!(service.store().applications.lock().unwrap().is_empty());
}

#[tokio::test]
async fn redelivered_message_produces_a_second_candidate() {
    let uploads = tempfile::tempdir().unwrap();
    let raw = raw_email("Application 1234", &[("cv_john.txt", "text/plain", JOHN_CV)]);
    let mailbox = QueuedMailbox::default();
    mailbox.deliver(raw.clone());
    let service = intake(mailbox, MemoryStore::with_job("1234"), uploads.path());

    service.run_cycle().await;
    let empty = service.run_cycle().await;
    assert_eq!(empty.messages_fetched, 0);

    service.mailbox().deliver(raw);
    service.run_cycle().await;

    let store = service.store();
    let candidates = store.candidates.lock().unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].email, candidates[1].email);
    assert_ne!(candidates[0].cv_path, candidates[1].cv_path);
    assert_eq!(store.applications.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn unsafe_attachment_names_stay_inside_the_cv_directory() {
    let uploads = tempfile::tempdir().unwrap();
    let mailbox = QueuedMailbox::default();
    mailbox.deliver(raw_email(
        "CV",
        &[("../../escape cv.txt", "text/plain", JOHN_CV)],
    ));
    let service = intake(mailbox, MemoryStore::default(), uploads.path());

    let report = service.run_cycle().await;
    assert_eq!(report.candidates_created, 1);

    let entries: Vec<_> = std::fs::read_dir(uploads.path().join("cv"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].parent().unwrap(), uploads.path().join("cv"));
    let name = entries[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(!name.contains('/'));
    assert!(name.ends_with("escape cv.txt"));
}

#[tokio::test]
async fn mailbox_failure_is_reported_not_raised() {
    let uploads = tempfile::tempdir().unwrap();
    let mailbox = QueuedMailbox {
        failure: Some("IMAP session exceeded 30s".to_string()),
        ..QueuedMailbox::default()
    };
    let service = intake(mailbox, MemoryStore::default(), uploads.path());

    assert!(service.last_report().await.is_none());
    let report = service.run_cycle().await;
    assert_eq!(report.messages_fetched, 0);
    assert_eq!(report.candidates_created, 0);
    assert!(report.error.as_deref().unwrap().contains("IMAP session exceeded"));

    let last = service.last_report().await.unwrap();
    assert_eq!(last.error, report.error);
    assert!(last.finished_at >= last.started_at);
}
