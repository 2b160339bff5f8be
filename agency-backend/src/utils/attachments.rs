//! MIME handling for inbound CV mail: header extraction, attachment
//! collection and the "does this look like a CV" heuristic.

use crate::error::Result;
use mailparse::{parse_mail, DispositionType, MailHeaderMap, ParsedMail};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

const CV_NAME_MARKERS: &[&str] = &["cv", "resume", "קורות חיים"];
const CV_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png", "tiff", "bmp"];

static JOB_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{4,}").unwrap());

#[derive(Debug, Clone)]
pub struct InboundEmail {
    pub message_id: Option<String>,
    pub subject: String,
    pub from: String,
    pub from_address: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn looks_like_cv(&self) -> bool {
        is_cv_attachment(&self.filename, &self.content_type)
    }
}

/// Parse a complete RFC 5322 message into headers and attachments.
pub fn parse_message(raw: &[u8]) -> Result<InboundEmail> {
    let mail = parse_mail(raw)?;

    let subject = mail.headers.get_first_value("Subject").unwrap_or_default();
    let from = mail.headers.get_first_value("From").unwrap_or_default();
    let from_address = mailparse::addrparse(&from)
        .ok()
        .and_then(|list| list.extract_single_info())
        .map(|info| info.addr.to_lowercase());
    let message_id = mail
        .headers
        .get_first_value("Message-ID")
        .map(|id| id.trim().trim_matches(|c| c == '<' || c == '>').to_string());

    let mut attachments = Vec::new();
    collect_attachments(&mail, &mut attachments)?;

    Ok(InboundEmail {
        message_id,
        subject,
        from,
        from_address,
        attachments,
    })
}

fn collect_attachments(part: &ParsedMail, out: &mut Vec<Attachment>) -> Result<()> {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_attachments(sub, out)?;
        }
        return Ok(());
    }

    let disposition = part.get_content_disposition();
    let filename = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned();

    let Some(filename) = filename else {
        return Ok(());
    };
    // Named inline parts (scanned CVs pasted as images) count too.
    if !matches!(
        disposition.disposition,
        DispositionType::Attachment | DispositionType::Inline
    ) {
        return Ok(());
    }

    out.push(Attachment {
        filename,
        content_type: part.ctype.mimetype.to_lowercase(),
        data: part.get_body_raw()?,
    });
    Ok(())
}

/// Filename markers OR known document/image extension OR an `image/*` type.
pub fn is_cv_attachment(filename: &str, content_type: &str) -> bool {
    let lower = filename.to_lowercase();

    if CV_NAME_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return true;
    }

    let has_cv_extension = Path::new(&lower)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| CV_EXTENSIONS.contains(&ext))
        .unwrap_or(false);

    has_cv_extension || content_type.to_lowercase().starts_with("image/")
}

/// Strip characters that are unsafe in a path component. Everything else,
/// Hebrew included, is kept as sent.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    }
}

/// First run of four or more digits in a subject line, e.g. `"Application 1234"`.
pub fn job_code_from_subject(subject: &str) -> Option<String> {
    JOB_CODE_RE.find(subject).map(|m| m.as_str().to_string())
}
