use crate::config::ExtractionSettings;
use anyhow::Context;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp"];

/// Turns a stored CV file into plain text. Never fails: anything that goes
/// wrong is logged and yields an empty string.
#[derive(Clone)]
pub struct TextExtractor {
    settings: ExtractionSettings,
}

impl TextExtractor {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }

    pub async fn extract_text_from_file(&self, path: &Path) -> String {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let result = match ext.as_str() {
            "pdf" => self.run_pdftotext(path).await,
            "doc" | "docx" => read_docx(path).await,
            "txt" => tokio::fs::read_to_string(path)
                .await
                .context("failed to read text file"),
            e if IMAGE_EXTENSIONS.contains(&e) => self.run_ocr(path).await,
            _ => {
                tracing::debug!(path = %path.display(), "No text extractor for file type");
                return String::new();
            }
        };

        match result {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = ?e, "Text extraction failed");
                String::new()
            }
        }
    }

    async fn run_pdftotext(&self, path: &Path) -> anyhow::Result<String> {
        let mut command = Command::new(&self.settings.pdftotext_path);
        command
            .arg("-layout")
            .arg(path)
            .arg("-")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.run(command, "pdftotext").await
    }

    async fn run_ocr(&self, path: &Path) -> anyhow::Result<String> {
        let mut command = Command::new(&self.settings.tesseract_path);
        command
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.settings.ocr_languages)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.run(command, "tesseract").await
    }

    async fn run(&self, mut command: Command, tool: &str) -> anyhow::Result<String> {
        let output = timeout(self.settings.timeout, command.output())
            .await
            .map_err(|_| anyhow::anyhow!("{} timed out after {:?}", tool, self.settings.timeout))?
            .with_context(|| format!("failed to run {}", tool))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {}: {}",
                tool,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

async fn read_docx(path: &Path) -> anyhow::Result<String> {
    let data = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || extract_docx_text(&data)).await?
}

/// Paragraph text from `word/document.xml`. Only `w:t` content is kept and
/// it is taken untrimmed, since Word splits words and their separating
/// spaces across runs. Legacy binary `.doc` files are not zip archives and
/// fail here.
pub fn extract_docx_text(data: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    let mut document_file = archive.by_name("word/document.xml")?;
    let mut xml = String::new();
    document_file.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);

    let mut buf = Vec::new();
    let mut current = String::new();
    let mut lines = Vec::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" => in_text = in_paragraph,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    if !current.trim().is_empty() {
                        lines.push(current.trim().to_string());
                    }
                    current.clear();
                    in_paragraph = false;
                    in_text = false;
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if in_paragraph && e.name().as_ref() == b"w:tab" {
                    current.push(' ');
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    current.push_str(&e.xml_content()?);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    if let Some(ch) = e.resolve_char_ref()? {
                        current.push(ch);
                    } else {
                        let name = e.decode()?;
                        match resolve_predefined_entity(&name) {
                            Some(value) => current.push_str(value),
                            None => tracing::debug!(entity = %name, "Unknown entity in docx"),
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }

        buf.clear();
    }

    Ok(lines.join("\n"))
}
