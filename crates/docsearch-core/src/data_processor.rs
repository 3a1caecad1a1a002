use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;

use crate::config::IngestSettings;
use crate::error::{Error, Result};

/// Formats the extractor understands. Markdown is read like plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::PlainText),
            "md" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default();
        Self::from_extension(&ext).ok_or_else(|| Error::UnsupportedExtension { path: path.to_path_buf(), ext })
    }
}

/// Extracted text of one source file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub filename: String,
    pub format: DocumentFormat,
    pub content: String,
}

/// Scans the documents directory and turns files into text.
pub struct DataProcessor {
    docs_dir: PathBuf,
    extensions: Vec<String>,
}

impl DataProcessor {
    pub fn new(docs_dir: impl Into<PathBuf>, extensions: &[String]) -> Self {
        let extensions = extensions.iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()).collect();
        Self { docs_dir: docs_dir.into(), extensions }
    }

    pub fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(settings.docs_dir(), &settings.extensions)
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Files directly inside the documents directory whose extension is in
    /// the configured list, sorted by path. Sub-directories are not visited.
    pub fn list_documents(&self) -> Result<Vec<PathBuf>> {
        if !self.docs_dir.is_dir() {
            return Err(Error::FileNotFound(self.docs_dir.clone()));
        }
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.docs_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase);
            if ext.is_some_and(|ext| self.extensions.contains(&ext)) {
                files.push(path.to_path_buf());
            } else {
                tracing::debug!(path = %path.display(), "skipping file with unlisted extension");
            }
        }
        files.sort();
        Ok(files)
    }

    /// Resolve a bare file name against the documents directory.
    pub fn resolve(&self, filename: &str) -> PathBuf {
        let path = Path::new(filename);
        if path.is_absolute() || path.exists() { path.to_path_buf() } else { self.docs_dir.join(path) }
    }

    pub fn load(&self, path: &Path) -> Result<SourceDocument> {
        let format = DocumentFormat::from_path(path)?;
        let content = extract_text(path)?;
        let filename = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        tracing::info!(file = %filename, chars = content.chars().count(), "text extracted");
        Ok(SourceDocument { path: path.to_path_buf(), filename, format, content })
    }
}

/// Extract the text of a TXT, MD, PDF or DOCX file.
pub fn extract_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    match DocumentFormat::from_path(path)? {
        DocumentFormat::PlainText | DocumentFormat::Markdown => read_plain_text(path),
        DocumentFormat::Pdf => read_pdf(path),
        DocumentFormat::Docx => read_docx(path),
    }
}

fn read_plain_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

fn read_pdf(path: &Path) -> Result<String> {
    let failed = |e: &dyn std::fmt::Display| Error::Extraction { path: path.to_path_buf(), message: e.to_string() };
    let mut doc = pdf_oxide::PdfDocument::open(path).map_err(|e| failed(&e))?;
    let pages = doc.page_count().map_err(|e| failed(&e))?;
    let mut text = String::new();
    for page in 0..pages {
        text.push_str(&doc.extract_text(page).map_err(|e| failed(&e))?);
    }
    Ok(text)
}

/// Paragraph text of `word/document.xml`, one paragraph per line.
fn read_docx(path: &Path) -> Result<String> {
    let failed = |message: String| Error::Extraction { path: path.to_path_buf(), message };
    let mut archive = zip::ZipArchive::new(fs::File::open(path)?).map_err(|e| failed(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| failed(format!("word/document.xml: {e}")))?
        .read_to_string(&mut xml)?;
    docx_paragraphs(&xml).map(|paragraphs| paragraphs.join("\n")).map_err(failed)
}

fn docx_paragraphs(xml: &str) -> std::result::Result<Vec<String>, String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape().map_err(|e| e.to_string())?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}
