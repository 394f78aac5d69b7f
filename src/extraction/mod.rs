//! Plain-text extraction from uploaded PDF, DOCX, and TXT files.

mod docx;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading document text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// File extension is not one of pdf, docx, or txt.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    /// File could not be read from disk.
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// Text file was not valid UTF-8.
    #[error("Text file is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    /// PDF parser rejected the file.
    #[error("Failed to extract PDF text: {0}")]
    Pdf(String),
    /// DOCX container or markup was malformed.
    #[error("Failed to extract DOCX text: {0}")]
    Docx(String),
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word processing document.
    Docx,
    /// UTF-8 plain text.
    Txt,
}

impl DocumentFormat {
    /// Resolve the format from a file name or path, ignoring extension case.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            _ => Err(ExtractionError::UnsupportedFormat(if extension.is_empty() {
                filename.to_string()
            } else {
                extension
            })),
        }
    }

    /// Canonical lowercase extension.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Whether a path carries one of the supported extensions.
pub fn is_supported(path: &Path) -> bool {
    path.to_str()
        .map(|name| DocumentFormat::from_filename(name).is_ok())
        .unwrap_or(false)
}

/// Read a file from disk and extract its text according to its extension.
pub fn extract_document_text(path: &Path) -> Result<String, ExtractionError> {
    let name = path.to_string_lossy();
    let format = DocumentFormat::from_filename(&name)?;
    let bytes = std::fs::read(path)?;
    let text = extract_text_from_bytes(format, &bytes)?;
    tracing::debug!(
        path = %path.display(),
        %format,
        chars = text.chars().count(),
        "Extracted document text"
    );
    Ok(text)
}

/// Extract text from in-memory file contents.
pub fn extract_text_from_bytes(
    format: DocumentFormat,
    bytes: &[u8],
) -> Result<String, ExtractionError> {
    match format {
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|error| ExtractionError::Pdf(error.to_string())),
        DocumentFormat::Docx => docx::extract_docx_text(bytes),
        DocumentFormat::Txt => Ok(String::from_utf8(bytes.to_vec())?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_resolution_is_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_filename("Lease.PDF").expect("pdf"),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_filename("dir/brief.docx").expect("docx"),
            DocumentFormat::Docx
        );
        assert_eq!(
            DocumentFormat::from_filename("notes.txt").expect("txt"),
            DocumentFormat::Txt
        );
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let error = DocumentFormat::from_filename("scan.png").expect_err("png");
        assert!(matches!(error, ExtractionError::UnsupportedFormat(ref ext) if ext == "png"));
        assert!(DocumentFormat::from_filename("README").is_err());
        assert!(!is_supported(Path::new("archive.doc")));
        assert!(is_supported(Path::new("contract.Docx")));
    }

    #[test]
    fn txt_requires_utf8() {
        let text = extract_text_from_bytes(DocumentFormat::Txt, "§ 1983 claim".as_bytes())
            .expect("utf8 text");
        assert_eq!(text, "§ 1983 claim");
        let error =
            extract_text_from_bytes(DocumentFormat::Txt, &[0xff, 0xfe, 0x00]).expect_err("bad");
        assert!(matches!(error, ExtractionError::Encoding(_)));
    }

    #[test]
    fn extract_document_text_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("memo.txt");
        std::fs::write(&path, "Memorandum of understanding").expect("write");
        assert_eq!(
            extract_document_text(&path).expect("text"),
            "Memorandum of understanding"
        );
    }

    #[test]
    fn malformed_pdf_is_an_error() {
        let error = extract_text_from_bytes(DocumentFormat::Pdf, b"not a pdf").expect_err("pdf");
        assert!(matches!(error, ExtractionError::Pdf(_)));
    }
}
