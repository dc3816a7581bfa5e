use thiserror::Error;

const TEXT_MIME_TYPES: [&str; 3] = ["text/plain", "text/markdown", "text/x-markdown"];
const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];
const PDF_MIME_TYPE: &str = "application/pdf";
const PDF_EXTENSION: &str = "pdf";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unsupported document type: {0}")]
    UnsupportedFormat(String),

    #[error("could not read PDF: {0}")]
    Pdf(String),
}

/// Kinds of documents the bot can turn into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
}

impl DocumentFormat {
    /// Detects the format from the MIME type, falling back to the file extension.
    pub fn detect(file_name: Option<&str>, mime_type: Option<&str>) -> Option<Self> {
        match mime_type {
            Some(mime_type) if TEXT_MIME_TYPES.contains(&mime_type) => {
                return Some(DocumentFormat::PlainText)
            }
            Some(PDF_MIME_TYPE) => return Some(DocumentFormat::Pdf),
            _ => {}
        }

        let (_, extension) = file_name?.rsplit_once('.')?;
        if TEXT_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension))
        {
            Some(DocumentFormat::PlainText)
        } else if PDF_EXTENSION.eq_ignore_ascii_case(extension) {
            Some(DocumentFormat::Pdf)
        } else {
            None
        }
    }
}

/// Turns a downloaded document into a single text blob.
pub fn extract_text(
    file_name: Option<&str>,
    mime_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, ExtractError> {
    let Some(format) = DocumentFormat::detect(file_name, mime_type) else {
        let kind = mime_type.or(file_name).unwrap_or("unknown");
        return Err(ExtractError::UnsupportedFormat(kind.to_string()));
    };

    let text = match format {
        DocumentFormat::PlainText => {
            let text = String::from_utf8_lossy(bytes);
            text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
        }
        DocumentFormat::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?
        }
    };
    Ok(text.replace("\r\n", "\n"))
}
