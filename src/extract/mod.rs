pub mod ocr;
pub mod pdf;
pub mod types;

use crate::{config::Config, error::ExtractionError, util::looks_like_url};
use std::path::Path;
use tracing::{info, warn};

pub use ocr::CommandOcr;
pub use types::{ExtractedDocument, ExtractionMethod, ToolStatus};

/// Turns an image-only PDF into per-page text.
pub trait OcrEngine: Send + Sync {
    fn recognize_pdf(&self, input: &Path) -> Result<Vec<String>, ExtractionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Pdf,
    PlainText,
}

/// Document-to-text extraction: PDF text layer, OCR fallback, or plain text.
pub struct Extractor {
    max_input_file_bytes: u64,
    reject_url_inputs: bool,
    ocr: Option<Box<dyn OcrEngine>>,
}

impl Extractor {
    pub fn new(cfg: &Config) -> Self {
        let ocr: Option<Box<dyn OcrEngine>> = if cfg.ocr.enabled {
            Some(Box::new(CommandOcr::new(&cfg.ocr)))
        } else {
            None
        };
        Self {
            max_input_file_bytes: cfg.limits.max_input_file_bytes,
            reject_url_inputs: cfg.security.reject_url_inputs,
            ocr,
        }
    }

    /// Replace the OCR fallback, e.g. with a different engine.
    pub fn with_ocr(mut self, ocr: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn extract(&self, input: &Path) -> Result<ExtractedDocument, ExtractionError> {
        let kind = self.validate(input)?;
        let path = input.display().to_string();

        match kind {
            FileKind::PlainText => {
                info!("reading text file {}", path);
                let text = std::fs::read_to_string(input)?;
                Ok(ExtractedDocument {
                    path,
                    pages: vec![text],
                    method: ExtractionMethod::PlainText,
                    page_count: None,
                })
            }
            FileKind::Pdf => self.extract_pdf(input, path),
        }
    }

    fn extract_pdf(&self, input: &Path, path: String) -> Result<ExtractedDocument, ExtractionError> {
        info!("reading pdf text layer {}", path);
        let pages = pdf::text_layer_pages(input)?;
        let doc = ExtractedDocument {
            page_count: Some(pages.len() as u32),
            path,
            pages,
            method: ExtractionMethod::TextLayer,
        };
        if !doc.is_blank() {
            return Ok(doc);
        }

        let Some(ocr) = &self.ocr else {
            warn!("no text layer in {} and OCR is disabled", doc.path);
            return Err(ExtractionError::NoText(doc.path));
        };

        info!("no text layer in {}; falling back to OCR", doc.path);
        let pages = ocr.recognize_pdf(input)?;
        let doc = ExtractedDocument {
            page_count: Some(pages.len() as u32),
            pages,
            method: ExtractionMethod::Ocr,
            path: doc.path,
        };
        if doc.is_blank() {
            return Err(ExtractionError::NoText(doc.path));
        }
        info!("ocr recognized {} pages from {}", doc.pages.len(), doc.path);
        Ok(doc)
    }

    fn validate(&self, input: &Path) -> Result<FileKind, ExtractionError> {
        let input_str = input.display().to_string();

        if self.reject_url_inputs && looks_like_url(&input_str) {
            return Err(ExtractionError::UrlInput(input_str));
        }

        let meta = match std::fs::metadata(input) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractionError::NotFound(input_str));
            }
            Err(e) => return Err(ExtractionError::Io(e)),
        };
        if !meta.is_file() {
            return Err(ExtractionError::UnsupportedFileType(format!(
                "not a regular file: {input_str}"
            )));
        }
        if meta.len() > self.max_input_file_bytes {
            return Err(ExtractionError::TooLarge {
                path: input_str,
                size: meta.len(),
                limit: self.max_input_file_bytes,
            });
        }

        match input.extension().and_then(|s| s.to_str()) {
            Some(ext) => match ext.to_ascii_lowercase().as_str() {
                "pdf" => Ok(FileKind::Pdf),
                "txt" | "text" | "md" => Ok(FileKind::PlainText),
                other => Err(ExtractionError::UnsupportedFileType(other.to_string())),
            },
            None if pdf::has_pdf_header(input) => {
                warn!("input has no extension; PDF header found: {}", input_str);
                Ok(FileKind::Pdf)
            }
            None => Err(ExtractionError::UnsupportedFileType(format!(
                "no extension: {input_str}"
            ))),
        }
    }
}
