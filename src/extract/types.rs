use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Text read from the PDF's embedded text layer.
    TextLayer,
    /// Pages rendered to images and run through OCR.
    Ocr,
    /// File read as-is.
    PlainText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub path: String,
    pub pages: Vec<String>,
    pub method: ExtractionMethod,
    pub page_count: Option<u32>,
}

impl ExtractedDocument {
    pub fn text(&self) -> String {
        self.pages.join("\n\n")
    }

    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Availability of one external tool, as reported by `doctor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatus {
    pub tool: String,
    pub exe: String,
    pub available: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
