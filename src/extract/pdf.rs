use crate::error::ExtractionError;
use std::panic;
use std::path::Path;
use tracing::debug;

/// Read the text layer of a PDF. Pages are split on form feeds when the
/// parser emits them; otherwise the whole document is one page.
pub fn text_layer_pages(path: &Path) -> Result<Vec<String>, ExtractionError> {
    let bytes = std::fs::read(path)?;
    if !bytes.starts_with(b"%PDF-") {
        return Err(ExtractionError::Pdf(format!(
            "missing %PDF- header: {}",
            path.display()
        )));
    }

    // pdf-extract panics on some malformed inputs instead of returning an error.
    let parsed = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
        .map_err(|_| ExtractionError::Pdf(format!("parser panicked on {}", path.display())))?;
    let text = parsed.map_err(|e| ExtractionError::Pdf(format!("{}: {e}", path.display())))?;

    let pages: Vec<String> = text.split('\u{000C}').map(str::to_string).collect();
    debug!(
        "text layer {} pages={} chars={}",
        path.display(),
        pages.len(),
        text.len()
    );
    Ok(pages)
}

pub fn has_pdf_header(path: &Path) -> bool {
    use std::io::Read;
    let Ok(mut f) = std::fs::File::open(path) else {
        return false;
    };
    let mut buf = [0u8; 5];
    f.read_exact(&mut buf).is_ok() && &buf == b"%PDF-"
}
