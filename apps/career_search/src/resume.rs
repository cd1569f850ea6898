//! Resume text extraction for uploaded `.pdf` / `.docx` files.

use std::path::Path;

use bytes::Bytes;
use serde_json::Value;
use tracing::{error, warn};

use crate::errors::AppError;

const PDF_EXT: &str = "pdf";
const DOCX_EXT: &str = "docx";

/// Extracts plain text from an upload, dispatching on the file extension.
/// Returns `Ok(None)` for unsupported extensions.
pub async fn process_file(filename: &str, data: Bytes) -> Result<Option<String>, AppError> {
    let filename = filename.to_string();
    tokio::task::spawn_blocking(move || extract_text(&filename, &data))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("resume extraction task failed: {e}")))?
}

pub fn extract_text(filename: &str, data: &[u8]) -> Result<Option<String>, AppError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some(DOCX_EXT) => read_docx(data).map(Some),
        Some(PDF_EXT) => read_pdf(data).map(Some),
        other => {
            warn!("Unsupported resume file type: {other:?}");
            Ok(None)
        }
    }
}

fn read_pdf(data: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| {
        error!("Error processing PDF file: {e}");
        AppError::Validation("Error processing file".to_string())
    })
}

/// Paragraph text joined with newlines. Runs inside a paragraph are concatenated as-is.
fn read_docx(data: &[u8]) -> Result<String, AppError> {
    let docx = docx_rs::read_docx(data).map_err(|e| {
        error!("Error parsing DOCX file: {e:?}");
        AppError::Validation("Error processing file".to_string())
    })?;

    let json: Value = serde_json::from_str(&docx.json()).map_err(|e| {
        error!("Error parsing DOCX JSON: {e}");
        AppError::Validation("Error processing file".to_string())
    })?;

    let paragraphs: Vec<String> = json
        .get("document")
        .and_then(|d| d.get("children"))
        .and_then(|c| c.as_array())
        .map(|children| {
            children
                .iter()
                .filter(|child| node_type(child) == Some("paragraph"))
                .map(paragraph_text)
                .collect()
        })
        .unwrap_or_default();

    Ok(paragraphs.join("\n"))
}

fn node_type(node: &Value) -> Option<&str> {
    node.get("type").and_then(|t| t.as_str())
}

fn children(node: &Value) -> &[Value] {
    node.get("data")
        .and_then(|d| d.get("children"))
        .and_then(|c| c.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn paragraph_text(paragraph: &Value) -> String {
    let mut text = String::new();
    for child in children(paragraph) {
        match node_type(child) {
            Some("run") => push_run_text(child, &mut text),
            // Hyperlinks wrap their own runs.
            Some("hyperlink") => {
                for run in children(child).iter().filter(|r| node_type(r) == Some("run")) {
                    push_run_text(run, &mut text);
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run_text(run: &Value, out: &mut String) {
    for child in children(run) {
        match node_type(child) {
            Some("text") => {
                if let Some(t) = child.get("data").and_then(|d| d.get("text")).and_then(|t| t.as_str()) {
                    out.push_str(t);
                }
            }
            Some("tab") => out.push('\t'),
            _ => {}
        }
    }
}
