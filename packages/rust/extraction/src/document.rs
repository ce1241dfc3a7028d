//! Source documents handed to the pipeline.

use std::path::Path;

use sha2::{Digest, Sha256};

use plancheck_shared::{DocumentInfo, PlanCheckError, Result};

/// A text document plus its provenance.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    info: DocumentInfo,
}

impl Document {
    /// Read a document from disk. Only UTF-8 text is accepted.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| PlanCheckError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_bytes(name, bytes)
    }

    /// Build a document from raw bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let info = DocumentInfo {
            sha256: sha256_hex(&bytes),
            bytes: bytes.len(),
            name,
        };

        let text = String::from_utf8(bytes).map_err(|e| {
            PlanCheckError::document(format!(
                "{} is not UTF-8 text (invalid byte at offset {})",
                info.name,
                e.utf8_error().valid_up_to()
            ))
        })?;

        if text.trim().is_empty() {
            return Err(PlanCheckError::document(format!("{} is empty", info.name)));
        }

        Ok(Self { text, info })
    }

    /// Build a document from in-memory text.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        Self::from_bytes(name, text.into().into_bytes())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_digest_and_size() {
        let doc = Document::from_text("plan.txt", "G+7 residential block").unwrap();
        assert_eq!(doc.name(), "plan.txt");
        assert_eq!(doc.info().bytes, 21);
        assert_eq!(doc.info().sha256.len(), 64);
    }

    #[test]
    fn same_content_same_digest() {
        let a = Document::from_text("a.txt", "identical").unwrap();
        let b = Document::from_text("b.txt", "identical").unwrap();
        assert_eq!(a.info().sha256, b.info().sha256);
    }

    #[test]
    fn rejects_binary() {
        let err = Document::from_bytes("drawing.pdf", vec![0x25, 0x50, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, PlanCheckError::Document { .. }));
        assert!(err.to_string().contains("offset 2"));
    }

    #[test]
    fn rejects_blank() {
        assert!(Document::from_text("empty.txt", "  \n ").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Document::from_path(Path::new("/nonexistent/plancheck/plan.txt")).unwrap_err();
        assert!(matches!(err, PlanCheckError::Io { .. }));
    }

    #[test]
    fn reads_fixture_from_disk() {
        let path = Path::new("../../../fixtures/documents/structural-report.txt");
        let doc = Document::from_path(path).expect("read fixture");
        assert!(doc.text().contains("Seismic Zone"));
    }
}
