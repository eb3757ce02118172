pub mod docx;
pub mod pdftotext;

use crate::error::CrosstabError;
use serde::{Deserialize, Serialize};

/// A table as ordered rows of cell texts. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Table { rows }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(|r| r.as_slice())
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// A table-structured document: top-level paragraphs and tables, each in
/// document order. Tables are referenced by position only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Table>,
}

/// Content extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: usize,
    pub lines: Vec<String>,
}

impl PageContent {
    /// Treat a plain text file as a single page.
    pub fn from_text(text: &str) -> Self {
        PageContent {
            page_number: 1,
            lines: text.lines().map(|l| l.to_string()).collect(),
        }
    }
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, CrosstabError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
