pub mod aggregate;
pub mod diagnostics;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod report;
pub mod rules;

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use aggregate::AggregationStore;
use diagnostics::Diagnostics;
use error::CrosstabError;
use extraction::{PageContent, PdfExtractor, SourceDocument};
use model::QuestionBook;
use parsing::lines::{fold_into_store, QuestionTally};
use report::Report;
use rules::schema::RuleSetDef;

/// Which ingestion path produced a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Docx,
    Pdf,
    Text,
}

impl InputKind {
    /// Pick the reader from the file extension.
    pub fn from_path(path: &Path) -> Result<InputKind, CrosstabError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("docx") => Ok(InputKind::Docx),
            Some("pdf") => Ok(InputKind::Pdf),
            Some("txt") => Ok(InputKind::Text),
            _ => Err(CrosstabError::UnsupportedInput(path.display().to_string())),
        }
    }
}

/// Everything one conversion produced, ready to render or serialize.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub kind: InputKind,
    pub banner: Vec<String>,
    pub questions: QuestionBook,
    pub campuses: BTreeSet<String>,
    pub store: AggregationStore,
    /// Text path only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tallies: Vec<QuestionTally>,
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    precision: u32,
}

impl Conversion {
    /// Table-path conversions render one section per teacher; text-path
    /// conversions one section per question.
    pub fn to_report(&self) -> Report {
        match self.kind {
            InputKind::Docx => report::build_teacher_report(
                &self.store,
                &self.questions,
                &self.campuses,
                &self.banner,
            ),
            InputKind::Pdf | InputKind::Text => {
                report::build_tally_report(&self.tallies, &self.banner, self.precision)
            }
        }
    }
}

/// Convert an already-read table-structured document.
pub fn convert_document(
    doc: &SourceDocument,
    rules: &RuleSetDef,
) -> Result<Conversion, CrosstabError> {
    let out = parsing::walk_document(doc, rules)?;
    Ok(Conversion {
        kind: InputKind::Docx,
        banner: out.banner,
        questions: out.questions,
        campuses: out.campuses,
        store: out.store,
        tallies: Vec::new(),
        diagnostics: out.diagnostics,
        precision: rules.percentage_precision,
    })
}

pub fn convert_docx(bytes: &[u8], rules: &RuleSetDef) -> Result<Conversion, CrosstabError> {
    let doc = extraction::docx::read_docx(bytes)?;
    convert_document(&doc, rules)
}

/// Convert a PDF through the given text extraction backend.
pub fn convert_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    rules: &RuleSetDef,
) -> Result<Conversion, CrosstabError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    tracing::debug!(
        backend = extractor.backend_name(),
        pages = pages.len(),
        "extracted PDF text"
    );
    convert_pages(&pages, rules, InputKind::Pdf)
}

/// Convert plain text, treated as a single page.
pub fn convert_text(text: &str, rules: &RuleSetDef) -> Result<Conversion, CrosstabError> {
    convert_pages(&[PageContent::from_text(text)], rules, InputKind::Text)
}

/// Convert already-extracted pages through the text path.
pub fn convert_pages(
    pages: &[PageContent],
    rules: &RuleSetDef,
    kind: InputKind,
) -> Result<Conversion, CrosstabError> {
    let out = parsing::parse_lines(pages, rules)?;
    let campus = rules.fallback_campus.as_str();
    let store = fold_into_store(&out.tallies, campus, rules.percentage_precision);
    Ok(Conversion {
        kind,
        banner: out.banner,
        questions: out.questions,
        campuses: BTreeSet::from([campus.to_string()]),
        store,
        tallies: out.tallies,
        diagnostics: out.diagnostics,
        precision: rules.percentage_precision,
    })
}

/// Read `path` and run the matching ingestion path.
pub fn convert_path(
    path: &Path,
    extractor: &dyn PdfExtractor,
    rules: &RuleSetDef,
) -> Result<Conversion, CrosstabError> {
    let kind = InputKind::from_path(path)?;
    let bytes = std::fs::read(path)?;
    tracing::info!(input = %path.display(), ?kind, bytes = bytes.len(), "converting");
    match kind {
        InputKind::Docx => convert_docx(&bytes, rules),
        InputKind::Pdf => convert_pdf(&bytes, extractor, rules),
        InputKind::Text => convert_text(&String::from_utf8_lossy(&bytes), rules),
    }
}
