pub mod banner;
pub mod context;
pub mod headings;
pub mod lines;
pub mod normalize;
pub mod table;
pub mod walker;

use crate::error::CrosstabError;
use crate::extraction::{PageContent, SourceDocument};
use crate::rules::schema::RuleSetDef;
use lines::{LineParseOutput, LineParser};
use walker::{DocumentWalker, WalkOutput};

/// Walk a table-structured document and aggregate its data tables.
///
/// Fails when no teacher value was stored at all.
pub fn walk_document(
    doc: &SourceDocument,
    rules: &RuleSetDef,
) -> Result<WalkOutput, CrosstabError> {
    if doc.paragraphs.iter().all(|p| p.trim().is_empty()) && doc.tables.is_empty() {
        return Err(CrosstabError::NothingDetected(
            "document has no paragraphs or tables".into(),
        ));
    }

    let out = DocumentWalker::from_rules(rules)?.walk(doc);
    if out.store.is_empty() {
        return Err(CrosstabError::NothingDetected(format!(
            "{} question heading(s) and {} table(s) produced no teacher values",
            out.questions.len(),
            doc.tables.len()
        )));
    }
    Ok(out)
}

/// Parse extracted text lines (pages in order) into per-question tallies.
///
/// Fails when no question collected any entry.
pub fn parse_lines(
    pages: &[PageContent],
    rules: &RuleSetDef,
) -> Result<LineParseOutput, CrosstabError> {
    if pages
        .iter()
        .all(|p| p.lines.iter().all(|l| l.trim().is_empty()))
    {
        return Err(CrosstabError::NothingDetected(
            "no text content found".into(),
        ));
    }

    let out = LineParser::from_rules(rules)?.parse(pages);
    if out.tallies.is_empty() {
        return Err(CrosstabError::NothingDetected(format!(
            "{} question heading(s) found but no entries under them",
            out.questions.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::default_ruleset;

    #[test]
    fn test_empty_document_is_nothing_detected() {
        let rules = default_ruleset().unwrap();
        let err = walk_document(&SourceDocument::default(), &rules).unwrap_err();
        assert!(matches!(err, CrosstabError::NothingDetected(_)));
    }

    #[test]
    fn test_document_without_data_tables_is_nothing_detected() {
        let rules = default_ruleset().unwrap();
        let doc = SourceDocument {
            paragraphs: vec!["Q#1 Punctuality".into()],
            tables: vec![crate::extraction::Table::new(vec![vec![
                "ID".into(),
                "Responses".into(),
            ]])],
        };
        let err = walk_document(&doc, &rules).unwrap_err();
        assert!(matches!(err, CrosstabError::NothingDetected(_)));
    }

    #[test]
    fn test_blank_pages_are_nothing_detected() {
        let rules = default_ruleset().unwrap();
        let err = parse_lines(&[PageContent::from_text("\n  \n")], &rules).unwrap_err();
        assert!(matches!(err, CrosstabError::NothingDetected(_)));
    }

    #[test]
    fn test_questions_without_entries_are_nothing_detected() {
        let rules = default_ruleset().unwrap();
        let err = parse_lines(&[PageContent::from_text("Q#1 Punctuality\nQ#2 Clarity")], &rules)
            .unwrap_err();
        assert!(matches!(err, CrosstabError::NothingDetected(_)));
    }
}
