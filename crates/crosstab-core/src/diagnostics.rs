use crate::model::QuestionId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A question heading found no acceptable table before the tables ran out.
    QuestionWithoutTable,
    /// The same question id was declared twice.
    DuplicateQuestion,
    /// Recognised questions and accepted data tables do not line up.
    TableCountMismatch,
    /// Tables left over after the last question heading.
    UnconsumedTables,
    MissingBannerImage,
    /// Text lines that matched no pattern.
    DroppedLines,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionWarning {
    pub kind: WarningKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionId>,
    pub message: String,
}

/// Why a table was not used as a data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Empty,
    MissingNameColumn,
    MissingValueColumn,
    NonDataHeader,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "table has no header row"),
            Rejection::MissingNameColumn => write!(f, "no name/teacher column"),
            Rejection::MissingValueColumn => write!(f, "no percentage/ranking column"),
            Rejection::NonDataHeader => write!(f, "header matches a known non-data shape"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedTable {
    /// Position in the document's table stream.
    pub index: usize,
    pub reason: Rejection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedLine {
    pub page_number: usize,
    pub line_text: String,
    pub reason: String,
}

/// Everything a conversion noticed but did not treat as fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ConversionWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_tables: Vec<RejectedTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_lines: Vec<SkippedLine>,
}

impl Diagnostics {
    /// Record a warning and log it.
    pub fn warn(&mut self, kind: WarningKind, question: Option<QuestionId>, message: String) {
        tracing::warn!(?kind, "{message}");
        self.warnings.push(ConversionWarning {
            kind,
            question,
            message,
        });
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_records_kind() {
        let mut d = Diagnostics::default();
        assert!(d.warnings.is_empty());
        d.warn(
            WarningKind::DuplicateQuestion,
            Some(QuestionId::new(2)),
            "Q#2 declared twice".into(),
        );
        assert!(d.has_warning(WarningKind::DuplicateQuestion));
        assert!(!d.has_warning(WarningKind::UnconsumedTables));
        assert_eq!(d.warnings.len(), 1);
    }

    #[test]
    fn test_serializes_snake_case() {
        let mut d = Diagnostics::default();
        d.rejected_tables.push(RejectedTable {
            index: 0,
            reason: Rejection::NonDataHeader,
        });
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"non_data_header\""));
        assert!(!json.contains("skipped_lines"));
    }
}
