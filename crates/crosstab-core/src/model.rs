use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix of the canonical question identifier (`Q#<n>`).
pub const QUESTION_ID_PREFIX: &str = "Q#";

/// Canonical question identifier. Orders by its numeric part, so `Q#2 < Q#10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct QuestionId(u32);

impl QuestionId {
    pub fn new(number: u32) -> Self {
        QuestionId(number)
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    /// Build an id from the digit capture of a heading pattern.
    pub fn from_digits(digits: &str) -> Option<QuestionId> {
        digits.trim().parse().ok().map(QuestionId)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{QUESTION_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for QuestionId {
    type Err = String;

    /// Accepts `Q#12`, `Q-12` and `Q 12` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let rest = trimmed
            .strip_prefix('Q')
            .or_else(|| trimmed.strip_prefix('q'))
            .ok_or_else(|| format!("question id '{s}' must start with 'Q'"))?;
        let digits = rest.trim_start_matches(|c: char| c == '#' || c == '-' || c.is_whitespace());
        QuestionId::from_digits(digits).ok_or_else(|| format!("invalid question id '{s}'"))
    }
}

impl From<QuestionId> for String {
    fn from(id: QuestionId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for QuestionId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A recognised question heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// The full heading line, used as the row label in the report.
    pub text: String,
}

/// Display text per question, ordered by question number.
///
/// Re-recognising an id overwrites its text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBook(BTreeMap<QuestionId, String>);

impl QuestionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a question. Returns true if the id had been seen before.
    pub fn record(&mut self, question: &Question) -> bool {
        self.0
            .insert(question.id, question.text.clone())
            .is_some()
    }

    pub fn text(&self, id: QuestionId) -> Option<&str> {
        self.0.get(&id).map(|s| s.as_str())
    }

    /// Display label for a question, falling back to its canonical id.
    pub fn label(&self, id: QuestionId) -> String {
        self.text(id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How values are read out of a data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    Percentage,
    Ranking,
}

impl fmt::Display for ValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMode::Percentage => write!(f, "percentage"),
            ValueMode::Ranking => write!(f, "ranking"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_id_display() {
        assert_eq!(QuestionId::new(7).to_string(), "Q#7");
    }

    #[test]
    fn test_question_id_parse_variants() {
        assert_eq!("Q#12".parse::<QuestionId>().unwrap(), QuestionId::new(12));
        assert_eq!("Q-12".parse::<QuestionId>().unwrap(), QuestionId::new(12));
        assert_eq!("q 3".parse::<QuestionId>().unwrap(), QuestionId::new(3));
        assert!("12".parse::<QuestionId>().is_err());
        assert!("Q#".parse::<QuestionId>().is_err());
    }

    #[test]
    fn test_question_id_orders_numerically() {
        let mut ids = vec![QuestionId::new(10), QuestionId::new(2), QuestionId::new(1)];
        ids.sort();
        assert_eq!(ids, vec![QuestionId::new(1), QuestionId::new(2), QuestionId::new(10)]);
    }

    #[test]
    fn test_question_book_last_text_wins() {
        let mut book = QuestionBook::new();
        let id = QuestionId::new(1);
        assert!(!book.record(&Question {
            id,
            text: "Q#1 Punctuality".into(),
        }));
        assert!(book.record(&Question {
            id,
            text: "Q#1 Punctuality (repeat)".into(),
        }));
        assert_eq!(book.text(id), Some("Q#1 Punctuality (repeat)"));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_question_id_serializes_as_string() {
        let json = serde_json::to_string(&QuestionId::new(4)).unwrap();
        assert_eq!(json, "\"Q#4\"");
        let back: QuestionId = serde_json::from_str("\"Q-4\"").unwrap();
        assert_eq!(back, QuestionId::new(4));
    }
}
