use serde::{Deserialize, Serialize};

/// Heuristics and constants that drive extraction for one survey export style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub question: QuestionRuleDef,
    /// Tried in order; the first matching rule names the campus.
    pub campus_rules: Vec<CampusRuleDef>,
    /// Campus used for values seen before any campus heading.
    pub fallback_campus: String,
    #[serde(default)]
    pub sentinels: SentinelDef,
    /// Header shapes (lower-cased cell texts) that never hold teacher data.
    #[serde(default)]
    pub non_data_headers: Vec<Vec<String>>,
    /// Lower-case keywords marking leading paragraphs as banner text.
    #[serde(default)]
    pub banner_keywords: Vec<String>,
    /// Question treated as the ranking question on the text path, e.g. "Q#12".
    #[serde(default)]
    pub ranking_question: Option<String>,
    #[serde(default = "default_precision")]
    pub percentage_precision: u32,
}

fn default_precision() -> u32 {
    1
}

/// Question heading patterns. Capture group 1 holds the question number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRuleDef {
    /// Anchored pattern for document headings.
    pub heading_pattern: String,
    /// Unanchored pattern for extracted text lines.
    pub embedded_pattern: String,
}

/// One row of the campus rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampusRuleDef {
    pub name: String,
    pub pattern: String,
    /// Capture group holding the raw campus name.
    #[serde(default = "default_group")]
    pub group: usize,
    #[serde(default)]
    pub steps: Vec<PostStep>,
}

fn default_group() -> usize {
    1
}

/// Clean-up applied to a captured campus name, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStep {
    Trim,
    /// Drop a trailing "- Boys" / "- Girls" / "- Co-ed" / "- Campus".
    StripSectionSuffix,
    /// Drop a leading "IG-I" / "IG-II" / "IG-III" / "Grade <n>".
    StripLevelPrefix,
    CollapseSpaces,
    TitleCase,
}

/// Names excluded from table-path aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelDef {
    /// Excluded when the name contains the phrase (case-insensitive).
    #[serde(default)]
    pub contains: Vec<String>,
    /// Excluded when the whole name equals the phrase (case-insensitive).
    #[serde(default)]
    pub exact: Vec<String>,
}
