use crate::model::ValueMode;
use crate::rules::schema::{PostStep, SentinelDef};
use regex::Regex;
use std::sync::LazyLock;

static SECTION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*-\s*(?:boys|girls|co-?ed|campus)\b.*$").expect("static regex")
});

static LEVEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:IG\s*-\s*(?:III|II|I)\b|Grade\s*\d+\b)[\s:-]*").expect("static regex")
});

/// Collapse every run of whitespace into a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prepare a heading line for pattern matching: unify dashes, collapse spaces.
pub fn normalize_heading(s: &str) -> String {
    let unified: String = s
        .chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '\u{a0}' => ' ',
            _ => c,
        })
        .collect();
    collapse_whitespace(&unified)
}

/// Grouping key for a person name: whitespace-collapsed and case-folded.
pub fn name_key(raw: &str) -> String {
    collapse_whitespace(raw).to_lowercase()
}

/// Display form of a person name: the original casing, whitespace-collapsed.
pub fn display_name(raw: &str) -> String {
    collapse_whitespace(raw)
}

/// Capitalize the first letter of every word and lower-case the rest.
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn strip_section_suffix(s: &str) -> String {
    SECTION_SUFFIX.replace(s, "").into_owned()
}

pub fn strip_level_prefix(s: &str) -> String {
    LEVEL_PREFIX.replace(s, "").into_owned()
}

/// Run a captured campus name through a rule's post-processing steps.
pub fn apply_steps(raw: &str, steps: &[PostStep]) -> String {
    steps.iter().fold(raw.to_string(), |acc, step| match step {
        PostStep::Trim => acc.trim().to_string(),
        PostStep::StripSectionSuffix => strip_section_suffix(&acc),
        PostStep::StripLevelPrefix => strip_level_prefix(&acc),
        PostStep::CollapseSpaces => collapse_whitespace(&acc),
        PostStep::TitleCase => title_case(&acc),
    })
}

/// Convert raw cell text into the stored value for `mode`.
///
/// A trailing `%` is stripped first. Percentage values get it back unless
/// they are empty, in which case there is nothing to store. Ranking values
/// are kept verbatim (after trimming).
pub fn normalize_value(raw: &str, mode: ValueMode) -> Option<String> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    match mode {
        ValueMode::Percentage if stripped.is_empty() => None,
        ValueMode::Percentage => Some(format!("{stripped}%")),
        ValueMode::Ranking => Some(stripped.to_string()),
    }
}

/// Names that stand for "no teacher" and are never aggregated.
#[derive(Debug, Clone, Default)]
pub struct Sentinels {
    contains: Vec<String>,
    exact: Vec<String>,
}

impl Sentinels {
    pub fn new(def: &SentinelDef) -> Self {
        Sentinels {
            contains: def.contains.iter().map(|s| s.to_lowercase()).collect(),
            exact: def.exact.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    pub fn is_sentinel(&self, name: &str) -> bool {
        let key = name_key(name);
        self.contains.iter().any(|p| key.contains(p.as_str()))
            || self.exact.iter().any(|p| key == *p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Mr   A \t B "), "Mr A B");
    }

    #[test]
    fn test_normalize_heading_unifies_dashes() {
        assert_eq!(normalize_heading("IG-I  Mars \u{2013} Boys"), "IG-I Mars - Boys");
    }

    #[test]
    fn test_name_key_and_display() {
        assert_eq!(name_key("  Ms  SARA Khan "), "ms sara khan");
        assert_eq!(display_name("  Ms  SARA Khan "), "Ms SARA Khan");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("north NAZIMABAD"), "North Nazimabad");
        assert_eq!(title_case("mars"), "Mars");
    }

    #[test]
    fn test_strip_section_suffix() {
        assert_eq!(strip_section_suffix("Mars - Boys"), "Mars");
        assert_eq!(strip_section_suffix("Mars-Co-ed"), "Mars");
        assert_eq!(strip_section_suffix("Mars - Campus 2"), "Mars");
        assert_eq!(strip_section_suffix("Mars"), "Mars");
    }

    #[test]
    fn test_strip_level_prefix() {
        assert_eq!(strip_level_prefix("IG-II Mars"), "Mars");
        assert_eq!(strip_level_prefix("Grade 9 - Venus"), "Venus");
        assert_eq!(strip_level_prefix("Mars"), "Mars");
    }

    #[test]
    fn test_apply_steps_in_order() {
        let steps = [
            PostStep::StripSectionSuffix,
            PostStep::Trim,
            PostStep::CollapseSpaces,
            PostStep::TitleCase,
        ];
        assert_eq!(apply_steps("  gulshan   campus  - Girls", &steps), "Gulshan Campus");
    }

    #[test]
    fn test_normalize_percentage() {
        assert_eq!(normalize_value("40", ValueMode::Percentage).as_deref(), Some("40%"));
        assert_eq!(normalize_value(" 40% ", ValueMode::Percentage).as_deref(), Some("40%"));
        assert_eq!(normalize_value("%", ValueMode::Percentage), None);
        assert_eq!(normalize_value("", ValueMode::Percentage), None);
    }

    #[test]
    fn test_normalize_ranking_verbatim() {
        assert_eq!(normalize_value("3", ValueMode::Ranking).as_deref(), Some("3"));
        assert_eq!(normalize_value("2nd", ValueMode::Ranking).as_deref(), Some("2nd"));
        assert_eq!(normalize_value("5%", ValueMode::Ranking).as_deref(), Some("5"));
    }

    #[test]
    fn test_sentinels() {
        let s = Sentinels::new(&SentinelDef {
            contains: vec!["none of the above".into()],
            exact: vec!["none".into()],
        });
        assert!(s.is_sentinel("None of the above"));
        assert!(s.is_sentinel("  NONE  "));
        assert!(s.is_sentinel("(None of the Above)"));
        assert!(!s.is_sentinel("Mr Nonewood"));
        assert!(!s.is_sentinel("Mr A"));
    }
}
