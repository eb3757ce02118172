use crate::error::CrosstabError;
use crate::model::{Question, QuestionId};
use crate::parsing::normalize::{apply_steps, normalize_heading};
use crate::rules::compile_pattern;
use crate::rules::schema::{PostStep, RuleSetDef};
use regex::Regex;

/// What a heading line declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heading {
    Campus(String),
    Question(Question),
}

#[derive(Debug, Clone)]
struct CampusRule {
    name: String,
    pattern: Regex,
    group: usize,
    steps: Vec<PostStep>,
}

/// Recognises campus and question headings using a ruleset's pattern table.
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    question: Regex,
    embedded_question: Regex,
    campus_rules: Vec<CampusRule>,
}

impl HeadingClassifier {
    pub fn from_rules(rules: &RuleSetDef) -> Result<Self, CrosstabError> {
        let question = compile_pattern(
            "question.heading_pattern",
            &rules.question.heading_pattern,
            1,
        )?;
        let embedded_question = compile_pattern(
            "question.embedded_pattern",
            &rules.question.embedded_pattern,
            1,
        )?;
        let campus_rules = rules
            .campus_rules
            .iter()
            .map(|def| {
                Ok(CampusRule {
                    name: def.name.clone(),
                    pattern: compile_pattern(&def.name, &def.pattern, def.group)?,
                    group: def.group,
                    steps: def.steps.clone(),
                })
            })
            .collect::<Result<Vec<_>, CrosstabError>>()?;

        Ok(HeadingClassifier {
            question,
            embedded_question,
            campus_rules,
        })
    }

    /// Classify a heading line. Question headings take precedence, since their
    /// pattern is anchored on the `Q#` marker.
    pub fn classify(&self, line: &str) -> Option<Heading> {
        let normalized = normalize_heading(line);
        if normalized.is_empty() {
            return None;
        }
        if let Some(question) = self.question(line) {
            return Some(Heading::Question(question));
        }
        self.campus(&normalized).map(Heading::Campus)
    }

    /// Match a question heading at the start of the line. The whole original
    /// line (trimmed) becomes the question text.
    pub fn question(&self, line: &str) -> Option<Question> {
        let normalized = normalize_heading(line);
        let caps = self.question.captures(&normalized)?;
        let id = QuestionId::from_digits(caps.get(1)?.as_str())?;
        Some(Question {
            id,
            text: line.trim().to_string(),
        })
    }

    /// Match a question marker anywhere in the line (text path).
    pub fn embedded_question(&self, line: &str) -> Option<Question> {
        let caps = self.embedded_question.captures(line)?;
        let id = QuestionId::from_digits(caps.get(1)?.as_str())?;
        Some(Question {
            id,
            text: line.trim().to_string(),
        })
    }

    /// First campus rule that matches wins.
    pub fn campus(&self, normalized: &str) -> Option<String> {
        self.campus_rules.iter().find_map(|rule| {
            let raw = rule.pattern.captures(normalized)?.get(rule.group)?.as_str();
            let name = apply_steps(raw, &rule.steps);
            if name.is_empty() {
                None
            } else {
                tracing::debug!(rule = %rule.name, campus = %name, "campus heading");
                Some(name)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::default_ruleset;

    fn classifier() -> HeadingClassifier {
        HeadingClassifier::from_rules(&default_ruleset().unwrap()).unwrap()
    }

    #[test]
    fn test_ig_campus_with_suffix() {
        assert_eq!(
            classifier().classify("IG-I Mars - Boys"),
            Some(Heading::Campus("Mars".into()))
        );
    }

    #[test]
    fn test_ig_levels_and_en_dash() {
        let c = classifier();
        assert_eq!(
            c.classify("IG-III  north   nazimabad \u{2013} Girls"),
            Some(Heading::Campus("North Nazimabad".into()))
        );
        assert_eq!(
            c.classify("IG-II Venus"),
            Some(Heading::Campus("Venus".into()))
        );
    }

    #[test]
    fn test_grade_campus() {
        assert_eq!(
            classifier().classify("Grade 9 Jupiter - Co-ed"),
            Some(Heading::Campus("Jupiter".into()))
        );
    }

    #[test]
    fn test_dash_section_campus() {
        assert_eq!(
            classifier().classify("Saturn Campus - Girls"),
            Some(Heading::Campus("Saturn Campus".into()))
        );
    }

    #[test]
    fn test_question_keeps_full_line() {
        let heading = classifier().classify("Q#3 - The teacher explains clearly");
        let Some(Heading::Question(q)) = heading else {
            panic!("expected question, got {heading:?}");
        };
        assert_eq!(q.id, QuestionId::new(3));
        assert_eq!(q.text, "Q#3 - The teacher explains clearly");
    }

    #[test]
    fn test_question_dash_form_is_canonicalised() {
        let q = classifier().question("Q-12: Homework feedback").unwrap();
        assert_eq!(q.id.to_string(), "Q#12");
    }

    #[test]
    fn test_question_not_mid_line_for_headings() {
        let c = classifier();
        assert!(c.question("See Q#4 below").is_none());
        assert_eq!(
            c.embedded_question("Page 2 Q#4 Punctuality").map(|q| q.id),
            Some(QuestionId::new(4))
        );
    }

    #[test]
    fn test_plain_text_is_ignored() {
        let c = classifier();
        assert_eq!(c.classify("Learner feedback summary"), None);
        assert_eq!(c.classify("   "), None);
    }
}
