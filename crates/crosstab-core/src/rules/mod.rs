pub mod builtin;
pub mod schema;

use crate::error::CrosstabError;
use crate::model::QuestionId;
use regex::Regex;
use schema::RuleSetDef;
use std::path::Path;

/// Highest supported `percentage_precision`.
pub const MAX_PRECISION: u32 = 4;

/// Load a ruleset from a JSON file.
pub fn load_ruleset(path: &Path) -> Result<RuleSetDef, CrosstabError> {
    let content = std::fs::read_to_string(path).map_err(|e| CrosstabError::RulesetLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_ruleset(&content, path)
}

/// Parse a ruleset from a JSON string.
pub fn parse_ruleset(json: &str, source: &Path) -> Result<RuleSetDef, CrosstabError> {
    let ruleset: RuleSetDef =
        serde_json::from_str(json).map_err(|e| CrosstabError::RulesetLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_ruleset(&ruleset)?;
    Ok(ruleset)
}

/// Validate that a ruleset is well-formed.
pub fn validate_ruleset(ruleset: &RuleSetDef) -> Result<(), CrosstabError> {
    if ruleset.name.trim().is_empty() {
        return Err(CrosstabError::RulesetInvalid("name must not be empty".into()));
    }

    compile_pattern("question.heading_pattern", &ruleset.question.heading_pattern, 1)?;
    compile_pattern("question.embedded_pattern", &ruleset.question.embedded_pattern, 1)?;

    if ruleset.campus_rules.is_empty() {
        return Err(CrosstabError::RulesetInvalid(
            "campus_rules must not be empty".into(),
        ));
    }

    for rule in &ruleset.campus_rules {
        if rule.group == 0 {
            return Err(CrosstabError::RulesetInvalid(format!(
                "campus rule '{}' must capture a group other than 0",
                rule.name
            )));
        }
        compile_pattern(&format!("campus rule '{}'", rule.name), &rule.pattern, rule.group)?;
    }

    if ruleset.fallback_campus.trim().is_empty() {
        return Err(CrosstabError::RulesetInvalid(
            "fallback_campus must not be empty".into(),
        ));
    }

    if let Some(ref id) = ruleset.ranking_question {
        id.parse::<QuestionId>().map_err(|e| {
            CrosstabError::RulesetInvalid(format!("ranking_question: {e}"))
        })?;
    }

    if ruleset.percentage_precision > MAX_PRECISION {
        return Err(CrosstabError::RulesetInvalid(format!(
            "percentage_precision {} exceeds the maximum of {}",
            ruleset.percentage_precision, MAX_PRECISION
        )));
    }

    Ok(())
}

/// Compile `pattern` and make sure capture `group` exists.
pub(crate) fn compile_pattern(
    label: &str,
    pattern: &str,
    group: usize,
) -> Result<Regex, CrosstabError> {
    let re = Regex::new(pattern)
        .map_err(|e| CrosstabError::RulesetInvalid(format!("{label}: invalid pattern: {e}")))?;
    if re.captures_len() <= group {
        return Err(CrosstabError::RulesetInvalid(format!(
            "{label}: pattern has no capture group {group}"
        )));
    }
    Ok(re)
}
