use crate::error::CrosstabError;
use crate::rules::schema::RuleSetDef;
use crate::rules::validate_ruleset;

const DEFAULT_JSON: &str = include_str!("../../../../rules/default.json");

/// Available predefined rulesets.
pub const PRESETS: &[&str] = &["default"];

/// Load a predefined ruleset by name.
pub fn load_preset(name: &str) -> Result<RuleSetDef, CrosstabError> {
    match name {
        "default" => {
            let ruleset: RuleSetDef = serde_json::from_str(DEFAULT_JSON)?;
            validate_ruleset(&ruleset)?;
            Ok(ruleset)
        }
        _ => Err(CrosstabError::RulesetInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

/// The ruleset used when no custom rule file is given.
pub fn default_ruleset() -> Result<RuleSetDef, CrosstabError> {
    load_preset("default")
}
