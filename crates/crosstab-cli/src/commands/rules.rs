use crosstab_core::error::CrosstabError;
use crosstab_core::rules::builtin;
use crosstab_core::rules::schema::RuleSetDef;
use std::path::Path;

pub fn list() -> Result<(), CrosstabError> {
    println!("Available predefined rulesets:\n");
    for name in builtin::PRESETS {
        let rs = builtin::load_preset(name)?;
        println!("  {:<8} {} (v{})", name, rs.name, rs.version);
        if let Some(ref desc) = rs.description {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), CrosstabError> {
    let rs = builtin::load_preset(preset)?;
    println!("{}", serde_json::to_string_pretty(&rs)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), CrosstabError> {
    let rs = crosstab_core::rules::load_ruleset(file)?;

    println!("Ruleset '{}' (v{}) is valid.", rs.name, rs.version);
    println!("  Question heading: {}", rs.question.heading_pattern);
    let names: Vec<&str> = rs.campus_rules.iter().map(|r| r.name.as_str()).collect();
    println!("  Campus rules: {}", names.join(", "));
    println!("  Fallback campus: {}", rs.fallback_campus);
    if let Some(ref q) = rs.ranking_question {
        println!("  Ranking question: {q}");
    }

    let warnings = lint(&rs);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

/// Legal but probably unintended settings.
fn lint(rs: &RuleSetDef) -> Vec<String> {
    let mut warnings = Vec::new();
    if rs.sentinels.contains.is_empty() && rs.sentinels.exact.is_empty() {
        warnings.push("no sentinel names: \"none of the above\" rows will be aggregated".into());
    }
    if rs.banner_keywords.is_empty() {
        warnings.push("no banner keywords: reports will have no banner text".into());
    }
    for rule in &rs.campus_rules {
        if rule.steps.is_empty() {
            warnings.push(format!(
                "campus rule '{}' has no post-processing steps; names keep their raw casing",
                rule.name
            ));
        }
    }
    warnings
}
