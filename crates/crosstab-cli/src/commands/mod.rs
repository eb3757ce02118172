pub mod convert;
pub mod parse;
pub mod rules;

use crosstab_core::diagnostics::Diagnostics;
use crosstab_core::error::CrosstabError;
use crosstab_core::rules::builtin;
use crosstab_core::rules::schema::RuleSetDef;
use std::path::Path;

/// A custom rule file when given, otherwise the built-in preset.
fn load_rules(file: Option<&Path>) -> Result<RuleSetDef, CrosstabError> {
    match file {
        Some(path) => crosstab_core::rules::load_ruleset(path),
        None => builtin::default_ruleset(),
    }
}

/// Each warning is already logged when recorded, so only counts are printed.
fn print_diagnostics(diagnostics: &Diagnostics) {
    for line in diagnostics_summary(diagnostics) {
        eprintln!("  {line}");
    }
}

fn diagnostics_summary(diagnostics: &Diagnostics) -> Vec<String> {
    let mut lines = Vec::new();
    if !diagnostics.warnings.is_empty() {
        lines.push(format!("{} warning(s)", diagnostics.warnings.len()));
    }
    if !diagnostics.rejected_tables.is_empty() {
        lines.push(format!(
            "{} table(s) skipped as non-data tables",
            diagnostics.rejected_tables.len()
        ));
    }
    if !diagnostics.skipped_lines.is_empty() {
        lines.push(format!(
            "{} line(s) skipped during parsing",
            diagnostics.skipped_lines.len()
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosstab_core::diagnostics::{SkippedLine, WarningKind};

    #[test]
    fn test_summary_counts_without_repeating_messages() {
        let mut d = Diagnostics::default();
        d.warn(WarningKind::DroppedLines, None, "2 line(s) dropped".into());
        d.warn(WarningKind::UnconsumedTables, None, "1 table(s) left".into());
        d.skipped_lines.push(SkippedLine {
            page_number: 1,
            line_text: "junk".into(),
            reason: "before first question heading".into(),
        });
        let lines = diagnostics_summary(&d);
        assert_eq!(lines, vec!["2 warning(s)", "1 line(s) skipped during parsing"]);
        assert!(lines.iter().all(|l| !l.contains("dropped")));
    }

    #[test]
    fn test_clean_run_prints_nothing() {
        assert!(diagnostics_summary(&Diagnostics::default()).is_empty());
    }
}
