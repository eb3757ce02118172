use crosstab_core::error::CrosstabError;
use crosstab_core::extraction::pdftotext::PdftotextExtractor;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    rules_file: Option<PathBuf>,
) -> Result<(), CrosstabError> {
    let rules = super::load_rules(rules_file.as_deref())?;
    let extractor = PdftotextExtractor::new();
    let conversion = crosstab_core::convert_path(&input_file, &extractor, &rules)?;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            std::fs::write(&path, output::json::render(&conversion)?)?;
            eprintln!(
                "Parsed {} teacher(s) across {} question(s), written to {}",
                conversion.store.len(),
                conversion.questions.len(),
                path.display()
            );
            super::print_diagnostics(&conversion.diagnostics);
        }
        None => {
            let output_str = match output_format {
                "json" => output::json::render(&conversion)?,
                _ => output::table::format_conversion(&conversion),
            };
            println!("{output_str}");
        }
    }

    Ok(())
}
