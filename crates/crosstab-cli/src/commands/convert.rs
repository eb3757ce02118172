use crosstab_core::error::CrosstabError;
use crosstab_core::extraction::pdftotext::PdftotextExtractor;
use crosstab_core::report::{self, docx::write_docx};
use std::path::PathBuf;

pub fn run(
    input_file: PathBuf,
    out: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    rules_file: Option<PathBuf>,
    banner_image: Option<PathBuf>,
) -> Result<(), CrosstabError> {
    let rules = super::load_rules(rules_file.as_deref())?;
    let extractor = PdftotextExtractor::new();
    let mut conversion = crosstab_core::convert_path(&input_file, &extractor, &rules)?;

    let image = banner_image
        .as_deref()
        .and_then(|path| report::load_banner_image(path, &mut conversion.diagnostics));
    let report = conversion.to_report();
    let bytes = write_docx(&report, image.as_ref())?;

    let path = match out {
        Some(path) => path,
        None => {
            let dir = out_dir.unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&dir)?;
            let stem = input_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "report".into());
            report::unique_output_path(&dir, &format!("{stem}-crosstab"))
        }
    };
    std::fs::write(&path, bytes)?;

    tracing::info!(
        teachers = conversion.store.len(),
        questions = conversion.questions.len(),
        sections = report.sections.len(),
        output = %path.display(),
        "wrote report"
    );
    super::print_diagnostics(&conversion.diagnostics);
    println!("{}", path.display());

    Ok(())
}
