use crosstab_core::report::ReportTable;
use crosstab_core::Conversion;

pub fn format_conversion(conversion: &Conversion) -> String {
    let report = conversion.to_report();
    let mut out = String::new();

    for line in &report.banner {
        out.push_str(line);
        out.push('\n');
    }
    if !report.banner.is_empty() {
        out.push('\n');
    }

    let campuses: Vec<&str> = conversion.campuses.iter().map(|c| c.as_str()).collect();
    out.push_str(&format!(
        "Questions: {}  Campuses: {}  Teachers: {}\n\n",
        conversion.questions.len(),
        campuses.join(", "),
        conversion.store.len()
    ));

    for section in &report.sections {
        out.push_str(&format!("=== {} ===\n\n", section.heading));
        format_table(&section.table, &mut out);
        out.push('\n');
    }

    let diagnostics = &conversion.diagnostics;
    if !diagnostics.warnings.is_empty() {
        out.push_str("Warnings:\n");
        for w in &diagnostics.warnings {
            out.push_str(&format!("  - {}\n", w.message));
        }
    }
    if !diagnostics.skipped_lines.is_empty() {
        out.push_str(&format!(
            "\n{} line(s) skipped during parsing\n",
            diagnostics.skipped_lines.len()
        ));
    }

    out
}

fn format_table(table: &ReportTable, out: &mut String) {
    let columns = table.header.len();
    let mut widths: Vec<usize> = table.header.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = cells.get(i).map(|c| c.as_str()).unwrap_or("");
                format!("{:<width$}", cell, width = width)
            })
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    out.push_str(&line(&table.header));
    let total: usize = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
    out.push_str(&format!("  {}\n", "-".repeat(total)));
    for row in &table.rows {
        out.push_str(&line(row));
    }
}
