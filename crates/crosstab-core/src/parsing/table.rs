use crate::diagnostics::Rejection;
use crate::extraction::Table;
use crate::model::ValueMode;
use crate::parsing::normalize::{normalize_value, Sentinels};
use crate::rules::schema::RuleSetDef;

/// Resolved layout of a data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub name_column: usize,
    pub value_column: usize,
    pub mode: ValueMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableClass {
    Accepted(TableLayout),
    Rejected(Rejection),
}

/// One (name, value) pair read from a data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    pub value: String,
}

/// Decides whether a table holds teacher data and reads it out.
#[derive(Debug, Clone)]
pub struct TableClassifier {
    non_data_headers: Vec<Vec<String>>,
    sentinels: Sentinels,
}

impl TableClassifier {
    pub fn from_rules(rules: &RuleSetDef) -> Self {
        TableClassifier {
            non_data_headers: rules
                .non_data_headers
                .iter()
                .map(|h| h.iter().map(|c| c.trim().to_lowercase()).collect())
                .collect(),
            sentinels: Sentinels::new(&rules.sentinels),
        }
    }

    /// Inspect the header row. The last column mentioning "name"/"teacher"
    /// holds names; a "ranking" column beats a "percentage" column.
    pub fn classify(&self, table: &Table) -> TableClass {
        let Some(header) = table.header() else {
            return TableClass::Rejected(Rejection::Empty);
        };
        let lowered: Vec<String> = header.iter().map(|c| c.trim().to_lowercase()).collect();

        if self.non_data_headers.iter().any(|shape| *shape == lowered) {
            return TableClass::Rejected(Rejection::NonDataHeader);
        }

        let mut name_column = None;
        let mut percentage_column = None;
        let mut ranking_column = None;
        for (i, cell) in lowered.iter().enumerate() {
            if cell.contains("name") || cell.contains("teacher") {
                name_column = Some(i);
            }
            if cell.contains("percentage") {
                percentage_column = Some(i);
            }
            if cell.contains("ranking") {
                ranking_column = Some(i);
            }
        }

        let (value_column, mode) = match (ranking_column, percentage_column) {
            (Some(col), _) => (col, ValueMode::Ranking),
            (None, Some(col)) => (col, ValueMode::Percentage),
            (None, None) => return TableClass::Rejected(Rejection::MissingValueColumn),
        };
        let Some(name_column) = name_column else {
            return TableClass::Rejected(Rejection::MissingNameColumn);
        };

        TableClass::Accepted(TableLayout {
            name_column,
            value_column,
            mode,
        })
    }

    /// Read the data rows of an accepted table. Empty names, sentinel names
    /// and empty percentages are skipped.
    pub fn extract(&self, table: &Table, layout: &TableLayout) -> Vec<TableEntry> {
        table
            .data_rows()
            .iter()
            .filter_map(|row| {
                let name = row.get(layout.name_column).map(|s| s.trim()).unwrap_or("");
                if name.is_empty() || self.sentinels.is_sentinel(name) {
                    return None;
                }
                let raw = row.get(layout.value_column).map(|s| s.as_str()).unwrap_or("");
                let value = normalize_value(raw, layout.mode)?;
                Some(TableEntry {
                    name: name.to_string(),
                    value,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::default_ruleset;

    fn classifier() -> TableClassifier {
        TableClassifier::from_rules(&default_ruleset().unwrap())
    }

    fn table(rows: &[&[&str]]) -> Table {
        Table::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_percentage_table() {
        let t = table(&[&["Name", "Percentage"], &["Mr A", "40"], &["None of the above", "10"]]);
        let c = classifier();
        let TableClass::Accepted(layout) = c.classify(&t) else {
            panic!("expected accepted table");
        };
        assert_eq!(layout.mode, ValueMode::Percentage);
        assert_eq!(
            c.extract(&t, &layout),
            vec![TableEntry {
                name: "Mr A".into(),
                value: "40%".into()
            }]
        );
    }

    #[test]
    fn test_ranking_table_beats_percentage() {
        let t = table(&[&["Teacher Name", "Percentage", "Ranking"], &["Ms B", "20%", "2"]]);
        let c = classifier();
        let TableClass::Accepted(layout) = c.classify(&t) else {
            panic!("expected accepted table");
        };
        assert_eq!(layout.mode, ValueMode::Ranking);
        assert_eq!(layout.value_column, 2);
        assert_eq!(c.extract(&t, &layout)[0].value, "2");
    }

    #[test]
    fn test_last_matching_column_wins() {
        let t = table(&[&["Name", "Teacher", "Count", "Percentage"], &["x", "Mr C", "4", "12%"]]);
        let TableClass::Accepted(layout) = classifier().classify(&t) else {
            panic!("expected accepted table");
        };
        assert_eq!(layout.name_column, 1);
        assert_eq!(layout.value_column, 3);
    }

    #[test]
    fn test_id_responses_always_rejected() {
        let t = table(&[&["ID", "Responses"], &["Name", "Percentage"]]);
        assert_eq!(
            classifier().classify(&t),
            TableClass::Rejected(Rejection::NonDataHeader)
        );
    }

    #[test]
    fn test_missing_columns_rejected() {
        let c = classifier();
        assert_eq!(
            c.classify(&table(&[&["Name", "Count"]])),
            TableClass::Rejected(Rejection::MissingValueColumn)
        );
        assert_eq!(
            c.classify(&table(&[&["Option", "Percentage"]])),
            TableClass::Rejected(Rejection::MissingNameColumn)
        );
        assert_eq!(c.classify(&Table::default()), TableClass::Rejected(Rejection::Empty));
    }

    #[test]
    fn test_extract_skips_blank_names_and_empty_percentages() {
        let t = table(&[&["Name", "Percentage"], &["", "5"], &["Mr D", ""], &["None", "3"], &["Mr E"]]);
        let c = classifier();
        let TableClass::Accepted(layout) = c.classify(&t) else {
            panic!("expected accepted table");
        };
        assert!(c.extract(&t, &layout).is_empty());
    }
}
