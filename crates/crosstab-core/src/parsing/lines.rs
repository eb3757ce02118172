use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::aggregate::AggregationStore;
use crate::diagnostics::{Diagnostics, SkippedLine, WarningKind};
use crate::error::CrosstabError;
use crate::extraction::PageContent;
use crate::model::{Question, QuestionBook, QuestionId};
use crate::parsing::banner::BannerCollector;
use crate::parsing::headings::HeadingClassifier;
use crate::parsing::normalize::collapse_whitespace;
use crate::rules::schema::RuleSetDef;

static RANK_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(.+)$").expect("static regex"));

static COUNT_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+(\d+)$").expect("static regex"));

static RANK_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\brank(?:s|ed|ing|ings)?\b").expect("static regex")
});

/// Name prefix that always sorts last in a percentage tally.
const NONE_OF_THE_ABOVE: &str = "none of the above";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyRow {
    pub name: String,
    pub count: u64,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankRow {
    pub rank: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tally {
    Percentage { total: u64, rows: Vec<TallyRow> },
    Ranking { rows: Vec<RankRow> },
}

/// Computed result for one question on the text path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionTally {
    pub question: Question,
    pub tally: Tally,
}

impl QuestionTally {
    pub fn is_ranking(&self) -> bool {
        matches!(self.tally, Tally::Ranking { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineParseOutput {
    /// Ascending by question number; questions without entries are left out.
    pub tallies: Vec<QuestionTally>,
    pub questions: QuestionBook,
    pub banner: Vec<String>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug)]
struct Pending {
    question: Question,
    ranking: bool,
    counts: Vec<(String, u64)>,
    ranks: Vec<RankRow>,
}

/// Classifies flat text lines into question headings and entries, then
/// computes per-question percentages itself.
#[derive(Debug, Clone)]
pub struct LineParser {
    headings: HeadingClassifier,
    ranking_question: Option<QuestionId>,
    precision: u32,
    banner_keywords: Vec<String>,
}

impl LineParser {
    pub fn from_rules(rules: &RuleSetDef) -> Result<Self, CrosstabError> {
        let ranking_question = rules
            .ranking_question
            .as_deref()
            .map(|id| id.parse::<QuestionId>())
            .transpose()
            .map_err(CrosstabError::RulesetInvalid)?;
        Ok(LineParser {
            headings: HeadingClassifier::from_rules(rules)?,
            ranking_question,
            precision: rules.percentage_precision,
            banner_keywords: rules.banner_keywords.clone(),
        })
    }

    fn is_ranking(&self, question: &Question) -> bool {
        self.ranking_question == Some(question.id)
            || RANK_WORD.is_match(&question.text)
    }

    pub fn parse(&self, pages: &[PageContent]) -> LineParseOutput {
        let mut out = LineParseOutput::default();
        let mut pending: BTreeMap<QuestionId, Pending> = BTreeMap::new();
        let mut current: Option<QuestionId> = None;
        let mut banner = BannerCollector::new(&self.banner_keywords);

        for page in pages {
            for raw in &page.lines {
                let line = collapse_whitespace(raw);
                if line.is_empty() {
                    continue;
                }

                let heading = self.headings.embedded_question(&line);
                banner.offer(&line, heading.is_some());

                if let Some(question) = heading {
                    out.questions.record(&question);
                    let ranking = self.is_ranking(&question);
                    let id = question.id;
                    let entry = pending.entry(id).or_insert_with(|| Pending {
                        question: question.clone(),
                        ranking,
                        counts: Vec::new(),
                        ranks: Vec::new(),
                    });
                    entry.question = question;
                    entry.ranking |= ranking;
                    current = Some(id);
                    continue;
                }

                let Some(entry) = current.and_then(|id| pending.get_mut(&id)) else {
                    skip(
                        &mut out.diagnostics,
                        page.page_number,
                        line,
                        "before first question heading",
                    );
                    continue;
                };

                if entry.ranking {
                    let row = RANK_ENTRY.captures(&line).map(|caps| RankRow {
                        rank: caps[1].to_string(),
                        name: caps[2].trim().to_string(),
                    });
                    match row {
                        Some(row) => entry.ranks.push(row),
                        None => skip(
                            &mut out.diagnostics,
                            page.page_number,
                            line,
                            "not a '<rank> <name>' entry",
                        ),
                    }
                    continue;
                }

                let parsed = COUNT_ENTRY.captures(&line).and_then(|caps| {
                    let count = caps[2].parse::<u64>().ok()?;
                    Some((caps[1].trim().to_string(), count))
                });
                match parsed {
                    Some(pair) => entry.counts.push(pair),
                    None => skip(
                        &mut out.diagnostics,
                        page.page_number,
                        line,
                        "not a '<name> <count>' entry",
                    ),
                }
            }
        }

        out.banner = banner.into_lines();
        out.tallies = pending
            .into_values()
            .filter_map(|p| self.finish(p))
            .collect();

        if !out.diagnostics.skipped_lines.is_empty() {
            let dropped = out.diagnostics.skipped_lines.len();
            out.diagnostics.warn(
                WarningKind::DroppedLines,
                None,
                format!("{dropped} line(s) matched neither a question heading nor an entry"),
            );
        }

        tracing::info!(
            questions = out.questions.len(),
            tallies = out.tallies.len(),
            "parsed text lines"
        );
        out
    }

    fn finish(&self, pending: Pending) -> Option<QuestionTally> {
        let tally = if pending.ranking {
            if pending.ranks.is_empty() {
                return None;
            }
            Tally::Ranking {
                rows: pending.ranks,
            }
        } else {
            if pending.counts.is_empty() {
                return None;
            }
            tally_counts(&pending.counts, self.precision)
        };
        Some(QuestionTally {
            question: pending.question,
            tally,
        })
    }
}

fn skip(diagnostics: &mut Diagnostics, page_number: usize, line: String, reason: &str) {
    tracing::debug!(page_number, %line, reason, "dropped line");
    diagnostics.skipped_lines.push(SkippedLine {
        page_number,
        line_text: line,
        reason: reason.to_string(),
    });
}

/// Sum counts per exact name and compute each name's share of the total.
///
/// "None of the above" sorts last; everything else alphabetically by
/// lower-cased name.
pub fn tally_counts(entries: &[(String, u64)], precision: u32) -> Tally {
    let mut groups: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (name, count) in entries {
        match index.get(name.as_str()) {
            Some(&i) => groups[i].1 = groups[i].1.saturating_add(*count),
            None => {
                index.insert(name.as_str(), groups.len());
                groups.push((name.clone(), *count));
            }
        }
    }

    let total = groups.iter().fold(0u64, |acc, (_, c)| acc.saturating_add(*c));
    groups.sort_by_key(|(name, _)| {
        let lower = name.to_lowercase();
        (lower.starts_with(NONE_OF_THE_ABOVE), lower)
    });

    let rows = groups
        .into_iter()
        .map(|(name, count)| TallyRow {
            name,
            count,
            percentage: percentage(count, total, precision),
        })
        .collect();
    Tally::Percentage { total, rows }
}

/// `count / total * 100`, rounded half-to-even. A zero total gives zero.
pub fn percentage(count: u64, total: u64, precision: u32) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(count) * Decimal::ONE_HUNDRED / Decimal::from(total))
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven)
}

/// Render a percentage with exactly `precision` decimal places.
pub fn format_percentage(value: Decimal, precision: u32) -> String {
    format!("{:.*}%", precision as usize, value)
}

/// Fold text-path tallies into the shared store, all under one campus.
pub fn fold_into_store(
    tallies: &[QuestionTally],
    campus: &str,
    precision: u32,
) -> AggregationStore {
    let mut store = AggregationStore::new();
    for qt in tallies {
        match &qt.tally {
            Tally::Percentage { rows, .. } => {
                for row in rows {
                    store.insert(
                        &row.name,
                        qt.question.id,
                        campus,
                        format_percentage(row.percentage, precision),
                    );
                }
            }
            Tally::Ranking { rows } => {
                for row in rows {
                    store.insert(&row.name, qt.question.id, campus, row.rank.clone());
                }
            }
        }
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::default_ruleset;
    use rust_decimal_macros::dec;

    fn parser() -> LineParser {
        LineParser::from_rules(&default_ruleset().unwrap()).unwrap()
    }

    fn page(lines: &[&str]) -> PageContent {
        PageContent {
            page_number: 1,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_percentages_from_counts() {
        let Tally::Percentage { total, rows } =
            tally_counts(&[("Mr A".into(), 3), ("Mr B".into(), 1)], 1)
        else {
            panic!("expected percentage tally");
        };
        assert_eq!(total, 4);
        assert_eq!(rows[0].name, "Mr A");
        assert_eq!(rows[0].percentage, dec!(75.0));
        assert_eq!(rows[1].percentage, dec!(25.0));
        assert_eq!(format_percentage(rows[0].percentage, 1), "75.0%");
    }

    #[test]
    fn test_one_third_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3, 1), dec!(33.3));
        assert_eq!(format_percentage(percentage(1, 3, 1), 1), "33.3%");
        assert_eq!(format_percentage(percentage(2, 3, 1), 1), "66.7%");
    }

    #[test]
    fn test_zero_total() {
        assert_eq!(format_percentage(percentage(0, 0, 1), 1), "0.0%");
    }

    #[test]
    fn test_groups_by_exact_name_and_sorts_none_last() {
        let Tally::Percentage { total, rows } = tally_counts(
            &[
                ("None of the above".into(), 2),
                ("mr b".into(), 1),
                ("Mr A".into(), 1),
                ("Mr A".into(), 4),
            ],
            1,
        ) else {
            panic!("expected percentage tally");
        };
        assert_eq!(total, 8);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Mr A", "mr b", "None of the above"]);
        assert_eq!(rows[0].count, 5);
        assert_eq!(rows[2].percentage, dec!(25.0));
    }

    #[test]
    fn test_parse_counts_and_keeps_sentinels() {
        let out = parser().parse(&[page(&[
            "Teacher Feedback Summary",
            "Q#1 Punctuality",
            "Mr A    3",
            "None of the above   1",
        ])]);
        assert_eq!(out.tallies.len(), 1);
        let Tally::Percentage { rows, .. } = &out.tallies[0].tally else {
            panic!("expected percentage tally");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "None of the above");
        assert!(out.banner.is_empty());
        assert_eq!(out.diagnostics.skipped_lines.len(), 1);
        assert!(out.diagnostics.has_warning(WarningKind::DroppedLines));
    }

    #[test]
    fn test_ranking_question_from_config() {
        let mut rules = default_ruleset().unwrap();
        rules.ranking_question = Some("Q#2".into());
        let parser = LineParser::from_rules(&rules).unwrap();
        let out = parser.parse(&[page(&["Q#2 Best teacher", "1 Ms C", "2 Mr A", "junk"])]);
        let tally = &out.tallies[0];
        assert!(tally.is_ranking());
        assert_eq!(
            tally.tally,
            Tally::Ranking {
                rows: vec![
                    RankRow {
                        rank: "1".into(),
                        name: "Ms C".into()
                    },
                    RankRow {
                        rank: "2".into(),
                        name: "Mr A".into()
                    },
                ]
            }
        );
        assert_eq!(out.diagnostics.skipped_lines[0].reason, "not a '<rank> <name>' entry");
    }

    #[test]
    fn test_ranking_question_from_heading_text() {
        let out = parser().parse(&[page(&["Q#5 Ranking of teachers", "1 Ms C"])]);
        assert!(out.tallies[0].is_ranking());
    }

    #[test]
    fn test_rank_must_be_a_whole_word() {
        let out = parser().parse(&[page(&[
            "Q#3 The teacher gives frank feedback",
            "Mr A 3",
            "Mr B 1",
            "Q#4 Never cranky in class",
            "Ms C 2",
        ])]);
        assert_eq!(out.tallies.len(), 2);
        assert!(out.tallies.iter().all(|t| !t.is_ranking()));
        assert!(out.diagnostics.skipped_lines.is_empty());
    }

    #[test]
    fn test_rank_word_forms() {
        for heading in ["Q#5 Rank your teachers", "Q#5 Teachers RANKED", "Q#5 rankings"] {
            let out = parser().parse(&[page(&[heading, "1 Ms C"])]);
            assert!(out.tallies[0].is_ranking(), "{heading}");
        }
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let Tally::Percentage { total, rows } = tally_counts(
            &[
                ("Mr A".into(), u64::MAX),
                ("Mr B".into(), 1),
                ("Mr B".into(), u64::MAX),
            ],
            1,
        ) else {
            panic!("expected percentage tally");
        };
        assert_eq!(total, u64::MAX);
        assert_eq!(rows[0].count, u64::MAX);
        assert_eq!(rows[1].count, u64::MAX);
        assert_eq!(rows[0].percentage, dec!(100.0));
    }

    #[test]
    fn test_pages_concatenate_and_questions_order() {
        let out = parser().parse(&[
            page(&["Q#10 Homework", "Mr A 2"]),
            PageContent {
                page_number: 2,
                lines: vec!["Mr B 2".into(), "Q#2 Clarity".into(), "Mr A 1".into()],
            },
        ]);
        let ids: Vec<_> = out.tallies.iter().map(|t| t.question.id.number()).collect();
        assert_eq!(ids, vec![2, 10]);
        let Tally::Percentage { total, .. } = &out.tallies[1].tally else {
            panic!("expected percentage tally");
        };
        assert_eq!(*total, 4);
    }

    #[test]
    fn test_fold_into_store_uses_campus() {
        let out = parser().parse(&[page(&["Q#1 Punctuality", "Mr A 3", "Mr B 1"])]);
        let store = fold_into_store(&out.tallies, "General", 1);
        assert_eq!(store.value("mr a", QuestionId::new(1), "General"), Some("75.0%"));
    }

    #[test]
    fn test_banner_lines_before_first_question() {
        let out = parser().parse(&[page(&[
            "Learners Feedback 2024",
            "Academic Year 2024-25",
            "Q#1 Punctuality",
            "Learners 4",
        ])]);
        assert_eq!(out.banner, vec!["Learners Feedback 2024", "Academic Year 2024-25"]);
        assert_eq!(out.diagnostics.skipped_lines.len(), 2);
    }

    #[test]
    fn test_nothing_recognised_gives_no_tallies() {
        let out = parser().parse(&[page(&["just", "some text"])]);
        assert!(out.tallies.is_empty());
    }
}
