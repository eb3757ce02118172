use std::collections::BTreeSet;

use crate::aggregate::AggregationStore;
use crate::diagnostics::{Diagnostics, RejectedTable, WarningKind};
use crate::error::CrosstabError;
use crate::extraction::SourceDocument;
use crate::model::{Question, QuestionBook};
use crate::parsing::banner::BannerCollector;
use crate::parsing::context::ContextTracker;
use crate::parsing::headings::{Heading, HeadingClassifier};
use crate::parsing::table::{TableClass, TableClassifier, TableLayout};
use crate::rules::schema::RuleSetDef;

/// Result of walking one table-structured document.
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    pub store: AggregationStore,
    pub questions: QuestionBook,
    pub campuses: BTreeSet<String>,
    pub banner: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Pairs each question heading with the next data table, in order.
#[derive(Debug, Clone)]
pub struct DocumentWalker {
    headings: HeadingClassifier,
    tables: TableClassifier,
    fallback_campus: String,
    banner_keywords: Vec<String>,
}

impl DocumentWalker {
    pub fn from_rules(rules: &RuleSetDef) -> Result<Self, CrosstabError> {
        Ok(DocumentWalker {
            headings: HeadingClassifier::from_rules(rules)?,
            tables: TableClassifier::from_rules(rules),
            fallback_campus: rules.fallback_campus.clone(),
            banner_keywords: rules.banner_keywords.clone(),
        })
    }

    /// Single forward pass over the paragraphs with one cursor into the
    /// table stream. Rejected tables are skipped for good; there is no
    /// backtracking.
    pub fn walk(&self, doc: &SourceDocument) -> WalkOutput {
        let mut ctx = ContextTracker::new(self.fallback_campus.clone());
        let mut banner = BannerCollector::new(&self.banner_keywords);
        let mut out = WalkOutput::default();
        let mut cursor = 0;
        let mut question_count = 0;
        let mut accepted_count = 0;

        for paragraph in &doc.paragraphs {
            let text = paragraph.trim();
            if text.is_empty() {
                continue;
            }

            let heading = self.headings.classify(text);
            banner.offer(text, matches!(heading, Some(Heading::Question(_))));

            let Some(heading) = heading else {
                continue;
            };
            ctx.observe(&heading);
            let Heading::Question(question) = heading else {
                continue;
            };

            question_count += 1;
            if out.questions.record(&question) {
                out.diagnostics.warn(
                    WarningKind::DuplicateQuestion,
                    Some(question.id),
                    format!(
                        "{} is declared more than once; later values overwrite earlier ones",
                        question.id
                    ),
                );
            }

            match self.next_data_table(doc, &mut cursor, &mut out.diagnostics) {
                Some((index, layout)) => {
                    accepted_count += 1;
                    let campus = ctx.campus_for_values();
                    self.store_table(doc, index, &layout, &question, &campus, &mut out.store);
                }
                None => out.diagnostics.warn(
                    WarningKind::QuestionWithoutTable,
                    Some(question.id),
                    format!("no data table left for {}", question.id),
                ),
            }
        }

        if cursor < doc.tables.len() {
            out.diagnostics.warn(
                WarningKind::UnconsumedTables,
                None,
                format!(
                    "{} table(s) after the last question heading were not read",
                    doc.tables.len() - cursor
                ),
            );
        }
        if question_count != accepted_count {
            out.diagnostics.warn(
                WarningKind::TableCountMismatch,
                None,
                format!(
                    "{question_count} question heading(s) but {accepted_count} data table(s); \
                     values may be attributed to the wrong question"
                ),
            );
        }

        tracing::info!(
            questions = question_count,
            tables = accepted_count,
            teachers = out.store.len(),
            "walked document"
        );

        out.campuses = ctx.into_campuses();
        out.campuses.extend(out.store.campuses());
        out.banner = banner.into_lines();
        out
    }

    /// Advance the cursor to the next accepted table. The cursor moves past
    /// every table it looks at.
    fn next_data_table(
        &self,
        doc: &SourceDocument,
        cursor: &mut usize,
        diagnostics: &mut Diagnostics,
    ) -> Option<(usize, TableLayout)> {
        while *cursor < doc.tables.len() {
            let index = *cursor;
            *cursor += 1;
            match self.tables.classify(&doc.tables[index]) {
                TableClass::Accepted(layout) => return Some((index, layout)),
                TableClass::Rejected(reason) => {
                    tracing::debug!(index, %reason, "skipping table");
                    diagnostics.rejected_tables.push(RejectedTable { index, reason });
                }
            }
        }
        None
    }

    fn store_table(
        &self,
        doc: &SourceDocument,
        index: usize,
        layout: &TableLayout,
        question: &Question,
        campus: &str,
        store: &mut AggregationStore,
    ) {
        let entries = self.tables.extract(&doc.tables[index], layout);
        tracing::debug!(
            index,
            question = %question.id,
            campus,
            mode = %layout.mode,
            rows = entries.len(),
            "reading table"
        );
        for entry in entries {
            if let Some(previous) = store.insert(&entry.name, question.id, campus, entry.value) {
                tracing::debug!(
                    teacher = %entry.name,
                    question = %question.id,
                    campus,
                    %previous,
                    "overwrote earlier value"
                );
            }
        }
    }
}
