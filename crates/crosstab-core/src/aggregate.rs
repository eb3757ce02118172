use crate::model::QuestionId;
use crate::parsing::normalize::{display_name, name_key};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Campus -> value for one question.
pub type CampusValues = BTreeMap<String, String>;

/// Everything recorded for one teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherRecord {
    /// Case-folded grouping key.
    pub key: String,
    /// Most recently observed spelling of the name.
    pub display_name: String,
    pub answers: BTreeMap<QuestionId, CampusValues>,
}

impl TeacherRecord {
    fn new(key: String, display_name: String) -> Self {
        TeacherRecord {
            key,
            display_name,
            answers: BTreeMap::new(),
        }
    }

    pub fn value(&self, question: QuestionId, campus: &str) -> Option<&str> {
        self.answers
            .get(&question)
            .and_then(|c| c.get(campus))
            .map(|s| s.as_str())
    }

    /// True if any question holds a non-empty value for `campus`.
    pub fn has_value_for(&self, campus: &str) -> bool {
        self.answers
            .values()
            .any(|c| c.get(campus).is_some_and(|v| !v.is_empty()))
    }
}

/// Teacher -> question -> campus -> value, in teacher insertion order.
///
/// At most one value is kept per (teacher, question, campus); a later insert
/// replaces the earlier one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationStore {
    teachers: Vec<TeacherRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the record for `name`, creating it on first sight. The display
    /// name is refreshed to this spelling either way.
    pub fn get_or_create(&mut self, name: &str) -> &mut TeacherRecord {
        let key = name_key(name);
        let display = display_name(name);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.teachers.push(TeacherRecord::new(key.clone(), display.clone()));
                let idx = self.teachers.len() - 1;
                self.index.insert(key, idx);
                idx
            }
        };
        let record = &mut self.teachers[idx];
        record.display_name = display;
        record
    }

    /// Store a value, returning the value it replaced, if any.
    pub fn insert(
        &mut self,
        name: &str,
        question: QuestionId,
        campus: &str,
        value: String,
    ) -> Option<String> {
        self.get_or_create(name)
            .answers
            .entry(question)
            .or_default()
            .insert(campus.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Option<&TeacherRecord> {
        self.index
            .get(&name_key(name))
            .map(|&idx| &self.teachers[idx])
    }

    pub fn value(&self, name: &str, question: QuestionId, campus: &str) -> Option<&str> {
        self.get(name).and_then(|t| t.value(question, campus))
    }

    /// Teachers in the order they were first observed.
    pub fn teachers(&self) -> impl Iterator<Item = &TeacherRecord> {
        self.teachers.iter()
    }

    /// Every campus that holds at least one value.
    pub fn campuses(&self) -> BTreeSet<String> {
        self.teachers
            .iter()
            .flat_map(|t| t.answers.values())
            .flat_map(|c| c.keys().cloned())
            .collect()
    }

    /// Number of stored (teacher, question, campus) values.
    pub fn value_count(&self) -> usize {
        self.teachers
            .iter()
            .flat_map(|t| t.answers.values())
            .map(|c| c.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.teachers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
    }
}
