use crate::parsing::headings::Heading;
use std::collections::BTreeSet;

/// Sticky parse state: the campus the next values belong to.
///
/// A campus persists until replaced by a later campus heading. Values seen
/// before any campus heading are attributed to the fallback campus.
#[derive(Debug, Clone)]
pub struct ContextTracker {
    fallback_campus: String,
    current_campus: Option<String>,
    campuses: BTreeSet<String>,
}

impl ContextTracker {
    pub fn new(fallback_campus: impl Into<String>) -> Self {
        ContextTracker {
            fallback_campus: fallback_campus.into(),
            current_campus: None,
            campuses: BTreeSet::new(),
        }
    }

    /// Apply a classified heading. Question headings leave the campus alone.
    pub fn observe(&mut self, heading: &Heading) {
        if let Heading::Campus(name) = heading {
            self.campuses.insert(name.clone());
            self.current_campus = Some(name.clone());
        }
    }

    /// Campus for the next stored value. Using the fallback registers it as
    /// a known campus.
    pub fn campus_for_values(&mut self) -> String {
        match &self.current_campus {
            Some(c) => c.clone(),
            None => {
                self.campuses.insert(self.fallback_campus.clone());
                self.fallback_campus.clone()
            }
        }
    }

    /// Every campus discovered (plus the fallback, once used).
    pub fn into_campuses(self) -> BTreeSet<String> {
        self.campuses
    }
}
