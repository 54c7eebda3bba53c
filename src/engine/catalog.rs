//! Symptom catalog cache — categories plus the active question set.

use serde::{Deserialize, Serialize};

use crate::transcript::Choice;

/// A symptom category available for assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomCategory {
    /// Stable identifier, e.g. `"headache"`.
    pub key: String,
    /// Display name, e.g. `"Headache"`.
    pub name: String,
}

/// One question in a category's assessment sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<Choice>,
}

#[derive(Debug, Clone)]
struct CachedQuestions {
    category_key: String,
    questions: Vec<Question>,
}

/// Local cache of the category list (populated once at session start) and,
/// lazily, the question set for the category currently being assessed.
#[derive(Debug, Default)]
pub struct CatalogCache {
    categories: Vec<SymptomCategory>,
    active: Option<CachedQuestions>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_categories(&mut self, categories: Vec<SymptomCategory>) {
        self.categories = categories;
    }

    pub fn categories(&self) -> &[SymptomCategory] {
        &self.categories
    }

    /// Whether `key` names a known category.
    pub fn contains(&self, key: &str) -> bool {
        self.categories.iter().any(|c| c.key == key)
    }

    /// Display name for a category key, if known.
    pub fn category_name(&self, key: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.name.as_str())
    }

    /// Store the fetched question set for one category, replacing any
    /// previously cached set. Lives for the duration of one assessment.
    pub fn cache_questions(&mut self, category_key: impl Into<String>, questions: Vec<Question>) {
        self.active = Some(CachedQuestions {
            category_key: category_key.into(),
            questions,
        });
    }

    /// The cached question set for `key`, if that is the cached category.
    pub fn questions_for(&self, key: &str) -> Option<&[Question]> {
        self.active
            .as_ref()
            .filter(|c| c.category_key == key)
            .map(|c| c.questions.as_slice())
    }

    /// Drop the cached question set (on restart).
    pub fn clear_questions(&mut self) {
        self.active = None;
    }
}
