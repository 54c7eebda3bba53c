//! Answer store — per-attempt mapping of question id to chosen value.

use std::collections::BTreeMap;

/// Append-only mapping from question identifier to the selected answer
/// value for the current assessment attempt.
///
/// Keys are write-once within one attempt: a question is never re-asked
/// once the flow has advanced past it. `clear` resets the store for a
/// restarted attempt.
#[derive(Debug, Default, Clone)]
pub struct AnswerStore {
    answers: BTreeMap<String, String>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer. Returns false (and leaves the existing entry
    /// untouched) if the question was already answered this attempt.
    pub fn record(&mut self, question_id: impl Into<String>, value: impl Into<String>) -> bool {
        let question_id = question_id.into();
        if self.answers.contains_key(&question_id) {
            return false;
        }
        self.answers.insert(question_id, value.into());
        true
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Snapshot of all answers, for the completion request payload.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.answers.clone()
    }

    /// Clear all entries before a new attempt begins.
    pub fn clear(&mut self) {
        self.answers.clear();
    }
}
