//! Conversation state machine steps.

use serde::{Deserialize, Serialize};

/// The single discrete stage of the conversation.
///
/// Exactly one value is active at any time; every transition is driven by
/// one event handled in [`Engine::advance`](crate::engine::Engine::advance).
/// The emergency path can force `Complete` from any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Disclaimer and consent prompt, before anything else.
    Welcome,
    /// Choosing between free-text description and the category list.
    SelectingSymptom,
    /// Suspended waiting for a free-text symptom description.
    AwaitingDescription,
    /// Walking the per-category question sequence.
    Assessing,
    /// Assessment finished (recommendation, referral, or emergency).
    Complete,
}

impl Step {
    /// Whether this step accepts free-text submissions.
    pub fn accepts_text(&self) -> bool {
        matches!(self, Self::AwaitingDescription)
    }

    /// Whether the current assessment attempt has ended.
    ///
    /// `Complete` is terminal for the attempt, not for the machine: a
    /// `restart` selection re-enters `SelectingSymptom`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::SelectingSymptom => "selecting_symptom",
            Self::AwaitingDescription => "awaiting_description",
            Self::Assessing => "assessing",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}
