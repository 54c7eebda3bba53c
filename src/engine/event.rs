//! Events into and commands out of the assessment engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::catalog::{Question, SymptomCategory};
use crate::error::OperationKind;
use crate::transcript::Choice;

/// Urgency rating attached to a non-emergency recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

/// Final assessment result from the remote collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub is_emergency: bool,
    /// Absent when the result is an emergency.
    pub urgency_level: Option<Urgency>,
    /// Ordered recommendation lines; blank entries are filtered on display.
    pub recommendations: Vec<String>,
    /// Optional supplementary insight text.
    pub ai_insights: Option<String>,
}

/// What the interpretation service made of a free-text description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interpretation {
    /// Cleaned-up restatement of the user's description.
    pub interpreted_description: Option<String>,
    /// Short explanation of the suggested category.
    pub reasoning: Option<String>,
}

/// One event driving the state machine. The engine handles exactly one
/// event at a time; every (step, event) pair has a defined outcome.
#[derive(Debug, Clone)]
pub enum Event {
    /// The user clicked an option on the latest prompt.
    UserSelectedOption { value: String },
    /// The user submitted free text (only meaningful in `AwaitingDescription`).
    UserSubmittedDescription { text: String },
    /// Session and category list are ready; the conversation can begin.
    RemoteCatalogLoaded { categories: Vec<SymptomCategory> },
    /// The question set for a category arrived.
    RemoteQuestionsLoaded {
        category_key: String,
        questions: Vec<Question>,
    },
    /// Free-text interpretation finished; `category_key` is None when the
    /// service could not resolve a category.
    RemoteDescriptionInterpreted {
        category_key: Option<String>,
        summary: Interpretation,
    },
    /// The completion request resolved. `attempt` stamps which assessment
    /// attempt the result belongs to; stale results are dropped silently.
    RemoteAssessmentCompleted {
        attempt: u64,
        result: RecommendationResult,
    },
    /// A remote call failed at the gateway boundary.
    RemoteCallFailed { operation: OperationKind },
}

/// A remote effect the engine asks the conversation controller to perform.
///
/// The engine itself never touches the network; it stays a pure transition
/// function and the controller replays results back in as events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateSession,
    FetchCategories,
    FetchQuestions {
        category_key: String,
    },
    /// Best-effort answer telemetry; failure must not block advancement.
    SubmitAnswer {
        question_id: String,
        value: String,
    },
    InterpretDescription {
        text: String,
    },
    CompleteAssessment {
        category_key: String,
        answers: BTreeMap<String, String>,
        attempt: u64,
    },
}

/// A bot message the engine wants emitted, before the transcript assigns
/// it an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub choices: Vec<Choice>,
    pub emergency: bool,
}

impl Reply {
    /// A plain text bubble.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
            emergency: false,
        }
    }

    /// An options prompt (original UI renders these as an empty bubble
    /// holding only buttons, so the text is usually empty).
    pub fn prompt(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            text: text.into(),
            choices,
            emergency: false,
        }
    }

    /// A high-salience emergency bubble.
    pub fn alarm(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
            emergency: true,
        }
    }
}

/// Result of one `advance` call: messages to emit, in order, plus remote
/// effects to dispatch after they are shown.
#[derive(Debug, Default)]
pub struct EngineOutput {
    pub replies: Vec<Reply>,
    pub commands: Vec<Command>,
}

impl EngineOutput {
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn say(&mut self, text: impl Into<String>) {
        self.replies.push(Reply::text(text));
    }

    pub(crate) fn prompt(&mut self, choices: Vec<Choice>) {
        self.replies.push(Reply::prompt("", choices));
    }

    pub(crate) fn alarm(&mut self, text: impl Into<String>) {
        self.replies.push(Reply::alarm(text));
    }

    pub(crate) fn dispatch(&mut self, command: Command) {
        self.commands.push(command);
    }
}
