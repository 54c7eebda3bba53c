//! Assessment engine — pure decision logic for the triage conversation.
//!
//! `Engine::advance` is the single entry point: given the accumulated state
//! and one event, it returns the bot messages to emit and the remote
//! commands to dispatch. It never performs I/O itself; the conversation
//! controller executes commands and replays their results as new events.

pub mod answers;
pub mod catalog;
pub mod event;
pub mod script;
pub mod step;

pub use answers::AnswerStore;
pub use catalog::{CatalogCache, Question, SymptomCategory};
pub use event::{Command, Event, EngineOutput, Interpretation, RecommendationResult, Reply, Urgency};
pub use step::Step;

use crate::error::OperationKind;

/// The assessment currently in progress.
#[derive(Debug, Clone)]
struct ActiveAssessment {
    category_key: String,
    /// 0-based index of the next question to ask. Monotonically increasing
    /// within one assessment; never exceeds the cached question count.
    index: usize,
}

/// The conversation state machine and assessment-flow controller.
#[derive(Debug)]
pub struct Engine {
    step: Step,
    catalog: CatalogCache,
    answers: AnswerStore,
    active: Option<ActiveAssessment>,
    /// Stamp for completion requests; results carrying an older stamp are
    /// dropped silently (a restart may have superseded them).
    attempt: u64,
    disambiguation_attempts: u32,
    max_disambiguation_attempts: u32,
}

impl Engine {
    pub fn new(max_disambiguation_attempts: u32) -> Self {
        Self {
            step: Step::Welcome,
            catalog: CatalogCache::new(),
            answers: AnswerStore::new(),
            active: None,
            attempt: 0,
            disambiguation_attempts: 0,
            max_disambiguation_attempts,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Index of the next question in the active assessment, if any.
    pub fn question_index(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.index)
    }

    /// Process one event to completion. Every (step, event) pair has a
    /// defined outcome; combinations that cannot legally occur are no-ops.
    pub fn advance(&mut self, event: Event) -> EngineOutput {
        tracing::debug!(step = %self.step, event = ?event_name(&event), "advance");
        match event {
            Event::UserSelectedOption { value } => self.on_option(value),
            Event::UserSubmittedDescription { text } => self.on_description(text),
            Event::RemoteCatalogLoaded { categories } => self.on_catalog(categories),
            Event::RemoteQuestionsLoaded {
                category_key,
                questions,
            } => self.on_questions(category_key, questions),
            Event::RemoteDescriptionInterpreted {
                category_key,
                summary,
            } => self.on_interpretation(category_key, summary),
            Event::RemoteAssessmentCompleted { attempt, result } => {
                self.on_completion(attempt, result)
            }
            Event::RemoteCallFailed { operation } => self.on_failure(operation),
        }
    }

    // ── User events ─────────────────────────────────────────────────

    fn on_option(&mut self, value: String) -> EngineOutput {
        let mut out = EngineOutput::none();

        // The fixed emergency option overrides everything, in any step,
        // even before the session is confirmed.
        if value == "emergency" {
            self.emergency(&mut out);
            return out;
        }

        match self.step {
            Step::Welcome => {
                if value == "continue" {
                    self.step = Step::SelectingSymptom;
                    self.say_selection_flow(&mut out);
                }
                // Anything else cannot legally occur here; ignore.
            }
            Step::SelectingSymptom | Step::AwaitingDescription => {
                self.on_selection_option(value, &mut out)
            }
            Step::Assessing => self.on_answer(value, &mut out),
            Step::Complete => match value.as_str() {
                "restart" => self.restart(&mut out),
                "complete" => {
                    out.say(script::GOODBYE);
                    out.say(script::GOODBYE_REMINDER);
                }
                _ => {}
            },
        }
        out
    }

    /// Options valid while choosing a symptom (also reachable from the
    /// disambiguation prompt in `AwaitingDescription`).
    fn on_selection_option(&mut self, value: String, out: &mut EngineOutput) {
        match value.as_str() {
            "describe" => {
                self.step = Step::AwaitingDescription;
                for line in script::DESCRIBE_COACHING {
                    out.say(line);
                }
                out.prompt(script::back_prompt());
            }
            "categories" => {
                // No step change; just present the list. An empty catalog
                // means the startup fetch failed, so retry it here.
                if self.catalog.categories().is_empty() {
                    out.dispatch(Command::FetchCategories);
                } else {
                    out.prompt(script::category_prompt(self.catalog.categories()));
                }
            }
            "back" => {
                self.step = Step::SelectingSymptom;
                self.say_selection_flow(out);
            }
            "other" => {
                out.say(script::REFERRAL);
                out.say(script::REFERRAL_NEXT);
                self.step = Step::Complete;
            }
            key if self.catalog.contains(key) => {
                self.begin_assessment(key.to_string(), out);
            }
            _ => {
                tracing::warn!(value = %value, "Ignoring unknown selection option");
            }
        }
    }

    fn on_description(&mut self, text: String) -> EngineOutput {
        let mut out = EngineOutput::none();
        if !self.step.accepts_text() {
            tracing::warn!(step = %self.step, "Free text submitted outside description step");
            return out;
        }
        out.dispatch(Command::InterpretDescription { text });
        out
    }

    /// Question-advancement rule: record the answer, submit it best-effort,
    /// short-circuit on an emergency option, otherwise advance the index.
    fn on_answer(&mut self, value: String, out: &mut EngineOutput) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let key = active.category_key.clone();
        let index = active.index;
        let Some(questions) = self.catalog.questions_for(&key) else {
            // Questions still in flight; the prompt is not rendered yet.
            return;
        };
        if index >= questions.len() {
            return;
        }

        let question = &questions[index];
        let question_id = question.id.clone();
        let selected_emergency = question
            .options
            .iter()
            .any(|o| o.value == value && o.emergency);

        self.answers.record(question_id.clone(), value.clone());
        out.dispatch(Command::SubmitAnswer { question_id, value });

        if selected_emergency {
            // Bypass index advancement entirely.
            self.emergency(out);
            return;
        }

        if let Some(active) = self.active.as_mut() {
            active.index += 1;
        }
        self.ask_current_or_complete(out);
    }

    // ── Remote events ───────────────────────────────────────────────

    fn on_catalog(&mut self, categories: Vec<SymptomCategory>) -> EngineOutput {
        let mut out = EngineOutput::none();
        tracing::info!(count = categories.len(), "Symptom catalog loaded");
        self.catalog.set_categories(categories);

        match self.step {
            Step::Welcome => self.say_welcome_script(&mut out),
            // A retried fetch from the "categories" selection resolved; show
            // the list the user asked for.
            Step::SelectingSymptom | Step::AwaitingDescription => {
                out.prompt(script::category_prompt(self.catalog.categories()));
            }
            _ => {}
        }
        out
    }

    fn on_questions(&mut self, category_key: String, questions: Vec<Question>) -> EngineOutput {
        let mut out = EngineOutput::none();
        let expected = self
            .active
            .as_ref()
            .is_some_and(|a| a.category_key == category_key);
        if self.step != Step::Assessing || !expected {
            tracing::debug!(category = %category_key, "Dropping question set for inactive assessment");
            return out;
        }
        self.catalog.cache_questions(category_key, questions);
        self.ask_current_or_complete(&mut out);
        out
    }

    fn on_interpretation(
        &mut self,
        category_key: Option<String>,
        summary: Interpretation,
    ) -> EngineOutput {
        let mut out = EngineOutput::none();
        if self.step != Step::AwaitingDescription {
            tracing::debug!("Dropping interpretation result outside description step");
            return out;
        }

        // A key the catalog doesn't know is treated as unresolved.
        let resolved = category_key.filter(|k| self.catalog.contains(k));

        match resolved {
            Some(key) => {
                out.say(script::INTERPRETED_INTRO);
                if let Some(desc) = summary.interpreted_description.as_deref() {
                    out.say(format!("\"{desc}\""));
                }
                out.say(script::interpreted_reasoning(summary.reasoning.as_deref()));
                out.say(script::INTERPRETED_NEXT);
                self.begin_assessment(key, &mut out);
            }
            None => {
                out.say(script::UNRESOLVED_INTRO);
                self.disambiguate(&mut out);
            }
        }
        out
    }

    fn on_completion(&mut self, attempt: u64, result: RecommendationResult) -> EngineOutput {
        let mut out = EngineOutput::none();
        if attempt != self.attempt {
            tracing::debug!(
                stale = attempt,
                current = self.attempt,
                "Dropping completion result from a superseded attempt"
            );
            return out;
        }
        if self.step != Step::Assessing {
            return out;
        }

        if result.is_emergency {
            self.emergency(&mut out);
            return out;
        }

        out.say(script::ASSESSMENT_INTRO);
        for rec in result.recommendations.iter().filter(|r| !r.trim().is_empty()) {
            out.say(rec.clone());
        }
        if let Some(insights) = result.ai_insights.as_deref().filter(|i| !i.trim().is_empty()) {
            out.say(script::INSIGHTS_HEADER);
            out.say(insights.to_string());
        }
        match result.urgency_level {
            Some(Urgency::High) => out.say(script::URGENCY_HIGH),
            Some(Urgency::Medium) => out.say(script::URGENCY_MEDIUM),
            Some(Urgency::Low) | None => {}
        }
        out.say(script::CLOSING_DISCLAIMER);
        out.prompt(script::restart_prompt());
        self.step = Step::Complete;
        out
    }

    fn on_failure(&mut self, operation: OperationKind) -> EngineOutput {
        let mut out = EngineOutput::none();
        tracing::warn!(operation = %operation, step = %self.step, "Remote call failed");

        match operation {
            OperationKind::Session => {
                // Blocking for the whole flow, but emergency guidance must
                // stay reachable even with no backend.
                out.say(script::failure_notice(operation));
                out.prompt(vec![crate::transcript::Choice::emergency(
                    "emergency",
                    "🚨 I need emergency help now",
                )]);
            }
            OperationKind::Catalog if self.step == Step::Welcome => {
                // The conversation still opens: consent and the emergency
                // option never depend on the catalog, and the list can be
                // fetched again from the "categories" selection.
                out.say(script::failure_notice(operation));
                self.say_welcome_script(&mut out);
            }
            OperationKind::Catalog
                if self.step == Step::SelectingSymptom
                    || self.step == Step::AwaitingDescription =>
            {
                // The retried fetch failed too; re-offer the selection
                // prompt so the user keeps something answerable.
                out.say(script::failure_notice(operation));
                out.prompt(script::selection_prompt());
            }
            OperationKind::Interpretation if self.step == Step::AwaitingDescription => {
                // Falls back to category disambiguation, bounded like any
                // other inconclusive round.
                out.say(script::failure_notice(operation));
                self.disambiguate(&mut out);
            }
            OperationKind::Completion if self.step == Step::Assessing => {
                // Move to Complete anyway so the user is not stuck.
                out.say(script::failure_notice(operation));
                out.prompt(script::restart_prompt());
                self.step = Step::Complete;
            }
            _ => {
                // Non-blocking: warn and leave the step unchanged so the
                // user can retry from the existing prompt.
                out.say(script::failure_notice(operation));
            }
        }
        out
    }

    // ── Shared transitions ──────────────────────────────────────────

    /// The override transition: urgent guidance, then force `Complete`,
    /// discarding any in-flight question sequence.
    fn emergency(&mut self, out: &mut EngineOutput) {
        out.alarm(script::EMERGENCY_ALERT);
        out.say(script::EMERGENCY_GUIDANCE);
        self.active = None;
        self.step = Step::Complete;
    }

    /// Greeting, disclaimers, and the consent prompt. Emitted whether or
    /// not the catalog loaded; only the category list itself needs it.
    fn say_welcome_script(&self, out: &mut EngineOutput) {
        out.say(script::GREETING);
        out.say(script::DISCLAIMER);
        out.say(script::EMERGENCY_NOTICE);
        out.say(script::CONSENT_QUESTION);
        out.prompt(script::consent_prompt());
    }

    fn say_selection_flow(&self, out: &mut EngineOutput) {
        out.say(script::SELECTION_INTRO);
        out.say(script::SELECTION_QUESTION);
        out.prompt(script::selection_prompt());
    }

    /// Enter `Assessing` for a category: fresh answers, index 0, and the
    /// question fetch if the set is not already cached.
    fn begin_assessment(&mut self, category_key: String, out: &mut EngineOutput) {
        tracing::info!(category = %category_key, "Starting assessment");
        self.step = Step::Assessing;
        self.answers.clear();
        self.active = Some(ActiveAssessment {
            category_key: category_key.clone(),
            index: 0,
        });
        if self.catalog.questions_for(&category_key).is_some() {
            self.ask_current_or_complete(out);
        } else {
            out.dispatch(Command::FetchQuestions { category_key });
        }
    }

    /// Emit the next question, or the completion request once the index
    /// reaches the question count.
    fn ask_current_or_complete(&mut self, out: &mut EngineOutput) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let Some(questions) = self.catalog.questions_for(&active.category_key) else {
            return;
        };

        if active.index < questions.len() {
            let question = &questions[active.index];
            out.say(question.text.clone());
            out.prompt(question.options.clone());
        } else {
            out.dispatch(Command::CompleteAssessment {
                category_key: active.category_key.clone(),
                answers: self.answers.snapshot(),
                attempt: self.attempt,
            });
        }
    }

    /// Bounded category-disambiguation round. Stays in
    /// `AwaitingDescription` so a follow-up description is still accepted.
    fn disambiguate(&mut self, out: &mut EngineOutput) {
        self.disambiguation_attempts += 1;
        if self.disambiguation_attempts >= self.max_disambiguation_attempts {
            tracing::warn!(
                attempts = self.disambiguation_attempts,
                "Interpretation consistently inconclusive; referring out"
            );
            out.say(script::REFERRAL);
            out.say(script::REFERRAL_NEXT);
            self.step = Step::Complete;
            return;
        }
        out.say(script::UNRESOLVED_QUESTION);
        out.prompt(script::category_prompt(self.catalog.categories()));
    }

    /// Clear per-attempt state and resume the selection flow with a fresh
    /// remote session.
    fn restart(&mut self, out: &mut EngineOutput) {
        tracing::info!("Restarting assessment");
        self.answers.clear();
        self.catalog.clear_questions();
        self.active = None;
        self.attempt += 1;
        self.disambiguation_attempts = 0;
        self.step = Step::SelectingSymptom;
        out.dispatch(Command::CreateSession);
        self.say_selection_flow(out);
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::UserSelectedOption { .. } => "user_selected_option",
        Event::UserSubmittedDescription { .. } => "user_submitted_description",
        Event::RemoteCatalogLoaded { .. } => "remote_catalog_loaded",
        Event::RemoteQuestionsLoaded { .. } => "remote_questions_loaded",
        Event::RemoteDescriptionInterpreted { .. } => "remote_description_interpreted",
        Event::RemoteAssessmentCompleted { .. } => "remote_assessment_completed",
        Event::RemoteCallFailed { .. } => "remote_call_failed",
    }
}
