//! End-to-end conversation flows against a scripted gateway double.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use triage_assist::config::BotConfig;
use triage_assist::conversation::Conversation;
use triage_assist::engine::{
    Interpretation, Question, RecommendationResult, Step, SymptomCategory, Urgency,
};
use triage_assist::error::{GatewayError, OperationKind};
use triage_assist::gateway::{Interpreted, TriageApi};
use triage_assist::transcript::{Choice, Message};

/// Scripted backend: fixed catalog and question sets, configurable
/// interpretation and completion results, and a call log for assertions.
struct MockApi {
    calls: Mutex<Vec<String>>,
    sessions: AtomicUsize,
    interpret_key: Option<String>,
    completion: RecommendationResult,
    completed_with: Mutex<Option<BTreeMap<String, String>>>,
    failing: Vec<OperationKind>,
    failing_once: Mutex<Vec<OperationKind>>,
}

impl MockApi {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sessions: AtomicUsize::new(0),
            interpret_key: None,
            completion: RecommendationResult {
                is_emergency: false,
                urgency_level: Some(Urgency::Low),
                recommendations: vec![
                    "Rest in a quiet, dark room".to_string(),
                    "Stay hydrated".to_string(),
                ],
                ai_insights: None,
            },
            completed_with: Mutex::new(None),
            failing: Vec::new(),
            failing_once: Mutex::new(Vec::new()),
        }
    }

    fn interpreting_as(mut self, key: &str) -> Self {
        self.interpret_key = Some(key.to_string());
        self
    }

    fn with_completion(mut self, completion: RecommendationResult) -> Self {
        self.completion = completion;
        self
    }

    fn failing(mut self, kinds: Vec<OperationKind>) -> Self {
        self.failing = kinds;
        self
    }

    /// Fail the first call of each listed kind, then recover.
    fn failing_once(self, kinds: Vec<OperationKind>) -> Self {
        *self.failing_once.lock().unwrap() = kinds;
        self
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn check(&self, op: OperationKind) -> Result<(), GatewayError> {
        let mut once = self.failing_once.lock().unwrap();
        let tripped = once
            .iter()
            .position(|k| *k == op)
            .map(|i| once.remove(i))
            .is_some();
        if tripped || self.failing.contains(&op) {
            Err(GatewayError::Transport {
                operation: op,
                reason: "scripted failure".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TriageApi for MockApi {
    async fn create_session(&self) -> Result<String, GatewayError> {
        self.log("create_session");
        self.check(OperationKind::Session)?;
        let n = self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(format!("session-{n}"))
    }

    async fn fetch_categories(&self) -> Result<Vec<SymptomCategory>, GatewayError> {
        self.log("fetch_categories");
        self.check(OperationKind::Catalog)?;
        Ok(vec![
            SymptomCategory {
                key: "headache".into(),
                name: "Headache".into(),
            },
            SymptomCategory {
                key: "chest_pain".into(),
                name: "Chest Pain".into(),
            },
        ])
    }

    async fn fetch_questions(&self, key: &str) -> Result<Vec<Question>, GatewayError> {
        self.log(format!("fetch_questions:{key}"));
        self.check(OperationKind::Questions)?;
        Ok(vec![
            Question {
                id: "severity".into(),
                text: "How severe is the pain?".into(),
                options: vec![Choice::new("mild", "Mild"), Choice::new("severe", "Severe")],
            },
            Question {
                id: "onset".into(),
                text: "How did it start?".into(),
                options: vec![
                    Choice::new("gradual", "Gradually over hours"),
                    Choice::emergency("thunderclap", "Suddenly, worst of my life"),
                ],
            },
            Question {
                id: "fever".into(),
                text: "Do you also have a fever?".into(),
                options: vec![Choice::new("yes", "Yes"), Choice::new("no", "No")],
            },
        ])
    }

    async fn submit_answer(
        &self,
        _session: &str,
        question: &str,
        _value: &str,
    ) -> Result<(), GatewayError> {
        self.log(format!("submit_answer:{question}"));
        self.check(OperationKind::Submission)
    }

    async fn interpret_description(
        &self,
        _session: &str,
        _text: &str,
    ) -> Result<Interpreted, GatewayError> {
        self.log("interpret");
        self.check(OperationKind::Interpretation)?;
        Ok(Interpreted {
            category_key: self.interpret_key.clone(),
            summary: Interpretation {
                interpreted_description: Some("recurring head pain".into()),
                reasoning: Some("tension-type headache".into()),
            },
        })
    }

    async fn complete_assessment(
        &self,
        _session: &str,
        _key: &str,
        answers: &BTreeMap<String, String>,
    ) -> Result<RecommendationResult, GatewayError> {
        self.log("complete");
        self.check(OperationKind::Completion)?;
        *self.completed_with.lock().unwrap() = Some(answers.clone());
        Ok(self.completion.clone())
    }
}

fn conversation(api: Arc<MockApi>) -> Conversation {
    Conversation::new(&BotConfig::instant(), api)
}

fn bot_messages(convo: &Conversation) -> Vec<&Message> {
    convo
        .transcript()
        .messages()
        .iter()
        .filter(|m| m.is_bot())
        .collect()
}

/// Drive a started conversation up to the first assessment question.
async fn enter_assessment(convo: &mut Conversation) {
    convo.select_option("continue").await;
    convo.select_option("categories").await;
    convo.select_option("headache").await;
}

#[tokio::test]
async fn guided_flow_reaches_recommendations() {
    let api = Arc::new(MockApi::new());
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    enter_assessment(&mut convo).await;

    convo.select_option("mild").await;
    convo.select_option("gradual").await;
    convo.select_option("no").await;

    assert_eq!(convo.step(), Step::Complete);
    assert_eq!(api.count("complete"), 1);

    // Every answered question reaches the completion payload exactly once.
    let answers = api.completed_with.lock().unwrap().clone().unwrap();
    assert_eq!(answers.len(), 3);
    assert_eq!(answers.get("severity").map(String::as_str), Some("mild"));
    assert_eq!(answers.get("onset").map(String::as_str), Some("gradual"));
    assert_eq!(answers.get("fever").map(String::as_str), Some("no"));

    let text: Vec<&str> = bot_messages(&convo).iter().map(|m| m.text.as_str()).collect();
    assert!(text.iter().any(|t| t.contains("here's my assessment")));
    assert!(text.iter().any(|t| t.contains("Rest in a quiet, dark room")));
    assert!(text.iter().any(|t| t.contains("general guidance only")));

    let prompt = convo.transcript().last_options_prompt().unwrap();
    assert!(prompt.iter().any(|c| c.value == "restart"));
    assert!(prompt.iter().any(|c| c.value == "complete"));
}

#[tokio::test]
async fn medium_urgency_renders_banner_and_insights() {
    let api = Arc::new(MockApi::new().with_completion(RecommendationResult {
        is_emergency: false,
        urgency_level: Some(Urgency::Medium),
        recommendations: vec!["See a doctor this week".to_string()],
        ai_insights: Some("Pattern suggests a migraine trigger.".to_string()),
    }));
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    enter_assessment(&mut convo).await;
    convo.select_option("mild").await;
    convo.select_option("gradual").await;
    convo.select_option("no").await;

    let text: Vec<&str> = bot_messages(&convo).iter().map(|m| m.text.as_str()).collect();
    assert!(text.iter().any(|t| t.contains("MEDIUM")));
    assert!(text.iter().any(|t| t.contains("AI-Enhanced Insights")));
    assert!(text.iter().any(|t| t.contains("migraine trigger")));
}

#[tokio::test]
async fn emergency_answer_short_circuits_the_assessment() {
    let api = Arc::new(MockApi::new());
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    enter_assessment(&mut convo).await;

    convo.select_option("mild").await;
    convo.select_option("thunderclap").await;

    assert_eq!(convo.step(), Step::Complete);
    // The remaining questions are skipped and no completion is requested.
    assert_eq!(api.count("complete"), 0);

    let bots = bot_messages(&convo);
    let tail: Vec<&Message> = bots[bots.len() - 2..].to_vec();
    assert!(tail[0].emergency);
    assert!(tail[0].text.contains("CALL 911"));
    assert!(tail[1].text.contains("nearest emergency room"));
}

#[tokio::test]
async fn emergency_recommendation_overrides_normal_rendering() {
    let api = Arc::new(MockApi::new().with_completion(RecommendationResult {
        is_emergency: true,
        urgency_level: None,
        recommendations: vec!["Call emergency services".to_string()],
        ai_insights: None,
    }));
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    enter_assessment(&mut convo).await;
    convo.select_option("mild").await;
    convo.select_option("gradual").await;
    convo.select_option("no").await;

    assert_eq!(convo.step(), Step::Complete);
    let bots = bot_messages(&convo);
    assert!(bots[bots.len() - 2].text.contains("CALL 911"));
    assert!(bots[bots.len() - 1].text.contains("nearest emergency room"));
}

#[tokio::test]
async fn description_is_interpreted_into_an_assessment() {
    let api = Arc::new(MockApi::new().interpreting_as("headache"));
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    convo.select_option("continue").await;
    convo.select_option("describe").await;

    assert!(convo.accepts_text());
    convo
        .submit_text("pounding pain behind my eyes since this morning")
        .await;

    assert_eq!(convo.step(), Step::Assessing);
    assert_eq!(api.count("interpret"), 1);
    assert_eq!(api.count("fetch_questions:headache"), 1);

    let text: Vec<&str> = bot_messages(&convo).iter().map(|m| m.text.as_str()).collect();
    assert!(text.iter().any(|t| t.contains("recurring head pain")));
    assert!(text.iter().any(|t| t.contains("tension-type headache")));
    // The first question is already on screen.
    assert!(text.iter().any(|t| t.contains("How severe")));
    let prompt = convo.transcript().last_options_prompt().unwrap();
    assert!(prompt.iter().any(|c| c.value == "mild"));
}

#[tokio::test]
async fn unresolved_descriptions_are_bounded_then_referred() {
    let api = Arc::new(MockApi::new()); // interpret_key = None
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    convo.select_option("continue").await;
    convo.select_option("describe").await;

    convo.submit_text("it just feels wrong").await;
    assert_eq!(convo.step(), Step::AwaitingDescription);
    // The fallback prompt offers the catalog plus the escape hatch.
    let prompt = convo.transcript().last_options_prompt().unwrap();
    assert!(prompt.iter().any(|c| c.value == "headache"));
    assert!(prompt.iter().any(|c| c.value == "other"));

    convo.submit_text("hard to say").await;
    assert_eq!(convo.step(), Step::AwaitingDescription);

    convo.submit_text("still not sure").await;
    assert_eq!(convo.step(), Step::Complete);
    assert_eq!(api.count("fetch_questions"), 0);

    let text: Vec<&str> = bot_messages(&convo).iter().map(|m| m.text.as_str()).collect();
    assert!(text
        .iter()
        .any(|t| t.contains("consulting with a healthcare professional")));
}

#[tokio::test]
async fn disambiguation_accepts_a_direct_category_pick() {
    let api = Arc::new(MockApi::new());
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    convo.select_option("continue").await;
    convo.select_option("describe").await;
    convo.submit_text("it just feels wrong").await;

    convo.select_option("chest_pain").await;
    assert_eq!(convo.step(), Step::Assessing);
    assert_eq!(api.count("fetch_questions:chest_pain"), 1);
}

#[tokio::test]
async fn restart_gets_a_fresh_session_but_keeps_the_catalog() {
    let api = Arc::new(MockApi::new());
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    enter_assessment(&mut convo).await;
    convo.select_option("mild").await;
    convo.select_option("gradual").await;
    convo.select_option("no").await;
    assert_eq!(convo.step(), Step::Complete);

    convo.select_option("restart").await;
    assert_eq!(convo.step(), Step::SelectingSymptom);
    assert_eq!(convo.session_id(), Some("session-1"));
    assert_eq!(api.count("create_session"), 2);
    assert_eq!(api.count("fetch_categories"), 1);

    // A second run starts from a clean answer store.
    convo.select_option("categories").await;
    convo.select_option("headache").await;
    convo.select_option("severe").await;
    convo.select_option("gradual").await;
    convo.select_option("yes").await;

    let answers = api.completed_with.lock().unwrap().clone().unwrap();
    assert_eq!(answers.len(), 3);
    assert_eq!(answers.get("severity").map(String::as_str), Some("severe"));
}

#[tokio::test]
async fn catalog_failure_keeps_consent_and_emergency_reachable() {
    let api = Arc::new(MockApi::new().failing(vec![OperationKind::Catalog]));
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;

    assert_eq!(convo.step(), Step::Welcome);
    let prompt = convo.transcript().last_options_prompt().unwrap();
    assert!(prompt.iter().any(|c| c.value == "continue"));
    assert!(prompt.iter().any(|c| c.value == "emergency"));

    // Asking for the list retries the fetch; when that fails too, the
    // selection prompt is offered again instead of going dark.
    convo.select_option("continue").await;
    convo.select_option("categories").await;
    assert_eq!(api.count("fetch_categories"), 2);
    let prompt = convo.transcript().last_options_prompt().unwrap();
    assert!(prompt.iter().any(|c| c.value == "categories"));

    convo.select_option("emergency").await;
    assert_eq!(convo.step(), Step::Complete);
    assert!(convo.transcript().messages().iter().any(|m| m.emergency));
}

#[tokio::test]
async fn catalog_recovers_on_retry_from_categories_selection() {
    let api = Arc::new(MockApi::new().failing_once(vec![OperationKind::Catalog]));
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    convo.select_option("continue").await;
    convo.select_option("categories").await;

    assert_eq!(api.count("fetch_categories"), 2);
    let prompt = convo.transcript().last_options_prompt().unwrap();
    assert!(prompt.iter().any(|c| c.value == "headache"));

    // The recovered catalog supports a full assessment.
    convo.select_option("headache").await;
    assert_eq!(convo.step(), Step::Assessing);
}

#[tokio::test]
async fn submission_warning_does_not_block_the_next_answer() {
    let api = Arc::new(MockApi::new().failing(vec![OperationKind::Submission]));
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    enter_assessment(&mut convo).await;

    // Each failed background submission lands its warning after the next
    // question's prompt; the prompt must stay answerable through it.
    convo.select_option("mild").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    convo.select_option("gradual").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    convo.select_option("no").await;

    assert_eq!(convo.step(), Step::Complete);
    assert_eq!(api.count("complete"), 1);

    let messages = convo.transcript().messages();
    let warning = messages
        .iter()
        .position(|m| m.text.contains("couldn't save that answer"))
        .expect("submission warning");
    // The warning buried the open question prompt, yet the following
    // answer still resolved against it (its label echo made it in).
    assert!(messages[..warning].iter().any(|m| !m.choices.is_empty()));
    assert!(messages[warning..]
        .iter()
        .any(|m| !m.is_bot() && m.text.contains("Gradually over hours")));
}

#[tokio::test]
async fn interpretation_failure_falls_back_to_the_catalog() {
    let api = Arc::new(MockApi::new().failing(vec![OperationKind::Interpretation]));
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    convo.select_option("continue").await;
    convo.select_option("describe").await;
    convo.submit_text("pounding pain behind my eyes").await;

    assert_eq!(convo.step(), Step::AwaitingDescription);
    let text: Vec<&str> = bot_messages(&convo).iter().map(|m| m.text.as_str()).collect();
    assert!(text
        .iter()
        .any(|t| t.contains("trouble processing your description")));
    let prompt = convo.transcript().last_options_prompt().unwrap();
    assert!(prompt.iter().any(|c| c.value == "headache"));
}

#[tokio::test]
async fn completion_failure_still_ends_the_assessment() {
    let api = Arc::new(MockApi::new().failing(vec![OperationKind::Completion]));
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    enter_assessment(&mut convo).await;
    convo.select_option("mild").await;
    convo.select_option("gradual").await;
    convo.select_option("no").await;

    assert_eq!(convo.step(), Step::Complete);
    let text: Vec<&str> = bot_messages(&convo).iter().map(|m| m.text.as_str()).collect();
    assert!(text
        .iter()
        .any(|t| t.contains("Unable to generate recommendations")));
    let prompt = convo.transcript().last_options_prompt().unwrap();
    assert!(prompt.iter().any(|c| c.value == "restart"));
}

#[tokio::test]
async fn goodbye_closes_the_transcript_without_options() {
    let api = Arc::new(MockApi::new());
    let mut convo = conversation(Arc::clone(&api));
    convo.start().await;
    enter_assessment(&mut convo).await;
    convo.select_option("mild").await;
    convo.select_option("gradual").await;
    convo.select_option("no").await;
    convo.select_option("complete").await;

    assert!(convo.step().is_terminal());
    assert!(convo.transcript().last_options_prompt().is_none());
    let text: Vec<&str> = bot_messages(&convo).iter().map(|m| m.text.as_str()).collect();
    assert!(text.iter().any(|t| t.contains("Stay healthy")));

    // Background answer submissions should also have landed by now.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(api.count("submit_answer") >= 1);
}
