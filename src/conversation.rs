//! Conversation controller — owns the engine, transcript, and session.
//!
//! Events are processed strictly one at a time: each user interaction runs
//! to completion (including any remote calls its commands trigger) before
//! the next is accepted. The only background work is best-effort answer
//! submission, whose failures come back through an event channel and are
//! drained before the next interaction.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::BotConfig;
use crate::engine::{Command, Engine, Event, Reply, Step};
use crate::error::OperationKind;
use crate::gateway::TriageApi;
use crate::transcript::{Origin, Transcript};

/// A single triage conversation: one engine, one transcript, one session.
pub struct Conversation {
    engine: Engine,
    transcript: Transcript,
    gateway: Arc<dyn TriageApi>,
    session_id: Option<String>,
    typing_delay: Duration,
    /// True while a remote call is outstanding; the presentation layer
    /// uses it to disable option widgets against duplicate submission.
    loading: bool,
    /// True while bot replies are being paced onto the transcript.
    typing: bool,
    background_tx: mpsc::UnboundedSender<Event>,
    background_rx: mpsc::UnboundedReceiver<Event>,
}

impl Conversation {
    pub fn new(config: &BotConfig, gateway: Arc<dyn TriageApi>) -> Self {
        let (background_tx, background_rx) = mpsc::unbounded_channel();
        Self {
            engine: Engine::new(config.max_disambiguation_attempts),
            transcript: Transcript::new(),
            gateway,
            session_id: None,
            typing_delay: config.typing_delay,
            loading: false,
            typing: false,
            background_tx,
            background_rx,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn step(&self) -> Step {
        self.engine.step()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Whether the bot is currently waiting on a free-text description.
    pub fn accepts_text(&self) -> bool {
        self.engine.step().accepts_text()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Boot the conversation: create the session, load the catalog, and
    /// let the engine emit the welcome script. Session creation is the
    /// blocking precondition for everything else; on failure only the
    /// emergency option remains available.
    pub async fn start(&mut self) {
        self.loading = true;
        let booted = match self.gateway.create_session().await {
            Ok(session_id) => {
                self.session_id = Some(session_id);
                match self.gateway.fetch_categories().await {
                    Ok(categories) => Event::RemoteCatalogLoaded { categories },
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to load symptom catalog");
                        Event::RemoteCallFailed {
                            operation: e.operation(),
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create session");
                Event::RemoteCallFailed {
                    operation: OperationKind::Session,
                }
            }
        };
        self.loading = false;
        self.process(booted).await;
    }

    /// The user clicked an option on the latest prompt.
    pub async fn select_option(&mut self, value: &str) {
        self.drain_background().await;
        // Echo the selection into the transcript under its display label.
        if let Some(label) = self.transcript.label_for(value) {
            let label = label.to_string();
            self.transcript.append_user(label);
        }
        self.process(Event::UserSelectedOption {
            value: value.to_string(),
        })
        .await;
        self.drain_background().await;
    }

    /// The user submitted free text.
    pub async fn submit_text(&mut self, text: &str) {
        self.drain_background().await;
        self.transcript.append_user(text);
        self.process(Event::UserSubmittedDescription {
            text: text.to_string(),
        })
        .await;
        self.drain_background().await;
    }

    /// Feed one event through the engine, emit its messages, execute its
    /// commands, and loop on any follow-up events until quiescent.
    async fn process(&mut self, event: Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let output = self.engine.advance(event);
            self.emit(output.replies).await;
            for command in output.commands {
                if let Some(follow_up) = self.execute(command).await {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    /// Append engine replies to the transcript, pausing for the cosmetic
    /// typing delay before each bot bubble.
    async fn emit(&mut self, replies: Vec<Reply>) {
        if replies.is_empty() {
            return;
        }
        self.typing = true;
        for reply in replies {
            if !self.typing_delay.is_zero() {
                tokio::time::sleep(self.typing_delay).await;
            }
            self.transcript
                .append(Origin::Bot, reply.text, reply.choices, reply.emergency);
        }
        self.typing = false;
    }

    /// Perform one remote command, translating failures into
    /// `RemoteCallFailed` events rather than surfacing them as errors.
    async fn execute(&mut self, command: Command) -> Option<Event> {
        match command {
            Command::CreateSession => {
                self.loading = true;
                let result = self.gateway.create_session().await;
                self.loading = false;
                match result {
                    Ok(session_id) => {
                        self.session_id = Some(session_id);
                        None
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to create session");
                        Some(Event::RemoteCallFailed {
                            operation: OperationKind::Session,
                        })
                    }
                }
            }
            Command::FetchCategories => {
                self.loading = true;
                let result = self.gateway.fetch_categories().await;
                self.loading = false;
                Some(match result {
                    Ok(categories) => Event::RemoteCatalogLoaded { categories },
                    Err(e) => Event::RemoteCallFailed {
                        operation: e.operation(),
                    },
                })
            }
            Command::FetchQuestions { category_key } => {
                self.loading = true;
                let result = self.gateway.fetch_questions(&category_key).await;
                self.loading = false;
                Some(match result {
                    Ok(questions) => Event::RemoteQuestionsLoaded {
                        category_key,
                        questions,
                    },
                    Err(e) => Event::RemoteCallFailed {
                        operation: e.operation(),
                    },
                })
            }
            Command::SubmitAnswer { question_id, value } => {
                // Fire-and-forget: the local answer store is authoritative,
                // so a slow or failed submission never blocks advancement.
                let Some(session_id) = self.require_session(OperationKind::Submission) else {
                    return Some(Event::RemoteCallFailed {
                        operation: OperationKind::Submission,
                    });
                };
                let gateway = Arc::clone(&self.gateway);
                let tx = self.background_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = gateway
                        .submit_answer(&session_id, &question_id, &value)
                        .await
                    {
                        tracing::warn!(error = %e, question_id, "Answer submission failed");
                        let _ = tx.send(Event::RemoteCallFailed {
                            operation: OperationKind::Submission,
                        });
                    }
                });
                None
            }
            Command::InterpretDescription { text } => {
                let Some(session_id) = self.require_session(OperationKind::Interpretation) else {
                    return Some(Event::RemoteCallFailed {
                        operation: OperationKind::Interpretation,
                    });
                };
                self.loading = true;
                let result = self.gateway.interpret_description(&session_id, &text).await;
                self.loading = false;
                Some(match result {
                    Ok(interpreted) => Event::RemoteDescriptionInterpreted {
                        category_key: interpreted.category_key,
                        summary: interpreted.summary,
                    },
                    Err(e) => Event::RemoteCallFailed {
                        operation: e.operation(),
                    },
                })
            }
            Command::CompleteAssessment {
                category_key,
                answers,
                attempt,
            } => {
                let Some(session_id) = self.require_session(OperationKind::Completion) else {
                    return Some(Event::RemoteCallFailed {
                        operation: OperationKind::Completion,
                    });
                };
                self.loading = true;
                let result = self
                    .gateway
                    .complete_assessment(&session_id, &category_key, &answers)
                    .await;
                self.loading = false;
                Some(match result {
                    Ok(result) => Event::RemoteAssessmentCompleted { attempt, result },
                    Err(e) => Event::RemoteCallFailed {
                        operation: e.operation(),
                    },
                })
            }
        }
    }

    /// Session id for a session-scoped command, logging the typed failure
    /// when none has been established.
    fn require_session(&self, operation: OperationKind) -> Option<String> {
        if self.session_id.is_none() {
            let err = crate::error::GatewayError::SessionMissing { operation };
            tracing::error!(error = %err, "Dropping session-scoped command");
        }
        self.session_id.clone()
    }

    /// Process any events queued by background submissions.
    async fn drain_background(&mut self) {
        while let Ok(event) = self.background_rx.try_recv() {
            self.process(event).await;
        }
    }
}
