//! Session/network gateway to the triage backend.
//!
//! Every operation is independently failable; failures are typed with the
//! `OperationKind` they belong to so the conversation controller can turn
//! them into `RemoteCallFailed` events instead of faults. All operations
//! are safe to retry with the same arguments.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::BotConfig;
use crate::engine::{Interpretation, Question, RecommendationResult, SymptomCategory, Urgency};
use crate::error::{GatewayError, OperationKind};
use crate::transcript::Choice;

/// Outcome of a free-text interpretation request.
#[derive(Debug, Clone)]
pub struct Interpreted {
    /// Best-guess category key, or None when unresolved.
    pub category_key: Option<String>,
    pub summary: Interpretation,
}

/// The remote API surface the conversation depends on.
#[async_trait]
pub trait TriageApi: Send + Sync {
    /// Create a new assessment session. Must succeed before any other
    /// operation; its failure blocks the whole flow.
    async fn create_session(&self) -> Result<String, GatewayError>;

    /// List the available symptom categories.
    async fn fetch_categories(&self) -> Result<Vec<SymptomCategory>, GatewayError>;

    /// Fetch the ordered question set for one category.
    async fn fetch_questions(&self, category_key: &str) -> Result<Vec<Question>, GatewayError>;

    /// Record one answer remotely. Best-effort telemetry: the local answer
    /// store stays authoritative for flow control.
    async fn submit_answer(
        &self,
        session_id: &str,
        question_id: &str,
        value: &str,
    ) -> Result<(), GatewayError>;

    /// Map a natural-language description to a best-guess category.
    async fn interpret_description(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<Interpreted, GatewayError>;

    /// Request the final recommendation for a completed question sequence.
    async fn complete_assessment(
        &self,
        session_id: &str,
        category_key: &str,
        answers: &BTreeMap<String, String>,
    ) -> Result<RecommendationResult, GatewayError>;
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct CategoryList {
    symptoms: Vec<WireCategory>,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    key: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct QuestionSet {
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    id: String,
    text: String,
    options: Vec<WireOption>,
}

#[derive(Debug, Deserialize)]
struct WireOption {
    value: String,
    text: String,
    #[serde(default)]
    emergency: bool,
}

#[derive(Debug, Serialize)]
struct AnswerSubmission<'a> {
    session_id: &'a str,
    question_id: &'a str,
    answer: &'a str,
}

#[derive(Debug, Serialize)]
struct InterpretRequest<'a> {
    session_id: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct InterpretResponse {
    symptom_key: Option<String>,
    #[serde(default)]
    ai_analysis: Interpretation,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    session_id: &'a str,
    symptom_key: &'a str,
    responses: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    recommendations: WireRecommendations,
}

/// Lenient completion payload: the backend stamps `urgency_level:
/// "EMERGENCY"` on emergency results, which is not one of the three
/// urgency ratings, so the level is parsed tolerantly.
#[derive(Debug, Deserialize)]
struct WireRecommendations {
    is_emergency: bool,
    urgency_level: Option<String>,
    recommendations: Vec<String>,
    #[serde(default)]
    ai_insights: Option<String>,
}

impl From<WireRecommendations> for RecommendationResult {
    fn from(wire: WireRecommendations) -> Self {
        let urgency_level = wire.urgency_level.as_deref().and_then(|s| match s {
            "HIGH" => Some(Urgency::High),
            "MEDIUM" => Some(Urgency::Medium),
            "LOW" => Some(Urgency::Low),
            _ => None,
        });
        Self {
            is_emergency: wire.is_emergency,
            urgency_level,
            recommendations: wire.recommendations,
            ai_insights: wire.ai_insights,
        }
    }
}

impl From<WireQuestion> for Question {
    fn from(wire: WireQuestion) -> Self {
        Self {
            id: wire.id,
            text: wire.text,
            options: wire
                .options
                .into_iter()
                .map(|o| Choice {
                    value: o.value,
                    label: o.text,
                    emergency: o.emergency,
                })
                .collect(),
        }
    }
}

// ── HTTP implementation ─────────────────────────────────────────────

/// Gateway backed by the triage HTTP backend.
pub struct HttpGateway {
    base_url: String,
    request_timeout: Duration,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: OperationKind,
        path: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.api_url(path))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                operation,
                reason: e.to_string(),
            })?;
        decode(operation, response).await
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        operation: OperationKind,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(self.api_url(path))
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                operation,
                reason: e.to_string(),
            })?;
        decode(operation, response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    operation: OperationKind,
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::UnexpectedStatus {
            operation,
            status: status.as_u16(),
        });
    }
    response.json().await.map_err(|e| GatewayError::Decode {
        operation,
        reason: e.to_string(),
    })
}

#[async_trait]
impl TriageApi for HttpGateway {
    async fn create_session(&self) -> Result<String, GatewayError> {
        let created: SessionCreated = self
            .post_json(
                OperationKind::Session,
                "/api/session/create",
                &serde_json::json!({}),
            )
            .await?;
        tracing::info!(session_id = %created.session_id, "Session created");
        Ok(created.session_id)
    }

    async fn fetch_categories(&self) -> Result<Vec<SymptomCategory>, GatewayError> {
        let list: CategoryList = self
            .get_json(OperationKind::Catalog, "/api/symptoms")
            .await?;
        Ok(list
            .symptoms
            .into_iter()
            .map(|c| SymptomCategory {
                key: c.key,
                name: c.name,
            })
            .collect())
    }

    async fn fetch_questions(&self, category_key: &str) -> Result<Vec<Question>, GatewayError> {
        let set: QuestionSet = self
            .get_json(
                OperationKind::Questions,
                &format!("/api/symptoms/{category_key}"),
            )
            .await?;
        Ok(set.questions.into_iter().map(Question::from).collect())
    }

    async fn submit_answer(
        &self,
        session_id: &str,
        question_id: &str,
        value: &str,
    ) -> Result<(), GatewayError> {
        let body = AnswerSubmission {
            session_id,
            question_id,
            answer: value,
        };
        // The acknowledgement body carries nothing the flow needs.
        let _: serde_json::Value = self
            .post_json(OperationKind::Submission, "/api/assessment/answer", &body)
            .await?;
        tracing::debug!(question_id, "Answer submitted");
        Ok(())
    }

    async fn interpret_description(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<Interpreted, GatewayError> {
        let body = InterpretRequest {
            session_id,
            description: text,
        };
        let response: InterpretResponse = self
            .post_json(
                OperationKind::Interpretation,
                "/api/analyze-description",
                &body,
            )
            .await?;
        Ok(Interpreted {
            category_key: response.symptom_key,
            summary: response.ai_analysis,
        })
    }

    async fn complete_assessment(
        &self,
        session_id: &str,
        category_key: &str,
        answers: &BTreeMap<String, String>,
    ) -> Result<RecommendationResult, GatewayError> {
        let body = CompletionRequest {
            session_id,
            symptom_key: category_key,
            responses: answers,
        };
        let response: CompletionResponse = self
            .post_json(OperationKind::Completion, "/api/assessment/complete", &body)
            .await?;
        Ok(response.recommendations.into())
    }
}
