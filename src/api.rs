//! HTTP client for the exam-practice backend.
//!
//! The backend speaks its own JSON shapes (durations in minutes, question
//! kind inferred from a `type` string or the presence of options). Those are
//! converted here, once, into the crate's [`TestDefinition`].

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::exam::{Difficulty, Question, QuestionKind, ScoredResult, TestDefinition};
use crate::gateway::{
    AttemptRegistry, AttemptTicket, GenerationParams, SubmissionGateway, SubmissionPayload,
    TestGenerator,
};

const API_PREFIX: &str = "api/exam_practice";

#[derive(Debug, Clone)]
pub struct HttpExamClient {
    client: Client,
    base_url: String,
}

impl HttpExamClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mocktest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().unwrap_or_default();
        let message = error_detail(&text);
        tracing::warn!(%url, status = status.as_u16(), %message, "request failed");
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pulls the human-readable message out of an error body.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct Detail {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<Detail>(body) {
        Ok(Detail {
            detail: serde_json::Value::String(msg),
        }) => msg,
        Ok(Detail { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    subject: &'a str,
    topic: Option<&'a str>,
    difficulty: Difficulty,
    question_count: u32,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct ExamDto {
    id: String,
    title: String,
    #[serde(default)]
    subject: Option<String>,
    /// Minutes.
    duration: i64,
    total_marks: u32,
    questions: Vec<ExamQuestionDto>,
}

#[derive(Debug, Deserialize)]
struct ExamQuestionDto {
    id: String,
    question: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    tolerance: Option<f64>,
    #[serde(default)]
    difficulty: Option<Difficulty>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    expected_time: Option<u32>,
    #[serde(default = "default_marks")]
    marks: u32,
    #[serde(default)]
    negative_marks: i32,
}

fn default_marks() -> u32 {
    1
}

impl ExamQuestionDto {
    fn into_question(self, fallback: Difficulty) -> Question {
        let kind = match self.kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("numerical") | Some("numeric") => QuestionKind::Numerical {
                tolerance: self.tolerance,
            },
            Some("text") | Some("free-text") | Some("subjective") => QuestionKind::FreeText,
            _ if !self.options.is_empty() => QuestionKind::MultipleChoice {
                options: self.options,
            },
            _ => QuestionKind::FreeText,
        };

        Question {
            id: self.id,
            prompt: self.question,
            kind,
            marks: self.marks,
            negative_marks: self.negative_marks.min(0),
            difficulty: self.difficulty.unwrap_or(fallback),
            expected_time_seconds: self.expected_time,
            topic: self.topic,
        }
    }
}

impl ExamDto {
    fn into_definition(self, params: &GenerationParams) -> Result<TestDefinition, ApiError> {
        let duration_seconds = self.duration.checked_mul(60).ok_or_else(|| {
            ApiError::Decode(format!("test duration of {} minutes is out of range", self.duration))
        })?;

        Ok(TestDefinition {
            id: self.id,
            title: self.title,
            subject: self.subject.unwrap_or_else(|| params.subject.clone()),
            duration_seconds,
            total_marks: self.total_marks,
            questions: self
                .questions
                .into_iter()
                .map(|q| q.into_question(params.difficulty))
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
struct SubmissionBody {
    answers: BTreeMap<String, String>,
    time_spent: BTreeMap<String, u32>,
    completed_at: String,
    skipped_questions: Vec<String>,
    bookmarked_questions: Vec<String>,
}

impl From<&SubmissionPayload> for SubmissionBody {
    fn from(payload: &SubmissionPayload) -> Self {
        Self {
            answers: payload.answers.to_wire(),
            time_spent: payload.time_spent.clone(),
            completed_at: payload.completed_at.to_rfc3339(),
            skipped_questions: payload.skipped_questions.clone(),
            bookmarked_questions: payload.bookmarked_questions.clone(),
        }
    }
}

impl TestGenerator for HttpExamClient {
    fn generate(&self, params: &GenerationParams) -> Result<TestDefinition, ApiError> {
        let body = GenerateRequest {
            subject: &params.subject,
            topic: params.topic.as_deref(),
            difficulty: params.difficulty,
            question_count: params.question_count,
            duration: params.duration_minutes,
        };

        let response = self.post("exams/generate", &body).map_err(|err| match err {
            ApiError::Server { message, .. } => ApiError::Generation(message),
            other => other,
        })?;
        let dto: ExamDto = response.json()?;
        dto.into_definition(params)
    }
}

impl AttemptRegistry for HttpExamClient {
    fn start_attempt(&self, test_id: &str) -> Result<AttemptTicket, ApiError> {
        let response = self.post(&format!("exams/{test_id}/start"), &serde_json::json!({}))?;
        Ok(response.json()?)
    }
}

impl SubmissionGateway for HttpExamClient {
    fn submit(
        &self,
        attempt_id: &str,
        payload: &SubmissionPayload,
    ) -> Result<ScoredResult, ApiError> {
        let body = SubmissionBody::from(payload);
        let response = self.post(&format!("exams/attempts/{attempt_id}/submit"), &body)?;
        Ok(response.json()?)
    }
}
