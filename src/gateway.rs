use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::answers::AnswerSnapshot;
use crate::error::ApiError;
use crate::exam::{Difficulty, ScoredResult, TestDefinition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GenerationParams {
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    pub difficulty: Difficulty,
    pub topic: Option<String>,
    #[validate(range(min = 1, max = 100, message = "question count must be 1-100"))]
    pub question_count: u32,
    #[validate(range(min = 1, max = 300, message = "duration must be 1-300 minutes"))]
    pub duration_minutes: u32,
}

impl GenerationParams {
    /// Trims text fields and checks them, before any request goes out.
    pub fn normalized(mut self) -> Result<Self, ApiError> {
        self.subject = self.subject.trim().to_string();
        self.topic = self
            .topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self.validate()?;
        Ok(self)
    }
}

/// Server-side attempt handle, obtained before the local countdown begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptTicket {
    #[serde(rename = "id")]
    pub attempt_id: String,
    pub test_id: String,
    pub started_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    Manual,
    TimeExpired,
}

/// Everything handed to the scoring service when an attempt closes.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    pub answers: AnswerSnapshot,
    pub time_spent: BTreeMap<String, u32>,
    pub completed_at: DateTime<Utc>,
    pub skipped_questions: Vec<String>,
    pub bookmarked_questions: Vec<String>,
    pub reason: CompletionReason,
}

#[cfg_attr(test, mockall::automock)]
pub trait TestGenerator {
    fn generate(&self, params: &GenerationParams) -> Result<TestDefinition, ApiError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait AttemptRegistry {
    fn start_attempt(&self, test_id: &str) -> Result<AttemptTicket, ApiError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait SubmissionGateway {
    fn submit(
        &self,
        attempt_id: &str,
        payload: &SubmissionPayload,
    ) -> Result<ScoredResult, ApiError>;
}

/// The full backend surface the application needs.
pub trait ExamApi: TestGenerator + AttemptRegistry + SubmissionGateway {}

impl<T: TestGenerator + AttemptRegistry + SubmissionGateway + ?Sized> ExamApi for T {}

impl<T: TestGenerator + ?Sized> TestGenerator for Arc<T> {
    fn generate(&self, params: &GenerationParams) -> Result<TestDefinition, ApiError> {
        (**self).generate(params)
    }
}

impl<T: AttemptRegistry + ?Sized> AttemptRegistry for Arc<T> {
    fn start_attempt(&self, test_id: &str) -> Result<AttemptTicket, ApiError> {
        (**self).start_attempt(test_id)
    }
}

impl<T: SubmissionGateway + ?Sized> SubmissionGateway for Arc<T> {
    fn submit(
        &self,
        attempt_id: &str,
        payload: &SubmissionPayload,
    ) -> Result<ScoredResult, ApiError> {
        (**self).submit(attempt_id, payload)
    }
}

impl<T: SubmissionGateway + ?Sized> SubmissionGateway for &T {
    fn submit(
        &self,
        attempt_id: &str,
        payload: &SubmissionPayload,
    ) -> Result<ScoredResult, ApiError> {
        (**self).submit(attempt_id, payload)
    }
}
