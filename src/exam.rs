use std::collections::{BTreeMap, HashSet};

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AttemptError;
use crate::util::percent;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    ValueEnum,
    strum_macros::Display,
)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl<'de> Deserialize<'de> for Difficulty {
    /// Generated questions carry free-form difficulty labels ("medium",
    /// "HARD", ...). Anything unrecognised counts as medium.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(<Difficulty as ValueEnum>::from_str(label.trim(), true).unwrap_or_else(|_| {
            tracing::debug!(label = %label, "unrecognised difficulty, using medium");
            Difficulty::default()
        }))
    }
}

/// Shape of a question, dispatched explicitly instead of probing for options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice { options: Vec<String> },
    Numerical { tolerance: Option<f64> },
    FreeText,
}

impl QuestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple choice",
            QuestionKind::Numerical { .. } => "numerical",
            QuestionKind::FreeText => "free text",
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::MultipleChoice { options } => options,
            QuestionKind::Numerical { .. } | QuestionKind::FreeText => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    pub marks: u32,
    /// Penalty for a wrong answer, zero or negative.
    pub negative_marks: i32,
    pub difficulty: Difficulty,
    pub expected_time_seconds: Option<u32>,
    pub topic: Option<String>,
}

/// A generated test. Never mutated once an attempt has been started on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub duration_seconds: i64,
    pub total_marks: u32,
    pub questions: Vec<Question>,
}

impl TestDefinition {
    pub fn validate(&self) -> Result<(), AttemptError> {
        if self.duration_seconds <= 0 {
            return Err(AttemptError::InvalidDuration(self.duration_seconds));
        }
        if self.questions.is_empty() {
            return Err(AttemptError::InvalidDefinition(
                "test has no questions".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(AttemptError::InvalidDefinition(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
            if question.negative_marks > 0 {
                return Err(AttemptError::InvalidDefinition(format!(
                    "question {} has positive negative marks",
                    question.id
                )));
            }
            if let QuestionKind::MultipleChoice { options } = &question.kind {
                if options.is_empty() {
                    return Err(AttemptError::InvalidDefinition(format!(
                        "multiple choice question {} has no options",
                        question.id
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.questions.iter().any(|q| q.id == question_id)
    }

    pub fn position(&self, question_id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == question_id)
    }

    pub fn difficulty_distribution(&self) -> BTreeMap<Difficulty, usize> {
        let mut dist = BTreeMap::new();
        for question in &self.questions {
            *dist.entry(question.difficulty).or_insert(0) += 1;
        }
        dist
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOutcome {
    Correct,
    Incorrect,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub status: QuestionOutcome,
    #[serde(default)]
    pub time: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

/// Attempted and correct counts for one topic or difficulty level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(default)]
    pub attempted: u32,
    #[serde(default)]
    pub correct: u32,
}

impl Performance {
    pub fn percentage(&self) -> f64 {
        percent(self.correct as usize, self.attempted as usize)
    }

    fn add(&mut self, outcome: QuestionOutcome) {
        match outcome {
            QuestionOutcome::Correct => {
                self.attempted += 1;
                self.correct += 1;
            }
            QuestionOutcome::Incorrect => self.attempted += 1,
            QuestionOutcome::Skipped => {}
        }
    }
}

/// Score returned by the backend for a submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub test_id: String,
    pub attempt_id: String,
    /// Percentage of total marks.
    pub score: f64,
    pub total_marks: u32,
    pub obtained_marks: i32,
    pub correct_answers: u32,
    #[serde(default)]
    pub incorrect_answers: u32,
    #[serde(default)]
    pub skipped_questions: u32,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(alias = "total_time")]
    pub time_taken: u32,
    pub completed_at: String,
    #[serde(default)]
    pub question_analysis: BTreeMap<String, QuestionAnalysis>,
    #[serde(default)]
    pub difficulty_performance: BTreeMap<String, Performance>,
    #[serde(default)]
    pub topic_performance: BTreeMap<String, Performance>,
}

impl ScoredResult {
    /// Per-topic counts, attempted topics only. Falls back to the question
    /// analysis when the server sent no topic breakdown.
    pub fn topic_breakdown(
        &self,
        definition: &TestDefinition,
    ) -> BTreeMap<String, Performance> {
        let mut breakdown = self.topic_performance.clone();
        if breakdown.is_empty() {
            for question in &definition.questions {
                let (Some(topic), Some(analysis)) =
                    (&question.topic, self.question_analysis.get(&question.id))
                else {
                    continue;
                };
                breakdown
                    .entry(topic.clone())
                    .or_default()
                    .add(analysis.status);
            }
        }
        breakdown.retain(|_, p| p.attempted > 0);
        breakdown
    }

    /// Per-difficulty counts, attempted levels only.
    pub fn difficulty_breakdown(&self) -> BTreeMap<String, Performance> {
        let mut breakdown = self.difficulty_performance.clone();
        breakdown.retain(|_, p| p.attempted > 0);
        if breakdown.is_empty() {
            for analysis in self.question_analysis.values() {
                breakdown
                    .entry(analysis.difficulty.to_string())
                    .or_default()
                    .add(analysis.status);
            }
            breakdown.retain(|_, p| p.attempted > 0);
        }
        breakdown
    }
}
