use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AttemptError;
use crate::exam::{Question, QuestionKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnswerValue {
    /// Zero-based option index of a multiple-choice question.
    Choice(usize),
    Numeric(f64),
    Text(String),
}

impl AnswerValue {
    /// Option label for a choice index: 0 -> "A", 1 -> "B", ...
    pub fn option_label(index: usize) -> String {
        let mut label = String::new();
        let mut n = index;
        loop {
            label.insert(0, (b'A' + (n % 26) as u8) as char);
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        label
    }

    /// Representation the scoring service compares against its answer key.
    pub fn to_wire(&self) -> String {
        match self {
            AnswerValue::Choice(index) => Self::option_label(*index),
            AnswerValue::Numeric(value) => value.to_string(),
            AnswerValue::Text(text) => text.trim().to_string(),
        }
    }

    /// Checks that this value is a possible answer to a question of `kind`.
    fn check(&self, kind: &QuestionKind) -> Result<(), String> {
        match (self, kind) {
            (AnswerValue::Choice(index), QuestionKind::MultipleChoice { options }) => {
                if *index < options.len() {
                    Ok(())
                } else {
                    Err(format!(
                        "option {} does not exist, the question has {}",
                        Self::option_label(*index),
                        options.len()
                    ))
                }
            }
            (AnswerValue::Numeric(value), QuestionKind::Numerical { .. }) => {
                if value.is_finite() {
                    Ok(())
                } else {
                    Err(format!("{value} is not a finite number"))
                }
            }
            (AnswerValue::Text(text), QuestionKind::FreeText) => {
                if text.trim().is_empty() {
                    Err("answer is empty".to_string())
                } else {
                    Ok(())
                }
            }
            (value, kind) => Err(format!(
                "{} answer given to a {} question",
                value.kind_label(),
                kind.label()
            )),
        }
    }

    fn kind_label(&self) -> &'static str {
        match self {
            AnswerValue::Choice(_) => "choice",
            AnswerValue::Numeric(_) => "numeric",
            AnswerValue::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub value: AnswerValue,
    /// Attempt-elapsed seconds when this answer was last written.
    pub time_spent_seconds: u32,
}

/// Current answer per question. Entries can be overwritten but never removed.
///
/// Every write is checked against the kind of the question it answers, so
/// the store only ever holds values the scoring service can compare.
#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    kinds: BTreeMap<String, QuestionKind>,
    records: BTreeMap<String, AnswerRecord>,
}

impl AnswerStore {
    pub fn new<'a, I>(questions: I) -> Self
    where
        I: IntoIterator<Item = &'a Question>,
    {
        Self {
            kinds: questions
                .into_iter()
                .map(|q| (q.id.clone(), q.kind.clone()))
                .collect(),
            records: BTreeMap::new(),
        }
    }

    pub fn set(
        &mut self,
        question_id: &str,
        value: AnswerValue,
        time_spent_seconds: u32,
    ) -> Result<(), AttemptError> {
        let Some(kind) = self.kinds.get(question_id) else {
            return Err(AttemptError::UnknownQuestion(question_id.to_string()));
        };
        value
            .check(kind)
            .map_err(|reason| AttemptError::InvalidAnswer {
                question_id: question_id.to_string(),
                reason,
            })?;

        self.records.insert(
            question_id.to_string(),
            AnswerRecord {
                question_id: question_id.to_string(),
                value,
                time_spent_seconds,
            },
        );
        Ok(())
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.records.get(question_id).map(|r| &r.value)
    }

    pub fn record(&self, question_id: &str) -> Option<&AnswerRecord> {
        self.records.get(question_id)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn snapshot(&self) -> AnswerSnapshot {
        AnswerSnapshot {
            records: self.records.clone(),
        }
    }
}

/// Frozen copy of the answers at submission time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnswerSnapshot {
    records: BTreeMap<String, AnswerRecord>,
}

impl AnswerSnapshot {
    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.records.get(question_id).map(|r| &r.value)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.records.contains_key(question_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.records.values()
    }

    pub fn to_wire(&self) -> BTreeMap<String, String> {
        self.records
            .iter()
            .map(|(id, record)| (id.clone(), record.value.to_wire()))
            .collect()
    }
}
