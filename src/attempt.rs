use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerStore, AnswerValue};
use crate::clock::{Clock, ClockEvent};
use crate::error::{ApiError, AttemptError};
use crate::exam::{Question, ScoredResult, TestDefinition};
use crate::gateway::{CompletionReason, SubmissionGateway, SubmissionPayload};
use crate::navigation::NavigationCursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Idle,
    InProgress,
    Submitted,
    Expired,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Submitted | AttemptStatus::Expired)
    }
}

/// Timed exams run straight through; practice tests may be paused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptMode {
    #[default]
    Timed,
    Practice,
}

/// Palette colour of a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionStatus {
    NotVisited,
    Unanswered,
    Answered,
    Marked,
    AnsweredMarked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Scored(ScoredResult),
    /// The gateway failed. The attempt stays closed regardless.
    Failed(ApiError),
    /// The attempt was already closed; nothing was sent.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Running { remaining: u32 },
    Paused,
    Expired(SubmitOutcome),
    /// The attempt closed before this tick arrived.
    Closed,
}

#[derive(Debug)]
struct Bound {
    attempt_id: String,
    definition: TestDefinition,
    answers: AnswerStore,
    cursor: NavigationCursor,
    started_at: DateTime<Utc>,
    visited: BTreeSet<usize>,
    bookmarks: BTreeSet<String>,
}

/// One attempt at a test, from start to a single terminal transition.
///
/// The session owns its [`Clock`]; the runtime only feeds it ticks. Closing
/// the attempt (manually or by expiry) freezes the answers into a
/// [`SubmissionPayload`] and hands it to the gateway exactly once.
pub struct AttemptSession<G: SubmissionGateway> {
    gateway: G,
    mode: AttemptMode,
    clock: Clock,
    status: AttemptStatus,
    bound: Option<Bound>,
    payload: Option<SubmissionPayload>,
    outcome: Option<Result<ScoredResult, ApiError>>,
}

impl<G: SubmissionGateway> AttemptSession<G> {
    pub fn new(gateway: G, mode: AttemptMode) -> Self {
        Self {
            gateway,
            mode,
            clock: Clock::new(),
            status: AttemptStatus::Idle,
            bound: None,
            payload: None,
            outcome: None,
        }
    }

    pub fn start(
        &mut self,
        attempt_id: impl Into<String>,
        definition: TestDefinition,
    ) -> Result<(), AttemptError> {
        if self.status != AttemptStatus::Idle {
            return Err(AttemptError::AlreadyStarted);
        }
        definition.validate()?;
        self.clock.start(definition.duration_seconds)?;

        let attempt_id = attempt_id.into();
        tracing::info!(
            attempt_id = %attempt_id,
            test_id = %definition.id,
            questions = definition.question_count(),
            duration_secs = definition.duration_seconds,
            "attempt started"
        );

        self.bound = Some(Bound {
            answers: AnswerStore::new(&definition.questions),
            cursor: NavigationCursor::new(definition.question_count()),
            started_at: Utc::now(),
            visited: BTreeSet::from([0]),
            bookmarks: BTreeSet::new(),
            attempt_id,
            definition,
        });
        self.status = AttemptStatus::InProgress;
        Ok(())
    }

    fn open_mut(&mut self) -> Result<&mut Bound, AttemptError> {
        match self.status {
            AttemptStatus::Idle => Err(AttemptError::NotStarted),
            AttemptStatus::Submitted | AttemptStatus::Expired => Err(AttemptError::AttemptClosed),
            AttemptStatus::InProgress => self.bound.as_mut().ok_or(AttemptError::NotStarted),
        }
    }

    pub fn record_answer(
        &mut self,
        question_id: &str,
        value: AnswerValue,
    ) -> Result<(), AttemptError> {
        let elapsed = self.clock.elapsed();
        let bound = self.open_mut()?;
        bound.answers.set(question_id, value, elapsed)?;
        tracing::debug!(question_id, elapsed, "answer recorded");
        Ok(())
    }

    /// Answers the question under the cursor.
    pub fn answer_current(&mut self, value: AnswerValue) -> Result<(), AttemptError> {
        let question_id = self
            .current_question()
            .map(|q| q.id.clone())
            .ok_or(AttemptError::NotStarted)?;
        self.record_answer(&question_id, value)
    }

    pub fn navigate(&mut self, index: i64) -> Result<usize, AttemptError> {
        let bound = self.open_mut()?;
        let idx = bound.cursor.go_to(index);
        bound.visited.insert(idx);
        Ok(idx)
    }

    pub fn next(&mut self) -> Result<usize, AttemptError> {
        let current = self.open_mut()?.cursor.index() as i64;
        self.navigate(current + 1)
    }

    pub fn previous(&mut self) -> Result<usize, AttemptError> {
        let current = self.open_mut()?.cursor.index() as i64;
        self.navigate(current - 1)
    }

    /// Flags a question for review. Returns whether it is now bookmarked.
    pub fn toggle_bookmark(&mut self, question_id: &str) -> Result<bool, AttemptError> {
        let bound = self.open_mut()?;
        if !bound.definition.contains(question_id) {
            return Err(AttemptError::UnknownQuestion(question_id.to_string()));
        }
        if bound.bookmarks.remove(question_id) {
            Ok(false)
        } else {
            bound.bookmarks.insert(question_id.to_string());
            Ok(true)
        }
    }

    pub fn pause(&mut self) -> Result<bool, AttemptError> {
        self.open_mut()?;
        if self.mode != AttemptMode::Practice {
            return Err(AttemptError::PauseUnavailable);
        }
        Ok(self.clock.pause())
    }

    pub fn resume(&mut self) -> Result<bool, AttemptError> {
        self.open_mut()?;
        if self.mode != AttemptMode::Practice {
            return Err(AttemptError::PauseUnavailable);
        }
        Ok(self.clock.resume())
    }

    /// Advances the countdown by one second. Reaching zero closes the
    /// attempt as [`AttemptStatus::Expired`] and submits it.
    pub fn tick(&mut self) -> Result<TickOutcome, AttemptError> {
        match self.status {
            AttemptStatus::Idle => return Err(AttemptError::NotStarted),
            AttemptStatus::Submitted | AttemptStatus::Expired => return Ok(TickOutcome::Closed),
            AttemptStatus::InProgress => {}
        }

        match self.clock.tick() {
            Some(ClockEvent::Tick { remaining }) => Ok(TickOutcome::Running { remaining }),
            Some(ClockEvent::Expired) => {
                tracing::info!(attempt_id = self.attempt_id().unwrap_or_default(), "time expired");
                Ok(TickOutcome::Expired(self.close(CompletionReason::TimeExpired)))
            }
            None => Ok(TickOutcome::Paused),
        }
    }

    /// Closes the attempt and sends it for scoring. Only the first call does
    /// anything; later calls return [`SubmitOutcome::Ignored`].
    pub fn submit(&mut self) -> Result<SubmitOutcome, AttemptError> {
        match self.status {
            AttemptStatus::Idle => Err(AttemptError::NotStarted),
            AttemptStatus::Submitted | AttemptStatus::Expired => {
                tracing::debug!("duplicate submit ignored");
                Ok(SubmitOutcome::Ignored)
            }
            AttemptStatus::InProgress => Ok(self.close(CompletionReason::Manual)),
        }
    }

    fn close(&mut self, reason: CompletionReason) -> SubmitOutcome {
        self.clock.stop();
        self.status = match reason {
            CompletionReason::Manual => AttemptStatus::Submitted,
            CompletionReason::TimeExpired => AttemptStatus::Expired,
        };

        let Some(bound) = self.bound.as_ref() else {
            return SubmitOutcome::Ignored;
        };

        let payload = SubmissionPayload {
            answers: bound.answers.snapshot(),
            time_spent: even_split(&bound.definition, self.clock.elapsed()),
            completed_at: Utc::now(),
            skipped_questions: bound
                .definition
                .questions
                .iter()
                .filter(|q| bound.answers.get(&q.id).is_none())
                .map(|q| q.id.clone())
                .collect(),
            bookmarked_questions: bound.bookmarks.iter().cloned().collect(),
            reason,
        };
        let attempt_id = bound.attempt_id.clone();

        tracing::info!(
            attempt_id = %attempt_id,
            answered = payload.answers.len(),
            skipped = payload.skipped_questions.len(),
            reason = ?reason,
            "submitting attempt"
        );

        let result = self.gateway.submit(&attempt_id, &payload);
        self.payload = Some(payload);

        let outcome = match &result {
            Ok(scored) => {
                tracing::info!(attempt_id = %attempt_id, score = scored.score, "attempt scored");
                SubmitOutcome::Scored(scored.clone())
            }
            Err(err) => {
                tracing::warn!(attempt_id = %attempt_id, error = %err, "submission failed");
                SubmitOutcome::Failed(err.clone())
            }
        };
        self.outcome = Some(result);
        outcome
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn mode(&self) -> AttemptMode {
        self.mode
    }

    pub fn attempt_id(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.attempt_id.as_str())
    }

    pub fn definition(&self) -> Option<&TestDefinition> {
        self.bound.as_ref().map(|b| &b.definition)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.bound.as_ref().map(|b| b.started_at)
    }

    pub fn cursor(&self) -> usize {
        self.bound.as_ref().map_or(0, |b| b.cursor.index())
    }

    pub fn is_first(&self) -> bool {
        self.bound.as_ref().map_or(true, |b| b.cursor.is_first())
    }

    pub fn is_last(&self) -> bool {
        self.bound.as_ref().map_or(true, |b| b.cursor.is_last())
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.bound
            .as_ref()
            .and_then(|b| b.definition.questions.get(b.cursor.index()))
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.clock.remaining()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.clock.elapsed()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.bound.as_ref().and_then(|b| b.answers.get(question_id))
    }

    pub fn answered_count(&self) -> usize {
        self.bound.as_ref().map_or(0, |b| b.answers.count())
    }

    pub fn bookmarked_count(&self) -> usize {
        self.bound.as_ref().map_or(0, |b| b.bookmarks.len())
    }

    pub fn is_bookmarked(&self, question_id: &str) -> bool {
        self.bound
            .as_ref()
            .is_some_and(|b| b.bookmarks.contains(question_id))
    }

    pub fn question_status(&self, index: usize) -> Option<QuestionStatus> {
        let bound = self.bound.as_ref()?;
        let question = bound.definition.questions.get(index)?;
        let answered = bound.answers.get(&question.id).is_some();
        let marked = bound.bookmarks.contains(&question.id);

        Some(match (answered, marked) {
            (true, true) => QuestionStatus::AnsweredMarked,
            (true, false) => QuestionStatus::Answered,
            (false, true) => QuestionStatus::Marked,
            (false, false) if bound.visited.contains(&index) => QuestionStatus::Unanswered,
            (false, false) => QuestionStatus::NotVisited,
        })
    }

    /// What was handed to the gateway, once the attempt has closed.
    pub fn payload(&self) -> Option<&SubmissionPayload> {
        self.payload.as_ref()
    }

    pub fn result(&self) -> Option<&ScoredResult> {
        self.outcome.as_ref().and_then(|r| r.as_ref().ok())
    }

    pub fn submit_error(&self) -> Option<&ApiError> {
        self.outcome.as_ref().and_then(|r| r.as_ref().err())
    }
}

impl<G: SubmissionGateway> Drop for AttemptSession<G> {
    fn drop(&mut self) {
        if self.status == AttemptStatus::InProgress {
            self.clock.stop();
            tracing::info!(
                attempt_id = self.attempt_id().unwrap_or_default(),
                remaining = self.clock.remaining(),
                "attempt abandoned"
            );
        }
    }
}

/// Time per question as an even share of the total elapsed time.
///
/// Focus time is not tracked per question, so every question gets
/// `elapsed / count` seconds (rounded down).
fn even_split(definition: &TestDefinition, elapsed: u32) -> BTreeMap<String, u32> {
    let count = definition.question_count().max(1) as u32;
    let share = elapsed / count;
    definition
        .questions
        .iter()
        .map(|q| (q.id.clone(), share))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::fixtures::{definition, free_text, mcq, numerical};
    use crate::gateway::MockSubmissionGateway;
    use assert_matches::assert_matches;

    fn scored(attempt_id: &str) -> ScoredResult {
        ScoredResult {
            test_id: "t1".into(),
            attempt_id: attempt_id.into(),
            score: 50.0,
            total_marks: 8,
            obtained_marks: 4,
            correct_answers: 1,
            incorrect_answers: 0,
            skipped_questions: 1,
            accuracy: 100.0,
            percentile: Some(75.0),
            rank: None,
            time_taken: 3,
            completed_at: "2024-05-01T10:00:00".into(),
            question_analysis: BTreeMap::new(),
            difficulty_performance: BTreeMap::new(),
            topic_performance: BTreeMap::new(),
        }
    }

    fn idle_gateway() -> MockSubmissionGateway {
        let mut gateway = MockSubmissionGateway::new();
        gateway.expect_submit().never();
        gateway
    }

    #[test]
    fn test_start_binds_definition() {
        let mut session = AttemptSession::new(idle_gateway(), AttemptMode::Timed);
        assert_eq!(session.status(), AttemptStatus::Idle);

        session
            .start("a1", definition(90, vec![mcq("q1"), mcq("q2")]))
            .unwrap();

        assert_eq!(session.status(), AttemptStatus::InProgress);
        assert_eq!(session.attempt_id(), Some("a1"));
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.remaining_seconds(), 90);
        assert_eq!(session.answered_count(), 0);
        assert!(session.started_at().is_some());
        assert_eq!(session.current_question().unwrap().id, "q1");
    }

    #[test]
    fn test_start_twice_fails() {
        let mut session = AttemptSession::new(idle_gateway(), AttemptMode::Timed);
        session.start("a1", definition(60, vec![mcq("q1")])).unwrap();
        assert_eq!(
            session.start("a2", definition(60, vec![mcq("q1")])),
            Err(AttemptError::AlreadyStarted)
        );
        assert_eq!(session.attempt_id(), Some("a1"));
    }

    #[test]
    fn test_invalid_definition_keeps_session_idle() {
        let mut session = AttemptSession::new(idle_gateway(), AttemptMode::Timed);
        assert_eq!(
            session.start("a1", definition(0, vec![mcq("q1")])),
            Err(AttemptError::InvalidDuration(0))
        );
        assert_eq!(session.status(), AttemptStatus::Idle);
        assert!(session.start("a1", definition(10, vec![mcq("q1")])).is_ok());
    }

    #[test]
    fn test_operations_before_start() {
        let mut session = AttemptSession::new(idle_gateway(), AttemptMode::Timed);
        assert_eq!(session.navigate(1), Err(AttemptError::NotStarted));
        assert_eq!(
            session.record_answer("q1", AnswerValue::Choice(0)),
            Err(AttemptError::NotStarted)
        );
        assert_eq!(session.tick(), Err(AttemptError::NotStarted));
        assert_eq!(session.submit(), Err(AttemptError::NotStarted));
    }

    #[test]
    fn test_manual_submit_sends_payload_once() {
        let mut gateway = MockSubmissionGateway::new();
        gateway
            .expect_submit()
            .withf(|id, payload| {
                id.to_string() == "a1"
                    && payload.answers.get("q1") == Some(&AnswerValue::Choice(0))
                    && payload.skipped_questions == vec!["q2".to_string()]
                    && payload.reason == CompletionReason::Manual
            })
            .times(1)
            .returning(|id, _| Ok(scored(id)));

        let mut session = AttemptSession::new(gateway, AttemptMode::Timed);
        session
            .start("a1", definition(60, vec![mcq("q1"), numerical("q2")]))
            .unwrap();
        session.record_answer("q1", AnswerValue::Choice(0)).unwrap();
        for _ in 0..5 {
            session.tick().unwrap();
        }

        let outcome = session.submit().unwrap();
        assert_matches!(outcome, SubmitOutcome::Scored(r) if r.attempt_id == "a1");
        assert_eq!(session.status(), AttemptStatus::Submitted);
        assert_eq!(session.submit().unwrap(), SubmitOutcome::Ignored);
        assert_eq!(session.status(), AttemptStatus::Submitted);
        assert_eq!(session.tick().unwrap(), TickOutcome::Closed);
        assert_eq!(session.remaining_seconds(), 55);
    }

    #[test]
    fn test_expiry_submits_with_expired_status() {
        let mut gateway = MockSubmissionGateway::new();
        gateway
            .expect_submit()
            .withf(|_, payload| payload.reason == CompletionReason::TimeExpired)
            .times(1)
            .returning(|id, _| Ok(scored(id)));

        let mut session = AttemptSession::new(gateway, AttemptMode::Timed);
        session
            .start("a1", definition(3, vec![mcq("q1"), mcq("q2")]))
            .unwrap();

        assert_eq!(session.tick().unwrap(), TickOutcome::Running { remaining: 2 });
        assert_eq!(session.tick().unwrap(), TickOutcome::Running { remaining: 1 });
        assert_matches!(
            session.tick().unwrap(),
            TickOutcome::Expired(SubmitOutcome::Scored(_))
        );
        assert_eq!(session.status(), AttemptStatus::Expired);
        assert_eq!(session.submit().unwrap(), SubmitOutcome::Ignored);
        assert_eq!(session.status(), AttemptStatus::Expired);
    }

    #[test]
    fn test_mutations_after_close_are_rejected() {
        let mut gateway = MockSubmissionGateway::new();
        gateway
            .expect_submit()
            .times(1)
            .returning(|id, _| Ok(scored(id)));

        let mut session = AttemptSession::new(gateway, AttemptMode::Practice);
        session
            .start("a1", definition(60, vec![mcq("q1"), mcq("q2")]))
            .unwrap();
        session.submit().unwrap();

        assert_eq!(
            session.record_answer("q1", AnswerValue::Choice(1)),
            Err(AttemptError::AttemptClosed)
        );
        assert_eq!(session.navigate(1), Err(AttemptError::AttemptClosed));
        assert_eq!(session.toggle_bookmark("q1"), Err(AttemptError::AttemptClosed));
        assert_eq!(session.pause(), Err(AttemptError::AttemptClosed));
        assert!(session.payload().unwrap().answers.is_empty());
    }

    #[test]
    fn test_gateway_failure_keeps_attempt_closed() {
        let mut gateway = MockSubmissionGateway::new();
        gateway
            .expect_submit()
            .times(1)
            .returning(|_, _| Err(ApiError::Transport("connection reset".into())));

        let mut session = AttemptSession::new(gateway, AttemptMode::Timed);
        session.start("a1", definition(60, vec![mcq("q1")])).unwrap();

        assert_matches!(session.submit().unwrap(), SubmitOutcome::Failed(ApiError::Transport(_)));
        assert_eq!(session.status(), AttemptStatus::Submitted);
        assert!(session.result().is_none());
        assert!(session.submit_error().is_some());
        assert_eq!(session.submit().unwrap(), SubmitOutcome::Ignored);
    }

    #[test]
    fn test_time_is_split_evenly() {
        let mut gateway = MockSubmissionGateway::new();
        gateway
            .expect_submit()
            .withf(|_, payload| {
                payload.time_spent.len() == 3 && payload.time_spent.values().all(|t| *t == 3)
            })
            .times(1)
            .returning(|id, _| Ok(scored(id)));

        let mut session = AttemptSession::new(gateway, AttemptMode::Timed);
        session
            .start("a1", definition(60, vec![mcq("q1"), mcq("q2"), mcq("q3")]))
            .unwrap();
        for _ in 0..10 {
            session.tick().unwrap();
        }
        session.submit().unwrap();
    }

    #[test]
    fn test_answer_stamps_elapsed_seconds() {
        let mut session = AttemptSession::new(idle_gateway(), AttemptMode::Timed);
        session.start("a1", definition(60, vec![mcq("q1")])).unwrap();
        session.tick().unwrap();
        session.tick().unwrap();
        session.answer_current(AnswerValue::Choice(2)).unwrap();

        assert_eq!(session.answer("q1"), Some(&AnswerValue::Choice(2)));
        assert_eq!(session.elapsed_seconds(), 2);
    }

    #[test]
    fn test_pause_only_in_practice_mode() {
        let mut timed = AttemptSession::new(idle_gateway(), AttemptMode::Timed);
        timed.start("a1", definition(60, vec![mcq("q1")])).unwrap();
        assert_eq!(timed.pause(), Err(AttemptError::PauseUnavailable));

        let mut practice = AttemptSession::new(idle_gateway(), AttemptMode::Practice);
        practice.start("a2", definition(60, vec![mcq("q1")])).unwrap();
        assert_eq!(practice.pause(), Ok(true));
        assert_eq!(practice.tick().unwrap(), TickOutcome::Paused);
        assert_eq!(practice.remaining_seconds(), 60);
        assert_eq!(practice.resume(), Ok(true));
        assert_eq!(practice.tick().unwrap(), TickOutcome::Running { remaining: 59 });
    }

    #[test]
    fn test_question_status_palette() {
        let mut session = AttemptSession::new(idle_gateway(), AttemptMode::Timed);
        session
            .start("a1", definition(60, vec![mcq("q1"), mcq("q2"), mcq("q3"), mcq("q4")]))
            .unwrap();

        session.record_answer("q1", AnswerValue::Choice(0)).unwrap();
        session.toggle_bookmark("q1").unwrap();
        session.navigate(1).unwrap();
        session.toggle_bookmark("q3").unwrap();

        assert_eq!(session.question_status(0), Some(QuestionStatus::AnsweredMarked));
        assert_eq!(session.question_status(1), Some(QuestionStatus::Unanswered));
        assert_eq!(session.question_status(2), Some(QuestionStatus::Marked));
        assert_eq!(session.question_status(3), Some(QuestionStatus::NotVisited));
        assert_eq!(session.question_status(4), None);

        assert_eq!(session.toggle_bookmark("q3"), Ok(false));
        assert_eq!(session.bookmarked_count(), 1);
        assert_matches!(
            session.toggle_bookmark("q9"),
            Err(AttemptError::UnknownQuestion(_))
        );
    }

    #[test]
    fn test_navigation_ignores_out_of_range() {
        let mut session = AttemptSession::new(idle_gateway(), AttemptMode::Timed);
        session.start("a1", definition(60, vec![mcq("q1")])).unwrap();

        assert_eq!(session.navigate(5), Ok(0));
        assert_eq!(session.navigate(-3), Ok(0));
        assert_eq!(session.next(), Ok(0));
        assert_eq!(session.previous(), Ok(0));
        assert!(session.is_first() && session.is_last());
    }

    #[test]
    fn test_answers_that_do_not_fit_are_never_sent() {
        let mut gateway = MockSubmissionGateway::new();
        gateway
            .expect_submit()
            .withf(|_, payload| {
                payload.answers.to_wire()
                    == BTreeMap::from([("q1".to_string(), "B".to_string())])
            })
            .times(1)
            .returning(|id, _| Ok(scored(id)));

        let mut session = AttemptSession::new(gateway, AttemptMode::Timed);
        session
            .start("a1", definition(60, vec![mcq("q1"), free_text("q2")]))
            .unwrap();

        session.record_answer("q1", AnswerValue::Choice(1)).unwrap();
        assert_matches!(
            session.record_answer("q1", AnswerValue::Choice(7)),
            Err(AttemptError::InvalidAnswer { question_id, .. }) if question_id == "q1"
        );
        assert_matches!(
            session.record_answer("q2", AnswerValue::Numeric(f64::NAN)),
            Err(AttemptError::InvalidAnswer { .. })
        );
        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.status(), AttemptStatus::InProgress);

        session.submit().unwrap();
        assert_eq!(session.payload().unwrap().skipped_questions, vec!["q2"]);
    }
}
