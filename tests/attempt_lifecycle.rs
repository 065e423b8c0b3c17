// End-to-end attempt lifecycle against a recording gateway, through the
// public library surface only.

use std::cell::RefCell;
use std::collections::BTreeMap;

use assert_matches::assert_matches;
use mocktest::answers::AnswerValue;
use mocktest::attempt::{AttemptMode, AttemptSession, AttemptStatus, SubmitOutcome, TickOutcome};
use mocktest::error::{ApiError, AttemptError};
use mocktest::exam::{Difficulty, Question, QuestionKind, ScoredResult, TestDefinition};
use mocktest::gateway::{CompletionReason, SubmissionGateway, SubmissionPayload};

#[derive(Default)]
struct RecordingGateway {
    calls: RefCell<Vec<(String, SubmissionPayload)>>,
    fail: bool,
}

impl SubmissionGateway for RecordingGateway {
    fn submit(
        &self,
        attempt_id: &str,
        payload: &SubmissionPayload,
    ) -> Result<ScoredResult, ApiError> {
        self.calls
            .borrow_mut()
            .push((attempt_id.to_string(), payload.clone()));
        if self.fail {
            return Err(ApiError::Transport("connection reset".into()));
        }
        Ok(ScoredResult {
            test_id: "t1".into(),
            attempt_id: attempt_id.into(),
            score: 100.0,
            total_marks: 4,
            obtained_marks: 4,
            correct_answers: 1,
            incorrect_answers: 0,
            skipped_questions: 0,
            accuracy: 100.0,
            percentile: None,
            rank: None,
            time_taken: 5,
            completed_at: payload.completed_at.to_rfc3339(),
            question_analysis: BTreeMap::new(),
            difficulty_performance: BTreeMap::new(),
            topic_performance: BTreeMap::new(),
        })
    }
}

fn question(id: &str) -> Question {
    Question {
        id: id.into(),
        prompt: format!("Prompt for {id}"),
        kind: QuestionKind::MultipleChoice {
            options: vec!["yes".into(), "no".into()],
        },
        marks: 4,
        negative_marks: -1,
        difficulty: Difficulty::Easy,
        expected_time_seconds: None,
        topic: None,
    }
}

fn test_with(duration_seconds: i64, ids: &[&str]) -> TestDefinition {
    TestDefinition {
        id: "t1".into(),
        title: "Sample".into(),
        subject: "Physics".into(),
        duration_seconds,
        total_marks: 4 * ids.len() as u32,
        questions: ids.iter().map(|id| question(id)).collect(),
    }
}

#[test]
fn timed_expiry_submits_exactly_once() {
    let gateway = RecordingGateway::default();
    let mut session = AttemptSession::new(&gateway, AttemptMode::Timed);
    session.start("a1", test_with(3, &["q1", "q2"])).unwrap();

    assert_eq!(session.tick().unwrap(), TickOutcome::Running { remaining: 2 });
    assert_eq!(session.tick().unwrap(), TickOutcome::Running { remaining: 1 });
    assert_matches!(
        session.tick().unwrap(),
        TickOutcome::Expired(SubmitOutcome::Scored(_))
    );

    assert_eq!(session.status(), AttemptStatus::Expired);
    assert_eq!(session.tick().unwrap(), TickOutcome::Closed);
    assert_eq!(session.submit().unwrap(), SubmitOutcome::Ignored);

    let calls = gateway.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "a1");
    assert_eq!(calls[0].1.reason, CompletionReason::TimeExpired);
    assert_eq!(calls[0].1.skipped_questions, vec!["q1", "q2"]);
}

#[test]
fn manual_submit_before_expiry() {
    let gateway = RecordingGateway::default();
    let mut session = AttemptSession::new(&gateway, AttemptMode::Timed);
    session.start("a1", test_with(60, &["q1"])).unwrap();
    session.record_answer("q1", AnswerValue::Choice(0)).unwrap();
    for _ in 0..5 {
        session.tick().unwrap();
    }
    assert_eq!(session.remaining_seconds(), 55);

    assert_matches!(session.submit().unwrap(), SubmitOutcome::Scored(r) if r.score == 100.0);
    assert_eq!(session.status(), AttemptStatus::Submitted);

    let calls = gateway.calls.borrow();
    assert_eq!(calls.len(), 1);
    let wire = calls[0].1.answers.to_wire();
    assert_eq!(wire.len(), 1);
    assert_eq!(wire["q1"], "A");
    assert_eq!(calls[0].1.time_spent["q1"], 5);
    assert!(calls[0].1.skipped_questions.is_empty());
}

#[test]
fn navigation_stays_in_bounds() {
    let gateway = RecordingGateway::default();
    let mut session = AttemptSession::new(&gateway, AttemptMode::Timed);
    session.start("a1", test_with(60, &["q1"])).unwrap();

    assert_eq!(session.navigate(5).unwrap(), 0);
    assert_eq!(session.cursor(), 0);
    assert_eq!(session.navigate(-3).unwrap(), 0);
    assert_eq!(session.cursor(), 0);
    assert!(session.is_first() && session.is_last());
}

#[test]
fn unknown_question_is_rejected() {
    let gateway = RecordingGateway::default();
    let mut session = AttemptSession::new(&gateway, AttemptMode::Timed);
    session.start("a1", test_with(60, &["q1"])).unwrap();
    session.record_answer("q1", AnswerValue::Choice(1)).unwrap();

    let err = session
        .record_answer("nonexistent-id", AnswerValue::Text("X".into()))
        .unwrap_err();
    assert_eq!(err, AttemptError::UnknownQuestion("nonexistent-id".into()));
    assert_eq!(session.answered_count(), 1);
    assert_eq!(session.answer("q1"), Some(&AnswerValue::Choice(1)));
}

#[test]
fn answers_are_checked_against_the_question_kind() {
    let gateway = RecordingGateway::default();
    let mut definition = test_with(60, &["q1", "q2"]);
    definition.questions[1].kind = QuestionKind::FreeText;

    let mut session = AttemptSession::new(&gateway, AttemptMode::Timed);
    session.start("a1", definition).unwrap();

    assert_matches!(
        session.record_answer("q1", AnswerValue::Choice(7)),
        Err(AttemptError::InvalidAnswer { .. })
    );
    assert_matches!(
        session.record_answer("q2", AnswerValue::Numeric(f64::NAN)),
        Err(AttemptError::InvalidAnswer { .. })
    );
    session
        .record_answer("q2", AnswerValue::Text("inertia".into()))
        .unwrap();
    session.submit().unwrap();

    let calls = gateway.calls.borrow();
    let wire = calls[0].1.answers.to_wire();
    assert_eq!(wire.len(), 1);
    assert_eq!(wire["q2"], "inertia");
    assert_eq!(calls[0].1.skipped_questions, vec!["q1"]);
}

#[test]
fn gateway_failure_leaves_attempt_closed() {
    let gateway = RecordingGateway {
        fail: true,
        ..RecordingGateway::default()
    };
    let mut session = AttemptSession::new(&gateway, AttemptMode::Timed);
    session.start("a1", test_with(60, &["q1"])).unwrap();

    assert_matches!(session.submit().unwrap(), SubmitOutcome::Failed(ApiError::Transport(_)));
    assert_eq!(session.status(), AttemptStatus::Submitted);
    assert!(session.payload().is_some());
    assert!(session.submit_error().unwrap().is_transient());

    assert_eq!(
        session.record_answer("q1", AnswerValue::Choice(0)),
        Err(AttemptError::AttemptClosed)
    );
    assert_eq!(session.submit().unwrap(), SubmitOutcome::Ignored);
    assert_eq!(gateway.calls.borrow().len(), 1);
}

#[test]
fn dropping_an_open_attempt_sends_nothing() {
    let gateway = RecordingGateway::default();
    {
        let mut session = AttemptSession::new(&gateway, AttemptMode::Practice);
        session.start("a1", test_with(60, &["q1"])).unwrap();
        session.record_answer("q1", AnswerValue::Choice(0)).unwrap();
    }
    assert!(gateway.calls.borrow().is_empty());
}
