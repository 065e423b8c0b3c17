//! Screen state and key handling for the terminal front end.
//!
//! Network calls never run inside a key handler. A handler queues a
//! [`Request`]; the loop draws the loading frame, then calls
//! [`App::run_pending`] and drains any input that piled up meanwhile.

use std::sync::Arc;

use chrono::Local;
use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::answers::AnswerValue;
use crate::attempt::{AttemptMode, AttemptSession, AttemptStatus, SubmitOutcome, TickOutcome};
use crate::config::Config;
use crate::error::{ApiError, AttemptError};
use crate::exam::{Difficulty, QuestionKind, TestDefinition};
use crate::gateway::{ExamApi, GenerationParams};
use crate::history::{HistoryDb, HistoryEntry};

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Setup,
    Preview,
    Taking,
    Results,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialog {
    ConfirmSubmit,
    ConfirmLeave,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Generate(GenerationParams),
    Start,
    Submit,
}

impl Request {
    pub fn label(&self) -> &'static str {
        match self {
            Request::Generate(_) => "Generating your test...",
            Request::Start => "Starting attempt...",
            Request::Submit => "Submitting answers...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Subject,
    Topic,
    Difficulty,
    Questions,
    Minutes,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Subject,
        FormField::Topic,
        FormField::Difficulty,
        FormField::Questions,
        FormField::Minutes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Subject => "Subject",
            FormField::Topic => "Topic",
            FormField::Difficulty => "Difficulty",
            FormField::Questions => "Questions",
            FormField::Minutes => "Minutes",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    fn step(&self, forward: bool) -> FormField {
        let len = Self::ALL.len();
        let pos = self.position();
        let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
        Self::ALL[next]
    }
}

/// The test generation form.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupForm {
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub questions: String,
    pub minutes: String,
    pub focus: FormField,
}

impl SetupForm {
    pub fn from_config(config: &Config) -> Self {
        Self {
            subject: config.subject.clone(),
            topic: config.topic.clone().unwrap_or_default(),
            difficulty: config.difficulty,
            questions: config.question_count.to_string(),
            minutes: config.duration_minutes.to_string(),
            focus: FormField::Subject,
        }
    }

    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Subject => self.subject.clone(),
            FormField::Topic => self.topic.clone(),
            FormField::Difficulty => self.difficulty.to_string(),
            FormField::Questions => self.questions.clone(),
            FormField::Minutes => self.minutes.clone(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.step(true),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.step(false),
            KeyCode::Left | KeyCode::Right if self.focus == FormField::Difficulty => {
                self.difficulty = cycle_difficulty(self.difficulty, key.code == KeyCode::Right);
            }
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => match self.focus {
                FormField::Subject | FormField::Topic => {
                    if let Some(text) = self.text_mut() {
                        text.push(c);
                    }
                }
                FormField::Questions | FormField::Minutes if c.is_ascii_digit() => {
                    if let Some(text) = self.text_mut() {
                        if text.len() < 4 {
                            text.push(c);
                        }
                    }
                }
                FormField::Difficulty if c == ' ' => {
                    self.difficulty = cycle_difficulty(self.difficulty, true);
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Subject => Some(&mut self.subject),
            FormField::Topic => Some(&mut self.topic),
            FormField::Questions => Some(&mut self.questions),
            FormField::Minutes => Some(&mut self.minutes),
            FormField::Difficulty => None,
        }
    }

    pub fn to_params(&self) -> Result<GenerationParams, ApiError> {
        let question_count = self
            .questions
            .parse::<u32>()
            .map_err(|_| ApiError::Validation("question count must be a number".to_string()))?;
        let duration_minutes = self
            .minutes
            .parse::<u32>()
            .map_err(|_| ApiError::Validation("duration must be a number".to_string()))?;

        GenerationParams {
            subject: self.subject.clone(),
            difficulty: self.difficulty,
            topic: Some(self.topic.clone()),
            question_count,
            duration_minutes,
        }
        .normalized()
    }
}

fn cycle_difficulty(current: Difficulty, forward: bool) -> Difficulty {
    let all = Difficulty::value_variants();
    let pos = all.iter().position(|d| *d == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % all.len()
    } else {
        (pos + all.len() - 1) % all.len()
    };
    all[next]
}

pub struct App<A: ExamApi> {
    api: Arc<A>,
    config: Config,
    history: Option<HistoryDb>,
    state: AppState,
    dialog: Option<Dialog>,
    form: SetupForm,
    preview: Option<TestDefinition>,
    mode: AttemptMode,
    session: Option<AttemptSession<Arc<A>>>,
    input: String,
    results_scroll: usize,
    history_rows: Vec<HistoryEntry>,
    history_return: AppState,
    error: Option<String>,
    pending: Option<Request>,
    should_quit: bool,
}

impl<A: ExamApi> App<A> {
    pub fn new(api: Arc<A>, config: Config, history: Option<HistoryDb>) -> Self {
        let mode = if config.practice_mode {
            AttemptMode::Practice
        } else {
            AttemptMode::Timed
        };

        Self {
            form: SetupForm::from_config(&config),
            api,
            config,
            history,
            state: AppState::Setup,
            dialog: None,
            preview: None,
            mode,
            session: None,
            input: String::new(),
            results_scroll: 0,
            history_rows: Vec::new(),
            history_return: AppState::Setup,
            error: None,
            pending: None,
            should_quit: false,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn dialog(&self) -> Option<Dialog> {
        self.dialog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn form(&self) -> &SetupForm {
        &self.form
    }

    pub fn preview(&self) -> Option<&TestDefinition> {
        self.preview.as_ref()
    }

    pub fn mode(&self) -> AttemptMode {
        self.mode
    }

    pub fn session(&self) -> Option<&AttemptSession<Arc<A>>> {
        self.session.as_ref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn results_scroll(&self) -> usize {
        self.results_scroll
    }

    pub fn history_rows(&self) -> &[HistoryEntry] {
        &self.history_rows
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending(&self) -> Option<&Request> {
        self.pending.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn report(&mut self, err: &ApiError) {
        self.error = Some(err.user_message());
    }

    /// Like [`App::report`], for requests the user can repeat with Enter.
    fn report_retryable(&mut self, err: &ApiError) {
        let mut message = err.user_message();
        if err.is_transient() {
            message.push_str(". Press Enter to try again");
        }
        tracing::warn!(error = %err, transient = err.is_transient(), "request failed");
        self.error = Some(message);
    }

    fn report_defect(&mut self, err: AttemptError) {
        tracing::error!(error = %err, "attempt operation rejected");
        self.error = Some(err.to_string());
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.pending.is_some() {
            return;
        }
        if self.error.take().is_some() && key.code == KeyCode::Esc {
            return;
        }

        if let Some(dialog) = self.dialog {
            self.on_dialog_key(dialog, key);
            return;
        }

        match self.state {
            AppState::Setup => self.on_setup_key(key),
            AppState::Preview => self.on_preview_key(key),
            AppState::Taking => self.on_taking_key(key),
            AppState::Results => self.on_results_key(key),
            AppState::History => self.on_history_key(key),
        }
    }

    fn on_setup_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(2) => self.open_history(),
            KeyCode::Enter => match self.form.to_params() {
                Ok(params) => self.pending = Some(Request::Generate(params)),
                Err(err) => self.report(&err),
            },
            _ => self.form.on_key(key),
        }
    }

    fn on_preview_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.pending = Some(Request::Start),
            KeyCode::Char('m') => {
                self.mode = match self.mode {
                    AttemptMode::Timed => AttemptMode::Practice,
                    AttemptMode::Practice => AttemptMode::Timed,
                };
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.preview = None;
                self.state = AppState::Setup;
            }
            _ => {}
        }
    }

    fn on_taking_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let paused = self.session.as_ref().is_some_and(|s| s.is_paused());

        match key.code {
            KeyCode::Esc => self.dialog = Some(Dialog::ConfirmLeave),
            KeyCode::Char('p') if ctrl => self.toggle_pause(),
            _ if paused => {}
            KeyCode::Char('s') if ctrl => self.dialog = Some(Dialog::ConfirmSubmit),
            KeyCode::Char('b') if ctrl => {
                let id = self.current_question_id();
                if let Some(id) = id {
                    self.with_session(|s| s.toggle_bookmark(&id));
                }
            }
            KeyCode::Left => self.move_cursor(|s| s.previous()),
            KeyCode::Right => self.move_cursor(|s| s.next()),
            KeyCode::Home => self.move_cursor(|s| s.navigate(0)),
            KeyCode::End => self.move_cursor(|s| {
                let last = s.definition().map_or(0, |d| d.question_count() as i64 - 1);
                s.navigate(last)
            }),
            _ => self.on_answer_key(key),
        }
    }

    fn on_answer_key(&mut self, key: KeyEvent) {
        let Some(kind) = self
            .session
            .as_ref()
            .and_then(|s| s.current_question())
            .map(|q| q.kind.clone())
        else {
            return;
        };

        match (kind, key.code) {
            (QuestionKind::MultipleChoice { options }, KeyCode::Char(c)) => {
                let index = match c {
                    '1'..='9' => Some(c as usize - '1' as usize),
                    'a'..='z' => Some(c as usize - 'a' as usize),
                    'A'..='Z' => Some(c as usize - 'A' as usize),
                    _ => None,
                };
                if let Some(index) = index.filter(|i| *i < options.len()) {
                    self.with_session(|s| s.answer_current(AnswerValue::Choice(index)));
                }
            }
            (QuestionKind::MultipleChoice { .. }, KeyCode::Enter) => {
                self.move_cursor(|s| s.next());
            }
            (QuestionKind::Numerical { .. }, KeyCode::Char(c))
                if c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E') =>
            {
                self.input.push(c);
            }
            (QuestionKind::FreeText, KeyCode::Char(c)) => self.input.push(c),
            (QuestionKind::Numerical { .. } | QuestionKind::FreeText, KeyCode::Backspace) => {
                self.input.pop();
            }
            (QuestionKind::Numerical { .. }, KeyCode::Enter) => {
                let text = self.input.trim().to_string();
                if text.is_empty() {
                    return;
                }
                match text.parse::<f64>() {
                    Ok(value) if value.is_finite() => {
                        self.with_session(|s| s.answer_current(AnswerValue::Numeric(value)));
                    }
                    _ => self.error = Some(format!("\"{text}\" is not a number")),
                }
            }
            (QuestionKind::FreeText, KeyCode::Enter) => {
                let text = self.input.trim().to_string();
                if !text.is_empty() {
                    self.with_session(|s| s.answer_current(AnswerValue::Text(text)));
                }
            }
            _ => {}
        }
    }

    fn on_dialog_key(&mut self, dialog: Dialog, key: KeyEvent) {
        let confirmed = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return,
        };
        self.dialog = None;
        if !confirmed {
            return;
        }

        match dialog {
            Dialog::ConfirmSubmit => self.pending = Some(Request::Submit),
            Dialog::ConfirmLeave => {
                // Dropping an open session stops its clock.
                self.session = None;
                self.input.clear();
                self.state = AppState::Setup;
            }
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') => {
                self.session = None;
                self.preview = None;
                self.results_scroll = 0;
                self.state = AppState::Setup;
            }
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Up => self.results_scroll = self.results_scroll.saturating_sub(1),
            KeyCode::Down => {
                let last = self
                    .session
                    .as_ref()
                    .and_then(|s| s.definition())
                    .map_or(0, |d| d.question_count().saturating_sub(1));
                self.results_scroll = (self.results_scroll + 1).min(last);
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                self.state = self.history_return;
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn open_history(&mut self) {
        let Some(db) = &self.history else {
            self.error = Some("History is not available".to_string());
            return;
        };
        match db.recent(HISTORY_LIMIT) {
            Ok(rows) => {
                self.history_rows = rows;
                self.history_return = self.state;
                self.state = AppState::History;
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not read history");
                self.error = Some("Could not read history".to_string());
            }
        }
    }

    fn with_session<T>(
        &mut self,
        f: impl FnOnce(&mut AttemptSession<Arc<A>>) -> Result<T, AttemptError>,
    ) -> Option<T> {
        let session = self.session.as_mut()?;
        match f(session) {
            Ok(value) => Some(value),
            Err(err) => {
                self.report_defect(err);
                None
            }
        }
    }

    fn move_cursor(&mut self, f: impl FnOnce(&mut AttemptSession<Arc<A>>) -> Result<usize, AttemptError>) {
        if self.with_session(f).is_some() {
            self.load_input();
        }
    }

    fn toggle_pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = if session.is_paused() {
            session.resume()
        } else {
            session.pause()
        };
        match result {
            Ok(_) => {}
            Err(AttemptError::PauseUnavailable) => {
                self.error = Some("Pausing is only available in practice mode".to_string());
            }
            Err(err) => self.report_defect(err),
        }
    }

    fn current_question_id(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.current_question())
            .map(|q| q.id.clone())
    }

    /// Refills the input line with the stored answer of the current question.
    fn load_input(&mut self) {
        self.input = match self.current_question_id().and_then(|id| {
            self.session
                .as_ref()
                .and_then(|s| s.answer(&id).cloned())
        }) {
            Some(AnswerValue::Numeric(v)) => v.to_string(),
            Some(AnswerValue::Text(t)) => t,
            Some(AnswerValue::Choice(_)) | None => String::new(),
        };
    }

    /// One-second heartbeat. Returns whether the screen changed.
    pub fn on_tick(&mut self) -> bool {
        if self.state != AppState::Taking {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        match session.tick() {
            Ok(TickOutcome::Running { .. }) => true,
            Ok(TickOutcome::Paused) | Ok(TickOutcome::Closed) => false,
            Ok(TickOutcome::Expired(outcome)) => {
                self.dialog = None;
                self.finish(outcome);
                true
            }
            Err(err) => {
                self.report_defect(err);
                true
            }
        }
    }

    /// Performs the queued network request, if any.
    pub fn run_pending(&mut self) {
        let Some(request) = self.pending.take() else {
            return;
        };
        tracing::debug!(?request, "running request");

        match request {
            Request::Generate(params) => match self.api.generate(&params) {
                Ok(definition) => match definition.validate() {
                    Ok(()) => {
                        self.config.remember(&params);
                        self.preview = Some(definition);
                        self.state = AppState::Preview;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "generated test rejected");
                        self.error = Some(format!("The generated test is unusable: {err}"));
                    }
                },
                Err(err) => self.report_retryable(&err),
            },
            Request::Start => self.start_attempt(),
            Request::Submit => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                match session.submit() {
                    Ok(outcome) => self.finish(outcome),
                    Err(err) => self.report_defect(err),
                }
            }
        }
    }

    fn start_attempt(&mut self) {
        let Some(definition) = self.preview.clone() else {
            return;
        };
        let ticket = match self.api.start_attempt(&definition.id) {
            Ok(ticket) => ticket,
            Err(err) => {
                self.report_retryable(&err);
                return;
            }
        };

        let mut session = AttemptSession::new(Arc::clone(&self.api), self.mode);
        match session.start(ticket.attempt_id, definition) {
            Ok(()) => {
                self.session = Some(session);
                self.input.clear();
                self.results_scroll = 0;
                self.state = AppState::Taking;
            }
            Err(err) => self.report_defect(err),
        }
    }

    fn finish(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Scored(result) => {
                if let (Some(db), Some(def)) = (
                    &self.history,
                    self.session.as_ref().and_then(|s| s.definition()),
                ) {
                    let entry = HistoryEntry::from_result(def, &result, self.mode, Local::now());
                    if let Err(err) = db.record(&entry) {
                        tracing::warn!(error = %err, "could not record history");
                    }
                }
            }
            SubmitOutcome::Failed(err) => self.report(&err),
            SubmitOutcome::Ignored => return,
        }
        self.input.clear();
        self.state = AppState::Results;
    }

    /// Whether the attempt on screen ended by running out of time.
    pub fn expired(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.status() == AttemptStatus::Expired)
    }
}
