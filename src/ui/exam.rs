use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::answers::AnswerValue;
use crate::app::App;
use crate::attempt::{AttemptMode, AttemptSession, QuestionStatus};
use crate::exam::QuestionKind;
use crate::gateway::{ExamApi, SubmissionGateway};
use crate::ui::{bold, dim, italic};
use crate::util::format_clock;

/// Below this many seconds the timer turns red.
pub const LOW_TIME_SECS: u32 = 300;

const PALETTE_WIDTH: u16 = 26;
const PALETTE_CELL: u16 = 4;

pub fn timer_style(remaining: u32) -> Style {
    if remaining < LOW_TIME_SECS {
        bold().fg(Color::Red)
    } else {
        bold()
    }
}

pub fn status_style(status: QuestionStatus) -> Style {
    match status {
        QuestionStatus::NotVisited => dim(),
        QuestionStatus::Unanswered => Style::default().fg(Color::Red),
        QuestionStatus::Answered => Style::default().fg(Color::Green),
        QuestionStatus::Marked => Style::default().fg(Color::Magenta),
        QuestionStatus::AnsweredMarked => Style::default()
            .fg(Color::LightMagenta)
            .add_modifier(Modifier::BOLD),
    }
}

pub fn render_taking<A: ExamApi>(app: &App<A>, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // progress
            Constraint::Min(1),    // body
            Constraint::Length(1), // legend
        ])
        .split(area);

    render_header(session, rows[0], buf);
    render_progress(session, rows[1], buf);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(PALETTE_WIDTH)])
        .split(rows[2]);

    if session.is_paused() {
        Paragraph::new(Span::styled(
            "PAUSED - press ctrl+p to continue",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(body[0], buf);
    } else {
        render_question(session, app.input(), body[0], buf);
    }
    render_palette(session, body[1], buf);
    render_legend(session, rows[3], buf);
}

fn render_header<G: SubmissionGateway>(
    session: &AttemptSession<G>,
    area: Rect,
    buf: &mut Buffer,
) {
    let Some(def) = session.definition() else {
        return;
    };
    let remaining = session.remaining_seconds();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(20)])
        .split(area);

    Paragraph::new(Line::from(vec![
        Span::styled(def.title.clone(), bold()),
        Span::styled(format!("  {}", def.subject), dim()),
    ]))
    .render(chunks[0], buf);

    let clock = if session.is_paused() {
        Span::styled(format!("Paused {}", format_clock(remaining)), dim())
    } else {
        Span::styled(format!("Time left {}", format_clock(remaining)), timer_style(remaining))
    };
    Paragraph::new(clock)
        .alignment(Alignment::Right)
        .render(chunks[1], buf);
}

fn render_progress<G: SubmissionGateway>(
    session: &AttemptSession<G>,
    area: Rect,
    buf: &mut Buffer,
) {
    let total = session.definition().map_or(0, |d| d.question_count());
    Paragraph::new(Span::styled(
        format!(
            "Question {} of {}   answered {}   marked {}",
            session.cursor() + 1,
            total,
            session.answered_count(),
            session.bookmarked_count()
        ),
        italic(),
    ))
    .render(area, buf);
}

fn render_question<G: SubmissionGateway>(
    session: &AttemptSession<G>,
    input: &str,
    area: Rect,
    buf: &mut Buffer,
) {
    let Some(question) = session.current_question() else {
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("Q{}. ", session.cursor() + 1), bold()),
            Span::raw(question.prompt.clone()),
        ]),
        Line::from(Span::styled(
            format!(
                "{} · {} · +{} / {}{}",
                question.kind.label(),
                question.difficulty,
                question.marks,
                question.negative_marks,
                if session.is_bookmarked(&question.id) {
                    " · marked for review"
                } else {
                    ""
                }
            ),
            dim(),
        )),
        Line::default(),
    ];

    let saved = session.answer(&question.id);
    match &question.kind {
        QuestionKind::MultipleChoice { options } => {
            for (idx, option) in options.iter().enumerate() {
                let chosen = saved == Some(&AnswerValue::Choice(idx));
                let marker = if chosen { "●" } else { "○" };
                let style = if chosen {
                    bold().fg(Color::Green)
                } else {
                    Style::default()
                };
                lines.push(Line::from(Span::styled(
                    format!(
                        " {marker} {}) {option}",
                        AnswerValue::option_label(idx)
                    ),
                    style,
                )));
            }
        }
        QuestionKind::Numerical { .. } | QuestionKind::FreeText => {
            lines.push(Line::from(vec![
                Span::styled("> ", bold()),
                Span::raw(input.to_string()),
                Span::styled("_", dim().add_modifier(Modifier::SLOW_BLINK)),
            ]));
            if let Some(value) = saved {
                lines.push(Line::from(Span::styled(
                    format!("saved: {}", value.to_wire()),
                    Style::default().fg(Color::Green),
                )));
            }
        }
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL))
        .render(area, buf);
}

fn render_palette<G: SubmissionGateway>(
    session: &AttemptSession<G>,
    area: Rect,
    buf: &mut Buffer,
) {
    let total = session.definition().map_or(0, |d| d.question_count());
    let per_row = ((area.width.saturating_sub(2)) / PALETTE_CELL).max(1) as usize;

    let lines: Vec<Line> = (0..total)
        .collect::<Vec<_>>()
        .chunks(per_row)
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&idx| {
                        let status = session
                            .question_status(idx)
                            .unwrap_or(QuestionStatus::NotVisited);
                        let mut style = status_style(status);
                        if idx == session.cursor() {
                            style = style.add_modifier(Modifier::REVERSED);
                        }
                        Span::styled(format!("{:>3} ", idx + 1), style)
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" palette "))
        .render(area, buf);
}

fn render_legend<G: SubmissionGateway>(
    session: &AttemptSession<G>,
    area: Rect,
    buf: &mut Buffer,
) {
    let nav = |label: &str, enabled: bool| {
        Span::styled(label.to_string(), if enabled { bold() } else { dim() })
    };

    let answer_hint = match session.current_question().map(|q| &q.kind) {
        Some(QuestionKind::MultipleChoice { .. }) => "1-9 choose",
        Some(_) => "type + enter save",
        None => "",
    };

    let mut spans = vec![
        nav("◀ prev", !session.is_first()),
        Span::raw("  "),
        nav("next ▶", !session.is_last()),
        Span::styled(
            format!("   {answer_hint} / ctrl+b mark / ctrl+s submit"),
            italic(),
        ),
    ];
    if session.mode() == AttemptMode::Practice {
        spans.push(Span::styled(" / ctrl+p pause", italic()));
    }
    spans.push(Span::styled(" / esc leave", italic()));

    Paragraph::new(Line::from(spans)).render(area, buf);
}
