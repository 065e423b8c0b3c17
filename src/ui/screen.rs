use std::collections::BTreeMap;

use chrono::Local;
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, FormField};
use crate::attempt::AttemptMode;
use crate::exam::{Performance, QuestionOutcome};
use crate::gateway::ExamApi;
use crate::ui::charting::{render_score_trend, score_points};
use crate::ui::{bold, dim, italic};
use crate::util::{format_duration, mean};

const FORM_LABEL_WIDTH: usize = 12;

pub fn render_setup<A: ExamApi>(app: &App<A>, area: Rect, buf: &mut Buffer) {
    let form = app.form();
    let mut lines = vec![
        Line::from(Span::styled("New practice test", bold())),
        Line::default(),
    ];

    for field in FormField::ALL {
        let focused = form.focus == field;
        let value = form.value(field);
        let value = if field == FormField::Difficulty {
            format!("< {value} >")
        } else if focused {
            format!("{value}_")
        } else {
            value
        };

        let label_style = if focused {
            bold().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let pad = FORM_LABEL_WIDTH.saturating_sub(field.label().width());
        lines.push(Line::from(vec![
            Span::styled(if focused { "> " } else { "  " }, label_style),
            Span::styled(format!("{}{}", field.label(), " ".repeat(pad)), label_style),
            Span::styled(value, if focused { bold() } else { Style::default() }),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("service: {}", app.config().api_base_url),
        dim(),
    )));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(tab) next field / (enter) generate / (f2) history / (esc) quit",
        italic(),
    )));

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" mocktest "))
        .render(area, buf);
}

pub fn render_preview<A: ExamApi>(app: &App<A>, area: Rect, buf: &mut Buffer) {
    let Some(def) = app.preview() else {
        return;
    };

    let distribution = def
        .difficulty_distribution()
        .iter()
        .map(|(d, n)| format!("{d} {n}"))
        .join(" · ");

    let mode = match app.mode() {
        AttemptMode::Timed => "timed (no pausing)",
        AttemptMode::Practice => "practice (ctrl+p pauses)",
    };

    let lines = vec![
        Line::from(Span::styled(def.title.clone(), bold())),
        Line::from(Span::styled(def.subject.clone(), dim())),
        Line::default(),
        Line::from(format!("Questions   {}", def.question_count())),
        Line::from(format!("Duration    {}", format_duration(def.duration_seconds.max(0) as u32))),
        Line::from(format!("Marks       {}", def.total_marks)),
        Line::from(format!("Difficulty  {distribution}")),
        Line::from(vec![
            Span::raw("Mode        "),
            Span::styled(mode, bold()),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "(enter) start / (m) toggle mode / (esc) back",
            italic(),
        )),
    ];

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" ready "))
        .render(area, buf);
}

pub fn render_results<A: ExamApi>(app: &App<A>, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };

    let (topics, levels) = match (session.result(), session.definition()) {
        (Some(result), Some(def)) => (result.topic_breakdown(def), result.difficulty_breakdown()),
        _ => Default::default(),
    };
    let breakdown_height = match topics.len().max(levels.len()) {
        0 => 0,
        rows => rows as u16 + 2,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),                // summary
            Constraint::Length(breakdown_height), // topics and difficulty
            Constraint::Min(1),                   // per-question
            Constraint::Length(1),                // legend
        ])
        .split(area);

    let mut summary = Vec::new();
    if app.expired() {
        summary.push(Line::from(Span::styled(
            "Time ran out; your answers were submitted automatically.",
            Style::default().fg(Color::Yellow),
        )));
    }

    match session.result() {
        Some(result) => {
            let score_style = match result.score {
                s if s >= 75.0 => bold().fg(Color::Green),
                s if s >= 40.0 => bold().fg(Color::Yellow),
                _ => bold().fg(Color::Red),
            };
            summary.push(Line::from(vec![
                Span::styled(format!("{:.1}%", result.score), score_style),
                Span::raw(format!(
                    "   {}/{} marks",
                    result.obtained_marks, result.total_marks
                )),
            ]));
            summary.push(Line::from(format!(
                "correct {}   incorrect {}   skipped {}   accuracy {:.1}%",
                result.correct_answers,
                result.incorrect_answers,
                result.skipped_questions,
                result.accuracy
            )));
            let mut standing = format!("time {}", format_duration(result.time_taken));
            if let Some(p) = result.percentile {
                standing.push_str(&format!("   percentile {p:.1}"));
            }
            if let Some(rank) = result.rank {
                standing.push_str(&format!("   rank {rank}"));
            }
            summary.push(Line::from(standing));
        }
        None => {
            let reason = session
                .submit_error()
                .map(|e| e.user_message())
                .unwrap_or_default();
            summary.push(Line::from(Span::styled(
                format!("Submission failed: {reason}"),
                bold().fg(Color::Red),
            )));
            if let Some(payload) = session.payload() {
                summary.push(Line::from(format!(
                    "answered {}   skipped {}   marked {}",
                    payload.answers.len(),
                    payload.skipped_questions.len(),
                    payload.bookmarked_questions.len()
                )));
            }
        }
    }

    Paragraph::new(summary)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" results "))
        .render(chunks[0], buf);

    if breakdown_height > 0 {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        Paragraph::new(performance_lines(&topics, 24))
            .block(Block::default().borders(Borders::ALL).title(" by topic "))
            .render(columns[0], buf);
        Paragraph::new(performance_lines(&levels, 8))
            .block(Block::default().borders(Borders::ALL).title(" by difficulty "))
            .render(columns[1], buf);
    }

    if let (Some(result), Some(def)) = (session.result(), session.definition()) {
        let rows: Vec<Line> = def
            .questions
            .iter()
            .enumerate()
            .filter_map(|(idx, q)| {
                let analysis = result.question_analysis.get(&q.id)?;
                let (label, style) = match analysis.status {
                    QuestionOutcome::Correct => ("correct  ", Style::default().fg(Color::Green)),
                    QuestionOutcome::Incorrect => ("incorrect", Style::default().fg(Color::Red)),
                    QuestionOutcome::Skipped => ("skipped  ", dim()),
                };
                let mut spans = vec![
                    Span::styled(format!("Q{:<3} ", idx + 1), bold()),
                    Span::styled(label, style),
                    Span::raw(format!(
                        "  {:>4}s  {:<6}",
                        analysis.time, analysis.difficulty
                    )),
                ];
                if let Some(answer) = &analysis.correct_answer {
                    spans.push(Span::styled(format!("  answer {answer}"), italic()));
                }
                Some(Line::from(spans))
            })
            .skip(app.results_scroll())
            .collect();

        Paragraph::new(rows)
            .block(Block::default().borders(Borders::ALL).title(" questions "))
            .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled(
        "(n)ew test / (h)istory / (up/down) scroll / (q)uit",
        italic(),
    ))
    .render(chunks[3], buf);
}

/// `name  correct/attempted  pct%`, coloured by how well it went.
fn performance_lines(
    rows: &BTreeMap<String, Performance>,
    name_width: usize,
) -> Vec<Line<'static>> {
    rows.iter()
        .map(|(name, perf)| {
            let pct = perf.percentage();
            let style = match pct {
                p if p >= 75.0 => Style::default().fg(Color::Green),
                p if p >= 40.0 => Style::default().fg(Color::Yellow),
                _ => Style::default().fg(Color::Red),
            };
            let name = truncate(name, name_width);
            let pad = name_width.saturating_sub(name.width());
            Line::from(vec![
                Span::raw(format!("{name}{} ", " ".repeat(pad))),
                Span::raw(format!("{:>3}/{:<3} ", perf.correct, perf.attempted)),
                Span::styled(format!("{pct:>4.0}%"), style),
            ])
        })
        .collect()
}

pub fn render_history<A: ExamApi>(app: &App<A>, area: Rect, buf: &mut Buffer) {
    let rows = app.history_rows();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),      // summary
            Constraint::Percentage(45), // chart
            Constraint::Min(1),         // table
            Constraint::Length(1),      // legend
        ])
        .split(area);

    if rows.is_empty() {
        Paragraph::new(Span::styled(
            "No attempts recorded yet",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    } else {
        let scores: Vec<f64> = score_points(rows).iter().map(|p| p.1).collect();
        let best = scores.iter().copied().fold(0.0_f64, f64::max);
        Paragraph::new(Span::styled(
            format!(
                "{} attempts   average {:.1}%   best {:.1}%",
                rows.len(),
                mean(&scores).unwrap_or_default(),
                best
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        render_score_trend(rows, chunks[1], buf);

        let now = Local::now();
        let table: Vec<Line> = rows
            .iter()
            .map(|e| {
                Line::from(vec![
                    Span::styled(format!("{:>6.1}%  ", e.score), bold()),
                    Span::raw(format!("{:<14} ", e.subject)),
                    Span::raw(format!("{:<30} ", truncate(&e.title, 30))),
                    Span::styled(format!("{:<9}", e.mode), dim()),
                    Span::styled(e.age(now), italic()),
                ])
            })
            .collect();

        Paragraph::new(table)
            .block(Block::default().borders(Borders::ALL).title(" history "))
            .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled("(b)ack / (q)uit", italic())).render(chunks[3], buf);
}

fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + 1 >= max {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}
