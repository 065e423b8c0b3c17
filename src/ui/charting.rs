use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Chart, Dataset, GraphType, Widget},
};

use crate::history::HistoryEntry;
use crate::ui::bold;

/// Score per attempt, oldest first, indexed from 1. `rows` come newest first.
pub fn score_points(rows: &[HistoryEntry]) -> Vec<(f64, f64)> {
    rows.iter()
        .rev()
        .enumerate()
        .map(|(i, e)| ((i + 1) as f64, e.score))
        .collect()
}

/// Compute X (attempts) and Y (score) bounds for the trend chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest = points
        .iter()
        .map(|&(_, score)| score)
        .fold(0.0_f64, f64::max);

    let overall = match points.last() {
        Some(p) => p.0.max(2.0),
        None => 2.0,
    };

    (overall, highest.max(100.0).round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

pub fn render_score_trend(rows: &[HistoryEntry], area: Rect, buf: &mut Buffer) {
    let points = score_points(rows);
    let (attempts, top) = compute_chart_params(&points);

    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("attempt")
                .bounds([1.0, attempts])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(format_label(attempts), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("score %")
                .bounds([0.0, top])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(format_label(top), bold()),
                ]),
        )
        .render(area, buf);
}
