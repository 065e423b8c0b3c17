pub mod charting;
pub mod exam;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::app::{App, AppState, Dialog};
use crate::gateway::ExamApi;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub(crate) fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

impl<A: ExamApi> Widget for &App<A> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(if self.error().is_some() { 3 } else { 0 }),
            ])
            .split(area);

        match self.state() {
            AppState::Setup => screen::render_setup(self, chunks[0], buf),
            AppState::Preview => screen::render_preview(self, chunks[0], buf),
            AppState::Taking => exam::render_taking(self, chunks[0], buf),
            AppState::Results => screen::render_results(self, chunks[0], buf),
            AppState::History => screen::render_history(self, chunks[0], buf),
        }

        if let Some(message) = self.error() {
            render_error_banner(message, chunks[1], buf);
        }

        if let Some(dialog) = self.dialog() {
            render_dialog(dialog, area, buf);
        }

        if let Some(request) = self.pending() {
            render_popup(
                request.label(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                area,
                buf,
            );
        }
    }
}

fn render_error_banner(message: &str, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Line::from(vec![
        Span::styled(message.to_string(), Style::default().fg(Color::Red)),
        Span::styled("  (esc to dismiss)", dim()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" error "),
    )
    .wrap(Wrap { trim: true })
    .render(area, buf);
}

fn render_dialog(dialog: Dialog, area: Rect, buf: &mut Buffer) {
    let text = match dialog {
        Dialog::ConfirmSubmit => "Submit your answers now? (y/n)",
        Dialog::ConfirmLeave => "Leave this attempt? Your answers will be lost. (y/n)",
    };
    render_popup(text, bold(), area, buf);
}

fn render_popup(text: &str, style: Style, area: Rect, buf: &mut Buffer) {
    let width = (text.len() as u16 + 6).min(area.width);
    let popup = centered(area, width, 3);
    Clear.render(popup, buf);
    Paragraph::new(Span::styled(text.to_string(), style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(popup, buf);
}

pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 80, 24);
        let popup = centered(area, 40, 3);
        assert_eq!(popup, Rect::new(20, 10, 40, 3));

        let tiny = Rect::new(0, 0, 10, 2);
        let popup = centered(tiny, 40, 3);
        assert_eq!(popup, tiny);
    }

    #[test]
    fn test_ui_constants_consistency() {
        const _: () = assert!(HORIZONTAL_MARGIN * 2 < 80);
        const _: () = assert!(VERTICAL_MARGIN * 2 < 24);
    }

    #[test]
    fn test_error_banner_rendered() {
        let area = Rect::new(0, 0, 60, 3);
        let mut buf = Buffer::empty(area);
        render_error_banner("Could not reach the exam service", area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Could not reach"));
        assert!(text.contains("error"));
    }

    #[test]
    fn test_render_text_helper_shape() {
        use crate::app::App;
        use crate::config::Config;
        use crate::exam::{ScoredResult, TestDefinition};
        use crate::gateway::*;
        use crate::error::ApiError;
        use std::sync::Arc;

        struct Offline;
        impl TestGenerator for Offline {
            fn generate(&self, _: &GenerationParams) -> Result<TestDefinition, ApiError> {
                Err(ApiError::Transport("offline".into()))
            }
        }
        impl AttemptRegistry for Offline {
            fn start_attempt(&self, _: &str) -> Result<AttemptTicket, ApiError> {
                Err(ApiError::Transport("offline".into()))
            }
        }
        impl SubmissionGateway for Offline {
            fn submit(&self, _: &str, _: &SubmissionPayload) -> Result<ScoredResult, ApiError> {
                Err(ApiError::Transport("offline".into()))
            }
        }

        let mut app = App::new(Arc::new(Offline), Config::default(), None);
        app.on_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Enter,
            crossterm::event::KeyModifiers::NONE,
        ));
        assert!(render_text(&app).contains("Generating your test"));

        app.run_pending();
        let text = render_text(&app);
        assert!(text.contains("Could not reach the exam service"));
        assert_eq!(render_lines(&app, 100, 30).len(), 30);
    }
}
