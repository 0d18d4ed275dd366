//! UI rendering for the dialer

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use super::app::{App, Focus};
use super::field;
use super::messages;
use crate::workflow::WorkflowState;

/// State indicator color for the header
fn state_color(state: WorkflowState) -> Color {
    match state {
        WorkflowState::Completed => Color::Green,
        WorkflowState::Failed => Color::Red,
        WorkflowState::Calling | WorkflowState::AutoCalling | WorkflowState::CheckingStatus => {
            Color::Yellow
        }
        WorkflowState::Idle | WorkflowState::Ready => Color::Gray,
    }
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header + input row + message log + key hints
    let [header_area, input_area, log_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(field::FIELD_HEIGHT),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);

    let [number_area, button_area] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(field::BUTTON_WIDTH),
    ])
    .areas(input_area);

    let number = app.ui().with_field(|f| f.clone());
    field::render(number_area, frame, &number, app.focus == Focus::Number);
    field::render_button(
        button_area,
        frame.buffer_mut(),
        app.focus == Focus::CallButton,
        app.call_in_flight(),
    );

    app.ui()
        .with_log(|log| messages::render(log_area, frame.buffer_mut(), log, app.log_scroll));

    render_status(status_area, frame.buffer_mut());
}

/// Render the header bar
fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let state = app.workflow().state();
    let title = " dialbridge";
    let endpoint = format!(" {} ", app.workflow().endpoint().status_url());
    let state_text = format!(" {} ", state.as_str());

    let padding_width = area
        .width
        .saturating_sub((title.len() + endpoint.len() + state_text.len()) as u16)
        as usize;

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(padding_width)),
        Span::styled(endpoint, Style::default().fg(Color::Cyan)),
        Span::styled(state_text, Style::default().fg(state_color(state))),
    ]);

    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Render the key hint bar
fn render_status(area: Rect, buf: &mut Buffer) {
    let key = Style::default().fg(Color::Cyan);
    let sep = Span::styled(" | ", Style::default().fg(Color::Gray));

    let line = Line::from(vec![
        Span::styled(" Enter: call", key),
        sep.clone(),
        Span::styled("Tab: switch focus", key),
        sep.clone(),
        Span::styled("Up/Down: scroll", key),
        sep,
        Span::styled("Esc: quit", key),
    ]);

    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}
