//! Message log pane: timestamped status and error messages, newest on top.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::workflow::ui::{Message, MessageLog};
use crate::workflow::MessageKind;

/// Render the message pane. `scroll` skips that many of the newest entries.
pub fn render(area: Rect, buf: &mut Buffer, log: &MessageLog, scroll: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Messages ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if log.is_empty() {
        let hint = Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        ));
        Paragraph::new(hint).render(inner, buf);
        return;
    }

    let lines: Vec<Line> = log
        .iter()
        .skip(scroll)
        .take(inner.height as usize)
        .map(message_line)
        .collect();

    Paragraph::new(lines).render(inner, buf);
}

/// Largest useful scroll offset for a log.
pub fn max_scroll(log: &MessageLog) -> usize {
    log.len().saturating_sub(1)
}

fn message_line(message: &Message) -> Line<'static> {
    let color = match message.kind {
        MessageKind::Info => Color::Green,
        MessageKind::Error => Color::Red,
    };

    Line::from(vec![
        Span::styled(
            format!("{} ", message.at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("{}: ", message.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(message.text.clone(), Style::default().fg(color)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DialError;
    use crate::workflow::ui::{SharedUi, UiSink};

    fn rendered(log: &MessageLog, scroll: usize) -> Vec<String> {
        let area = Rect::new(0, 0, 60, 5);
        let mut buf = Buffer::empty(area);
        render(area, &mut buf, log, scroll);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_newest_message_on_top() {
        let ui = SharedUi::new();
        ui.show_message("phone status", "OK");
        ui.show_error(&DialError::InvalidNumber);

        let rows = ui.with_log(|log| rendered(log, 0));
        assert!(rows[1].contains("error: invalid number"), "{:?}", rows);
        assert!(rows[2].contains("phone status: OK"), "{:?}", rows);
    }

    #[test]
    fn test_scroll_skips_newest() {
        let ui = SharedUi::new();
        ui.show_message("phone status", "OK");
        ui.show_message("call", "call started");

        let rows = ui.with_log(|log| rendered(log, 1));
        assert!(rows[1].contains("phone status: OK"), "{:?}", rows);
        assert_eq!(ui.with_log(max_scroll), 1);
    }

    #[test]
    fn test_empty_log_hint() {
        let rows = rendered(&MessageLog::default(), 0);
        assert!(rows[1].contains("No messages yet"), "{:?}", rows);
    }

    #[test]
    fn test_error_lines_are_red() {
        let ui = SharedUi::new();
        ui.show_error(&DialError::status(500));
        let line = ui.with_log(|log| message_line(log.iter().next().unwrap()));
        assert_eq!(line.spans[2].style.fg, Some(Color::Red));
        assert_eq!(
            line.spans[2].content,
            "Request failed with status 500: Internal Server Error"
        );
    }
}
