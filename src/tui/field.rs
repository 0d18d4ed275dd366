//! Number input box and call button.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};

use crate::workflow::ui::NumberField;

/// Height of the input row: border + text + border.
pub const FIELD_HEIGHT: u16 = 3;
/// Width of the call button including borders.
pub const BUTTON_WIDTH: u16 = 12;

fn border(focused: bool) -> Block<'static> {
    let (style, kind) = if focused {
        (Style::default().fg(Color::Yellow), BorderType::Double)
    } else {
        (Style::default().fg(Color::DarkGray), BorderType::Plain)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(kind)
        .border_style(style)
}

/// Render the number field, placing the terminal cursor when focused.
pub fn render(area: Rect, frame: &mut Frame, field: &NumberField, focused: bool) {
    let block = border(focused).title(Span::styled(
        " Number ",
        Style::default().fg(Color::Cyan),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }
    let input_area = Rect::new(inner.x, inner.y, inner.width, 1);

    if field.text().is_empty() {
        let placeholder: String = " Enter a number..."
            .chars()
            .take(input_area.width as usize)
            .collect();
        Paragraph::new(Line::from(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray),
        )))
        .render(input_area, frame.buffer_mut());
        if focused {
            frame.set_cursor_position((input_area.x + 1, input_area.y));
        }
        return;
    }

    let window = visible_window(field.text(), field.cursor(), input_area.width as usize);
    Paragraph::new(Line::from(Span::styled(
        format!(" {}", window.visible),
        Style::default().fg(Color::White),
    )))
    .render(input_area, frame.buffer_mut());

    if focused {
        let x = input_area.x + 1 + window.cursor_offset as u16;
        frame.set_cursor_position((x, input_area.y));
    }
}

/// Render the call button. Dimmed while a call is in flight.
pub fn render_button(area: Rect, buf: &mut Buffer, focused: bool, busy: bool) {
    let block = border(focused);
    let inner = block.inner(area);
    block.render(area, buf);

    let style = if busy {
        Style::default().fg(Color::DarkGray)
    } else if focused {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    let label = if busy { "..." } else { "Call" };

    Paragraph::new(Line::from(Span::styled(label, style)))
        .centered()
        .render(inner, buf);
}

/// Portion of the field text that fits, and where the cursor lands in it.
struct Window {
    visible: String,
    cursor_offset: usize,
}

/// Scroll horizontally so the cursor stays visible.
///
/// One column on the left is reserved for padding.
fn visible_window(text: &str, cursor: usize, width: usize) -> Window {
    let avail = width.saturating_sub(1);
    if avail == 0 {
        return Window {
            visible: String::new(),
            cursor_offset: 0,
        };
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() < avail {
        return Window {
            visible: text.to_string(),
            cursor_offset: cursor,
        };
    }

    let start = if cursor < avail { 0 } else { cursor - avail + 1 };
    let end = (start + avail).min(chars.len());
    Window {
        visible: chars[start..end].iter().collect(),
        cursor_offset: cursor - start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_fits() {
        let w = visible_window("079 123", 3, 20);
        assert_eq!(w.visible, "079 123");
        assert_eq!(w.cursor_offset, 3);
    }

    #[test]
    fn test_window_scrolls_to_cursor() {
        // 5 columns usable after the padding column.
        let w = visible_window("0041791234567", 13, 6);
        assert_eq!(w.visible, "4567");
        assert_eq!(w.cursor_offset, 4);

        let w = visible_window("0041791234567", 2, 6);
        assert_eq!(w.visible, "00417");
        assert_eq!(w.cursor_offset, 2);
    }

    #[test]
    fn test_window_zero_width() {
        let w = visible_window("0791234567", 4, 1);
        assert!(w.visible.is_empty());
        assert_eq!(w.cursor_offset, 0);
    }

    #[test]
    fn test_button_labels() {
        let area = Rect::new(0, 0, BUTTON_WIDTH, FIELD_HEIGHT);
        let mut buf = Buffer::empty(area);
        render_button(area, &mut buf, true, false);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Call"));

        let mut buf = Buffer::empty(area);
        render_button(area, &mut buf, true, true);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("..."));
        assert!(!text.contains("Call"));
    }
}
