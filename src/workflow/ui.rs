//! UI sink: where the workflow reports messages and reads the number field.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};

use crate::error::DialError;

/// Maximum number of messages kept in the log.
const MAX_MESSAGES: usize = 200;

/// What the workflow needs from whatever is showing it.
pub trait UiSink: Send + Sync {
    /// Append an informational message.
    fn show_message(&self, title: &str, text: &str);
    /// Append an error message.
    fn show_error(&self, error: &DialError);
    /// Current contents of the number field.
    fn field_value(&self) -> String;
    /// Replace the contents of the number field.
    fn set_field_value(&self, value: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// One timestamped entry in the message log.
#[derive(Debug, Clone)]
pub struct Message {
    pub at: DateTime<Local>,
    pub kind: MessageKind,
    pub title: String,
    pub text: String,
}

impl Message {
    fn new(kind: MessageKind, title: &str, text: &str) -> Self {
        Self {
            at: Local::now(),
            kind,
            title: title.to_string(),
            text: text.to_string(),
        }
    }
}

/// Message log, most recent first.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: VecDeque<Message>,
}

impl MessageLog {
    /// Insert at the front, dropping the oldest entry past capacity.
    pub fn push(&mut self, message: Message) {
        self.entries.push_front(message);
        self.entries.truncate(MAX_MESSAGES);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Editable number field with a character cursor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NumberField {
    text: String,
    cursor: usize,
}

impl NumberField {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position as a character offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the text and put the cursor at the end.
    pub fn set(&mut self, text: String) {
        self.cursor = text.chars().count();
        self.text = text;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let end = self.char_to_byte(self.cursor);
            let start = self.char_to_byte(self.cursor - 1);
            self.text.drain(start..end);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let start = self.char_to_byte(self.cursor);
            let end = self.char_to_byte(self.cursor + 1);
            self.text.drain(start..end);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

#[derive(Debug, Default)]
struct UiState {
    field: NumberField,
    log: MessageLog,
}

/// UI state shared between the workflow tasks and the dialer's render loop.
#[derive(Clone, Default)]
pub struct SharedUi {
    inner: Arc<Mutex<UiState>>,
}

impl SharedUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the number field under the lock.
    pub fn with_field<R>(&self, f: impl FnOnce(&mut NumberField) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard.field)
    }

    /// Run `f` against the message log under the lock.
    pub fn with_log<R>(&self, f: impl FnOnce(&MessageLog) -> R) -> R {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&guard.log)
    }

    fn push(&self, message: Message) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.log.push(message);
    }
}

impl UiSink for SharedUi {
    fn show_message(&self, title: &str, text: &str) {
        tracing::info!("{}: {}", title, text);
        self.push(Message::new(MessageKind::Info, title, text));
    }

    fn show_error(&self, error: &DialError) {
        tracing::warn!("{}", error);
        self.push(Message::new(MessageKind::Error, "error", &error.to_string()));
    }

    fn field_value(&self) -> String {
        self.with_field(|f| f.text().to_string())
    }

    fn set_field_value(&self, value: String) {
        self.with_field(|f| f.set(value));
    }
}

/// Sink for headless commands: messages go straight to the terminal.
#[derive(Default)]
pub struct ConsoleUi {
    field: Mutex<String>,
}

impl ConsoleUi {
    pub fn new(initial: &str) -> Self {
        Self {
            field: Mutex::new(initial.to_string()),
        }
    }
}

impl UiSink for ConsoleUi {
    fn show_message(&self, title: &str, text: &str) {
        println!("[{}] {}: {}", Local::now().format("%H:%M:%S"), title, text);
    }

    fn show_error(&self, error: &DialError) {
        eprintln!("[{}] error: {}", Local::now().format("%H:%M:%S"), error);
    }

    fn field_value(&self) -> String {
        self.field.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_field_value(&self, value: String) {
        *self.field.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_most_recent_first() {
        let ui = SharedUi::new();
        ui.show_message("phone status", "OK");
        ui.show_error(&DialError::InvalidNumber);
        ui.show_message("call", "call started");

        let titles: Vec<String> = ui.with_log(|log| log.iter().map(|m| m.title.clone()).collect());
        assert_eq!(titles, vec!["call", "error", "phone status"]);

        let kinds: Vec<MessageKind> = ui.with_log(|log| log.iter().map(|m| m.kind).collect());
        assert_eq!(
            kinds,
            vec![MessageKind::Info, MessageKind::Error, MessageKind::Info]
        );
    }

    #[test]
    fn test_log_capacity() {
        let mut log = MessageLog::default();
        for i in 0..250 {
            log.push(Message::new(MessageKind::Info, "n", &i.to_string()));
        }
        assert_eq!(log.len(), 200);
        assert_eq!(log.iter().next().unwrap().text, "249");
        assert_eq!(log.iter().last().unwrap().text, "50");
    }

    #[test]
    fn test_field_editing() {
        let mut field = NumberField::default();
        for c in "0791".chars() {
            field.insert_char(c);
        }
        field.move_left();
        field.move_left();
        field.insert_char(' ');
        assert_eq!(field.text(), "07 91");
        assert_eq!(field.cursor(), 3);

        field.backspace();
        assert_eq!(field.text(), "0791");
        field.move_home();
        field.delete();
        assert_eq!(field.text(), "791");
        field.move_end();
        field.move_right();
        assert_eq!(field.cursor(), 3);
    }

    #[test]
    fn test_set_moves_cursor_to_end() {
        let ui = SharedUi::new();
        ui.set_field_value("079 123 45 67".to_string());
        assert_eq!(ui.field_value(), "079 123 45 67");
        assert_eq!(ui.with_field(|f| f.cursor()), 13);
    }

    #[test]
    fn test_console_field() {
        let ui = ConsoleUi::new("+41 79");
        assert_eq!(ui.field_value(), "+41 79");
        ui.set_field_value("0041 79".to_string());
        assert_eq!(ui.field_value(), "0041 79");
    }
}
