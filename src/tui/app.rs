//! Dialer state and main event loop

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use ratatui::DefaultTerminal;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::messages;
use super::ui;
use crate::number;
use crate::workflow::{CallWorkflow, FlagHost, SharedUi, StartReport, UiSink};

/// Target frame rate for UI updates (~30 fps)
const FRAME_DURATION_MS: u64 = 33;

/// Focused control
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Number,
    CallButton,
}

/// Application state
pub struct App {
    workflow: CallWorkflow,
    ui: SharedUi,
    host: FlagHost,
    /// Focused control
    pub focus: Focus,
    /// Whether the app should exit
    pub should_exit: bool,
    /// Message log scroll offset (0 = newest on top)
    pub log_scroll: usize,
    /// User-triggered call currently running
    call_task: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(workflow: CallWorkflow, ui: SharedUi, host: FlagHost) -> Self {
        Self {
            workflow,
            ui,
            host,
            focus: Focus::default(),
            should_exit: false,
            log_scroll: 0,
            call_task: None,
        }
    }

    pub fn workflow(&self) -> &CallWorkflow {
        &self.workflow
    }

    pub fn ui(&self) -> &SharedUi {
        &self.ui
    }

    /// True while a user-triggered call has not resolved.
    pub fn call_in_flight(&self) -> bool {
        self.call_task
            .as_ref()
            .map_or(false, |task| !task.is_finished())
    }

    /// Handle one key press
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_exit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_exit = true
            }
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::Enter => self.trigger_call(),
            KeyCode::Up => {
                let max = self.ui.with_log(messages::max_scroll);
                self.log_scroll = (self.log_scroll + 1).min(max);
            }
            KeyCode::Down => self.log_scroll = self.log_scroll.saturating_sub(1),
            _ if self.focus == Focus::Number => self.edit_field(key),
            _ => {}
        }
    }

    fn edit_field(&mut self, key: KeyEvent) {
        self.ui.with_field(|field| match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => field.clear(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                field.insert_char(c)
            }
            KeyCode::Backspace => field.backspace(),
            KeyCode::Delete => field.delete(),
            KeyCode::Left => field.move_left(),
            KeyCode::Right => field.move_right(),
            KeyCode::Home => field.move_home(),
            KeyCode::End => field.move_end(),
            _ => {}
        });
    }

    /// Switch focus; leaving the number field reformats it.
    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Number => {
                self.workflow.on_field_blur();
                Focus::CallButton
            }
            Focus::CallButton => Focus::Number,
        };
    }

    /// Start a call for the field contents unless one is already running.
    fn trigger_call(&mut self) {
        if self.call_in_flight() {
            tracing::debug!("Call already in flight, ignoring");
            return;
        }
        let workflow = self.workflow.clone();
        self.call_task = Some(tokio::spawn(async move {
            // Outcome is already in the message log.
            let _ = workflow.on_call_action().await;
        }));
        self.log_scroll = 0;
    }

    /// Exit once the host asked to close.
    fn poll_host(&mut self) {
        if self.host.close_requested() {
            self.should_exit = true;
        }
    }
}

/// Run the dialer with panic-safe terminal restore.
///
/// `initial` pre-fills the number field; with `auto_trigger` it is dialed
/// as soon as the status check finishes.
pub async fn run(
    workflow: CallWorkflow,
    ui: SharedUi,
    host: FlagHost,
    initial: Option<String>,
    auto_trigger: bool,
) -> Result<()> {
    if let Some(raw) = &initial {
        ui.set_field_value(number::display(raw));
    }
    let app = App::new(workflow, ui, host);

    let mut terminal = ratatui::init();
    let result = AssertUnwindSafe(run_app(&mut terminal, app, initial, auto_trigger))
        .catch_unwind()
        .await;
    ratatui::restore();

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    mut app: App,
    initial: Option<String>,
    auto_trigger: bool,
) -> Result<()> {
    let workflow = app.workflow.clone();
    let start_task =
        tokio::spawn(async move { workflow.start(initial.as_deref(), auto_trigger).await });

    let mut events = EventStream::new();
    let mut frame_tick = tokio::time::interval(Duration::from_millis(FRAME_DURATION_MS));

    while !app.should_exit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            _ = frame_tick.tick() => {}
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => app.should_exit = true,
            },
        }

        app.poll_host();
    }

    settle_start(start_task).await;
    Ok(())
}

/// Called on exit: stop the start sequence and any close it scheduled.
async fn settle_start(start_task: JoinHandle<StartReport>) {
    if !start_task.is_finished() {
        start_task.abort();
        return;
    }
    match start_task.await {
        Ok(report) => {
            if let Some(close) = report.close {
                close.cancel();
            }
        }
        Err(e) => tracing::error!("Start sequence failed: {}", e),
    }
}
