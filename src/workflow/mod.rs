//! Dial workflow: status check, automatic call, user-triggered calls and the
//! close that follows an automatic call.
//!
//! The workflow owns no I/O of its own. It talks to the phone system through
//! [`PhoneSystem`], reports to a [`UiSink`] and closes its host through a
//! [`HostContext`]. Every operation resolves on its own; a failed status check
//! never stops a later call.

pub mod host;
pub mod ui;

use std::sync::{Arc, Mutex};

use crate::endpoint::{EndpointConfig, PhoneSystem};
use crate::error::{is_success, DialError};
use crate::number;

pub use host::{FlagHost, HostContext, PendingClose, CLOSE_DELAY};
pub use ui::{ConsoleUi, MessageKind, SharedUi, UiSink};

/// Where a workflow instance is in its lifecycle.
///
/// `Completed` and `Failed` are not final: a new call moves back to `Calling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    CheckingStatus,
    AutoCalling,
    Ready,
    Calling,
    Completed,
    Failed,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::CheckingStatus => "checking status",
            WorkflowState::AutoCalling => "auto-calling",
            WorkflowState::Ready => "ready",
            WorkflowState::Calling => "calling",
            WorkflowState::Completed => "call started",
            WorkflowState::Failed => "failed",
        }
    }
}

/// Result of one workflow step, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    StatusOk,
    StatusError(DialError),
    /// Carries the canonical number that was dialed.
    CallStarted(String),
    CallFailed(DialError),
}

impl CallOutcome {
    fn from_status(result: &Result<u16, DialError>) -> Self {
        match result {
            Ok(_) => CallOutcome::StatusOk,
            Err(e) => CallOutcome::StatusError(e.clone()),
        }
    }

    fn from_call(result: &Result<CallStarted, DialError>) -> Self {
        match result {
            Ok(started) => CallOutcome::CallStarted(started.number.clone()),
            Err(e) => CallOutcome::CallFailed(e.clone()),
        }
    }
}

/// A call the phone system accepted.
pub struct CallStarted {
    /// Canonical number sent to the phone system.
    pub number: String,
    /// Close timer, present when the call was made with auto-close.
    pub close: Option<PendingClose>,
}

/// What `start` did.
pub struct StartReport {
    pub status: CallOutcome,
    /// Present when an automatic call was attempted.
    pub auto_call: Option<CallOutcome>,
    pub close: Option<PendingClose>,
}

/// One dial workflow. Clones share state and capabilities.
#[derive(Clone)]
pub struct CallWorkflow {
    endpoint: Arc<EndpointConfig>,
    phone: Arc<dyn PhoneSystem>,
    ui: Arc<dyn UiSink>,
    host: Arc<dyn HostContext>,
    state: Arc<Mutex<WorkflowState>>,
}

impl CallWorkflow {
    pub fn new(
        endpoint: EndpointConfig,
        phone: Arc<dyn PhoneSystem>,
        ui: Arc<dyn UiSink>,
        host: Arc<dyn HostContext>,
    ) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            phone,
            ui,
            host,
            state: Arc::new(Mutex::new(WorkflowState::Idle)),
        }
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn state(&self) -> WorkflowState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: WorkflowState) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        tracing::debug!("Workflow {} -> {}", guard.as_str(), next.as_str());
        *guard = next;
    }

    /// Ask the phone system for its status and report the result.
    pub async fn check_status(&self) -> Result<u16, DialError> {
        let result = match self.phone.request_status().await {
            Ok(code) if is_success(code) => Ok(code),
            Ok(code) => Err(DialError::status(code)),
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => self.ui.show_message("phone status", "OK"),
            Err(e) => self.ui.show_error(e),
        }
        result
    }

    /// Check status, then call `initial` automatically if asked to.
    ///
    /// The automatic call waits for the status check and happens whatever
    /// its outcome. It only fires for input that cleans to a non-empty number.
    pub async fn start(&self, initial: Option<&str>, auto_trigger: bool) -> StartReport {
        self.set_state(WorkflowState::CheckingStatus);
        let status = CallOutcome::from_status(&self.check_status().await);

        let initial = initial.filter(|raw| !number::clean(raw).is_empty());
        match (auto_trigger, initial) {
            (true, Some(raw)) => {
                self.set_state(WorkflowState::AutoCalling);
                let result = self.make_call(raw, true).await;
                let auto_call = Some(CallOutcome::from_call(&result));
                StartReport {
                    status,
                    auto_call,
                    close: result.ok().and_then(|started| started.close),
                }
            }
            _ => {
                self.set_state(WorkflowState::Ready);
                StartReport {
                    status,
                    auto_call: None,
                    close: None,
                }
            }
        }
    }

    /// Place a call to `raw` after cleaning it.
    ///
    /// Input without any digits is rejected before a request is made. With
    /// `auto_close`, a successful call schedules the host close.
    pub async fn make_call(&self, raw: &str, auto_close: bool) -> Result<CallStarted, DialError> {
        let number = number::clean(raw);
        if number.is_empty() {
            let err = DialError::InvalidNumber;
            self.ui.show_error(&err);
            return Err(err);
        }

        self.set_state(WorkflowState::Calling);
        tracing::info!("Calling {}", number);

        let result = match self
            .phone
            .initiate_call(
                &number,
                self.endpoint.do_not_prompt(),
                self.endpoint.calling_device(),
            )
            .await
        {
            Ok(code) if is_success(code) => Ok(()),
            Ok(code) => Err(DialError::status(code)),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.set_state(WorkflowState::Completed);
                self.ui.show_message("call", "call started");
                let close = auto_close
                    .then(|| PendingClose::schedule(Arc::clone(&self.host), CLOSE_DELAY));
                Ok(CallStarted { number, close })
            }
            Err(e) => {
                self.set_state(WorkflowState::Failed);
                self.ui.show_error(&e);
                Err(e)
            }
        }
    }

    /// The number field lost focus: show it in display form.
    pub fn on_field_blur(&self) {
        let value = self.ui.field_value();
        self.ui.set_field_value(number::display(&value));
    }

    /// Enter pressed or call button used.
    ///
    /// An empty field does nothing. Anything else is dialed; input that
    /// cleans to nothing is reported as an invalid number.
    pub async fn on_call_action(&self) -> Option<Result<CallStarted, DialError>> {
        let value = self.ui.field_value();
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(self.make_call(value, false).await)
    }
}
