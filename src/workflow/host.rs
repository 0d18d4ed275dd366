//! Hosting context and the delayed close after an automatic call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Delay between a successful automatic call and closing the host.
pub const CLOSE_DELAY: Duration = Duration::from_millis(500);

/// Whatever hosts the workflow: a dialer window, a headless launcher.
pub trait HostContext: Send + Sync {
    /// True when another program opened us and expects us to go away.
    fn is_embedded_launch(&self) -> bool;
    /// Close the host.
    fn close(&self);
}

/// Host that records a close request in a flag polled by its owner.
#[derive(Clone)]
pub struct FlagHost {
    embedded: bool,
    closed: Arc<AtomicBool>,
}

impl FlagHost {
    pub fn new(embedded: bool) -> Self {
        Self {
            embedded,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn close_requested(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl HostContext for FlagHost {
    fn is_embedded_launch(&self) -> bool {
        self.embedded
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A scheduled host close.
///
/// Dropping the handle leaves the timer running.
pub struct PendingClose {
    deadline: Instant,
    handle: JoinHandle<()>,
}

impl PendingClose {
    /// Close `host` after `delay`, if it is an embedded launch at that time.
    pub(crate) fn schedule(host: Arc<dyn HostContext>, delay: Duration) -> Self {
        let deadline = Instant::now() + delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if host.is_embedded_launch() {
                tracing::info!("Closing after automatic call");
                host.close();
            } else {
                tracing::debug!("Not an embedded launch, staying open");
            }
        });

        Self { deadline, handle }
    }

    /// When the close fires.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Stop the timer. No-op if it already fired.
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Wait for the timer to fire (or be aborted).
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::error!("Close timer failed: {}", e);
            }
        }
    }
}
