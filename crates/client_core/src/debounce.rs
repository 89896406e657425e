//! Debounced delivery of search terms.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time};

pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(500);

/// Holds back rapid keystrokes and emits only the latest term once input
/// has been quiet for the configured window. Each new submission aborts
/// the previously scheduled delivery, so at most one term is in flight.
pub struct SearchDebouncer {
    delay: Duration,
    outbound: mpsc::UnboundedSender<String>,
    pending: Option<JoinHandle<()>>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound, inbound) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                outbound,
                pending: None,
            },
            inbound,
        )
    }

    pub fn with_default_delay() -> (Self, mpsc::UnboundedReceiver<String>) {
        Self::new(DEFAULT_QUIESCENCE)
    }

    /// Schedules `term` for delivery after the quiet window. Must be called
    /// from within a tokio runtime.
    pub fn submit(&mut self, term: impl Into<String>) {
        self.cancel();

        let term = term.into();
        let delay = self.delay;
        let outbound = self.outbound.clone();
        self.pending = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            // The receiver being gone just means nobody is listening anymore.
            let _ = outbound.send(term);
        }));
    }

    /// Drops the scheduled delivery, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
