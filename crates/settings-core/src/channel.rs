use tokio::sync::broadcast;
use tracing::trace;

use crate::{
    header::{HeaderEvent, HeaderPatch},
    ports::HeaderObserver,
};

/// Broadcast stream type used by header subscribers.
pub type HeaderStream = broadcast::Receiver<HeaderEvent>;

/// Header preview fan-out shared by the settings forms and the app header.
#[derive(Clone, Debug)]
pub struct HeaderChannel {
    event_tx: broadcast::Sender<HeaderEvent>,
}

impl HeaderChannel {
    /// Create a channel that buffers up to `buffer` events per subscriber.
    pub fn new(buffer: usize) -> Self {
        let (event_tx, _) = broadcast::channel(buffer.max(1));
        Self { event_tx }
    }

    /// Subscribe to header preview events.
    pub fn subscribe(&self) -> HeaderStream {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Emission is best-effort: with no subscribers (the header is gone) the
    /// event is dropped.
    pub fn emit(&self, event: HeaderEvent) {
        if self.event_tx.send(event).is_err() {
            trace!("header event dropped: no subscribers");
        }
    }
}

impl HeaderObserver for HeaderChannel {
    fn notify(&self, patch: &HeaderPatch) {
        self.emit(HeaderEvent::Patched(patch.clone()));
    }

    fn reset(&self) {
        self.emit(HeaderEvent::Reset);
    }
}
