use tokio::sync::watch;
use tracing::trace;

/// Snapshot of the window layout values settings pages read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Inner window width in logical pixels.
    pub width: u32,
    /// Width of the side pane once it has been laid out.
    pub pane_width: Option<u32>,
}

/// Process-wide window properties.
///
/// Created once at start-up and passed to whoever needs it; mutated only
/// through [`WindowProperties::resize`] and [`WindowProperties::set_pane_width`].
#[derive(Debug)]
pub struct WindowProperties {
    tx: watch::Sender<WindowSnapshot>,
}

impl WindowProperties {
    pub fn new(width: u32) -> Self {
        let (tx, _) = watch::channel(WindowSnapshot {
            width,
            pane_width: None,
        });
        Self { tx }
    }

    pub fn width(&self) -> u32 {
        self.tx.borrow().width
    }

    pub fn pane_width(&self) -> Option<u32> {
        self.tx.borrow().pane_width
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        *self.tx.borrow()
    }

    /// Window resize notification.
    pub fn resize(&self, width: u32) {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.width == width {
                return false;
            }
            trace!(width, "window resized");
            snapshot.width = width;
            true
        });
    }

    pub fn set_pane_width(&self, pane_width: u32) {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.pane_width == Some(pane_width) {
                return false;
            }
            snapshot.pane_width = Some(pane_width);
            true
        });
    }

    /// Observe future changes.
    pub fn subscribe(&self) -> watch::Receiver<WindowSnapshot> {
        self.tx.subscribe()
    }
}
