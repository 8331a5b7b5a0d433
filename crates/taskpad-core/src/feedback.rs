//! User-visible side effects requested by the core: toasts and navigation.
//!
//! The core never draws anything. It hands a `Toast` or a `Route` to a
//! `Feedback` implementation and, for toasts, gets back a `Dismissal` it can
//! await when the next step has to wait until the user has seen the message.
//!
//! `ChannelFeedback` forwards both as `UiEvent`s over an unbounded channel.
//! The front end drains the receiver on every tick and completes the
//! dismissal sender once a toast has gone away.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
    /// How long the toast stays up before it dismisses itself
    pub timeout: Duration,
}

impl Toast {
    pub fn success(message: impl Into<String>, timeout: Duration) -> Self {
        Self {
            level: ToastLevel::Success,
            title: String::new(),
            message: message.into(),
            timeout,
        }
    }

    pub fn error(message: impl Into<String>, timeout: Duration) -> Self {
        Self {
            level: ToastLevel::Error,
            title: String::new(),
            message: message.into(),
            timeout,
        }
    }

    pub fn info(message: impl Into<String>, timeout: Duration) -> Self {
        Self {
            level: ToastLevel::Info,
            title: String::new(),
            message: message.into(),
            timeout,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Screens the core can send the user to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
}

/// Resolves once the toast it belongs to has been dismissed.
///
/// A dismissal whose sending half was dropped (the UI went away, or never
/// tracked the toast) resolves immediately.
#[derive(Debug)]
pub struct Dismissal {
    rx: Option<oneshot::Receiver<()>>,
}

impl Dismissal {
    pub fn new(rx: oneshot::Receiver<()>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A dismissal that has already happened
    pub fn immediate() -> Self {
        Self { rx: None }
    }

    pub async fn wait(self) {
        if let Some(rx) = self.rx {
            // Err means the sender was dropped, which counts as dismissed
            let _ = rx.await;
        }
    }
}

pub trait Feedback: Send + Sync {
    fn toast(&self, toast: Toast) -> Dismissal;

    fn navigate(&self, route: Route);
}

#[derive(Debug)]
pub enum UiEvent {
    Toast {
        toast: Toast,
        /// Complete (or drop) once the toast is gone
        dismissed: oneshot::Sender<()>,
    },
    Navigate(Route),
}

/// `Feedback` that forwards everything to a channel receiver.
#[derive(Clone)]
pub struct ChannelFeedback {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelFeedback {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Feedback for ChannelFeedback {
    fn toast(&self, toast: Toast) -> Dismissal {
        let (dismissed, rx) = oneshot::channel();
        debug!(level = ?toast.level, message = %toast.message, "Toast requested");
        if self.tx.send(UiEvent::Toast { toast, dismissed }).is_err() {
            debug!("UI event receiver closed, toast dropped");
            return Dismissal::immediate();
        }
        Dismissal::new(rx)
    }

    fn navigate(&self, route: Route) {
        debug!(?route, "Navigation requested");
        if self.tx.send(UiEvent::Navigate(route)).is_err() {
            debug!("UI event receiver closed, navigation dropped");
        }
    }
}
