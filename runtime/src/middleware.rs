//! Action middleware and the error-reporting middleware.
//!
//! Middleware observe every action the store processes, before the reducer
//! runs. They never alter, delay or swallow actions.
//!
//! [`ErrorReporter`] is the single place where a failed async action becomes
//! user-visible: it recognizes typed rejections via [`ReportsRejection`] and
//! forwards one message per rejection to the registered [`NotificationSink`].

use pocketbook_core::ReportsRejection;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Message used when a rejection carries no usable text
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Observer invoked with each action before the reducer.
pub trait Middleware<A>: Send + Sync {
    /// Observe an action
    fn handle(&self, action: &A);
}

/// Destination for user-facing error notifications (for example a toast).
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    fn notify(&self, message: &str);
}

impl<F> NotificationSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message);
    }
}

/// Middleware that turns typed rejections into notifications.
///
/// Holds at most one sink. Registering a new sink replaces the previous one;
/// rejections seen while no sink is registered are dropped, not queued.
///
/// # Example
///
/// ```ignore
/// let reporter = ErrorReporter::new(TracingSink);
/// reporter.set_sink(ChannelSink::new(toasts_tx));
///
/// let store = Store::new(state, reducer, env).with_middleware(reporter);
/// ```
pub struct ErrorReporter<A> {
    sink: Arc<RwLock<Option<Arc<dyn NotificationSink>>>>,
    fallback: String,
    _action: PhantomData<fn(&A)>,
}

impl<A> ErrorReporter<A> {
    /// Create a reporter delivering to `sink`
    #[must_use]
    pub fn new(sink: impl NotificationSink + 'static) -> Self {
        let reporter = Self::detached();
        reporter.set_sink(sink);
        reporter
    }

    /// Create a reporter with no sink registered yet
    #[must_use]
    pub fn detached() -> Self {
        Self {
            sink: Arc::new(RwLock::new(None)),
            fallback: DEFAULT_FALLBACK_MESSAGE.to_string(),
            _action: PhantomData,
        }
    }

    /// Override the fallback message used for blank rejections
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Register the sink, replacing any previous registration
    pub fn set_sink(&self, sink: impl NotificationSink + 'static) {
        let mut slot = self
            .sink
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = Some(Arc::new(sink));
    }

    /// Unregister the current sink
    pub fn clear_sink(&self) {
        let mut slot = self
            .sink
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = None;
    }

    /// Message that would be delivered for a rejection carrying `message`
    #[must_use]
    pub fn notification_for<'a>(&'a self, message: &'a str) -> &'a str {
        if message.trim().is_empty() {
            &self.fallback
        } else {
            message
        }
    }

    fn current_sink(&self) -> Option<Arc<dyn NotificationSink>> {
        self.sink
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl<A> Clone for ErrorReporter<A> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            fallback: self.fallback.clone(),
            _action: PhantomData,
        }
    }
}

impl<A> std::fmt::Debug for ErrorReporter<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("fallback", &self.fallback)
            .field("has_sink", &self.current_sink().is_some())
            .finish()
    }
}

impl<A> Middleware<A> for ErrorReporter<A>
where
    A: ReportsRejection,
{
    fn handle(&self, action: &A) {
        let Some(rejection) = action.rejection() else {
            return;
        };

        metrics::counter!("middleware.rejections.total").increment(1);

        let Some(sink) = self.current_sink() else {
            tracing::debug!(rejection = %rejection, "Rejection dropped: no notification sink registered");
            return;
        };

        sink.notify(self.notification_for(&rejection.message));
    }
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, message: &str) {
        tracing::warn!(notification = message, "User notification");
    }
}

/// Sink that forwards notifications over an unbounded channel.
///
/// The UI layer owns the receiver and renders each message.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Create a sink writing to `sender`
    #[must_use]
    pub const fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }

    /// Create a sink and the receiver for its notifications
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, message: &str) {
        if self.sender.send(message.to_string()).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}
