//! Query events.

use std::fmt;
use std::time::Duration;

use strata_sql::SqlValue;

/// Dispatched after every statement the connection runs.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecuted<'a> {
    /// Connection name.
    pub connection: &'a str,
    /// Statement text.
    pub sql: &'a str,
    /// Bindings sent with it.
    pub bindings: &'a [SqlValue],
    /// Wall time spent in the driver.
    pub elapsed: Duration,
    /// Whether the statement failed.
    pub failed: bool,
}

/// Receives [`QueryExecuted`] events.
pub trait QueryListener: Send {
    /// Handles one event.
    fn on_query(&mut self, event: &QueryExecuted<'_>);
}

impl<F> QueryListener for F
where
    F: FnMut(&QueryExecuted<'_>) + Send,
{
    fn on_query(&mut self, event: &QueryExecuted<'_>) {
        self(event);
    }
}

/// Fans events out to registered listeners, in registration order.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<Box<dyn QueryListener>>,
}

impl EventDispatcher {
    /// Creates a dispatcher without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn listen(&mut self, listener: impl QueryListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Whether any listener is registered.
    #[must_use]
    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Sends `event` to every listener.
    pub fn dispatch(&mut self, event: &QueryExecuted<'_>) {
        for listener in &mut self.listeners {
            listener.on_query(event);
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
