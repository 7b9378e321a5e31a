//! Build lifecycle events
//!
//! Listeners subscribe to one [`EventKind`] and receive the event mutably,
//! so they can rewrite the source before parsing, the tree after parsing or
//! before rendering, and the output after rendering.
//!
//! # Example
//!
//! ```
//! use rstdok_core::events::{Event, EventDispatcher, EventKind};
//!
//! let mut events = EventDispatcher::new();
//! events.subscribe(EventKind::PreParse, |event: &mut Event<'_>| {
//!     if let Event::PreParse { source, .. } = event {
//!         **source = source.replace("TODO", "Soon");
//!     }
//! });
//!
//! let mut source = "TODO: docs".to_string();
//! events.dispatch(&mut Event::PreParse { file: "index.rst", source: &mut source });
//! assert_eq!(source, "Soon: docs");
//! ```

use std::sync::Arc;

use rstdok_ast::DocumentNode;

/// An event with mutable access to its payload
#[derive(Debug)]
pub enum Event<'a> {
    /// Source text read, not parsed yet
    PreParse {
        file: &'a str,
        source: &'a mut String,
    },
    /// A document was parsed (before compilation)
    PostParseDocument { document: &'a mut DocumentNode },
    /// A compiled document is about to be rendered
    PreRender { document: &'a mut DocumentNode },
    /// A page was rendered, not written yet
    PostRender {
        file: &'a str,
        output: &'a mut String,
    },
}

/// Discriminant of an [`Event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PreParse,
    PostParseDocument,
    PreRender,
    PostRender,
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PreParse { .. } => EventKind::PreParse,
            Event::PostParseDocument { .. } => EventKind::PostParseDocument,
            Event::PreRender { .. } => EventKind::PreRender,
            Event::PostRender { .. } => EventKind::PostRender,
        }
    }
}

/// Receives events of the kind it subscribed to
pub trait EventListener: Send + Sync {
    fn handle(&self, event: &mut Event<'_>);
}

impl<F> EventListener for F
where
    F: Fn(&mut Event<'_>) + Send + Sync,
{
    fn handle(&self, event: &mut Event<'_>) {
        self(event)
    }
}

/// Listener list, shared by clones
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Vec<(EventKind, Arc<dyn EventListener>)>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; listeners run in subscription order
    pub fn subscribe(&mut self, kind: EventKind, listener: impl EventListener + 'static) {
        self.listeners.push((kind, Arc::new(listener)));
    }

    /// Hand the event to every listener of its kind
    pub fn dispatch(&self, event: &mut Event<'_>) {
        let kind = event.kind();
        for (_, listener) in self.listeners.iter().filter(|(k, _)| *k == kind) {
            listener.handle(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(k, _)| *k == kind).count()
    }
}
