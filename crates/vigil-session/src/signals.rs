//! Ambient browser-state seam.
//!
//! Document visibility, fullscreen state, and tamper events (blocked
//! shortcuts, context menu) reach the engine through this trait so the
//! whole guard path can run against a scripted implementation in tests
//! and in the CLI simulator.

use std::sync::Mutex;

/// A keyboard shortcut the assessment page intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Copy,
    Paste,
    SelectAll,
    Find,
    DevTools,
}

impl Shortcut {
    /// The red-flag description recorded when this shortcut is blocked.
    pub fn flag_description(&self) -> String {
        match self {
            Self::Copy => "Attempted keyboard shortcut: Ctrl+C".to_string(),
            Self::Paste => "Attempted keyboard shortcut: Ctrl+V".to_string(),
            Self::SelectAll => "Attempted keyboard shortcut: Ctrl+A".to_string(),
            Self::Find => "Attempted keyboard shortcut: Ctrl+F".to_string(),
            Self::DevTools => "Attempted to open developer tools".to_string(),
        }
    }
}

/// A discrete environment signal observed by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentEvent {
    /// The page became hidden (tab switch, minimize).
    VisibilityHidden,
    /// An intercepted keyboard shortcut was attempted.
    BlockedShortcut(Shortcut),
    /// The context menu was invoked.
    ContextMenu,
}

/// What the host should do with the intercepted default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Call the platform's prevent-default equivalent.
    Suppress,
    /// Let the default action proceed.
    Allow,
}

/// An environment event subscriber.
pub type SignalHandler = Box<dyn FnMut(EnvironmentEvent) -> EventDisposition + Send>;

/// Injectable source of ambient browser state.
pub trait EnvironmentSignals: Send + Sync {
    /// Whether the document is currently hidden.
    fn is_hidden(&self) -> bool;

    /// Whether the page is in fullscreen mode.
    fn is_fullscreen(&self) -> bool;

    /// Register a handler for discrete environment events.
    fn subscribe(&self, handler: SignalHandler);

    /// Enter fullscreen mode (session start).
    fn request_fullscreen(&self);

    /// Leave fullscreen mode (session teardown).
    fn exit_fullscreen(&self);
}

/// Scripted signal source for tests and the CLI simulator.
pub struct SimulatedSignals {
    inner: Mutex<SimulatedInner>,
}

struct SimulatedInner {
    hidden: bool,
    fullscreen: bool,
    handlers: Vec<SignalHandler>,
    fullscreen_requests: u32,
    fullscreen_exits: u32,
}

impl SimulatedSignals {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SimulatedInner {
                hidden: false,
                fullscreen: false,
                handlers: Vec::new(),
                fullscreen_requests: 0,
                fullscreen_exits: 0,
            }),
        }
    }

    /// Script the document-visibility state seen by `is_hidden`.
    pub fn set_hidden(&self, hidden: bool) {
        self.inner.lock().expect("signals lock poisoned").hidden = hidden;
    }

    /// Script the fullscreen state seen by `is_fullscreen`.
    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.inner.lock().expect("signals lock poisoned").fullscreen = fullscreen;
    }

    /// Deliver an event to every subscriber; returns their dispositions.
    ///
    /// Handlers run outside the internal lock: a handler may read
    /// `is_hidden`/`is_fullscreen` (or a sampler may, concurrently)
    /// without deadlocking against the dispatch.
    pub fn emit(&self, event: EnvironmentEvent) -> Vec<EventDisposition> {
        let mut handlers = {
            let mut inner = self.inner.lock().expect("signals lock poisoned");
            std::mem::take(&mut inner.handlers)
        };

        let dispositions = handlers.iter_mut().map(|handler| handler(event)).collect();

        let mut inner = self.inner.lock().expect("signals lock poisoned");
        let added_during_dispatch = std::mem::take(&mut inner.handlers);
        handlers.extend(added_during_dispatch);
        inner.handlers = handlers;

        dispositions
    }

    /// How many times fullscreen was requested.
    pub fn fullscreen_requests(&self) -> u32 {
        self.inner.lock().expect("signals lock poisoned").fullscreen_requests
    }

    /// How many times fullscreen was exited.
    pub fn fullscreen_exits(&self) -> u32 {
        self.inner.lock().expect("signals lock poisoned").fullscreen_exits
    }
}

impl Default for SimulatedSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentSignals for SimulatedSignals {
    fn is_hidden(&self) -> bool {
        self.inner.lock().expect("signals lock poisoned").hidden
    }

    fn is_fullscreen(&self) -> bool {
        self.inner.lock().expect("signals lock poisoned").fullscreen
    }

    fn subscribe(&self, handler: SignalHandler) {
        self.inner
            .lock()
            .expect("signals lock poisoned")
            .handlers
            .push(handler);
    }

    fn request_fullscreen(&self) {
        let mut inner = self.inner.lock().expect("signals lock poisoned");
        inner.fullscreen = true;
        inner.fullscreen_requests += 1;
    }

    fn exit_fullscreen(&self) {
        let mut inner = self.inner.lock().expect("signals lock poisoned");
        inner.fullscreen = false;
        inner.fullscreen_exits += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_subscribers_in_order() {
        let signals = SimulatedSignals::new();
        signals.subscribe(Box::new(|_| EventDisposition::Suppress));
        signals.subscribe(Box::new(|_| EventDisposition::Allow));

        let dispositions = signals.emit(EnvironmentEvent::ContextMenu);
        assert_eq!(
            dispositions,
            vec![EventDisposition::Suppress, EventDisposition::Allow]
        );
    }

    #[test]
    fn fullscreen_state_follows_requests() {
        let signals = SimulatedSignals::new();
        assert!(!signals.is_fullscreen());

        signals.request_fullscreen();
        assert!(signals.is_fullscreen());
        assert_eq!(signals.fullscreen_requests(), 1);

        signals.exit_fullscreen();
        assert!(!signals.is_fullscreen());
        assert_eq!(signals.fullscreen_exits(), 1);
    }

    #[test]
    fn shortcut_descriptions_match_intercepts() {
        assert_eq!(
            Shortcut::Copy.flag_description(),
            "Attempted keyboard shortcut: Ctrl+C"
        );
        assert_eq!(
            Shortcut::DevTools.flag_description(),
            "Attempted to open developer tools"
        );
    }
}
