//! Injectable sink for background diagnostics.
//!
//! Components never print directly; they emit [`Diagnostic`] events into a
//! [`DiagnosticSink`]. The CLI installs [`TracingSink`], tests use [`MemorySink`].

use std::{
    fmt,
    sync::{Arc, Mutex},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Shell,
    Map,
    Control,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Component::Shell => "shell",
            Component::Map => "map",
            Component::Control => "control",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub component: Component,
    pub message: String,
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Forwards diagnostics to the `tracing` subscriber installed by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let component = diagnostic.component.as_str();
        match diagnostic.level {
            Level::Info => tracing::info!(component = component, "{}", diagnostic.message),
            Level::Warn => tracing::warn!(component = component, "{}", diagnostic.message),
            Level::Error => tracing::error!(component = component, "{}", diagnostic.message),
        }
    }
}

/// Collects diagnostics in memory so tests can assert on them.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, level: Level, component: Component) -> usize {
        self.events()
            .iter()
            .filter(|d| d.level == level && d.component == component)
            .count()
    }

    /// True if any event at `level` from `component` mentions `needle`.
    pub fn contains(&self, level: Level, component: Component, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|d| d.level == level && d.component == component && d.message.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic);
    }
}

/// A sink handle bound to one emitting component.
#[derive(Clone)]
pub struct Diagnostics {
    sink: SharedSink,
    component: Component,
}

impl Diagnostics {
    pub fn new(sink: SharedSink, component: Component) -> Self {
        Self { sink, component }
    }

    pub fn for_component(&self, component: Component) -> Self {
        Self {
            sink: self.sink.clone(),
            component,
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Level::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(Level::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Level::Error, message.into());
    }

    fn emit(&self, level: Level, message: String) {
        self.sink.emit(Diagnostic {
            level,
            component: self.component,
            message,
        });
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_is_shared_between_handles() {
        let sink = MemorySink::new();
        let map = Diagnostics::new(Arc::new(sink.clone()), Component::Map);
        let control = map.for_component(Component::Control);

        map.error("Failed to load traffic data");
        control.info("Sending payload");

        assert_eq!(sink.events().len(), 2);
        assert!(sink.contains(Level::Error, Component::Map, "traffic"));
        assert_eq!(sink.count(Level::Info, Component::Control), 1);
        assert!(!sink.contains(Level::Error, Component::Control, "traffic"));
    }
}
