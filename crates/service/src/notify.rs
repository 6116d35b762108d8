//! Notification sinks. The controller fires and forgets; these decide
//! where messages land.

use core_types::Severity;
use indexer::Notifier;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Routes notifications into the tracing stream.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Negative => tracing::error!(target: "docshelf::notify", "{message}"),
            Severity::Warning => tracing::warn!(target: "docshelf::notify", "{message}"),
            Severity::Positive | Severity::Info => {
                tracing::info!(target: "docshelf::notify", "{message}")
            }
        }
    }
}

/// Buffers notifications in memory; the UI feed reads them, tests assert
/// on them.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.entries.lock().push(Notification {
            message: message.to_string(),
            severity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_notifier_buffers_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify("first", Severity::Info);
        notifier.notify("second", Severity::Negative);

        let entries = notifier.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].severity, Severity::Negative);

        notifier.clear();
        assert!(notifier.entries().is_empty());
    }
}
