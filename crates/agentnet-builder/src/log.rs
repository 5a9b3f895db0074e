use chrono::{DateTime, Local};
use serde::Serialize;

use agentnet_core::event::{BuilderEvent, EventBus};

/// One transcript line. Never changed after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Position in the journal.
    pub seq: usize,
    pub from: String,
    pub to: String,
    pub message: String,
    /// Local time of the append, not server time.
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Append-only communication journal.
#[derive(Debug, Default)]
pub struct LogStore {
    entries: Vec<LogEntry>,
    bus: Option<EventBus>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A journal that announces every append on `bus`.
    pub fn with_bus(bus: EventBus) -> Self {
        Self {
            entries: Vec::new(),
            bus: Some(bus),
        }
    }

    /// Append an entry stamped with the current local time.
    ///
    /// Timestamps never go backwards: if the clock stepped back since the
    /// previous entry, the previous timestamp is reused.
    pub fn append(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> &LogEntry {
        let now = Local::now();
        let timestamp = match self.entries.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let seq = self.entries.len();
        self.entries.push(LogEntry {
            seq,
            from: from.into(),
            to: to.into(),
            message: message.into(),
            timestamp,
        });
        if let Some(bus) = &self.bus {
            bus.publish(BuilderEvent::LogAppended { seq });
        }
        &self.entries[seq]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_order_and_seq() {
        let mut log = LogStore::new();
        for i in 0..50 {
            log.append("System", "User", format!("msg {i}"));
        }
        assert_eq!(log.len(), 50);
        for (i, entry) in log.entries().iter().enumerate() {
            assert_eq!(entry.seq, i);
            assert_eq!(entry.message, format!("msg {i}"));
        }
        for pair in log.entries().windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_append_returns_new_entry() {
        let mut log = LogStore::new();
        let entry = log.append("1", "2", "hello");
        assert_eq!(entry.from, "1");
        assert_eq!(entry.to, "2");
        assert_eq!(entry.message, "hello");
        assert_eq!(log.last().unwrap().seq, 0);
    }

    #[test]
    fn test_append_signals_new_entry() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let mut log = LogStore::with_bus(bus);
        log.append("System", "Client", "Connected to backend!");
        log.append("1", "2", "hi");
        assert_eq!(rx.try_recv().unwrap(), BuilderEvent::LogAppended { seq: 0 });
        assert_eq!(rx.try_recv().unwrap(), BuilderEvent::LogAppended { seq: 1 });
    }

    #[test]
    fn test_time_label_format() {
        let mut log = LogStore::new();
        let label = log.append("a", "b", "c").time_label();
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }
}
