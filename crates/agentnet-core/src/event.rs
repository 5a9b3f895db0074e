/// State-change notifications for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderEvent {
    /// A transcript entry was appended at `seq`.
    LogAppended { seq: usize },
    /// Nodes or edges changed.
    GraphChanged,
    /// A flow run started or finished.
    RunStateChanged { in_flight: bool },
    /// The agent form opened, closed, or was edited.
    FormChanged { open: bool },
}

/// Event bus using tokio broadcast channel.
/// All subscribers receive all events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: tokio::sync::broadcast::Sender<BuilderEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: BuilderEvent) {
        // Ignore error if no receivers
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<BuilderEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(BuilderEvent::GraphChanged);
    }

    #[test]
    fn test_subscribers_see_events_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(BuilderEvent::LogAppended { seq: 0 });
        bus.publish(BuilderEvent::RunStateChanged { in_flight: true });
        assert_eq!(rx.try_recv().unwrap(), BuilderEvent::LogAppended { seq: 0 });
        assert_eq!(
            rx.try_recv().unwrap(),
            BuilderEvent::RunStateChanged { in_flight: true }
        );
    }
}
