use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent};
use tokio::sync::{broadcast, mpsc};

use agentnet_core::event::BuilderEvent;

/// Events that drive the TUI loop.
#[derive(Debug)]
pub enum TuiEvent {
    /// A crossterm key event.
    Key(crossterm::event::KeyEvent),
    Resize(u16, u16),
    /// A builder event from the EventBus.
    Builder(BuilderEvent),
    /// Tick timer for the run spinner.
    Tick,
}

/// Merged event source: crossterm + EventBus + tick timer.
///
/// `next` is cancel safe: terminal input is read by one long-lived reader
/// and buffered, so losing a `select!` race never drops a key.
pub struct EventLoop {
    builder_rx: broadcast::Receiver<BuilderEvent>,
    input_rx: mpsc::UnboundedReceiver<CrosstermEvent>,
    stop: Arc<AtomicBool>,
    tick_interval: Duration,
}

impl EventLoop {
    /// Start the terminal reader and merge it with `builder_rx`.
    pub fn new(builder_rx: broadcast::Receiver<BuilderEvent>) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let reader_stop = stop.clone();
        tokio::task::spawn_blocking(move || read_terminal(input_tx, reader_stop));

        let mut events = Self::with_input(builder_rx, input_rx);
        events.stop = stop;
        events
    }

    /// Merge `builder_rx` with an already running input source.
    pub fn with_input(
        builder_rx: broadcast::Receiver<BuilderEvent>,
        input_rx: mpsc::UnboundedReceiver<CrosstermEvent>,
    ) -> Self {
        Self {
            builder_rx,
            input_rx,
            stop: Arc::new(AtomicBool::new(false)),
            tick_interval: Duration::from_millis(100),
        }
    }

    /// Wait for the next event from any source.
    pub async fn next(&mut self) -> Option<TuiEvent> {
        let tick_sleep = tokio::time::sleep(self.tick_interval);

        tokio::select! {
            result = self.builder_rx.recv() => {
                match result {
                    Ok(evt) => Some(TuiEvent::Builder(evt)),
                    Err(broadcast::error::RecvError::Lagged(_)) => Some(TuiEvent::Tick),
                    Err(_) => None,
                }
            }
            Some(input) = self.input_rx.recv() => {
                match input {
                    CrosstermEvent::Key(key) => Some(TuiEvent::Key(key)),
                    CrosstermEvent::Resize(w, h) => Some(TuiEvent::Resize(w, h)),
                    _ => Some(TuiEvent::Tick),
                }
            }
            _ = tick_sleep => {
                Some(TuiEvent::Tick)
            }
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Blocking reader: forwards terminal events until stopped or the loop is gone.
fn read_terminal(tx: mpsc::UnboundedSender<CrosstermEvent>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match event::poll(Duration::from_millis(50)) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if tx.send(evt).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {}
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(c: char) -> CrosstermEvent {
        CrosstermEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_keys_survive_lost_select_races() {
        let bus = agentnet_core::event::EventBus::default();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let mut events = EventLoop::with_input(bus.subscribe(), input_rx);

        // A wait that loses its race is dropped mid-poll.
        let lost = tokio::time::timeout(Duration::from_millis(1), events.next()).await;
        assert!(lost.is_err());

        input_tx.send(key('a')).unwrap();
        input_tx.send(key('b')).unwrap();

        let mut keys = Vec::new();
        while keys.len() < 2 {
            if let Some(TuiEvent::Key(k)) = events.next().await {
                keys.push(k.code);
            }
        }
        assert_eq!(keys, vec![KeyCode::Char('a'), KeyCode::Char('b')]);
    }

    #[tokio::test]
    async fn test_builder_events_are_forwarded() {
        let bus = agentnet_core::event::EventBus::default();
        let (_input_tx, input_rx) = mpsc::unbounded_channel();
        let mut events = EventLoop::with_input(bus.subscribe(), input_rx);

        bus.publish(BuilderEvent::GraphChanged);
        assert!(matches!(
            events.next().await,
            Some(TuiEvent::Builder(BuilderEvent::GraphChanged))
        ));
    }
}
