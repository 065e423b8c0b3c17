use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;

    /// Non-blocking poll, used to discard input that queued up behind a request.
    fn try_recv(&self) -> Result<AppEvent, TryRecvError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(%err, "terminal event reader stopped");
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Result<AppEvent, TryRecvError> {
        self.rx.try_recv()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The countdown granularity: one tick per second.
    pub fn seconds() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Result<AppEvent, TryRecvError> {
        self.rx.try_recv()
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are paced against a deadline, so a steady stream of key presses
/// cannot starve the countdown. A tick that is missed entirely (for example
/// while a blocking request was in flight) is dropped rather than replayed.
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Blocks until the next event or the tick deadline, whichever comes first.
    pub fn step(&mut self) -> AppEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            return self.fire_tick(now);
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.fire_tick(Instant::now())
            }
        }
    }

    /// Restart the tick schedule from now.
    pub fn reset_tick(&mut self) {
        self.next_tick = Instant::now() + self.ticker.interval();
    }

    /// Discard queued key presses. Resizes are kept so the next frame fits.
    /// Returns how many key events were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while let Ok(ev) = self.event_source.try_recv() {
            if matches!(ev, AppEvent::Key(_)) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "discarded queued input");
        }
        dropped
    }

    fn fire_tick(&mut self, now: Instant) -> AppEvent {
        let interval = self.ticker.interval();
        self.next_tick += interval;
        if self.next_tick <= now {
            self.next_tick = now + interval;
        }
        AppEvent::Tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    fn key(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            AppEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(200));
        let mut runner = Runner::new(es, ticker);

        match runner.step() {
            AppEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn key_stream_does_not_starve_ticks() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..1000 {
            tx.send(key('a')).unwrap();
        }
        let es = TestEventSource::new(rx);
        let mut runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));

        std::thread::sleep(Duration::from_millis(10));
        // Deadline already passed: the tick wins over queued keys.
        assert!(matches!(runner.step(), AppEvent::Tick));
        assert!(matches!(runner.step(), AppEvent::Key(_)));
    }

    #[test]
    fn missed_ticks_are_not_replayed() {
        let (_tx, rx) = mpsc::channel::<AppEvent>();
        let es = TestEventSource::new(rx);
        let mut runner = Runner::new(es, FixedTicker::new(Duration::from_millis(50)));

        std::thread::sleep(Duration::from_millis(300));
        let started = Instant::now();
        assert!(matches!(runner.step(), AppEvent::Tick));
        assert!(matches!(runner.step(), AppEvent::Tick));
        // The second tick had to wait out a fresh interval.
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn drain_discards_keys_only() {
        let (tx, rx) = mpsc::channel();
        tx.send(key('1')).unwrap();
        tx.send(AppEvent::Resize).unwrap();
        tx.send(key('2')).unwrap();
        let es = TestEventSource::new(rx);
        let mut runner = Runner::new(es, FixedTicker::new(Duration::from_millis(1)));

        assert_eq!(runner.drain(), 2);
        assert_eq!(runner.drain(), 0);
    }
}
