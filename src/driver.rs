use std::time::{Duration, Instant};

use crate::constants::TICK_MS;
use crate::types::Direction;

/// Wall-clock gate for the fixed simulation cadence. `poll` answers whether a
/// tick is due at `now`; after a stall the next deadline is re-anchored to
/// `now`, so missed ticks are skipped rather than replayed in a burst.
pub struct TickDriver {
    interval: Duration,
    deadline: Instant,
}

impl TickDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: Instant::now(),
        }
    }

    pub fn at_tick_rate() -> Self {
        Self::new(Duration::from_millis(TICK_MS))
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.deadline {
            return false;
        }
        self.deadline = now + self.interval;
        true
    }
}

/// Holds the player's pending turn request between ticks. The latest request
/// wins; the latch keeps its value across ticks so an early turn request is
/// retried at every intersection until it is replaced.
pub struct InputLatch {
    queued: Direction,
}

impl InputLatch {
    pub fn new() -> Self {
        Self {
            queued: Direction::None,
        }
    }

    pub fn push(&mut self, dir: Direction) {
        self.queued = dir;
    }

    pub fn current(&self) -> Direction {
        self.queued
    }

    pub fn clear(&mut self) {
        self.queued = Direction::None;
    }
}

impl Default for InputLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_fires_once_per_interval() {
        let interval = Duration::from_millis(10);
        let mut driver = TickDriver::new(interval);
        let start = Instant::now() + Duration::from_secs(1);

        assert!(driver.poll(start));
        assert!(!driver.poll(start));
        assert!(!driver.poll(start + Duration::from_millis(9)));
        assert!(driver.poll(start + interval));
    }

    #[test]
    fn stall_does_not_replay_missed_ticks() {
        let interval = Duration::from_millis(10);
        let mut driver = TickDriver::new(interval);
        let start = Instant::now() + Duration::from_secs(1);
        assert!(driver.poll(start));

        // A full second late: one tick fires, the rest are dropped and the
        // cadence restarts from the late instant.
        let late = start + Duration::from_secs(1);
        assert!(driver.poll(late));
        assert!(!driver.poll(late + Duration::from_millis(9)));
        assert!(driver.poll(late + interval));
    }

    #[test]
    fn latch_keeps_only_the_latest_request() {
        let mut latch = InputLatch::new();
        assert_eq!(latch.current(), Direction::None);

        latch.push(Direction::Up);
        latch.push(Direction::Left);
        assert_eq!(latch.current(), Direction::Left);
        // Reading does not consume: the request stays queued across ticks.
        assert_eq!(latch.current(), Direction::Left);

        latch.clear();
        assert_eq!(latch.current(), Direction::None);
    }
}
