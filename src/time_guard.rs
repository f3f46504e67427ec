//! Cooperative, rate-limited cancellation.
//!
//! A `TimeSource` answers "has the deadline passed"; it may be expensive or
//! live elsewhere (another thread's stop flag). The `Sampler` bounds how often
//! it is asked, and the `TimeGuard` turns a positive answer into `TimedOut`,
//! which the search propagates with `?` up to the iterative-deepening driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// The search ran out of time. Recoverable; never leaves the driver.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("search timed out")]
pub struct TimedOut;

/// An authoritative answer to "should the search stop now".
pub trait TimeSource {
    fn expired(&mut self) -> bool;
}

/// Monotonic countdown. Each query subtracts the time elapsed since the
/// previous query, saturating at zero.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: Duration,
    last_tick: Instant,
}

impl Countdown {
    pub fn new(budget: Duration) -> Self {
        Countdown { remaining: budget, last_tick: Instant::now() }
    }

    /// Charges the time since the last tick and returns what is left.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        self.remaining = self.remaining.saturating_sub(now.duration_since(self.last_tick));
        self.last_tick = now;
        self.remaining
    }
}

impl TimeSource for Countdown {
    fn expired(&mut self) -> bool {
        self.tick().is_zero()
    }
}

/// Never expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl TimeSource for Unbounded {
    fn expired(&mut self) -> bool {
        false
    }
}

/// Expires once any holder of the shared flag raises it.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    flag: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle another thread can use to stop the search.
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

impl TimeSource for StopFlag {
    fn expired(&mut self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Decides when the time source is worth asking: once every `interval` of
/// wall-clock time or every `nodes` visits, whichever comes first.
#[derive(Debug, Clone)]
pub struct Sampler {
    interval: Duration,
    nodes: u64,
    since_query: u64,
    last_query: Instant,
}

impl Sampler {
    pub fn new(interval: Duration, nodes: u64) -> Self {
        Sampler { interval, nodes: nodes.max(1), since_query: 0, last_query: Instant::now() }
    }

    /// Records one node visit; true when the source should be queried.
    pub fn sample(&mut self) -> bool {
        self.since_query += 1;
        if self.since_query >= self.nodes || self.last_query.elapsed() >= self.interval {
            self.since_query = 0;
            self.last_query = Instant::now();
            return true;
        }
        false
    }
}

/// Sampler plus source. Expiry latches, so every later check fails fast
/// while the recursion unwinds.
pub struct TimeGuard<'a> {
    source: &'a mut dyn TimeSource,
    sampler: Sampler,
    expired: bool,
}

impl<'a> TimeGuard<'a> {
    pub fn new(source: &'a mut dyn TimeSource, sampler: Sampler) -> Self {
        TimeGuard { source, sampler, expired: false }
    }

    pub fn check(&mut self) -> Result<(), TimedOut> {
        if !self.expired && self.sampler.sample() {
            self.expired = self.source.expired();
        }
        if self.expired {
            Err(TimedOut)
        } else {
            Ok(())
        }
    }
}
