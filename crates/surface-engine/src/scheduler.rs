//! Tagged one-shot timers
//!
//! Deferred work (the fader-release display refresh) is expressed as an
//! event scheduled under a tag. Scheduling again under the same tag replaces
//! the pending entry, so there is never more than one timer per tag in
//! flight. Due events are handed back by `poll` and fed into the regular
//! event path, so a timer firing is processed like any other event.

use std::time::{Duration, Instant};

/// Timer service used by the sections
pub trait Scheduler<E> {
    /// Deliver `event` after `delay`, replacing any pending timer with `tag`
    fn schedule(&mut self, tag: &str, delay: Duration, event: E);

    /// Drop the pending timer with `tag`; returns whether one was pending
    fn cancel(&mut self, tag: &str) -> bool;
}

struct PendingTimer<E> {
    tag: String,
    due: Instant,
    event: E,
}

/// Polled timer queue driven by the host's tick
pub struct TimerQueue<E> {
    /// Latest time seen by `advance` or `poll`; delays are measured from here
    now: Instant,
    pending: Vec<PendingTimer<E>>,
}

impl<E> TimerQueue<E> {
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            pending: Vec::new(),
        }
    }

    /// Current reference time of the queue
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Number of timers waiting to fire
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, tag: &str) -> bool {
        self.pending.iter().any(|timer| timer.tag == tag)
    }

    /// Move the clock to `now` without firing anything
    ///
    /// Time never runs backwards: an older `now` leaves the clock unchanged.
    pub fn advance(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Advance the clock to `now` and return all due events in due order
    pub fn poll(&mut self, now: Instant) -> Vec<E> {
        self.advance(now);

        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due <= self.now {
                due.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|timer| timer.due);
        due.into_iter().map(|timer| timer.event).collect()
    }
}

impl<E> Scheduler<E> for TimerQueue<E> {
    fn schedule(&mut self, tag: &str, delay: Duration, event: E) {
        let due = self.now + delay;
        if let Some(timer) = self.pending.iter_mut().find(|timer| timer.tag == tag) {
            log::trace!("TimerQueue: replacing pending timer '{}'", tag);
            timer.due = due;
            timer.event = event;
        } else {
            self.pending.push(PendingTimer {
                tag: tag.to_string(),
                due,
                event,
            });
        }
    }

    fn cancel(&mut self, tag: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.tag != tag);
        before != self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_delay() {
        let start = Instant::now();
        let mut queue = TimerQueue::new(start);
        queue.schedule("touch", Duration::from_millis(1500), 7);

        assert!(queue.poll(start + Duration::from_millis(1499)).is_empty());
        assert_eq!(queue.poll(start + Duration::from_millis(1500)), vec![7]);
        assert!(queue.poll(start + Duration::from_millis(5000)).is_empty());
    }

    #[test]
    fn test_same_tag_replaces() {
        let start = Instant::now();
        let mut queue = TimerQueue::new(start);
        queue.schedule("touch", Duration::from_millis(100), 1);
        queue.schedule("touch", Duration::from_millis(200), 2);
        assert_eq!(queue.pending_count(), 1);

        // The first deadline no longer exists
        assert!(queue.poll(start + Duration::from_millis(150)).is_empty());
        assert_eq!(queue.poll(start + Duration::from_millis(200)), vec![2]);
    }

    #[test]
    fn test_delay_measured_from_advanced_clock() {
        let start = Instant::now();
        let mut queue = TimerQueue::new(start);
        queue.advance(start + Duration::from_millis(1400));
        queue.schedule("touch", Duration::from_millis(1500), 1);

        assert!(queue.poll(start + Duration::from_millis(1500)).is_empty());
        assert!(queue.poll(start + Duration::from_millis(2899)).is_empty());
        assert_eq!(queue.poll(start + Duration::from_millis(2900)), vec![1]);
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut queue = TimerQueue::new(start);
        queue.schedule("a", Duration::from_millis(10), 1);
        queue.schedule("b", Duration::from_millis(10), 2);

        assert!(queue.cancel("a"));
        assert!(!queue.cancel("a"));
        assert!(queue.is_pending("b"));
        assert_eq!(queue.poll(start + Duration::from_millis(10)), vec![2]);
    }

    #[test]
    fn test_due_order_and_monotonic_clock() {
        let start = Instant::now();
        let mut queue = TimerQueue::new(start);
        queue.schedule("late", Duration::from_millis(30), "late");
        queue.schedule("early", Duration::from_millis(10), "early");

        assert_eq!(
            queue.poll(start + Duration::from_millis(40)),
            vec!["early", "late"]
        );

        // Polling with an older instant keeps the clock where it was
        queue.poll(start);
        assert_eq!(queue.now(), start + Duration::from_millis(40));
    }
}
