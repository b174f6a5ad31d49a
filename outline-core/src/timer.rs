//! Single-shot, cancelable timers driven by the frame clock.
//!
//! Nothing blocks: a timer is a deadline checked when the owner advances time.

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Uniquely identifies a timer.
    pub struct TimerToken;
}

#[derive(Debug)]
struct Timer<T> {
    deadline: f64,
    payload: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: SlotMap<TimerToken, Timer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self { Self { timers: SlotMap::with_key() } }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self { Self::default() }

    pub fn schedule(&mut self, deadline: f64, payload: T) -> TimerToken {
        self.timers.insert(Timer { deadline, payload })
    }

    /// Cancel a pending timer. Cancelling a fired or cancelled token is a no-op.
    pub fn cancel(&mut self, token: TimerToken) -> Option<T> {
        self.timers.remove(token).map(|t| t.payload)
    }

    pub fn is_pending(&self, token: TimerToken) -> bool { self.timers.contains_key(token) }

    pub fn deadline(&self, token: TimerToken) -> Option<f64> { self.timers.get(token).map(|t| t.deadline) }

    pub fn len(&self) -> usize { self.timers.len() }
    pub fn is_empty(&self) -> bool { self.timers.is_empty() }

    /// Remove and return every timer due at `now`, earliest deadline first.
    pub fn drain_expired(&mut self, now: f64) -> Vec<(TimerToken, T)> {
        let mut due: Vec<(f64, TimerToken)> =
            self.timers.iter().filter(|(_, t)| t.deadline <= now).map(|(k, t)| (t.deadline, k)).collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().filter_map(|(_, k)| self.timers.remove(k).map(|t| (k, t.payload))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(2.0, "late");
        q.schedule(1.0, "early");
        q.schedule(5.0, "pending");
        let fired: Vec<_> = q.drain_expired(2.0).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["early", "late"]);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let t = q.schedule(1.0, 7);
        assert_eq!(q.cancel(t), Some(7));
        assert_eq!(q.cancel(t), None);
        assert!(q.drain_expired(10.0).is_empty());
        assert!(!q.is_pending(t));
    }
}
