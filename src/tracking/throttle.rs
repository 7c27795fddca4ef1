//! Latest-wins emission throttle

use crate::gesture::GestureState;

/// A value that can take over a superseded value without losing what it
/// carried
pub trait Coalesce {
    fn absorb(&mut self, older: Self);
}

impl Coalesce for GestureState {
    fn absorb(&mut self, older: Self) {
        GestureState::absorb(self, &older);
    }
}

/// Limits how often values are published.
///
/// Values offered inside the interval coalesce into one pending value; it is
/// published by the first offer or flush after the interval has passed.
#[derive(Debug, Clone)]
pub struct EmissionThrottle<T> {
    min_interval_ms: f64,
    last_emit_ms: Option<f64>,
    pending: Option<T>,
}

impl<T: Coalesce> EmissionThrottle<T> {
    pub fn new(min_interval_ms: f64) -> Self {
        Self {
            min_interval_ms: min_interval_ms.max(0.0),
            last_emit_ms: None,
            pending: None,
        }
    }

    fn due(&self, now_ms: f64) -> bool {
        match self.last_emit_ms {
            None => true,
            // A clock that jumped backwards (looped replay) counts as due
            Some(last) => now_ms < last || now_ms - last >= self.min_interval_ms,
        }
    }

    /// Offer a value; returns the value to publish, if any
    pub fn offer(&mut self, mut value: T, now_ms: f64) -> Option<T> {
        if let Some(older) = self.pending.take() {
            value.absorb(older);
        }
        if self.due(now_ms) {
            self.last_emit_ms = Some(now_ms);
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Publish the pending value if the interval has passed
    pub fn flush(&mut self, now_ms: f64) -> Option<T> {
        if self.pending.is_some() && self.due(now_ms) {
            self.last_emit_ms = Some(now_ms);
            self.pending.take()
        } else {
            None
        }
    }

    /// Take the pending value regardless of timing (end of stream)
    pub fn take_pending(&mut self) -> Option<T> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::PinchState;

    /// Remembers every value folded into it
    #[derive(Debug, PartialEq)]
    struct Trail(Vec<u32>);

    impl Coalesce for Trail {
        fn absorb(&mut self, older: Self) {
            let mut merged = older.0;
            merged.extend(self.0.drain(..));
            self.0 = merged;
        }
    }

    fn t(v: u32) -> Trail {
        Trail(vec![v])
    }

    #[test]
    fn test_first_value_passes() {
        let mut throttle = EmissionThrottle::new(12.0);
        assert_eq!(throttle.offer(t(1), 0.0), Some(t(1)));
    }

    #[test]
    fn test_burst_coalesces_into_latest() {
        let mut throttle = EmissionThrottle::new(12.0);
        assert_eq!(throttle.offer(t(1), 100.0), Some(t(1)));
        assert_eq!(throttle.offer(t(2), 103.0), None);
        assert_eq!(throttle.offer(t(3), 106.0), None);
        assert_eq!(throttle.flush(110.0), None);
        assert_eq!(throttle.flush(112.0), Some(Trail(vec![2, 3])));
        assert_eq!(throttle.flush(200.0), None);
    }

    #[test]
    fn test_offer_after_interval_folds_pending() {
        let mut throttle = EmissionThrottle::new(12.0);
        throttle.offer(t(1), 0.0);
        throttle.offer(t(2), 5.0);
        assert_eq!(throttle.offer(t(3), 20.0), Some(Trail(vec![2, 3])));
        assert_eq!(throttle.take_pending(), None);
    }

    #[test]
    fn test_backwards_clock_emits() {
        let mut throttle = EmissionThrottle::new(12.0);
        throttle.offer(t(1), 500.0);
        assert_eq!(throttle.offer(t(2), 3.0), Some(t(2)));
    }

    #[test]
    fn test_take_pending_ignores_interval() {
        let mut throttle = EmissionThrottle::new(12.0);
        throttle.offer(t(1), 0.0);
        throttle.offer(t(2), 1.0);
        assert_eq!(throttle.take_pending(), Some(t(2)));
    }

    #[test]
    fn test_pinch_edge_survives_coalescing() {
        let pinch = |just_pinched| GestureState {
            hands_count: 1,
            pinch: PinchState {
                is_pinching: true,
                just_pinched,
                strength: 1.0,
            },
            ..GestureState::default()
        };
        let mut throttle = EmissionThrottle::new(12.0);
        throttle.offer(GestureState::default(), 0.0);
        // Edge lands inside the interval, the held pinch after it
        assert_eq!(throttle.offer(pinch(true), 6.0), None);
        let out = throttle.offer(pinch(false), 14.0).unwrap();
        assert!(out.pinch.is_pinching);
        assert!(out.pinch.just_pinched);
    }
}
