/// Turns a stream of pressure readings into alert triggers.
///
/// A trigger needs `required` readings in a row strictly above the threshold;
/// one quiet reading breaks the streak.
#[derive(Debug, Clone)]
pub struct TriggerDebouncer {
    count: u32,
    required: u32,
}

impl TriggerDebouncer {
    pub fn new(required: u32) -> Self {
        Self {
            count: 0,
            required: required.max(1),
        }
    }

    /// Feed one reading. Returns true on the reading that completes a streak.
    pub fn observe(&mut self, reading: i32, threshold: i32) -> bool {
        if reading <= threshold {
            self.count = 0;
            return false;
        }
        self.count += 1;
        if self.count >= self.required {
            self.count = 0;
            return true;
        }
        false
    }

    #[cfg(test)]
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TH: i32 = 3000;

    #[test]
    fn fires_after_three_in_a_row() {
        let mut d = TriggerDebouncer::new(3);
        assert!(!d.observe(TH + 1, TH));
        assert!(!d.observe(TH + 1, TH));
        assert!(d.observe(TH + 1, TH));
        assert_eq!(d.count(), 0);
    }

    #[test]
    fn reading_at_threshold_breaks_streak() {
        let mut d = TriggerDebouncer::new(3);
        assert!(!d.observe(TH + 1, TH));
        assert!(!d.observe(TH + 1, TH));
        assert!(!d.observe(TH, TH));
        assert_eq!(d.count(), 0);
        assert!(!d.observe(TH + 1, TH));
    }

    #[test]
    fn single_required_fires_immediately() {
        let mut d = TriggerDebouncer::new(1);
        assert!(d.observe(TH + 1, TH));
        assert!(d.observe(TH + 1, TH));
    }

    #[test]
    fn zero_required_behaves_like_one() {
        let mut d = TriggerDebouncer::new(0);
        assert!(d.observe(TH + 1, TH));
    }

    #[test]
    fn counter_stays_below_required_between_fires() {
        let mut d = TriggerDebouncer::new(3);
        for _ in 0..10 {
            d.observe(TH + 100, TH);
            assert!(d.count() < 3);
        }
    }

    #[test]
    fn reset_clears_streak() {
        let mut d = TriggerDebouncer::new(2);
        d.observe(TH + 1, TH);
        d.reset();
        assert!(!d.observe(TH + 1, TH));
        assert!(d.observe(TH + 1, TH));
    }
}
