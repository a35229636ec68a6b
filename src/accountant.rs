use tracing::debug;

/// Running tally of spoken seconds across one narration run.
///
/// Whole items are recorded directly. Multi-chunk items are recorded
/// speculatively and either committed or rolled back as one unit. Rollbacks
/// restore the exact total seen before the unit started, so no float drift
/// accumulates from subtracting what was added.
#[derive(Debug, Clone, Default)]
pub struct ClipAccountant {
    running_total: f64,
    last_accepted: f64,
    total_before_last: f64,
    speculative_total: f64,
    speculative_base: Option<f64>,
}

impl ClipAccountant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running_total(&self) -> f64 {
        self.running_total
    }

    pub fn last_accepted_duration(&self) -> f64 {
        self.last_accepted
    }

    pub fn speculative_total(&self) -> f64 {
        self.speculative_total
    }

    pub fn is_speculating(&self) -> bool {
        self.speculative_base.is_some()
    }

    pub fn record_direct(&mut self, duration: f64) {
        self.total_before_last = self.running_total;
        self.running_total += duration;
        self.last_accepted = duration;
    }

    pub fn record_speculative(&mut self, duration: f64) {
        if self.speculative_base.is_none() {
            self.speculative_base = Some(self.running_total);
        }
        self.running_total += duration;
        self.speculative_total += duration;
    }

    /// Makes the pending unit permanent and returns its duration.
    pub fn commit_speculative(&mut self) -> f64 {
        let committed = self.speculative_total;
        if let Some(base) = self.speculative_base.take() {
            self.total_before_last = base;
            self.last_accepted = committed;
        }
        self.speculative_total = 0.0;
        committed
    }

    /// Drops the pending unit and returns how much was discarded.
    pub fn rollback_speculative(&mut self) -> f64 {
        let discarded = self.speculative_total;
        if let Some(base) = self.speculative_base.take() {
            self.running_total = base;
        }
        self.speculative_total = 0.0;
        debug!("Rolled back {:.2}s of speculative audio", discarded);
        discarded
    }

    /// Removes the most recently accepted item from the total and returns
    /// its duration. Only one step of history is kept; a second call without
    /// an intervening record is a no-op.
    pub fn rollback_last(&mut self) -> f64 {
        let removed = self.last_accepted;
        self.running_total = self.total_before_last;
        self.last_accepted = 0.0;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_and_committed_records_add_up() {
        let mut acc = ClipAccountant::new();
        acc.record_direct(2.0);
        acc.record_speculative(1.25);
        acc.record_speculative(0.5);
        assert_eq!(acc.commit_speculative(), 1.75);
        acc.record_direct(3.0);
        assert_eq!(acc.running_total(), 6.75);
        assert_eq!(acc.last_accepted_duration(), 3.0);
        assert_eq!(acc.speculative_total(), 0.0);
    }

    #[test]
    fn commit_sets_last_to_unit_sum() {
        let mut acc = ClipAccountant::new();
        acc.record_direct(1.0);
        acc.record_speculative(0.5);
        acc.record_speculative(0.25);
        acc.commit_speculative();
        assert_eq!(acc.last_accepted_duration(), 0.75);
        assert!(!acc.is_speculating());
    }

    #[test]
    fn speculative_rollback_restores_exact_total() {
        let mut acc = ClipAccountant::new();
        acc.record_direct(0.1);
        acc.record_direct(0.2);
        let before = acc.running_total();
        for d in [0.3, 0.7, 1.0 / 3.0] {
            acc.record_speculative(d);
        }
        acc.rollback_speculative();
        assert_eq!(acc.running_total().to_bits(), before.to_bits());
        assert_eq!(acc.speculative_total(), 0.0);
        assert_eq!(acc.last_accepted_duration(), 0.2);
    }

    #[test]
    fn rollback_last_evicts_previous_item() {
        let mut acc = ClipAccountant::new();
        acc.record_direct(2.0);
        acc.record_direct(3.0);
        acc.record_direct(3.0);
        assert_eq!(acc.rollback_last(), 3.0);
        assert_eq!(acc.running_total(), 5.0);
    }

    #[test]
    fn rollback_last_after_committed_unit() {
        let mut acc = ClipAccountant::new();
        acc.record_direct(2.0);
        acc.record_speculative(1.5);
        acc.record_speculative(1.5);
        acc.commit_speculative();
        assert_eq!(acc.rollback_last(), 3.0);
        assert_eq!(acc.running_total(), 2.0);
    }

    #[test]
    fn failed_unit_does_not_disturb_last_accepted() {
        let mut acc = ClipAccountant::new();
        acc.record_direct(2.0);
        acc.record_direct(4.0);
        acc.record_speculative(1.0);
        acc.rollback_speculative();
        assert_eq!(acc.rollback_last(), 4.0);
        assert_eq!(acc.running_total(), 2.0);
    }

    #[test]
    fn total_never_goes_negative() {
        let mut acc = ClipAccountant::new();
        acc.rollback_speculative();
        acc.rollback_last();
        assert_eq!(acc.running_total(), 0.0);
    }
}
