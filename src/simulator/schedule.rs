use super::LedgerStatus;
use std::time::Duration;

/// Stages a simulated package moves through after creation, with the wait before each.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionSchedule {
    pub stages: Vec<(Duration, LedgerStatus)>,
}

impl Default for ProgressionSchedule {
    fn default() -> Self {
        Self {
            stages: vec![
                (Duration::from_secs(2), LedgerStatus::Picked),
                (Duration::from_secs(3), LedgerStatus::Packed),
                (Duration::from_secs(5), LedgerStatus::Shipped),
                (Duration::from_secs(10), LedgerStatus::Delivered),
            ],
        }
    }
}

impl ProgressionSchedule {
    /// The default schedule with every delay multiplied by `factor`.
    ///
    /// Negative or non-finite factors are treated as zero. Delays too large to represent
    /// saturate at [`Duration::MAX`].
    pub fn scaled(factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        let mut schedule = Self::default();
        for (delay, _) in &mut schedule.stages {
            *delay = Duration::try_from_secs_f64(delay.as_secs_f64() * factor)
                .unwrap_or(Duration::MAX);
        }
        schedule
    }

    /// Same stages, all separated by `delay`.
    pub fn uniform(delay: Duration) -> Self {
        let mut schedule = Self::default();
        for (stage_delay, _) in &mut schedule.stages {
            *stage_delay = delay;
        }
        schedule
    }

    pub fn total(&self) -> Duration {
        self.stages
            .iter()
            .fold(Duration::ZERO, |total, (delay, _)| total.saturating_add(*delay))
    }
}
