/// Running average of lookups that hit. Each lookup records 100 for a hit and
/// 0 for a miss, so the average is a percentage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HitRateCounter {
    count: u64,
    total: u64,
}

impl HitRateCounter {
    pub fn record(&mut self, hit: bool) {
        self.count = self.count.saturating_add(1);
        if hit {
            self.total = self.total.saturating_add(100);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
