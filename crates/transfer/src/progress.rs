use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Callback receiving `(bytes_sent, total_bytes)` during a direct write.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Fixed progress percentages reached at the end of each pipeline stage.
///
/// Stages take very different real time; fixed checkpoints keep the
/// displayed percentage moving forward anyway. Transfer progress is
/// interpolated between `negotiated` and `transferred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCheckpoints {
    pub hashed: u8,
    pub negotiated: u8,
    pub transferred: u8,
}

impl Default for StageCheckpoints {
    fn default() -> Self {
        Self {
            hashed: 25,
            negotiated: 40,
            transferred: 75,
        }
    }
}

impl StageCheckpoints {
    /// Percentage reported once reconciliation succeeds.
    pub const DONE: u8 = 100;

    /// Maps `sent` of `total` transfer bytes into the transfer band.
    ///
    /// Empty content counts as fully sent.
    pub fn transfer_percent(&self, sent: u64, total: u64) -> u8 {
        let band = u64::from(self.transferred.saturating_sub(self.negotiated));
        if total == 0 {
            return self.transferred;
        }
        let sent = sent.min(total);
        self.negotiated + (band * sent / total) as u8
    }
}

struct SpeedSample {
    bytes: u64,
    at: Instant,
}

/// Transfer throughput over a sliding time window.
pub struct SpeedCalculator {
    inner: Mutex<SpeedInner>,
}

struct SpeedInner {
    samples: VecDeque<SpeedSample>,
    window: Duration,
    max_samples: usize,
}

impl SpeedCalculator {
    /// `window` defaults to 5 s, `max_samples` to 100.
    pub fn new(window: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(SpeedInner {
                samples: VecDeque::new(),
                window: window.unwrap_or(Duration::from_secs(5)),
                max_samples: max_samples.unwrap_or(100),
            }),
        }
    }

    /// Records `bytes` sent just now.
    pub fn add_sample(&self, bytes: u64) {
        self.add_sample_at(bytes, Instant::now());
    }

    fn add_sample_at(&self, bytes: u64, at: Instant) {
        let mut s = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        s.samples.push_back(SpeedSample { bytes, at });

        let window = s.window;
        while s
            .samples
            .front()
            .is_some_and(|oldest| at.duration_since(oldest.at) > window)
        {
            s.samples.pop_front();
        }
        while s.samples.len() > s.max_samples {
            s.samples.pop_front();
        }
    }

    /// Average bytes/second within the window; 0.0 with fewer than 2 samples.
    pub fn bytes_per_second(&self) -> f64 {
        let s = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let (Some(first), Some(last)) = (s.samples.front(), s.samples.back()) else {
            return 0.0;
        };
        let elapsed = last.at.duration_since(first.at);
        if s.samples.len() < 2 || elapsed.is_zero() {
            return 0.0;
        }
        let total: u64 = s.samples.iter().map(|sample| sample.bytes).sum();
        total as f64 / elapsed.as_secs_f64()
    }

    /// Estimated time to send `remaining` bytes; `None` while speed is unknown.
    pub fn eta(&self, remaining: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining as f64 / speed))
    }

    pub fn reset(&self) {
        let mut s = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        s.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_checkpoints_are_ordered() {
        let c = StageCheckpoints::default();
        assert!(c.hashed < c.negotiated);
        assert!(c.negotiated < c.transferred);
        assert!(c.transferred < StageCheckpoints::DONE);
    }

    #[test]
    fn transfer_percent_interpolates() {
        let c = StageCheckpoints::default();
        assert_eq!(c.transfer_percent(0, 100), 40);
        assert_eq!(c.transfer_percent(50, 100), 57);
        assert_eq!(c.transfer_percent(100, 100), 75);
    }

    #[test]
    fn transfer_percent_clamps_overshoot() {
        let c = StageCheckpoints::default();
        assert_eq!(c.transfer_percent(500, 100), 75);
    }

    #[test]
    fn transfer_percent_empty_content() {
        let c = StageCheckpoints::default();
        assert_eq!(c.transfer_percent(0, 0), 75);
    }

    #[test]
    fn transfer_percent_is_monotonic() {
        let c = StageCheckpoints::default();
        let mut last = 0;
        for sent in (0..=10_000).step_by(37) {
            let p = c.transfer_percent(sent, 10_000);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn speed_needs_two_samples() {
        let calc = SpeedCalculator::new(None, None);
        assert_eq!(calc.bytes_per_second(), 0.0);
        calc.add_sample(100);
        assert_eq!(calc.bytes_per_second(), 0.0);
        assert!(calc.eta(1000).is_none());
    }

    #[test]
    fn speed_over_known_interval() {
        let calc = SpeedCalculator::new(Some(Duration::from_secs(10)), None);
        let t0 = Instant::now();
        calc.add_sample_at(500, t0);
        calc.add_sample_at(500, t0 + Duration::from_secs(1));
        assert!((calc.bytes_per_second() - 1000.0).abs() < 1e-6);

        let eta = calc.eta(2000).unwrap();
        assert!((eta.as_secs_f64() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn old_samples_leave_the_window() {
        let calc = SpeedCalculator::new(Some(Duration::from_secs(1)), None);
        let t0 = Instant::now();
        calc.add_sample_at(1_000_000, t0);
        calc.add_sample_at(10, t0 + Duration::from_secs(5));
        calc.add_sample_at(10, t0 + Duration::from_millis(5500));
        // Only the last two samples survive: 20 bytes over 0.5 s.
        assert!((calc.bytes_per_second() - 40.0).abs() < 1e-6);
    }

    #[test]
    fn sample_count_is_capped() {
        let calc = SpeedCalculator::new(Some(Duration::from_secs(60)), Some(5));
        for i in 0..20 {
            calc.add_sample(i);
        }
        assert!(calc.inner.lock().unwrap().samples.len() <= 5);
    }

    #[test]
    fn reset_clears_samples() {
        let calc = SpeedCalculator::new(None, None);
        calc.add_sample(1);
        calc.add_sample(2);
        calc.reset();
        assert_eq!(calc.bytes_per_second(), 0.0);
    }
}
