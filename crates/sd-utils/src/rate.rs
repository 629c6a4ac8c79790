use std::{
	collections::VecDeque,
	time::{Duration, Instant},
};

/// A rolling window used to compute the files-per-second / bytes-per-second
/// figures on the discovery worker's live status record. Samples older than
/// `window` are dropped on every `record`/`rate` call so the figure tracks
/// recent throughput rather than a lifetime average.
#[derive(Debug)]
pub struct RateWindow {
	window: Duration,
	samples: VecDeque<(Instant, u64)>,
}

impl RateWindow {
	#[must_use]
	pub fn new(window: Duration) -> Self {
		Self {
			window,
			samples: VecDeque::new(),
		}
	}

	pub fn record(&mut self, amount: u64) {
		let now = Instant::now();
		self.samples.push_back((now, amount));
		self.evict_stale(now);
	}

	/// Units per second over the retained window.
	#[must_use]
	pub fn rate(&mut self) -> f64 {
		let now = Instant::now();
		self.evict_stale(now);

		let Some(&(oldest, _)) = self.samples.front() else {
			return 0.0;
		};
		let elapsed = now.saturating_duration_since(oldest).as_secs_f64().max(0.001);
		let total: u64 = self.samples.iter().map(|(_, n)| n).sum();
		total as f64 / elapsed
	}

	fn evict_stale(&mut self, now: Instant) {
		while let Some(&(t, _)) = self.samples.front() {
			if now.saturating_duration_since(t) > self.window {
				self.samples.pop_front();
			} else {
				break;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_rate_with_no_samples() {
		let mut w = RateWindow::new(Duration::from_secs(10));
		assert_eq!(w.rate(), 0.0);
	}

	#[test]
	fn accumulates_recorded_amounts() {
		let mut w = RateWindow::new(Duration::from_secs(10));
		w.record(100);
		w.record(50);
		assert!(w.rate() > 0.0);
	}
}
