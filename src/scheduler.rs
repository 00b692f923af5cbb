use std::time::{Duration, Instant};

const PERIOD: Duration = Duration::from_secs(1);

/// Aligns the 1 Hz redraw to wall-clock second boundaries.
///
/// The first deadline lands on the next whole second
/// (delay = 1000 ms − epoch ms mod 1000), every later one is exactly one
/// period after its predecessor. Missed deadlines are skipped in
/// whole-period steps so a stall never causes a redraw burst.
pub struct TickScheduler {
    next: Instant,
}

impl TickScheduler {
    pub fn start(now: Instant, epoch_millis: i64) -> Self {
        Self {
            next: now + Self::initial_delay(epoch_millis),
        }
    }

    /// Delay until the next whole-second boundary, in (0, 1000] ms.
    pub fn initial_delay(epoch_millis: i64) -> Duration {
        Duration::from_millis(1000 - (epoch_millis.rem_euclid(1000)) as u64)
    }

    /// How long the event loop may block before the next tick.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    pub fn due(&self, now: Instant) -> bool {
        now >= self.next
    }

    /// Advance past `now` in whole-period steps.
    pub fn advance(&mut self, now: Instant) {
        while self.next <= now {
            self.next += PERIOD;
        }
    }

    #[cfg(test)]
    fn next_deadline(&self) -> Instant {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_delay_is_within_one_second() {
        for ms in [0i64, 1, 250, 999, 1000, 86_399_999] {
            let delay = TickScheduler::initial_delay(ms);
            assert!(delay > Duration::ZERO, "epoch ms {}", ms);
            assert!(delay <= Duration::from_millis(1000), "epoch ms {}", ms);
        }
    }

    #[test]
    fn initial_delay_lands_on_a_second_boundary() {
        for ms in [0i64, 1, 437, 999, 12_345] {
            let delay = TickScheduler::initial_delay(ms).as_millis() as i64;
            assert_eq!((ms + delay) % 1000, 0, "epoch ms {}", ms);
        }
    }

    #[test]
    fn ticks_are_spaced_exactly_one_period() {
        let start = Instant::now();
        let mut sched = TickScheduler::start(start, 250);
        let first = sched.next_deadline();
        assert_eq!(first - start, Duration::from_millis(750));

        sched.advance(first);
        assert_eq!(sched.next_deadline() - first, PERIOD);
        let second = sched.next_deadline();
        sched.advance(second);
        assert_eq!(sched.next_deadline() - second, PERIOD);
    }

    #[test]
    fn missed_deadlines_are_skipped_in_whole_periods() {
        let start = Instant::now();
        let mut sched = TickScheduler::start(start, 0);
        let first = sched.next_deadline();

        // Stall 3.5 periods past the first deadline.
        let late = first + Duration::from_millis(3500);
        assert!(sched.due(late));
        sched.advance(late);
        // Next deadline stays on the 1 Hz grid anchored at `first`.
        assert_eq!(sched.next_deadline() - first, Duration::from_secs(4));
        assert!(!sched.due(late));
    }

    #[test]
    fn poll_timeout_counts_down_to_deadline() {
        let start = Instant::now();
        let sched = TickScheduler::start(start, 600);
        assert_eq!(sched.poll_timeout(start), Duration::from_millis(400));
        let past = start + Duration::from_secs(2);
        assert_eq!(sched.poll_timeout(past), Duration::ZERO);
    }
}
