//! Sequence tracker: detects gaps and late/lost sequences, remembering
//! the worst-ever-observed reordering lag.

use std::collections::HashSet;

pub struct SequenceTracker {
    last_seq: u32,
    missed: HashSet<u32>,
    worst_lag: u32,
    log_out_of_order: bool,
    max_out_of_order: u32,
}

pub enum TrackerEvent {
    LateArrival { sequence: u32, lag: u32, worst_lag: u32 },
    PresumedLost { sequence: u32, current: u32, worst_lag: u32 },
}

impl SequenceTracker {
    pub fn new(log_out_of_order: bool, max_out_of_order: u32) -> Self {
        Self {
            last_seq: 0,
            missed: HashSet::with_capacity(10),
            worst_lag: 0,
            log_out_of_order,
            max_out_of_order,
        }
    }

    /// Processes one observed sequence number, returning the operational
    /// events (never errors -- these are metrics, not failures) produced
    /// by this observation.
    pub fn observe(&mut self, seq: u32) -> Vec<TrackerEvent> {
        let mut events = Vec::new();

        if seq > self.last_seq + 1 && self.last_seq != 0 {
            for missed_seq in (self.last_seq + 1)..seq {
                self.missed.insert(missed_seq);
            }
        }

        let mut resolved = Vec::new();
        let mut lost = Vec::new();
        for &missed_seq in &self.missed {
            if missed_seq == seq {
                resolved.push(missed_seq);
            } else if seq.saturating_sub(missed_seq) > self.max_out_of_order {
                lost.push(missed_seq);
            }
        }

        for missed_seq in resolved {
            let lag = self.last_seq.saturating_sub(missed_seq);
            if lag > self.worst_lag {
                self.worst_lag = lag;
            }
            if self.log_out_of_order {
                events.push(TrackerEvent::LateArrival { sequence: missed_seq, lag, worst_lag: self.worst_lag });
            }
            self.missed.remove(&missed_seq);
        }

        for missed_seq in lost {
            events.push(TrackerEvent::PresumedLost { sequence: missed_seq, current: seq, worst_lag: self.worst_lag });
            self.missed.remove(&missed_seq);
        }

        if seq > self.last_seq {
            self.last_seq = seq;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_order_recovery_reports_late_arrivals_only() {
        // sequences arrive as [1,2,3,7,4,5,6,8]: 4,5,6 are late, not lost.
        let mut tracker = SequenceTracker::new(true, 500);
        let mut late = 0;
        let mut lost = 0;
        for seq in [1, 2, 3, 7, 4, 5, 6, 8] {
            for event in tracker.observe(seq) {
                match event {
                    TrackerEvent::LateArrival { .. } => late += 1,
                    TrackerEvent::PresumedLost { .. } => lost += 1,
                }
            }
        }
        assert_eq!(late, 3);
        assert_eq!(lost, 0);
    }

    #[test]
    fn far_future_sequence_presumes_loss() {
        let mut tracker = SequenceTracker::new(true, 5);
        tracker.observe(1);
        tracker.observe(2);
        let events = tracker.observe(100);
        assert!(events.iter().any(|e| matches!(e, TrackerEvent::PresumedLost { sequence, .. } if *sequence != 0)));
    }

    #[test]
    fn missed_set_stays_bounded_by_max_out_of_order() {
        let mut tracker = SequenceTracker::new(false, 10);
        tracker.observe(1);
        tracker.observe(50);
        for s in &tracker.missed {
            assert!(50u32.saturating_sub(*s) <= 10 || *s == 50);
        }
    }
}
