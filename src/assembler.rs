//! Event group assembler: the heart of the pipeline. Collates
//! records sharing a sequence number into one `AuditEventGroup`, emitting a
//! group when its end-of-event marker arrives or its deadline passes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::event::AuditEventGroup;
use crate::record::{AuditRecord, RecordType};
use crate::sequence_tracker::{SequenceTracker, TrackerEvent};
use crate::uid_cache::UidCache;

const EOE_TYPE: u16 = 1320;

/// Record types that are appended verbatim, without uid scanning:
/// EXECVE, CWD, SOCKADDR.
fn skips_uid_scan(record_type: u16) -> bool {
    matches!(record_type, 1309 | 1307 | 1306)
}

pub struct Assembler {
    open: HashMap<u32, AuditEventGroup>,
    uid_cache: Arc<UidCache>,
    tracker: Option<SequenceTracker>,
    events_min: u16,
    events_max: u16,
}

impl Assembler {
    pub fn new(uid_cache: Arc<UidCache>, tracker: Option<SequenceTracker>, events_min: u16, events_max: u16) -> Self {
        Self { open: HashMap::with_capacity(5), uid_cache, tracker, events_min, events_max }
    }

    /// Feeds one parsed record to the assembler, returning every group that
    /// became complete as a result (in completion order, not sequence
    /// order).
    pub fn process(&mut self, record_type: u16, sequence: u32, timestamp: String, payload: String) -> Vec<AuditEventGroup> {
        if sequence == 0 {
            return self.flush_old();
        }

        if let Some(tracker) = &mut self.tracker {
            for event in tracker.observe(sequence) {
                log_tracker_event(event);
            }
        }

        if record_type < self.events_min || record_type > self.events_max {
            return self.flush_old();
        }

        if record_type == EOE_TYPE {
            let mut completed = self.flush_old();
            if let Some(group) = self.complete(sequence) {
                completed.push(group);
            }
            return completed;
        }

        let group = self.open.entry(sequence).or_insert_with(|| AuditEventGroup::new(sequence, timestamp.clone()));

        if !skips_uid_scan(record_type) {
            scan_uids(&payload, &self.uid_cache, &mut group.uid_map);
        }
        if record_type == u16::from(RecordType::Syscall) {
            group.syscall_id = extract_syscall_id(&payload);
        }

        group.push(AuditRecord::new(RecordType::from(record_type), payload));

        self.flush_old()
    }

    /// Removes and returns the group for `sequence`, if open.
    fn complete(&mut self, sequence: u32) -> Option<AuditEventGroup> {
        self.open.remove(&sequence)
    }

    /// Emits every open group whose deadline has passed.
    fn flush_old(&mut self) -> Vec<AuditEventGroup> {
        let now = Instant::now();
        let due: Vec<u32> = self
            .open
            .iter()
            .filter(|(_, group)| group.is_past_deadline(now))
            .map(|(seq, _)| *seq)
            .collect();

        due.into_iter().filter_map(|seq| self.open.remove(&seq)).collect()
    }
}

fn log_tracker_event(event: TrackerEvent) {
    match event {
        TrackerEvent::LateArrival { sequence, lag, worst_lag } => {
            log::info!("got sequence {sequence} after {lag} messages, worst lag so far {worst_lag} messages");
        }
        TrackerEvent::PresumedLost { sequence, current, worst_lag } => {
            log::warn!("likely missed sequence {sequence}, current {current}, worst message delay {worst_lag}");
        }
    }
}

/// Scans `payload` for `uid=<digits>` substrings. This also matches
/// `auid=`, `euid=`, `suid=` and `fsuid=`, since each ends in the literal
/// `uid=` -- a deliberately blind substring scan rather than a strict
/// key match.
fn scan_uids(payload: &str, cache: &UidCache, uid_map: &mut HashMap<String, String>) {
    let mut data = payload;
    while let Some(start) = data.find("uid=") {
        let after = &data[start + 4..];
        let end = after.find(' ').unwrap_or(after.len());
        let uid = &after[..end];

        if !uid.is_empty() && !uid_map.contains_key(uid) {
            uid_map.insert(uid.to_string(), cache.resolve(uid));
        }

        if end >= after.len() {
            break;
        }
        data = &after[end + 1..];
    }
}

fn extract_syscall_id(payload: &str) -> Option<String> {
    let start = payload.find("syscall=")? + "syscall=".len();
    let rest = &payload[start..];
    let end = rest.find(' ').unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_assembler() -> Assembler {
        Assembler::new(Arc::new(UidCache::new()), None, 1300, 1399)
    }

    #[test]
    fn single_record_event_emits_on_eoe() {
        // single-record event.
        let mut a = new_assembler();
        let completed = a.process(1300, 7, "10000001.123".to_string(), "uid=0 syscall=59".to_string());
        assert!(completed.is_empty());

        let completed = a.process(1320, 7, "10000001.123".to_string(), String::new());
        assert_eq!(completed.len(), 1);
        let group = &completed[0];
        assert_eq!(group.sequence, 7);
        assert_eq!(group.messages.len(), 1);
        let resolved = group.uid_map.get("0").map(String::as_str);
        assert!(resolved == Some("root") || resolved == Some("UNKNOWN_USER"));
    }

    #[test]
    fn multi_record_event_preserves_arrival_order_and_uid_map() {
        // multi-record event with mixed record types.
        let mut a = new_assembler();
        let seq = 42;
        let ts = "10000002.000".to_string();
        a.process(1300, seq, ts.clone(), "uid=0 syscall=59".to_string());
        a.process(1309, seq, ts.clone(), "a0=\"ls\"".to_string());
        a.process(1307, seq, ts.clone(), "cwd=\"/root\"".to_string());
        a.process(1302, seq, ts.clone(), "name=\"/bin/ls\"".to_string());
        a.process(1302, seq, ts.clone(), "name=\"/lib/x\"".to_string());
        let completed = a.process(1320, seq, ts, String::new());

        assert_eq!(completed.len(), 1);
        let group = &completed[0];
        assert_eq!(group.messages.len(), 5);
        assert_eq!(group.messages[0].type_num(), 1300);
        assert_eq!(group.messages[4].type_num(), 1302);
        assert_eq!(group.uid_map.len(), 1);
        assert_eq!(group.syscall_id.as_deref(), Some("59"));
    }

    #[test]
    fn invalid_sequence_flushes_without_creating_a_group() {
        let mut a = new_assembler();
        let completed = a.process(1300, 0, String::new(), "junk".to_string());
        assert!(completed.is_empty());
        assert!(a.open.is_empty());
    }

    #[test]
    fn out_of_range_type_discards_record_but_flushes_old_groups() {
        let mut a = new_assembler();
        a.open.insert(8, {
            let mut g = AuditEventGroup::new(8, "1.0".to_string());
            g.complete_after = Instant::now() - std::time::Duration::from_millis(1);
            g
        });

        let completed = a.process(9999, 1, "1.0".to_string(), "x=1".to_string());
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].sequence, 8);
        assert!(a.open.is_empty());
    }

    #[test]
    fn execve_cwd_sockaddr_records_are_not_scanned_for_uids() {
        let mut a = new_assembler();
        a.process(1309, 1, "1.0".to_string(), "uid=1234 a0=\"x\"".to_string());
        let group = a.open.get(&1).unwrap();
        assert!(group.uid_map.is_empty());
    }
}
