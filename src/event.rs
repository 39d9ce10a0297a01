//! `AuditEventGroup`: all records sharing one kernel sequence number,
//! plus the state the assembler accumulates while the group is open.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::record::AuditRecord;

/// Default per-group completion deadline.
pub const COMPLETE_AFTER: Duration = Duration::from_secs(2);

/// Typical record count per event; a sizing hint only.
const TYPICAL_GROUP_SIZE: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct Containers {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DnsTap {
    pub ip: String,
    pub port: String,
    pub record: String,
}

/// One logical audit event: every record that shares a kernel sequence
/// number, plus whatever enrichment hooks have attached.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEventGroup {
    pub sequence: u32,
    pub timestamp: String,
    pub messages: Vec<AuditRecord>,
    pub uid_map: HashMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub containers: Option<Containers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroup_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnstap: Option<DnsTap>,

    /// Extracted from the SYSCALL record's `syscall=` field. Not part of the
    /// wire format directly but used by the filter engine.
    #[serde(skip)]
    pub syscall_id: Option<String>,
    #[serde(skip)]
    pub complete_after: Instant,
}

impl AuditEventGroup {
    pub fn new(sequence: u32, timestamp: String) -> Self {
        Self {
            sequence,
            timestamp,
            messages: Vec::with_capacity(TYPICAL_GROUP_SIZE),
            uid_map: HashMap::with_capacity(2),
            containers: None,
            cgroup_root: None,
            labels: None,
            metadata: None,
            dnstap: None,
            syscall_id: None,
            complete_after: Instant::now() + COMPLETE_AFTER,
        }
    }

    pub fn is_past_deadline(&self, now: Instant) -> bool {
        self.complete_after <= now
    }

    pub fn push(&mut self, record: AuditRecord) {
        self.messages.push(record);
    }
}
