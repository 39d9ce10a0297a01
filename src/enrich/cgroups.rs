//! Cgroup root enrichment: attaches the process's cgroup v2 path (or v1
//! `pids` controller path) to a completed event.

use crate::enrich::cgroup_fs::{cgroup_root_for, task_control_groups};
use crate::enrich::helpers::extract_pid_ppid;
use crate::enrich::traits::EnrichHook;
use crate::event::AuditEventGroup;

pub struct CgroupHook;

impl EnrichHook for CgroupHook {
    fn enrich(&self, group: &mut AuditEventGroup) {
        // AUDIT_SYSCALL, AUDIT_PATH, AUDIT_EXECVE, AUDIT_SECCOMP
        let Some(record) = group.messages.iter().find(|m| matches!(m.type_num(), 1300 | 1302 | 1309 | 1326)) else {
            return;
        };
        let (pid, _) = extract_pid_ppid(&record.data);
        if pid == 0 {
            return;
        }

        if let Ok(cgroups) = task_control_groups(pid) {
            if let Some(root) = cgroup_root_for(&cgroups) {
                group.cgroup_root = Some(root);
            }
        }
    }
}
