//! Container identification: derives a container id from a process's
//! cgroup path and attaches it to the completed event. Image name and
//! Kubernetes pod labels are not resolved -- doing so would require a
//! runtime client (Docker/containerd) this crate does not carry, so only
//! `id` is populated.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::config::ContainersConfig;
use crate::enrich::cgroup_fs::{container_id_from_path, task_control_groups};
use crate::enrich::helpers::extract_pid_ppid;
use crate::enrich::traits::EnrichHook;
use crate::event::{AuditEventGroup, Containers};

pub struct ContainerHook {
    pid_cache: Mutex<LruCache<i32, Option<String>>>,
}

impl ContainerHook {
    pub fn new(config: &ContainersConfig) -> Self {
        let capacity = NonZeroUsize::new(config.pid_cache.max(1)).unwrap();
        Self { pid_cache: Mutex::new(LruCache::new(capacity)) }
    }

    fn container_id_for_pid(&self, pid: i32) -> Option<String> {
        if let Some(cached) = self.pid_cache.lock().unwrap().get(&pid) {
            return cached.clone();
        }

        let resolved = task_control_groups(pid)
            .ok()
            .and_then(|cgroups| cgroups.iter().find_map(|cg| container_id_from_path(&cg.path)));

        self.pid_cache.lock().unwrap().put(pid, resolved.clone());
        resolved
    }

    /// Resolves a container id for `pid`, falling back to `ppid` once if
    /// the pid has already exited.
    fn containers_for(&self, pid: i32, ppid: i32) -> Option<Containers> {
        if pid == 0 {
            return None;
        }
        match self.container_id_for_pid(pid) {
            Some(id) => {
                Some(Containers { id, image: None, name: None, pod_uid: None, pod_name: None, pod_namespace: None })
            }
            None if ppid != 0 => self.containers_for(ppid, 0),
            None => None,
        }
    }
}

impl EnrichHook for ContainerHook {
    fn enrich(&self, group: &mut AuditEventGroup) {
        let Some(record) = group.messages.iter().find(|m| matches!(m.type_num(), 1300 | 1326)) else {
            return;
        };
        let (pid, ppid) = extract_pid_ppid(&record.data);
        if let Some(containers) = self.containers_for(pid, ppid) {
            group.containers = Some(containers);
        }
    }
}
