//! `/proc/<pid>/task/<pid>/cgroup` reading, shared by the containers and
//! cgroups enrichment hooks.

use std::fs;

pub struct ControlGroup {
    pub hierarchy_id: i32,
    pub controllers: Vec<String>,
    pub path: String,
}

pub fn task_control_groups(pid: i32) -> std::io::Result<Vec<ControlGroup>> {
    let contents = fs::read_to_string(format!("/proc/{pid}/task/{pid}/cgroup"))?;
    let mut cgroups = Vec::new();

    for line in contents.lines() {
        let mut parts = line.splitn(3, ':');
        let (Some(id), Some(controllers), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        let Ok(hierarchy_id) = id.parse::<i32>() else { continue };
        cgroups.push(ControlGroup {
            hierarchy_id,
            controllers: controllers.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect(),
            path: path.to_string(),
        });
    }

    Ok(cgroups)
}

/// The cgroup v2 path (hierarchy id 0), or the v1 `pids` controller path as
/// fallback.
pub fn cgroup_root_for(cgroups: &[ControlGroup]) -> Option<String> {
    let mut v1_pids_path = None;
    for cgroup in cgroups {
        if cgroup.hierarchy_id == 0 {
            return Some(cgroup.path.clone());
        }
        if cgroup.controllers.first().map(String::as_str) == Some("pids") {
            v1_pids_path = Some(cgroup.path.clone());
        }
    }
    v1_pids_path
}

const SHA256_HEX_LEN: usize = 64;

fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Extracts a container id embedded in a cgroup path: a bare 64-character
/// hex segment (`/docker/<id>`, `/kubepods/.../<id>`), or a
/// `docker-<id>.scope` systemd unit name.
pub fn container_id_from_path(path: &str) -> Option<String> {
    for segment in path.split('/') {
        if is_sha256_hex(segment) {
            return Some(segment.to_string());
        }

        if segment.len() > SHA256_HEX_LEN {
            let prefix = &segment[..SHA256_HEX_LEN];
            let boundary = segment.as_bytes()[SHA256_HEX_LEN];
            if !boundary.is_ascii_hexdigit() && is_sha256_hex(prefix) {
                return Some(prefix.to_string());
            }

            let trimmed = segment.strip_suffix(".scope").unwrap_or(segment);
            if trimmed.len() > SHA256_HEX_LEN {
                let suffix = &trimmed[trimmed.len() - SHA256_HEX_LEN..];
                let boundary = trimmed.as_bytes()[trimmed.len() - SHA256_HEX_LEN - 1];
                if !boundary.is_ascii_hexdigit() && is_sha256_hex(suffix) {
                    return Some(suffix.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_bare_hex_segment() {
        let id = "a".repeat(64);
        let path = format!("/docker/{id}");
        assert_eq!(container_id_from_path(&path), Some(id));
    }

    #[test]
    fn finds_id_in_systemd_scope_name() {
        let id = "b".repeat(64);
        let path = format!("/system.slice/docker-{id}.scope");
        assert_eq!(container_id_from_path(&path), Some(id));
    }

    #[test]
    fn no_hex_segment_returns_none() {
        assert_eq!(container_id_from_path("/user.slice/user-1000.slice"), None);
    }

    #[test]
    fn cgroup_root_prefers_v2() {
        let cgroups = vec![
            ControlGroup { hierarchy_id: 4, controllers: vec!["pids".to_string()], path: "/v1/pids".to_string() },
            ControlGroup { hierarchy_id: 0, controllers: vec![], path: "/v2/path".to_string() },
        ];
        assert_eq!(cgroup_root_for(&cgroups), Some("/v2/path".to_string()));
    }

    #[test]
    fn cgroup_root_falls_back_to_v1_pids() {
        let cgroups = vec![ControlGroup {
            hierarchy_id: 4,
            controllers: vec!["pids".to_string()],
            path: "/v1/pids".to_string(),
        }];
        assert_eq!(cgroup_root_for(&cgroups), Some("/v1/pids".to_string()));
    }
}
