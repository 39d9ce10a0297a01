//! UID resolver: process-wide, unbounded uid -> username cache. Caches
//! both hits and misses so a noisy uid never triggers a second passwd
//! lookup.

use std::collections::HashMap;
use std::sync::RwLock;

const UNKNOWN_USER: &str = "UNKNOWN_USER";

pub struct UidCache {
    entries: RwLock<HashMap<String, String>>,
}

impl UidCache {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Resolves `uid` to a username, consulting the cache first and the
    /// system password database on a miss. Unresolvable uids are cached as
    /// `"UNKNOWN_USER"` so we never look them up twice.
    pub fn resolve(&self, uid: &str) -> String {
        if let Some(name) = self.entries.read().unwrap().get(uid) {
            return name.clone();
        }

        let resolved = uid
            .parse::<u32>()
            .ok()
            .and_then(|numeric| users::get_user_by_uid(numeric))
            .and_then(|u| u.name().to_str().map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_USER.to_string());

        self.entries.write().unwrap().insert(uid.to_string(), resolved.clone());
        resolved
    }
}

impl Default for UidCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolvable_uid_caches_unknown_user() {
        let cache = UidCache::new();
        let name = cache.resolve("not-a-number");
        assert_eq!(name, UNKNOWN_USER);
        // Second call hits the cache rather than re-resolving.
        assert_eq!(cache.resolve("not-a-number"), UNKNOWN_USER);
    }

    #[test]
    fn root_resolves_when_running_as_root_or_caches_unknown() {
        let cache = UidCache::new();
        let name = cache.resolve("0");
        assert!(name == "root" || name == UNKNOWN_USER);
    }
}
