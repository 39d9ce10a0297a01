//! Enrichment hooks: additive `enrich(group)` plugins run in registration
//! order. `build` constructs the fixed, config-driven set of hooks.

mod cgroup_fs;
mod cgroups;
mod containers;
pub mod dns_wire;
pub mod dnstap;
mod helpers;
mod static_fields;
mod traits;

pub use cgroups::CgroupHook;
pub use containers::ContainerHook;
pub use static_fields::{LabelsHook, MetadataHook};
pub use traits::EnrichHook;

use crate::config::ExtrasConfig;

/// Builds the enrichment pipeline from configuration, in a fixed order:
/// containers, cgroup root, labels, metadata. The DNS-reverse hook is
/// wired up separately by the supervisor, since it owns a background
/// listener task rather than being stateless.
pub fn build(config: &ExtrasConfig) -> Vec<Box<dyn EnrichHook>> {
    let mut hooks: Vec<Box<dyn EnrichHook>> = Vec::new();

    if config.containers.enabled {
        hooks.push(Box::new(ContainerHook::new(&config.containers)));
    }
    if config.cgroups.enabled {
        hooks.push(Box::new(CgroupHook));
    }
    if config.labels.enabled {
        hooks.push(Box::new(LabelsHook::new(config.labels.pairs.clone())));
    }
    if config.metadata.enabled {
        hooks.push(Box::new(MetadataHook::new(config.metadata.pairs.clone())));
    }

    hooks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_returns_no_hooks_when_nothing_enabled() {
        let hooks = build(&ExtrasConfig::default());
        assert!(hooks.is_empty());
    }

    #[test]
    fn build_includes_labels_hook_when_enabled() {
        let mut config = ExtrasConfig::default();
        config.labels.enabled = true;
        config.labels.pairs.insert("k".to_string(), "v".to_string());
        let hooks = build(&config);
        assert_eq!(hooks.len(), 1);

        let mut group = crate::event::AuditEventGroup::new(1, "1.0".to_string());
        hooks[0].enrich(&mut group);
        assert_eq!(group.labels.unwrap().get("k"), Some(&"v".to_string()));
    }
}
