//! Static label/metadata enrichment: stamps the configured pairs onto
//! every message unconditionally.

use std::collections::HashMap;

use crate::enrich::traits::EnrichHook;
use crate::event::AuditEventGroup;

pub struct LabelsHook {
    pairs: HashMap<String, String>,
}

impl LabelsHook {
    pub fn new(pairs: HashMap<String, String>) -> Self {
        Self { pairs }
    }
}

impl EnrichHook for LabelsHook {
    fn enrich(&self, group: &mut AuditEventGroup) {
        group.labels = Some(self.pairs.clone());
    }
}

pub struct MetadataHook {
    pairs: HashMap<String, String>,
}

impl MetadataHook {
    pub fn new(pairs: HashMap<String, String>) -> Self {
        Self { pairs }
    }
}

impl EnrichHook for MetadataHook {
    fn enrich(&self, group: &mut AuditEventGroup) {
        group.metadata = Some(self.pairs.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_hook_stamps_configured_pairs() {
        let mut pairs = HashMap::new();
        pairs.insert("env".to_string(), "prod".to_string());
        let hook = LabelsHook::new(pairs.clone());

        let mut group = AuditEventGroup::new(1, "1.0".to_string());
        hook.enrich(&mut group);
        assert_eq!(group.labels, Some(pairs));
    }

    #[test]
    fn metadata_hook_stamps_configured_pairs() {
        let mut pairs = HashMap::new();
        pairs.insert("region".to_string(), "us-east".to_string());
        let hook = MetadataHook::new(pairs.clone());

        let mut group = AuditEventGroup::new(1, "1.0".to_string());
        hook.enrich(&mut group);
        assert_eq!(group.metadata, Some(pairs));
    }
}
