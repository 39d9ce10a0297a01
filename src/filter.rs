//! Filter engine: drops completed groups matching a configured
//! `(syscall, message_type, regex)` rule.

use std::collections::HashMap;

use regex::Regex;

use crate::config::FilterRuleConfig;
use crate::error::ConfigError;
use crate::event::AuditEventGroup;

pub struct AuditFilter {
    pub message_type: u16,
    pub regex: Regex,
    pub syscall: String,
}

/// Filters indexed by syscall id, then by message type, to keep matching
/// O(records) per completed group.
pub struct FilterEngine {
    by_syscall: HashMap<String, Vec<AuditFilter>>,
}

impl FilterEngine {
    pub fn new(filters: Vec<AuditFilter>) -> Self {
        let mut by_syscall: HashMap<String, Vec<AuditFilter>> = HashMap::new();
        for filter in filters {
            by_syscall.entry(filter.syscall.clone()).or_default().push(filter);
        }
        Self { by_syscall }
    }

    /// Compiles configured filter rules, failing at startup on invalid
    /// regex.
    pub fn from_config(rules: &[FilterRuleConfig]) -> Result<Self, ConfigError> {
        let mut filters = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            let regex = Regex::new(&rule.regex)
                .map_err(|err| ConfigError::InvalidFilter { index, reason: err.to_string() })?;
            filters.push(AuditFilter { message_type: rule.message_type, regex, syscall: rule.syscall.clone() });
        }
        Ok(Self::new(filters))
    }

    /// Returns `true` iff `group` should be dropped.
    pub fn should_drop(&self, group: &AuditEventGroup) -> bool {
        let Some(syscall_id) = &group.syscall_id else { return false };
        let Some(filters) = self.by_syscall.get(syscall_id) else { return false };

        filters.iter().any(|filter| {
            group
                .messages
                .iter()
                .any(|record| record.type_num() == filter.message_type && filter.regex.is_match(&record.data))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AuditRecord, RecordType};

    fn filter(message_type: u16, regex: &str, syscall: &str) -> AuditFilter {
        AuditFilter { message_type, regex: Regex::new(regex).unwrap(), syscall: syscall.to_string() }
    }

    #[test]
    fn drops_group_matching_syscall_type_and_regex() {
        // filter drops a matching group.
        let engine = FilterEngine::new(vec![filter(1302, "name=\"/tmp", "59")]);
        let mut group = AuditEventGroup::new(1, "1.0".to_string());
        group.syscall_id = Some("59".to_string());
        group.push(AuditRecord::new(RecordType::from(1302), "name=\"/tmp/evil\"".to_string()));

        assert!(engine.should_drop(&group));
    }

    #[test]
    fn keeps_group_when_syscall_does_not_match() {
        let engine = FilterEngine::new(vec![filter(1302, "name=\"/tmp", "59")]);
        let mut group = AuditEventGroup::new(1, "1.0".to_string());
        group.syscall_id = Some("2".to_string());
        group.push(AuditRecord::new(RecordType::from(1302), "name=\"/tmp/evil\"".to_string()));

        assert!(!engine.should_drop(&group));
    }

    #[test]
    fn keeps_group_when_no_record_of_filtered_type_matches() {
        let engine = FilterEngine::new(vec![filter(1302, "name=\"/tmp", "59")]);
        let mut group = AuditEventGroup::new(1, "1.0".to_string());
        group.syscall_id = Some("59".to_string());
        group.push(AuditRecord::new(RecordType::from(1302), "name=\"/etc/shadow\"".to_string()));

        assert!(!engine.should_drop(&group));
    }

    #[test]
    fn no_filters_never_drops() {
        let engine = FilterEngine::new(vec![]);
        let mut group = AuditEventGroup::new(1, "1.0".to_string());
        group.syscall_id = Some("59".to_string());
        assert!(!engine.should_drop(&group));
    }

    #[test]
    fn from_config_rejects_invalid_regex() {
        let rules = vec![FilterRuleConfig { message_type: 1302, regex: "(".to_string(), syscall: "59".to_string() }];
        assert!(matches!(FilterEngine::from_config(&rules), Err(ConfigError::InvalidFilter { .. })));
    }

    #[test]
    fn from_config_compiles_valid_rules() {
        let rules = vec![FilterRuleConfig {
            message_type: 1302,
            regex: "name=\"/tmp".to_string(),
            syscall: "59".to_string(),
        }];
        assert!(FilterEngine::from_config(&rules).is_ok());
    }
}
