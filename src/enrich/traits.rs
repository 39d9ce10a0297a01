use crate::event::AuditEventGroup;

/// An enrichment hook attaches additional, non-authoritative context to a
/// completed group. Hooks are additive: none may drop or mutate a field
/// another hook or the assembler already set.
pub trait EnrichHook: Send + Sync {
    fn enrich(&self, group: &mut AuditEventGroup);
}
