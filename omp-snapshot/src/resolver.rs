//! Per-run bookkeeping of ordinal ↔ identity mappings.
//!
//! Export registers each captured entity's source identity against its
//! ordinal so later kinds can turn identities into [`EntityRef`]s. Restore
//! registers destination identities against the same ordinals and keeps the
//! destination inventory (name → identity) for merge-by-name.

use crate::kind::{EntityKind, EntityRef};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct KindTable {
    by_ordinal: BTreeMap<u32, String>,
    by_identity: HashMap<String, u32>,
    by_name: HashMap<String, String>,
    last_ordinal: u32,
}

#[derive(Debug, Default)]
pub struct ReferenceResolver {
    tables: HashMap<EntityKind, KindTable>,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&mut self, kind: EntityKind) -> &mut KindTable {
        self.tables.entry(kind).or_default()
    }

    /// Allocate the next dense, 1-based ordinal for `kind`.
    pub fn next_ordinal(&mut self, kind: EntityKind) -> u32 {
        let table = self.table(kind);
        table.last_ordinal += 1;
        table.last_ordinal
    }

    /// Bind `ordinal` of `kind` to `identity` on the current server.
    pub fn register(&mut self, kind: EntityKind, ordinal: u32, identity: &str) {
        let table = self.table(kind);
        table.last_ordinal = table.last_ordinal.max(ordinal);
        table.by_ordinal.insert(ordinal, identity.to_string());
        table.by_identity.insert(identity.to_string(), ordinal);
    }

    pub fn identity(&self, reference: EntityRef) -> Option<&str> {
        self.tables
            .get(&reference.kind)?
            .by_ordinal
            .get(&reference.ordinal)
            .map(String::as_str)
    }

    /// Reverse lookup of a source identity captured earlier in this run.
    pub fn lookup(&self, kind: EntityKind, identity: &str) -> Option<EntityRef> {
        let ordinal = *self.tables.get(&kind)?.by_identity.get(identity)?;
        Some(EntityRef::new(kind, ordinal))
    }

    /// Replace the known inventory of `kind` on the current server.
    pub fn load_inventory<I, N, S>(&mut self, kind: EntityKind, entries: I)
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let table = self.table(kind);
        table.by_name = entries
            .into_iter()
            .map(|(name, identity)| (name.into(), identity.into()))
            .collect();
    }

    /// Identity of an entity named `name` already present on the server.
    pub fn existing(&self, kind: EntityKind, name: &str) -> Option<&str> {
        self.tables
            .get(&kind)?
            .by_name
            .get(name)
            .map(String::as_str)
    }

    /// Number of ordinals of `kind` bound to an identity.
    pub fn resolved(&self, kind: EntityKind) -> usize {
        self.tables
            .get(&kind)
            .map_or(0, |table| table.by_ordinal.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_dense_per_kind() {
        let mut resolver = ReferenceResolver::new();
        assert_eq!(resolver.next_ordinal(EntityKind::Filter), 1);
        assert_eq!(resolver.next_ordinal(EntityKind::Filter), 2);
        assert_eq!(resolver.next_ordinal(EntityKind::Target), 1);
        assert_eq!(resolver.next_ordinal(EntityKind::Filter), 3);
    }

    #[test]
    fn test_both_directions() {
        let mut resolver = ReferenceResolver::new();
        resolver.register(EntityKind::Target, 3, "t-99");

        let reference = EntityRef::new(EntityKind::Target, 3);
        assert_eq!(resolver.identity(reference), Some("t-99"));
        assert_eq!(resolver.lookup(EntityKind::Target, "t-99"), Some(reference));
        assert_eq!(resolver.lookup(EntityKind::Task, "t-99"), None);
        assert_eq!(resolver.resolved(EntityKind::Target), 1);
        assert_eq!(resolver.next_ordinal(EntityKind::Target), 4);
    }

    #[test]
    fn test_inventory_by_name() {
        let mut resolver = ReferenceResolver::new();
        resolver.load_inventory(EntityKind::Filter, [("Web", "f-1"), ("Mail", "f-2")]);

        assert_eq!(resolver.existing(EntityKind::Filter, "Mail"), Some("f-2"));
        assert_eq!(resolver.existing(EntityKind::Filter, "DNS"), None);
        assert_eq!(resolver.existing(EntityKind::Alert, "Mail"), None);
    }
}
