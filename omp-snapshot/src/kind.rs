//! Entity kinds and their fixed dependency order.

use std::fmt;

/// The eleven entity categories carried by a snapshot.
///
/// Variants are declared in processing order: a kind may only reference
/// kinds with a strictly lower [`EntityKind::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Credential,
    Filter,
    ReportFormat,
    Slave,
    Schedule,
    ScanConfig,
    Target,
    Alert,
    Task,
    Note,
    Override,
}

impl EntityKind {
    /// All kinds in export/restore order.
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Credential,
        EntityKind::Filter,
        EntityKind::ReportFormat,
        EntityKind::Slave,
        EntityKind::Schedule,
        EntityKind::ScanConfig,
        EntityKind::Target,
        EntityKind::Alert,
        EntityKind::Task,
        EntityKind::Note,
        EntityKind::Override,
    ];

    /// Position in the dependency graph. Kinds sharing a rank never
    /// reference each other.
    pub fn rank(self) -> u8 {
        match self {
            EntityKind::Credential => 0,
            EntityKind::Filter
            | EntityKind::ReportFormat
            | EntityKind::Slave
            | EntityKind::Schedule
            | EntityKind::ScanConfig => 1,
            EntityKind::Target => 2,
            EntityKind::Alert => 3,
            EntityKind::Task => 4,
            EntityKind::Note | EntityKind::Override => 5,
        }
    }

    /// True when documents of `self` may carry references to `other`.
    pub fn may_reference(self, other: EntityKind) -> bool {
        other.rank() < self.rank()
    }

    /// Prefix of symbolic tokens and snapshot file names.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Credential => "credential",
            EntityKind::Filter => "filter",
            EntityKind::ReportFormat => "reportformat",
            EntityKind::Slave => "slave",
            EntityKind::Schedule => "schedule",
            EntityKind::ScanConfig => "config",
            EntityKind::Target => "target",
            EntityKind::Alert => "alert",
            EntityKind::Task => "task",
            EntityKind::Note => "note",
            EntityKind::Override => "override",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }

    /// Element name of one entity in protocol responses.
    pub fn element(self) -> &'static str {
        match self {
            EntityKind::Credential => "lsc_credential",
            EntityKind::Filter => "filter",
            EntityKind::ReportFormat => "report_format",
            EntityKind::Slave => "slave",
            EntityKind::Schedule => "schedule",
            EntityKind::ScanConfig => "config",
            EntityKind::Target => "target",
            EntityKind::Alert => "alert",
            EntityKind::Task => "task",
            EntityKind::Note => "note",
            EntityKind::Override => "override",
        }
    }

    /// Read command, e.g. `get_targets`.
    pub fn get_command(self) -> String {
        format!("get_{}s", self.element())
    }

    /// Write command, e.g. `create_target`.
    pub fn create_command(self) -> String {
        format!("create_{}", self.element())
    }

    /// Inventory query listing every entity of this kind.
    pub fn list_request(self) -> String {
        let details = match self {
            EntityKind::Task | EntityKind::Note | EntityKind::Override => " details=\"1\"",
            _ => "",
        };
        format!("<{} filter=\"rows=-1\"{}/>", self.get_command(), details)
    }

    /// Human readable plural used in progress notices.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Credential => "credentials",
            EntityKind::Filter => "filters",
            EntityKind::ReportFormat => "report formats",
            EntityKind::Slave => "slaves",
            EntityKind::Schedule => "schedules",
            EntityKind::ScanConfig => "scan configs",
            EntityKind::Target => "targets",
            EntityKind::Alert => "alerts",
            EntityKind::Task => "tasks",
            EntityKind::Note => "notes",
            EntityKind::Override => "overrides",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Portable reference to the `ordinal`-th entity of `kind` in one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub ordinal: u32,
}

impl EntityRef {
    pub fn new(kind: EntityKind, ordinal: u32) -> Self {
        Self { kind, ordinal }
    }

    /// Parse a whole-value token such as `target_3`.
    pub fn parse_token(token: &str) -> Option<Self> {
        let (prefix, ordinal) = token.rsplit_once('_')?;
        if ordinal.is_empty() || !ordinal.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let kind = EntityKind::from_prefix(prefix)?;
        let ordinal = ordinal.parse().ok()?;
        (ordinal > 0).then_some(Self { kind, ordinal })
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.prefix(), self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_respects_rank() {
        for pair in EntityKind::ALL.windows(2) {
            assert!(pair[0].rank() <= pair[1].rank());
        }
        assert!(EntityKind::Task.may_reference(EntityKind::Target));
        assert!(!EntityKind::Filter.may_reference(EntityKind::ReportFormat));
        assert!(!EntityKind::Target.may_reference(EntityKind::Alert));
    }

    #[test]
    fn test_token_parsing() {
        assert_eq!(
            EntityRef::parse_token("target_3"),
            Some(EntityRef::new(EntityKind::Target, 3))
        );
        assert_eq!(
            EntityRef::parse_token("reportformat_12"),
            Some(EntityRef::new(EntityKind::ReportFormat, 12))
        );
        assert_eq!(EntityRef::parse_token("target_"), None);
        assert_eq!(EntityRef::parse_token("target_0"), None);
        assert_eq!(EntityRef::parse_token("port_list_1"), None);
        assert_eq!(EntityRef::parse_token("target_3a"), None);
        assert_eq!(EntityRef::new(EntityKind::ScanConfig, 2).to_string(), "config_2");
    }

    #[test]
    fn test_list_request() {
        assert_eq!(
            EntityKind::Target.list_request(),
            "<get_targets filter=\"rows=-1\"/>"
        );
        assert_eq!(
            EntityKind::Note.list_request(),
            "<get_notes filter=\"rows=-1\" details=\"1\"/>"
        );
        assert_eq!(EntityKind::Credential.create_command(), "create_lsc_credential");
    }
}
