//! Manifest line codec.

use crate::document::{escape_lines, unescape_lines};
use crate::kind::{EntityKind, EntityRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub kind: EntityKind,
    pub ordinal: u32,
    pub name: String,
}

impl ManifestEntry {
    pub fn new(kind: EntityKind, ordinal: u32, name: impl Into<String>) -> Self {
        Self {
            kind,
            ordinal,
            name: name.into(),
        }
    }

    pub fn reference(&self) -> EntityRef {
        EntityRef::new(self.kind, self.ordinal)
    }

    /// `{kind}_{ordinal}@{name}`, with line breaks in the name folded.
    pub fn to_line(&self) -> String {
        format!("{}@{}", self.reference(), escape_lines(&self.name))
    }

    pub fn parse(line: &str) -> Result<Self, String> {
        let (token, name) = line
            .split_once('@')
            .ok_or_else(|| format!("missing '@' in '{line}'"))?;
        let reference =
            EntityRef::parse_token(token).ok_or_else(|| format!("bad token '{token}'"))?;
        Ok(Self {
            kind: reference.kind,
            ordinal: reference.ordinal,
            name: unescape_lines(name),
        })
    }
}
