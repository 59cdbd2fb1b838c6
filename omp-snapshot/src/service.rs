//! Boundary to the management protocol service.

use crate::stream::TagStream;
use crate::utils::errors::Result;

/// Status code of a successful `create_*` command.
pub const STATUS_CREATED: &str = "201";

/// Sends one XML request and returns the XML response. Calls are blocking
/// and strictly sequential.
pub trait ProtocolService {
    fn execute(&mut self, request: &str) -> Result<String>;
}

impl<S: ProtocolService + ?Sized> ProtocolService for &mut S {
    fn execute(&mut self, request: &str) -> Result<String> {
        (**self).execute(request)
    }
}

/// Status attributes of a response's root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStatus {
    pub code: String,
    pub text: String,
    /// Identity of the created entity, if any.
    pub id: Option<String>,
}

impl CommandStatus {
    /// Read the first element of `response`.
    pub fn parse(response: &str) -> Option<Self> {
        let root = TagStream::new(response).next()?;
        Some(Self {
            code: root.attribute("status")?.to_string(),
            text: root.attribute("status_text").unwrap_or_default().to_string(),
            id: root.id().map(str::to_string),
        })
    }

    pub fn is_ok(&self) -> bool {
        self.code.starts_with('2')
    }

    /// The command created an entity and reported its identity.
    pub fn created(&self) -> Option<&str> {
        (self.code == STATUS_CREATED).then_some(self.id.as_deref()).flatten()
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory stand-in for a management server.

    use super::ProtocolService;
    use crate::decode::inventory;
    use crate::document::escape;
    use crate::kind::EntityKind;
    use crate::stream::TagStream;
    use crate::utils::errors::{Result, SnapshotError};
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Clone)]
    pub struct StoredEntity {
        pub id: String,
        /// Inner XML of the entity element.
        pub body: String,
    }

    #[derive(Debug, Default)]
    pub struct MemoryServer {
        pub entities: HashMap<EntityKind, Vec<StoredEntity>>,
        /// Every request received, in order.
        pub requests: Vec<String>,
        /// Names whose `create_*` is rejected with status 400.
        pub reject: HashSet<String>,
        next_id: usize,
    }

    impl MemoryServer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, kind: EntityKind, id: &str, body: &str) {
            self.entities.entry(kind).or_default().push(StoredEntity {
                id: id.to_string(),
                body: body.to_string(),
            });
        }

        pub fn count(&self, kind: EntityKind) -> usize {
            self.entities.get(&kind).map_or(0, Vec::len)
        }

        pub fn listing(&self, kind: EntityKind, only: Option<&str>) -> String {
            let element = kind.element();
            let command = kind.get_command();
            let mut out = format!("<{command}_response status=\"200\" status_text=\"OK\">");
            for entity in self.entities.get(&kind).into_iter().flatten() {
                if only.is_some_and(|id| id != entity.id) {
                    continue;
                }
                out.push_str(&format!(
                    "<{element} id=\"{}\">{}</{element}>",
                    escape(&entity.id),
                    entity.body
                ));
            }
            out.push_str(&format!("</{}_response>", kind.get_command()));
            out
        }

        /// Names of stored entities, via the same decoders restore uses.
        pub fn names(&self, kind: EntityKind) -> Vec<String> {
            inventory(kind, &self.listing(kind, None))
                .into_iter()
                .map(|(name, _)| name)
                .collect()
        }

        /// Creates received, as `(kind, rendered request)`.
        pub fn creates(&self) -> Vec<(EntityKind, String)> {
            self.requests
                .iter()
                .filter_map(|request| {
                    let root = TagStream::new(request).next()?;
                    let element = root.name.strip_prefix("create_")?;
                    let kind = EntityKind::ALL.into_iter().find(|k| k.element() == element)?;
                    Some((kind, request.clone()))
                })
                .collect()
        }

        fn create(&mut self, kind: EntityKind, request: &str) -> String {
            let command = kind.create_command();
            let body = request
                .trim()
                .strip_prefix(&format!("<{command}>"))
                .and_then(|rest| rest.strip_suffix(&format!("</{command}>")))
                .unwrap_or_default()
                .to_string();

            self.next_id += 1;
            let id = format!("{}-{}", kind.prefix(), self.next_id);
            let probe = format!(
                "<{element} id=\"{id}\">{body}</{element}>",
                element = kind.element()
            );
            let name = inventory(kind, &probe)
                .into_iter()
                .next()
                .map(|(name, _)| name)
                .unwrap_or_default();

            let response = format!("{command}_response");
            if self.reject.contains(&name) {
                return format!("<{response} status=\"400\" status_text=\"Rejected by test\"/>");
            }
            self.insert(kind, &id, &body);
            format!("<{response} status=\"201\" status_text=\"OK, resource created\" id=\"{id}\"/>")
        }
    }

    impl ProtocolService for MemoryServer {
        fn execute(&mut self, request: &str) -> Result<String> {
            self.requests.push(request.to_string());
            let root = TagStream::new(request)
                .next()
                .ok_or_else(|| SnapshotError::Service("empty request".into()))?;

            for kind in EntityKind::ALL {
                if root.name == kind.get_command() {
                    let only = root.attribute(&format!("{}_id", kind.element()));
                    return Ok(self.listing(kind, only));
                }
                if root.name == kind.create_command() {
                    return Ok(self.create(kind, request));
                }
            }
            Err(SnapshotError::Service(format!("unknown command {}", root.name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_status() {
        let status = CommandStatus::parse(
            "<create_filter_response status=\"201\" \
             status_text=\"OK, resource created\" id=\"f-7\"/>",
        )
        .unwrap();
        assert!(status.is_ok());
        assert_eq!(status.created(), Some("f-7"));
    }

    #[test]
    fn test_rejected_status() {
        let status = CommandStatus::parse(
            "<create_target_response status=\"400\" status_text=\"Failed to find credential\"/>",
        )
        .unwrap();
        assert!(!status.is_ok());
        assert_eq!(status.created(), None);
        assert_eq!(status.text, "Failed to find credential");
    }

    #[test]
    fn test_missing_status() {
        assert_eq!(CommandStatus::parse("<nothing/>"), None);
        assert_eq!(CommandStatus::parse(""), None);
    }
}
