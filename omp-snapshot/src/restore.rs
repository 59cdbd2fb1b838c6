//! Snapshot restore.
//!
//! Kinds are replayed in dependency order. Before a kind is replayed the
//! destination inventory of that kind is loaded: an entity whose name
//! already exists is bound to the existing identity and skipped, which
//! makes re-importing the same snapshot a no-op. A kind with any failure
//! stops the run, since later kinds may reference the entities that failed.

use crate::decode::inventory;
use crate::kind::{EntityKind, EntityRef};
use crate::report::RunReport;
use crate::resolver::ReferenceResolver;
use crate::service::{CommandStatus, ProtocolService};
use crate::snapshot::{ManifestEntry, SnapshotReader};
use crate::utils::errors::{Result, SnapshotError};
use tracing::{debug, error, info};

pub struct RestoreEngine<S: ProtocolService> {
    service: S,
    resolver: ReferenceResolver,
}

impl<S: ProtocolService> RestoreEngine<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            resolver: ReferenceResolver::new(),
        }
    }

    /// Ordinal ↔ destination identity bindings made so far.
    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Replay `snapshot` onto the destination. Per-entity failures are
    /// collected in the report; only service failures while reading an
    /// inventory end the run with an error.
    pub fn run(&mut self, snapshot: &SnapshotReader) -> Result<RunReport> {
        let mut report = RunReport::new();

        for kind in EntityKind::ALL {
            let entries = snapshot.entries(kind);
            info!("Importing {}", kind.label());
            self.load_inventory(kind)?;

            let mut failures = Vec::new();
            for entry in entries {
                if let Some(identity) = self.resolver.existing(kind, &entry.name) {
                    let identity = identity.to_string();
                    info!("{} '{}' already exists, skipping", kind, entry.name);
                    self.resolver.register(kind, entry.ordinal, &identity);
                    report.skipped += 1;
                    continue;
                }

                match self.create(snapshot, entry) {
                    Ok(identity) => {
                        info!("{} '{}' imported", kind, entry.name);
                        self.resolver.register(kind, entry.ordinal, &identity);
                        report.created += 1;
                    }
                    Err(reason) => failures.push(reason),
                }
            }

            if !failures.is_empty() {
                for failure in &failures {
                    report.error(failure.clone());
                }
                error!("{}", SnapshotError::ImportFailed { kind, failures });
                report.aborted_at = Some(kind);
                break;
            }
        }

        Ok(report)
    }

    fn load_inventory(&mut self, kind: EntityKind) -> Result<()> {
        let request = kind.list_request();
        let response = self.service.execute(&request)?;
        match CommandStatus::parse(&response) {
            Some(status) if status.is_ok() => {}
            other => {
                return Err(SnapshotError::MalformedResponse {
                    command: request,
                    reason: other.map_or_else(
                        || "response carries no status".to_string(),
                        |status| format!("status {} ({})", status.code, status.text),
                    ),
                })
            }
        }
        let entries = inventory(kind, &response);
        debug!(kind = %kind, existing = entries.len(), "Loaded destination inventory");
        self.resolver.load_inventory(kind, entries);
        Ok(())
    }

    /// Create one entity; the error is the failure line for the report.
    fn create(
        &mut self,
        snapshot: &SnapshotReader,
        entry: &ManifestEntry,
    ) -> std::result::Result<String, String> {
        let reference = entry.reference();
        let describe = || format!("{}/{}/{}", entry.kind, entry.ordinal, entry.name);

        let document = match snapshot.document(reference) {
            Ok(Some(document)) => document,
            Ok(None) if entry.kind == EntityKind::Credential => {
                return Err(format!(
                    "credential '{}' does not exist on the destination, import it manually",
                    entry.name
                ));
            }
            Ok(None) => {
                return Err(SnapshotError::MissingDocument(reference.to_string()).to_string());
            }
            Err(e) => return Err(format!("could not read {}: {e}", describe())),
        };

        let request = document
            .render(|target: EntityRef| self.resolver.identity(target).map(str::to_string))
            .map_err(|unresolved| {
                SnapshotError::UnresolvedReference {
                    token: unresolved.to_string(),
                    document: reference.to_string(),
                }
                .to_string()
            })?;

        let response = self
            .service
            .execute(&request)
            .map_err(|e| format!("could not import {}: {e}", describe()))?;

        match CommandStatus::parse(&response) {
            Some(status) => match status.created() {
                Some(identity) => Ok(identity.to_string()),
                None => Err(format!(
                    "could not import {}, status {} ({})",
                    describe(),
                    status.code,
                    status.text
                )),
            },
            None => Err(format!("could not import {}, response carries no status", describe())),
        }
    }
}
