//! Snapshot export.
//!
//! Kinds are queried in dependency order so every reference a decoder meets
//! points at an entity captured earlier in the same run.

use crate::decode::{decode_kind, envelope, Capture, DecodeContext};
use crate::kind::EntityKind;
use crate::report::RunReport;
use crate::resolver::ReferenceResolver;
use crate::service::{CommandStatus, ProtocolService};
use crate::snapshot::SnapshotWriter;
use crate::utils::errors::{Result, SnapshotError};
use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Password embedded into exported slaves.
    pub slave_password: Option<String>,
    /// Reference time for note and override expiry.
    pub now: DateTime<Utc>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            slave_password: None,
            now: Utc::now(),
        }
    }
}

/// Send `request` and fail unless the response carries a 2xx status.
fn query<S: ProtocolService>(service: &mut S, request: &str) -> Result<String> {
    let response = service.execute(request)?;
    match CommandStatus::parse(&response) {
        Some(status) if status.is_ok() => Ok(response),
        Some(status) => Err(SnapshotError::MalformedResponse {
            command: request.to_string(),
            reason: format!("status {} ({})", status.code, status.text),
        }),
        None => Err(SnapshotError::MalformedResponse {
            command: request.to_string(),
            reason: "response carries no status".to_string(),
        }),
    }
}

/// Capture every supported entity of the service into `writer`.
pub fn export_snapshot<S: ProtocolService>(
    mut service: S,
    writer: &mut SnapshotWriter,
    options: ExportOptions,
) -> Result<RunReport> {
    let mut report = RunReport::new();
    let mut resolver = ReferenceResolver::new();
    let mut ctx = DecodeContext::new(&mut resolver, options.now);
    ctx.slave_password = options.slave_password;

    for kind in EntityKind::ALL {
        info!("Requesting {}", kind.label());
        writer.begin_kind(kind)?;

        let response = query(&mut service, &kind.list_request())?;
        let mut records = decode_kind(kind, &response, &mut ctx);

        for record in &mut records {
            if let Capture::Detail { request } = &record.capture {
                let detail = query(&mut service, request)?;
                record.capture = Capture::Document(envelope(kind, &detail));
            }
            writer.write(record)?;
            report.exported += 1;
        }

        for warning in ctx.warnings.drain(..) {
            report.warn(warning);
        }

        if kind == EntityKind::Credential && !records.is_empty() {
            let names: Vec<_> = records.iter().map(|record| record.name.as_str()).collect();
            report.warn(format!(
                "found {} credential(s) ({}); credentials cannot be exported, \
                 import them manually on the destination",
                records.len(),
                names.join(", ")
            ));
        }

        info!("Exported {} {}", records.len(), kind.label());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::memory::MemoryServer;
    use std::fs;
    use tempfile::TempDir;

    fn source() -> MemoryServer {
        let mut server = MemoryServer::new();
        server.insert(EntityKind::Credential, "c-1", "<name>root ssh</name><type>up</type>");
        server.insert(EntityKind::Filter, "f-1", "<name>Web</name><term>port=80</term>");
        server.insert(
            EntityKind::Target,
            "t-1",
            "<name>web farm</name><hosts>10.0.0.0/24</hosts>\
             <ssh_lsc_credential id=\"c-1\"><name>root ssh</name><port>22</port>\
             </ssh_lsc_credential>",
        );
        server
    }

    #[test]
    fn test_export_writes_every_manifest() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let mut writer = SnapshotWriter::create(dir.path())?;
        let mut server = source();

        let report = export_snapshot(&mut server, &mut writer, ExportOptions::default())?;

        assert_eq!(report.exported, 3);
        for kind in EntityKind::ALL {
            assert!(dir.path().join(format!("{}.list", kind.prefix())).is_file());
        }
        assert_eq!(
            fs::read_to_string(dir.path().join("credential.list")).unwrap(),
            "credential_1@root ssh\n"
        );
        assert!(!dir.path().join("credential_1.xml").exists());

        let target = fs::read_to_string(dir.path().join("target_1.xml")).unwrap();
        assert!(target.contains("<ssh_lsc_credential id=\"credential_1\"><port>22</port>"));
        assert!(report.warnings.iter().any(|w| w.contains("found 1 credential(s) (root ssh)")));
        Ok(())
    }

    #[test]
    fn test_details_are_fetched_and_wrapped() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let mut writer = SnapshotWriter::create(dir.path())?;
        let mut server = MemoryServer::new();
        server.insert(
            EntityKind::ReportFormat,
            "rf-1",
            "<name>Summary</name><extension>txt</extension>",
        );

        export_snapshot(&mut server, &mut writer, ExportOptions::default())?;

        assert!(server
            .requests
            .iter()
            .any(|r| r == "<get_report_formats report_format_id=\"rf-1\" details=\"1\"/>"));
        let stored = fs::read_to_string(dir.path().join("reportformat_1.xml")).unwrap();
        assert!(stored.starts_with("<create_report_format><get_report_formats_response"));
        assert!(stored.contains("<name>Summary</name>"));
        assert!(stored.trim_end().ends_with("</create_report_format>"));
        Ok(())
    }

    struct Failing;

    impl ProtocolService for Failing {
        fn execute(&mut self, _request: &str) -> Result<String> {
            Ok("<get_lsc_credentials_response status=\"503\" \
                status_text=\"Service temporarily down\"/>"
                .into())
        }
    }

    #[test]
    fn test_error_status_aborts_export() {
        let dir = TempDir::new().unwrap();
        let mut writer = SnapshotWriter::create(dir.path()).unwrap();
        let result = export_snapshot(Failing, &mut writer, ExportOptions::default());
        assert!(matches!(result, Err(SnapshotError::MalformedResponse { .. })));
    }
}
