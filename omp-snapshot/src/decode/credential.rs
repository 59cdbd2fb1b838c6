//! Credential decoder.
//!
//! Secret material cannot be read back through the protocol, so only the
//! name and identity are captured. The manifest still lists each
//! credential: restore resolves it by name once the operator has recreated
//! it on the destination by hand.

use super::{
    Capture, DecodeContext, EntityDecoder, SectionMachine, SectionSet, Transition, COMMON_IGNORED,
};
use crate::kind::EntityKind;
use crate::stream::TagEvent;

/// Credential types whose private key can never leave the server.
const KEY_TYPES: [&str; 3] = ["usk", "key", "cc"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Global,
    Ignored,
}

impl SectionSet for Section {
    const GLOBAL: Self = Section::Global;

    fn enter(tag: &str) -> Option<Self> {
        (COMMON_IGNORED.contains(&tag) || tag == "targets" || tag == "slaves")
            .then_some(Section::Ignored)
    }
}

#[derive(Debug, Default)]
pub struct CredentialDecoder {
    sections: SectionMachine<Section>,
    name: String,
    credential_type: String,
}

impl EntityDecoder for CredentialDecoder {
    const KIND: EntityKind = EntityKind::Credential;

    fn feed(&mut self, event: &TagEvent) {
        let Transition::Within(Section::Global) = self.sections.step(event) else {
            return;
        };
        match event.name.as_str() {
            "name" => self.name = event.content.clone(),
            "type" => self.credential_type = event.content.clone(),
            _ => {}
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn capture(&self, _identity: &str, ctx: &mut DecodeContext<'_>) -> Capture {
        if KEY_TYPES.contains(&self.credential_type.as_str()) {
            ctx.warn(format!(
                "credential '{}' holds private key material which is not exportable",
                self.name
            ));
        }
        Capture::NotExportable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_kind;
    use crate::resolver::ReferenceResolver;
    use chrono::Utc;

    #[test]
    fn test_credentials_are_not_exportable() {
        let response = r#"<get_lsc_credentials_response status="200">
            <lsc_credential id="c-1"><name>root ssh</name><login>root</login><type>usk</type>
              <targets><target id="t-1"><name>web</name></target></targets>
            </lsc_credential>
            <lsc_credential id="c-2"><name>smb admin</name><type>up</type></lsc_credential>
        </get_lsc_credentials_response>"#;

        let mut resolver = ReferenceResolver::new();
        let mut ctx = DecodeContext::new(&mut resolver, Utc::now());
        let records = decode_kind(EntityKind::Credential, response, &mut ctx);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "root ssh");
        assert_eq!(records[0].capture, Capture::NotExportable);
        assert!(records[1].document().is_none());
        assert_eq!(ctx.warnings.len(), 1);
        assert!(ctx.warnings[0].contains("root ssh"));
    }
}
