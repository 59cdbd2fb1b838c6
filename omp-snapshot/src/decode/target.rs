//! Target decoder.
//!
//! Login credential references become `credential_{n}` tokens; the SSH
//! credential carries its port. Port lists are not part of a snapshot and
//! keep their identity.

use super::{
    Capture, DecodeContext, EntityDecoder, SectionMachine, SectionSet, Transition, COMMON_IGNORED,
};
use crate::document::{Document, Reference};
use crate::kind::EntityKind;
use crate::stream::TagEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Global,
    Ignored,
    SshCredential,
    SmbCredential,
    EsxiCredential,
    PortList,
}

impl SectionSet for Section {
    const GLOBAL: Self = Section::Global;

    fn enter(tag: &str) -> Option<Self> {
        match tag {
            "ssh_lsc_credential" => Some(Section::SshCredential),
            "smb_lsc_credential" => Some(Section::SmbCredential),
            "esxi_lsc_credential" => Some(Section::EsxiCredential),
            "port_list" => Some(Section::PortList),
            "tasks" => Some(Section::Ignored),
            _ if COMMON_IGNORED.contains(&tag) => Some(Section::Ignored),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct TargetDecoder {
    sections: SectionMachine<Section>,
    name: String,
    comment: String,
    hosts: String,
    exclude_hosts: String,
    alive_tests: String,
    ssh_credential: Option<String>,
    ssh_port: String,
    smb_credential: Option<String>,
    esxi_credential: Option<String>,
    port_list: Option<String>,
}

impl EntityDecoder for TargetDecoder {
    const KIND: EntityKind = EntityKind::Target;

    fn feed(&mut self, event: &TagEvent) {
        let id = || event.id().map(str::to_string);
        match self.sections.step(event) {
            Transition::Enter(Section::SshCredential) => self.ssh_credential = id(),
            Transition::Enter(Section::SmbCredential) => self.smb_credential = id(),
            Transition::Enter(Section::EsxiCredential) => self.esxi_credential = id(),
            Transition::Enter(Section::PortList) => self.port_list = id(),
            Transition::Within(Section::SshCredential) if event.opens("port") => {
                self.ssh_port = event.content.clone()
            }
            Transition::Within(Section::Global) => match event.name.as_str() {
                "name" => self.name = event.content.clone(),
                "comment" => self.comment = event.content.clone(),
                "hosts" => self.hosts = event.content.clone(),
                "exclude_hosts" => self.exclude_hosts = event.content.clone(),
                "alive_tests" => self.alive_tests = event.content.clone(),
                _ => {}
            },
            _ => {}
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn capture(&self, _identity: &str, ctx: &mut DecodeContext<'_>) -> Capture {
        let mut document = Document::new();
        document
            .open("create_target")
            .element("name", &self.name)
            .optional_element("comment", &self.comment)
            .element("hosts", &self.hosts)
            .optional_element("exclude_hosts", &self.exclude_hosts)
            .optional_element("alive_tests", &self.alive_tests);

        if let Some(identity) = &self.ssh_credential {
            let reference = ctx.reference(EntityKind::Credential, identity);
            document
                .open_with_id("ssh_lsc_credential", &reference)
                .optional_element("port", &self.ssh_port)
                .close("ssh_lsc_credential");
        }
        if let Some(identity) = &self.smb_credential {
            let reference = ctx.reference(EntityKind::Credential, identity);
            document.id_element("smb_lsc_credential", &reference);
        }
        if let Some(identity) = &self.esxi_credential {
            let reference = ctx.reference(EntityKind::Credential, identity);
            document.id_element("esxi_lsc_credential", &reference);
        }
        if let Some(identity) = &self.port_list {
            document.id_element("port_list", &Reference::Foreign(identity.clone()));
        }

        document.close("create_target");
        Capture::Document(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_kind;
    use crate::resolver::ReferenceResolver;
    use chrono::Utc;

    #[test]
    fn test_credentials_become_tokens() {
        let response = r#"<get_targets_response status="200">
            <target id="t-1"><name>web farm</name><hosts>10.0.0.1-10</hosts>
              <exclude_hosts></exclude_hosts>
              <ssh_lsc_credential id="c-ssh"><name>root ssh</name><port>2222</port>
                <trash>0</trash></ssh_lsc_credential>
              <smb_lsc_credential id=""><name></name></smb_lsc_credential>
              <port_list id="pl-33"><name>All IANA assigned TCP</name></port_list>
              <tasks><task id="x"><name>Nightly</name></task></tasks>
            </target>
        </get_targets_response>"#;

        let mut resolver = ReferenceResolver::new();
        resolver.register(EntityKind::Credential, 2, "c-ssh");
        let mut ctx = DecodeContext::new(&mut resolver, Utc::now());
        let records = decode_kind(EntityKind::Target, response, &mut ctx);

        assert_eq!(records[0].name, "web farm");
        assert_eq!(
            records[0].document().unwrap().to_stored(),
            "<create_target><name>web farm</name><hosts>10.0.0.1-10</hosts>\
             <ssh_lsc_credential id=\"credential_2\"><port>2222</port></ssh_lsc_credential>\
             <port_list id=\"pl-33\"/></create_target>"
        );
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn test_unknown_credential_passes_through() {
        let response = r#"<get_targets_response><target id="t-2"><name>db</name><hosts>db1</hosts>
            <smb_lsc_credential id="c-gone"><name>old</name></smb_lsc_credential></target>
            </get_targets_response>"#;

        let mut resolver = ReferenceResolver::new();
        let mut ctx = DecodeContext::new(&mut resolver, Utc::now());
        let records = decode_kind(EntityKind::Target, response, &mut ctx);

        assert!(records[0]
            .document()
            .unwrap()
            .to_stored()
            .contains("<smb_lsc_credential id=\"c-gone\"/>"));
        assert_eq!(ctx.warnings.len(), 1);
    }
}
