//! Slave decoder.
//!
//! Security caveat: the protocol never returns a slave's password, so the
//! creation document carries the password of the active connection profile
//! in plaintext. That is the operator credential of the server running the
//! export and it ends up inside the snapshot archive.

use super::{
    Capture, DecodeContext, EntityDecoder, SectionMachine, SectionSet, Transition, COMMON_IGNORED,
};
use crate::document::Document;
use crate::kind::EntityKind;
use crate::stream::TagEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Global,
    Ignored,
}

impl SectionSet for Section {
    const GLOBAL: Self = Section::Global;

    fn enter(tag: &str) -> Option<Self> {
        (COMMON_IGNORED.contains(&tag) || tag == "tasks").then_some(Section::Ignored)
    }
}

#[derive(Debug, Default)]
pub struct SlaveDecoder {
    sections: SectionMachine<Section>,
    name: String,
    comment: String,
    host: String,
    port: String,
    login: String,
}

impl EntityDecoder for SlaveDecoder {
    const KIND: EntityKind = EntityKind::Slave;

    fn feed(&mut self, event: &TagEvent) {
        let Transition::Within(Section::Global) = self.sections.step(event) else {
            return;
        };
        let field = match event.name.as_str() {
            "name" => &mut self.name,
            "comment" => &mut self.comment,
            "host" => &mut self.host,
            "port" => &mut self.port,
            "login" => &mut self.login,
            _ => return,
        };
        *field = event.content.clone();
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn capture(&self, _identity: &str, ctx: &mut DecodeContext<'_>) -> Capture {
        let password = match ctx.slave_password.clone() {
            Some(password) => password,
            None => {
                ctx.warn(format!(
                    "slave '{}' exported without password: no connection profile loaded",
                    self.name
                ));
                String::new()
            }
        };

        let mut document = Document::new();
        document
            .open("create_slave")
            .element("name", &self.name)
            .optional_element("comment", &self.comment)
            .element("host", &self.host)
            .element("port", &self.port)
            .element("login", &self.login)
            .element("password", &password)
            .close("create_slave");
        Capture::Document(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_kind;
    use crate::resolver::ReferenceResolver;
    use chrono::Utc;

    const RESPONSE: &str = r#"<get_slaves_response status="200">
        <slave id="s-1"><owner><name>admin</name></owner><name>dmz</name><comment></comment>
          <host>10.0.0.5</host><port>9390</port><login>scanner</login>
          <tasks><task id="t-1"><name>DMZ weekly</name></task></tasks>
        </slave>
    </get_slaves_response>"#;

    #[test]
    fn test_slave_embeds_profile_password() {
        let mut resolver = ReferenceResolver::new();
        let mut ctx = DecodeContext::new(&mut resolver, Utc::now());
        ctx.slave_password = Some("s3cret".into());
        let records = decode_kind(EntityKind::Slave, RESPONSE, &mut ctx);

        assert_eq!(records[0].name, "dmz");
        assert_eq!(
            records[0].document().unwrap().to_stored(),
            "<create_slave><name>dmz</name><host>10.0.0.5</host><port>9390</port>\
             <login>scanner</login><password>s3cret</password></create_slave>"
        );
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn test_missing_profile_warns() {
        let mut resolver = ReferenceResolver::new();
        let mut ctx = DecodeContext::new(&mut resolver, Utc::now());
        let records = decode_kind(EntityKind::Slave, RESPONSE, &mut ctx);

        assert!(records[0]
            .document()
            .unwrap()
            .to_stored()
            .contains("<password></password>"));
        assert_eq!(ctx.warnings.len(), 1);
    }
}
