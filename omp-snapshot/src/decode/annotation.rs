//! Note and override decoders.
//!
//! Both annotate results of one NVT, optionally scoped to a task, hosts, a
//! port and a severity. Overrides additionally carry a new severity. Neither
//! has a name of its own; their merge key is `{nvt_oid}:{text}`.

use super::{
    parse_instant, Capture, DecodeContext, EntityDecoder, SectionMachine, SectionSet, Transition,
    COMMON_IGNORED,
};
use crate::document::{Document, Reference};
use crate::kind::EntityKind;
use crate::stream::TagEvent;
use chrono::{DateTime, Utc};

/// `active` value meaning "active, never expires".
pub const ACTIVE_FOREVER: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Global,
    Ignored,
    Nvt,
    Task,
}

impl SectionSet for Section {
    const GLOBAL: Self = Section::Global;

    fn enter(tag: &str) -> Option<Self> {
        match tag {
            "nvt" => Some(Section::Nvt),
            "task" => Some(Section::Task),
            "result" => Some(Section::Ignored),
            _ if COMMON_IGNORED.contains(&tag) => Some(Section::Ignored),
            _ => None,
        }
    }
}

/// Encode the active state for `create_note`/`create_override`:
/// `-1` active without expiry, the remaining seconds when an expiry is
/// set, `0` when inactive or already expired.
pub fn encode_active(active: bool, expires: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match (active, expires) {
        (false, _) => 0,
        (true, None) => ACTIVE_FOREVER,
        (true, Some(expires)) => (expires - now).num_seconds().max(0),
    }
}

/// Fields shared by notes and overrides.
#[derive(Debug, Default)]
pub struct Annotation {
    sections: SectionMachine<Section>,
    nvt_oid: String,
    text: String,
    active: String,
    end_time: String,
    hosts: String,
    port: String,
    severity: String,
    new_severity: String,
    task: Option<String>,
}

impl Annotation {
    fn feed(&mut self, event: &TagEvent) {
        match self.sections.step(event) {
            Transition::Enter(Section::Nvt) => {
                self.nvt_oid = event.attribute("oid").unwrap_or_default().to_string();
            }
            Transition::Enter(Section::Task) => self.task = event.id().map(str::to_string),
            Transition::Within(Section::Global) => {
                let field = match event.name.as_str() {
                    "text" => &mut self.text,
                    "active" => &mut self.active,
                    "end_time" => &mut self.end_time,
                    "hosts" => &mut self.hosts,
                    "port" => &mut self.port,
                    "severity" => &mut self.severity,
                    "new_severity" => &mut self.new_severity,
                    _ => return,
                };
                *field = event.content.clone();
            }
            _ => {}
        }
    }

    fn name(&self) -> String {
        format!("{}:{}", self.nvt_oid, self.text)
    }

    fn expiry(&self, ctx: &mut DecodeContext<'_>) -> Option<DateTime<Utc>> {
        let end_time = self.end_time.trim();
        if end_time.is_empty() || end_time == "0" {
            return None;
        }
        let expiry = parse_instant(end_time);
        if expiry.is_none() {
            ctx.warn(format!(
                "annotation on {} has unreadable end time '{end_time}'; \
                 treating it as never expiring",
                self.nvt_oid
            ));
        }
        expiry
    }

    fn capture(&self, kind: EntityKind, ctx: &mut DecodeContext<'_>) -> Capture {
        let expires = self.expiry(ctx);
        let active = encode_active(self.active.trim() == "1", expires, ctx.now);
        let command = kind.create_command();

        let mut document = Document::new();
        document
            .open(&command)
            .element("text", &self.text)
            .raw(&format!(
                "<nvt oid=\"{}\"/>",
                crate::document::escape(&self.nvt_oid)
            ))
            .element("active", &active.to_string())
            .optional_element("hosts", &self.hosts)
            .optional_element("port", &self.port)
            .optional_element("severity", &self.severity);
        if kind == EntityKind::Override {
            document.element("new_severity", &self.new_severity);
        }
        if let Some(task) = &self.task {
            let reference: Reference = ctx.reference(EntityKind::Task, task);
            document.id_element("task", &reference);
        }
        document.close(&command);
        Capture::Document(document)
    }
}

#[derive(Debug, Default)]
pub struct NoteDecoder(Annotation);

#[derive(Debug, Default)]
pub struct OverrideDecoder(Annotation);

impl EntityDecoder for NoteDecoder {
    const KIND: EntityKind = EntityKind::Note;

    fn feed(&mut self, event: &TagEvent) {
        self.0.feed(event);
    }

    fn name(&self) -> String {
        self.0.name()
    }

    fn capture(&self, _identity: &str, ctx: &mut DecodeContext<'_>) -> Capture {
        self.0.capture(Self::KIND, ctx)
    }
}

impl EntityDecoder for OverrideDecoder {
    const KIND: EntityKind = EntityKind::Override;

    fn feed(&mut self, event: &TagEvent) {
        self.0.feed(event);
    }

    fn name(&self) -> String {
        self.0.name()
    }

    fn capture(&self, _identity: &str, ctx: &mut DecodeContext<'_>) -> Capture {
        self.0.capture(Self::KIND, ctx)
    }
}
