//! Per-kind entity decoders.
//!
//! Every decoder is a small state machine fed with [`TagEvent`]s between an
//! entity's opening and closing tags. Its position inside the entity is an
//! explicit `Section` value, moved by a transition table of
//! `(opening tag, section)` pairs: an opening tag from the table enters its
//! section from `Global`, the matching closing tag returns to `Global`.
//! Tags are only interpreted in the section where they carry meaning, so a
//! `name` under `owner` never overwrites the entity's own name.

pub mod alert;
pub mod annotation;
pub mod credential;
pub mod filter;
pub mod report_format;
pub mod scan_config;
pub mod schedule;
pub mod slave;
pub mod target;
pub mod task;

use crate::document::{Document, Reference};
use crate::kind::EntityKind;
use crate::resolver::ReferenceResolver;
use crate::stream::{TagEvent, TagStream};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Opening tags of bookkeeping sections every entity kind may carry.
pub(crate) const COMMON_IGNORED: [&str; 3] = ["owner", "permissions", "user_tags"];

/// A decoder's set of sections.
pub trait SectionSet: Copy + Eq + std::fmt::Debug + 'static {
    const GLOBAL: Self;

    /// Section entered by an opening `tag` while in `GLOBAL`.
    fn enter(tag: &str) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// The event opened section `S`; its content and attributes belong to it.
    Enter(S),
    /// The event closed the active section.
    Exit(S),
    /// The event is interpreted inside `S`.
    Within(S),
}

/// Current section plus the tag that opened it.
#[derive(Debug)]
pub struct SectionMachine<S: SectionSet> {
    current: S,
    opener: String,
}

impl<S: SectionSet> Default for SectionMachine<S> {
    fn default() -> Self {
        Self {
            current: S::GLOBAL,
            opener: String::new(),
        }
    }
}

impl<S: SectionSet> SectionMachine<S> {
    pub fn section(&self) -> S {
        self.current
    }

    pub fn step(&mut self, event: &TagEvent) -> Transition<S> {
        if self.current == S::GLOBAL {
            if event.is_close() {
                return Transition::Within(S::GLOBAL);
            }
            if let Some(next) = S::enter(&event.name) {
                self.current = next;
                self.opener = event.name.clone();
                return Transition::Enter(next);
            }
        } else if event.closes(&self.opener) {
            let left = self.current;
            self.current = S::GLOBAL;
            self.opener.clear();
            return Transition::Exit(left);
        }
        Transition::Within(self.current)
    }
}

/// How a captured entity is recreated on the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Ready-to-store creation document.
    Document(Document),
    /// Definition too structured to rebuild field by field: the export run
    /// fetches `request` and wraps the response with [`envelope`].
    Detail { request: String },
    /// Secret material that cannot be read back through the protocol.
    NotExportable,
}

/// One captured entity.
#[derive(Debug, Clone)]
pub struct Record {
    pub kind: EntityKind,
    /// Identity on the source server; never stored in the snapshot.
    pub source_identity: String,
    pub ordinal: u32,
    pub name: String,
    pub capture: Capture,
}

impl Record {
    pub fn document(&self) -> Option<&Document> {
        match &self.capture {
            Capture::Document(document) => Some(document),
            _ => None,
        }
    }
}

/// State shared by decoders during one export run.
pub struct DecodeContext<'a> {
    pub resolver: &'a mut ReferenceResolver,
    /// Reference time for expiry computations.
    pub now: DateTime<Utc>,
    /// Password of the active protocol connection profile.
    pub slave_password: Option<String>,
    pub warnings: Vec<String>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(resolver: &'a mut ReferenceResolver, now: DateTime<Utc>) -> Self {
        Self {
            resolver,
            now,
            slave_password: None,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Turn a source identity of `kind` into a portable reference. Identities
    /// not captured in this run pass through verbatim.
    pub fn reference(&mut self, kind: EntityKind, identity: &str) -> Reference {
        match self.resolver.lookup(kind, identity) {
            Some(captured) => Reference::Captured(captured),
            None => {
                self.warn(format!(
                    "{kind} {identity} is referenced but was not exported; keeping its identity"
                ));
                Reference::Foreign(identity.to_string())
            }
        }
    }
}

/// Decoder for one entity kind.
pub trait EntityDecoder: Default {
    const KIND: EntityKind;

    /// Consume one event between the entity's opening and closing tags.
    fn feed(&mut self, event: &TagEvent);

    /// Merge key of the entity.
    fn name(&self) -> String;

    /// Build the creation capture once the closing tag has arrived.
    fn capture(&self, identity: &str, ctx: &mut DecodeContext<'_>) -> Capture;
}

/// Walk `response` and call `emit` for every complete top-level entity of
/// `D::KIND` with its identity and finished decoder. An entity cut off by
/// the end of the response is dropped.
fn walk<D: EntityDecoder>(response: &str, mut emit: impl FnMut(String, D)) {
    let element = D::KIND.element();
    let mut open: Option<(String, D)> = None;
    let mut nesting = 0usize;

    for event in TagStream::new(response) {
        if nesting == 0 && event.closes(element) {
            if let Some((identity, decoder)) = open.take() {
                emit(identity, decoder);
                continue;
            }
        }

        match open.as_mut() {
            None => {
                if event.opens(element) {
                    if let Some(identity) = event.id() {
                        open = Some((identity.to_string(), D::default()));
                    }
                }
            }
            Some((_, decoder)) => {
                if event.opens(element) {
                    nesting += 1;
                } else if event.closes(element) {
                    nesting -= 1;
                }
                decoder.feed(&event);
            }
        }
    }
}

/// Decode every entity in a `get_*` response, numbering them in encounter
/// order and registering `ordinal ↔ source identity`.
pub fn decode_entities<D: EntityDecoder>(
    response: &str,
    ctx: &mut DecodeContext<'_>,
) -> Vec<Record> {
    let mut records = Vec::new();
    walk::<D>(response, |identity, decoder| {
        let ordinal = ctx.resolver.next_ordinal(D::KIND);
        let capture = decoder.capture(&identity, ctx);
        ctx.resolver.register(D::KIND, ordinal, &identity);
        let name = decoder.name();
        debug!(kind = %D::KIND, ordinal, name = %name, "Decoded entity");
        records.push(Record {
            kind: D::KIND,
            source_identity: identity,
            ordinal,
            name,
            capture,
        });
    });
    records
}

/// `(name, identity)` of every entity in a `get_*` response.
pub fn inventory_entities<D: EntityDecoder>(response: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    walk::<D>(response, |identity, decoder| entries.push((decoder.name(), identity)));
    entries
}

/// Decode a `get_*` response for `kind`.
pub fn decode_kind(kind: EntityKind, response: &str, ctx: &mut DecodeContext<'_>) -> Vec<Record> {
    match kind {
        EntityKind::Credential => decode_entities::<credential::CredentialDecoder>(response, ctx),
        EntityKind::Filter => decode_entities::<filter::FilterDecoder>(response, ctx),
        EntityKind::ReportFormat => {
            decode_entities::<report_format::ReportFormatDecoder>(response, ctx)
        }
        EntityKind::Slave => decode_entities::<slave::SlaveDecoder>(response, ctx),
        EntityKind::Schedule => decode_entities::<schedule::ScheduleDecoder>(response, ctx),
        EntityKind::ScanConfig => decode_entities::<scan_config::ScanConfigDecoder>(response, ctx),
        EntityKind::Target => decode_entities::<target::TargetDecoder>(response, ctx),
        EntityKind::Alert => decode_entities::<alert::AlertDecoder>(response, ctx),
        EntityKind::Task => decode_entities::<task::TaskDecoder>(response, ctx),
        EntityKind::Note => decode_entities::<annotation::NoteDecoder>(response, ctx),
        EntityKind::Override => decode_entities::<annotation::OverrideDecoder>(response, ctx),
    }
}

/// Name → identity inventory of `kind` from a `get_*` response.
pub fn inventory(kind: EntityKind, response: &str) -> Vec<(String, String)> {
    match kind {
        EntityKind::Credential => inventory_entities::<credential::CredentialDecoder>(response),
        EntityKind::Filter => inventory_entities::<filter::FilterDecoder>(response),
        EntityKind::ReportFormat => {
            inventory_entities::<report_format::ReportFormatDecoder>(response)
        }
        EntityKind::Slave => inventory_entities::<slave::SlaveDecoder>(response),
        EntityKind::Schedule => inventory_entities::<schedule::ScheduleDecoder>(response),
        EntityKind::ScanConfig => inventory_entities::<scan_config::ScanConfigDecoder>(response),
        EntityKind::Target => inventory_entities::<target::TargetDecoder>(response),
        EntityKind::Alert => inventory_entities::<alert::AlertDecoder>(response),
        EntityKind::Task => inventory_entities::<task::TaskDecoder>(response),
        EntityKind::Note => inventory_entities::<annotation::NoteDecoder>(response),
        EntityKind::Override => inventory_entities::<annotation::OverrideDecoder>(response),
    }
}

/// Wrap a fetched detail response in its creation envelope.
pub fn envelope(kind: EntityKind, detail: &str) -> Document {
    let body = strip_declaration(detail);
    let mut document = Document::new();
    document.open(&kind.create_command()).raw(body).close(&kind.create_command());
    document
}

fn strip_declaration(xml: &str) -> &str {
    let trimmed = xml.trim();
    match trimmed.strip_prefix("<?") {
        Some(rest) => rest.find("?>").map_or(trimmed, |end| rest[end + 2..].trim_start()),
        None => trimmed,
    }
}

/// Parse a protocol timestamp: RFC 3339 or the C `ctime` layout.
pub(crate) fn parse_timestamp(text: &str) -> Option<chrono::NaiveDateTime> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_local());
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    chrono::NaiveDateTime::parse_from_str(&collapsed, "%a %b %d %H:%M:%S %Y")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(&collapsed, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Parse a protocol timestamp as an instant. Offsets are honoured; the
/// offset-less layouts are read as UTC.
pub(crate) fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text.trim()) {
        return Some(parsed.with_timezone(&Utc));
    }
    parse_timestamp(text).map(|naive| naive.and_utc())
}
