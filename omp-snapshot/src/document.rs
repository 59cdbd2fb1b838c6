//! Creation documents with typed cross-entity references.
//!
//! A [`Document`] is XML text split into literal segments and
//! [`EntityRef`] segments. References are written as `{kind}_{ordinal}`
//! tokens when a snapshot is stored and replaced by destination identities
//! when the document is rendered for submission. Tokens only ever occupy two
//! slots: the value of an `id` attribute, and the text directly after an
//! opening `data` tag.
//!
//! A literal slot value that happens to read like a token is stored with its
//! underscores as `&#95;` character references, so only captured references
//! are ever written as bare tokens. The server decodes the reference back to
//! the original text.

use crate::kind::{EntityKind, EntityRef};

/// Stored form of a line feed inside documents and manifest names.
pub const NEWLINE_MARKER: &str = "&#10;";
/// Stored form of a carriage return.
pub const CARRIAGE_RETURN_MARKER: &str = "&#13;";
/// Underscore as written inside literal slot values that look like tokens.
const UNDERSCORE_REFERENCE: &str = "&#95;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Ref(EntityRef),
}

/// Target of an `id` reference in a creation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// An entity captured in this snapshot.
    Captured(EntityRef),
    /// An identity passed through as-is (port lists, scanners, NVTs).
    Foreign(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    segments: Vec<Segment>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every captured entity this document points at.
    pub fn references(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Ref(reference) => Some(*reference),
            Segment::Literal(_) => None,
        })
    }

    fn literal(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        match self.segments.last_mut() {
            Some(Segment::Literal(last)) => last.push_str(text),
            _ => self.segments.push(Segment::Literal(text.to_string())),
        }
        self
    }

    fn reference(&mut self, reference: EntityRef) -> &mut Self {
        self.segments.push(Segment::Ref(reference));
        self
    }

    pub fn open(&mut self, tag: &str) -> &mut Self {
        self.literal(&format!("<{tag}>"))
    }

    pub fn close(&mut self, tag: &str) -> &mut Self {
        self.literal(&format!("</{tag}>"))
    }

    /// Escaped character data.
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.literal(&escape(text))
    }

    /// Verbatim XML, e.g. an embedded detail response.
    pub fn raw(&mut self, xml: &str) -> &mut Self {
        self.literal(xml)
    }

    /// `<tag>text</tag>`
    pub fn element(&mut self, tag: &str, text: &str) -> &mut Self {
        self.open(tag).text(text).close(tag)
    }

    /// `<tag>text</tag>` unless `text` is empty.
    pub fn optional_element(&mut self, tag: &str, text: &str) -> &mut Self {
        if !text.is_empty() {
            self.element(tag, text);
        }
        self
    }

    /// Opening tag carrying an `id` reference; the caller closes it.
    pub fn open_with_id(&mut self, tag: &str, reference: &Reference) -> &mut Self {
        self.literal(&format!("<{tag} id=\""));
        match reference {
            Reference::Captured(captured) => self.reference(*captured),
            Reference::Foreign(identity) => self.literal(&slot_literal(identity)),
        };
        self.literal("\">")
    }

    /// `<tag id="..."/>`
    pub fn id_element(&mut self, tag: &str, reference: &Reference) -> &mut Self {
        self.literal(&format!("<{tag} id=\""));
        match reference {
            Reference::Captured(captured) => self.reference(*captured),
            Reference::Foreign(identity) => self.literal(&slot_literal(identity)),
        };
        self.literal("\"/>")
    }

    /// `<data>value<name>name</name></data>` where the value may be a
    /// reference.
    pub fn data_item(&mut self, name: &str, value: &Reference) -> &mut Self {
        self.open("data");
        match value {
            Reference::Captured(captured) => self.reference(*captured),
            Reference::Foreign(text) => self.literal(&slot_literal(text)),
        };
        self.element("name", name).close("data")
    }

    /// Single-line stored form with references as symbolic tokens.
    pub fn to_stored(&self) -> String {
        let rendered = self.render_with(|reference| Some(reference.to_string()));
        escape_lines(&rendered.unwrap_or_default())
    }

    /// Substitute every reference via `resolve`; the first reference it
    /// cannot resolve is returned as the error.
    pub fn render(
        &self,
        resolve: impl Fn(EntityRef) -> Option<String>,
    ) -> Result<String, EntityRef> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Ref(reference) => {
                    let identity = resolve(*reference).ok_or(*reference)?;
                    out.push_str(&escape(&identity));
                }
            }
        }
        Ok(out)
    }

    fn render_with(&self, resolve: impl Fn(EntityRef) -> Option<String>) -> Option<String> {
        self.render(resolve).ok()
    }

    /// Rebuild a document from its stored form. Only tokens sitting in a
    /// reference slot and naming a kind that `owner` may reference become
    /// references; everything else stays literal.
    pub fn parse_stored(stored: &str, owner: EntityKind) -> Self {
        let text = unescape_lines(stored.trim_end_matches(['\n', '\r']));
        let mut document = Document::new();
        let mut rest = text.as_str();

        let slot = |token: &str| {
            EntityRef::parse_token(token).filter(|reference| owner.may_reference(reference.kind))
        };

        while let Some(lt) = rest.find('<') {
            document.literal(&rest[..lt]);
            let Some(gt) = rest[lt..].find('>').map(|offset| lt + offset) else {
                document.literal(&rest[lt..]);
                rest = "";
                break;
            };
            let tag = &rest[lt..=gt];
            rest = &rest[gt + 1..];

            match id_value_span(tag) {
                Some((start, end)) if slot(&tag[start..end]).is_some() => {
                    document.literal(&tag[..start]);
                    if let Some(reference) = slot(&tag[start..end]) {
                        document.reference(reference);
                    }
                    document.literal(&tag[end..]);
                }
                _ => {
                    document.literal(tag);
                }
            }

            if tag_name(tag) == "data" {
                let text_end = rest.find('<').unwrap_or(rest.len());
                let content = &rest[..text_end];
                if let Some(reference) = slot(content.trim()) {
                    let leading = &content[..content.len() - content.trim_start().len()];
                    let trailing = &content[content.trim_end().len()..];
                    document.literal(leading).reference(reference).literal(trailing);
                    rest = &rest[text_end..];
                }
            }
        }
        document.literal(rest);
        document
    }
}

/// Escaped slot value that can never be read back as a token.
fn slot_literal(value: &str) -> String {
    let escaped = escape(value);
    if EntityRef::parse_token(value.trim()).is_some() {
        escaped.replace('_', UNDERSCORE_REFERENCE)
    } else {
        escaped
    }
}

/// Name of an opening tag such as `<data>` or `<config id="x"/>`.
fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    inner
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
}

/// Byte span of a double-quoted `id` attribute value inside `tag`.
fn id_value_span(tag: &str) -> Option<(usize, usize)> {
    if tag.starts_with("</") {
        return None;
    }
    let mut search = 0;
    while let Some(found) = tag[search..].find("id=\"") {
        let at = search + found;
        let preceded_by_space = tag[..at].ends_with(char::is_whitespace);
        let start = at + 4;
        let end = start + tag[start..].find('"')?;
        if preceded_by_space {
            return Some((start, end));
        }
        search = end;
    }
    None
}

/// Escape character data and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fold line breaks into markers so the text fits on one line.
pub fn escape_lines(text: &str) -> String {
    text.replace('\r', CARRIAGE_RETURN_MARKER)
        .replace('\n', NEWLINE_MARKER)
}

pub fn unescape_lines(text: &str) -> String {
    text.replace(NEWLINE_MARKER, "\n")
        .replace(CARRIAGE_RETURN_MARKER, "\r")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(ordinal: u32) -> EntityRef {
        EntityRef::new(EntityKind::Target, ordinal)
    }

    #[test]
    fn test_stored_form_uses_tokens() {
        let mut doc = Document::new();
        doc.open("create_task")
            .element("name", "Weekly")
            .id_element("target", &Reference::Captured(target(3)))
            .id_element("scanner", &Reference::Foreign("s-1".into()))
            .close("create_task");

        assert_eq!(
            doc.to_stored(),
            "<create_task><name>Weekly</name><target id=\"target_3\"/>\
             <scanner id=\"s-1\"/></create_task>"
        );
        assert_eq!(doc.references().collect::<Vec<_>>(), vec![target(3)]);
    }

    #[test]
    fn test_render_substitutes_identity() {
        let mut doc = Document::new();
        doc.open("create_task")
            .id_element("target", &Reference::Captured(target(3)))
            .close("create_task");

        let rendered = doc
            .render(|reference| (reference == target(3)).then(|| "t-99".to_string()))
            .unwrap();
        assert_eq!(rendered, "<create_task><target id=\"t-99\"/></create_task>");
        assert!(!rendered.contains("target_3"));

        assert_eq!(doc.render(|_| None), Err(target(3)));
    }

    #[test]
    fn test_parse_stored_recovers_reference_slots() {
        let stored = "<create_task><name>target_3</name><target id=\"target_3\"/>\
                      <alert id=\"alert_12\"/><comment>see target_31</comment></create_task>";
        let doc = Document::parse_stored(stored, EntityKind::Task);

        let refs: Vec<_> = doc.references().collect();
        assert_eq!(refs, vec![target(3), EntityRef::new(EntityKind::Alert, 12)]);
        assert_eq!(
            doc.render(|r| Some(format!("id-{}", r.ordinal))).unwrap(),
            "<create_task><name>target_3</name><target id=\"id-3\"/>\
             <alert id=\"id-12\"/><comment>see target_31</comment></create_task>"
        );
    }

    #[test]
    fn test_parse_stored_ignores_later_kinds() {
        let stored = "<create_filter><x id=\"task_1\"/></create_filter>";
        let doc = Document::parse_stored(stored, EntityKind::Filter);
        assert_eq!(doc.references().count(), 0);
    }

    #[test]
    fn test_data_slot() {
        let mut doc = Document::new();
        doc.open("method")
            .text("Email")
            .data_item(
                "notice_attach_format",
                &Reference::Captured(EntityRef::new(EntityKind::ReportFormat, 2)),
            )
            .data_item("to_address", &Reference::Foreign("ops@example.com".into()))
            .close("method");

        let stored = doc.to_stored();
        assert!(stored.contains("<data>reportformat_2<name>notice_attach_format</name></data>"));
        assert_eq!(Document::parse_stored(&stored, EntityKind::Alert), doc);
    }

    #[test]
    fn test_newlines_stored_on_one_line() {
        let mut doc = Document::new();
        doc.element("text", "first\nsecond\r\nthird");
        let stored = doc.to_stored();
        assert!(!stored.contains('\n'));
        assert!(!stored.contains('\r'));
        assert_eq!(Document::parse_stored(&stored, EntityKind::Note), doc);
    }

    #[test]
    fn test_text_is_escaped() {
        let mut doc = Document::new();
        doc.element("term", "name~\"a<b\" & c");
        assert_eq!(doc.to_stored(), "<term>name~&quot;a&lt;b&quot; &amp; c</term>");
    }

    #[test]
    fn test_literal_data_value_stays_literal() {
        let mut doc = Document::new();
        doc.open("method")
            .data_item("subject", &Reference::Foreign("filter_1".into()))
            .close("method");

        let stored = doc.to_stored();
        assert!(stored.contains("<data>filter&#95;1<name>subject</name></data>"));
        let parsed = Document::parse_stored(&stored, EntityKind::Alert);
        assert_eq!(parsed, doc);
        assert_eq!(parsed.references().count(), 0);
    }

    #[test]
    fn test_literal_id_that_reads_like_a_token_stays_literal() {
        let mut doc = Document::new();
        doc.id_element("port_list", &Reference::Foreign("target_3".into()));

        let parsed = Document::parse_stored(&doc.to_stored(), EntityKind::Task);
        assert_eq!(parsed.references().count(), 0);
        assert_eq!(parsed.render(|_| None).unwrap(), "<port_list id=\"target&#95;3\"/>");
    }

    #[test]
    fn test_id_attribute_needs_word_boundary() {
        assert_eq!(id_value_span("<nvt oid=\"1.3\">"), None);
        assert_eq!(id_value_span("<x id=\"a\">"), Some((7, 8)));
    }
}
