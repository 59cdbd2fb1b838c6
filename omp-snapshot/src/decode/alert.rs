//! Alert decoder.
//!
//! An alert has three clauses (condition, event, method), each a type
//! string followed by `<data>value<name>key</name></data>` items. Items that
//! hold report format or filter identities are rewritten as references.

use super::{
    Capture, DecodeContext, EntityDecoder, SectionMachine, SectionSet, Transition, COMMON_IGNORED,
};
use crate::document::{Document, Reference};
use crate::kind::EntityKind;
use crate::stream::TagEvent;

/// Method data items holding a report format identity.
const REPORT_FORMAT_ITEMS: [&str; 2] = ["notice_attach_format", "notice_report_format"];

/// Condition data item holding a filter identity.
const FILTER_ITEM: &str = "filter_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Global,
    Ignored,
    Condition,
    Event,
    Method,
    Filter,
}

impl SectionSet for Section {
    const GLOBAL: Self = Section::Global;

    fn enter(tag: &str) -> Option<Self> {
        match tag {
            "condition" => Some(Section::Condition),
            "event" => Some(Section::Event),
            "method" => Some(Section::Method),
            "filter" => Some(Section::Filter),
            "tasks" => Some(Section::Ignored),
            _ if COMMON_IGNORED.contains(&tag) => Some(Section::Ignored),
            _ => None,
        }
    }
}

/// One of the condition/event/method clauses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Clause {
    pub text: String,
    /// `(name, value)` in response order.
    pub data: Vec<(String, String)>,
    pending: Option<(String, String)>,
}

impl Clause {
    fn feed(&mut self, event: &TagEvent) {
        if event.opens("data") {
            self.pending = Some((String::new(), event.content.clone()));
        } else if event.opens("name") {
            if let Some((name, _)) = self.pending.as_mut() {
                *name = event.content.clone();
            }
        } else if event.closes("data") {
            if let Some(item) = self.pending.take() {
                self.data.push(item);
            }
        }
    }

    fn write(
        &self,
        tag: &str,
        document: &mut Document,
        mut rewrite: impl FnMut(&str, &str) -> Reference,
    ) {
        document.open(tag).text(&self.text);
        for (name, value) in &self.data {
            document.data_item(name, &rewrite(name, value));
        }
        document.close(tag);
    }
}

#[derive(Debug, Default)]
pub struct AlertDecoder {
    sections: SectionMachine<Section>,
    name: String,
    comment: String,
    condition: Clause,
    event: Clause,
    method: Clause,
    filter: Option<String>,
}

impl AlertDecoder {
    fn clause(&mut self, section: Section) -> Option<&mut Clause> {
        match section {
            Section::Condition => Some(&mut self.condition),
            Section::Event => Some(&mut self.event),
            Section::Method => Some(&mut self.method),
            _ => None,
        }
    }
}

impl EntityDecoder for AlertDecoder {
    const KIND: EntityKind = EntityKind::Alert;

    fn feed(&mut self, event: &TagEvent) {
        match self.sections.step(event) {
            Transition::Enter(Section::Filter) => {
                self.filter = event.id().map(str::to_string);
            }
            Transition::Enter(section) => {
                if let Some(clause) = self.clause(section) {
                    clause.text = event.content.clone();
                }
            }
            Transition::Within(Section::Global) => match event.name.as_str() {
                "name" => self.name = event.content.clone(),
                "comment" => self.comment = event.content.clone(),
                _ => {}
            },
            Transition::Within(section) => {
                if let Some(clause) = self.clause(section) {
                    clause.feed(event);
                }
            }
            Transition::Exit(_) => {}
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn capture(&self, _identity: &str, ctx: &mut DecodeContext<'_>) -> Capture {
        let mut document = Document::new();
        document
            .open("create_alert")
            .element("name", &self.name)
            .optional_element("comment", &self.comment);

        self.condition.write("condition", &mut document, |name, value| {
            if name == FILTER_ITEM && !value.is_empty() {
                ctx.reference(EntityKind::Filter, value)
            } else {
                Reference::Foreign(value.to_string())
            }
        });
        self.event.write("event", &mut document, |_, value| {
            Reference::Foreign(value.to_string())
        });
        self.method.write("method", &mut document, |name, value| {
            if REPORT_FORMAT_ITEMS.contains(&name) && !value.is_empty() {
                ctx.reference(EntityKind::ReportFormat, value)
            } else {
                Reference::Foreign(value.to_string())
            }
        });

        if let Some(filter) = &self.filter {
            let reference = ctx.reference(EntityKind::Filter, filter);
            document.id_element("filter", &reference);
        }

        document.close("create_alert");
        Capture::Document(document)
    }
}
