//! Filter decoder: name, comment, term and type map 1:1 onto
//! `create_filter`.

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
        (COMMON_IGNORED.contains(&tag) || tag == "alerts").then_some(Section::Ignored)
    }
}

#[derive(Debug, Default)]
pub struct FilterDecoder {
    sections: SectionMachine<Section>,
    name: String,
    comment: String,
    term: String,
    filter_type: String,
}

impl EntityDecoder for FilterDecoder {
    const KIND: EntityKind = EntityKind::Filter;

    fn feed(&mut self, event: &TagEvent) {
        let Transition::Within(Section::Global) = self.sections.step(event) else {
            return;
        };
        match event.name.as_str() {
            "name" => self.name = event.content.clone(),
            "comment" => self.comment = event.content.clone(),
            "term" => self.term = event.content.clone(),
            "type" => self.filter_type = event.content.clone(),
            _ => {}
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn capture(&self, _identity: &str, _ctx: &mut DecodeContext<'_>) -> Capture {
        let mut document = Document::new();
        document
            .open("create_filter")
            .element("name", &self.name)
            .optional_element("comment", &self.comment)
            .element("term", &self.term)
            .optional_element("type", &self.filter_type)
            .close("create_filter");
        Capture::Document(document)
    }
}
