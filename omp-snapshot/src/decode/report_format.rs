//! Report format decoder.
//!
//! Report format definitions (files, parameters, signatures) are too
//! structured to flatten, so the capture asks for the full detail response
//! and embeds it verbatim inside `create_report_format`.

use super::{
    Capture, DecodeContext, EntityDecoder, SectionMachine, SectionSet, Transition, COMMON_IGNORED,
};
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
        (COMMON_IGNORED.contains(&tag) || matches!(tag, "alerts" | "param" | "file" | "trust"))
            .then_some(Section::Ignored)
    }
}

#[derive(Debug, Default)]
pub struct ReportFormatDecoder {
    sections: SectionMachine<Section>,
    name: String,
}

/// Detail request for one report format.
pub fn detail_request(identity: &str) -> String {
    format!("<get_report_formats report_format_id=\"{identity}\" details=\"1\"/>")
}

impl EntityDecoder for ReportFormatDecoder {
    const KIND: EntityKind = EntityKind::ReportFormat;

    fn feed(&mut self, event: &TagEvent) {
        if let Transition::Within(Section::Global) = self.sections.step(event) {
            if event.opens("name") {
                self.name = event.content.clone();
            }
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn capture(&self, identity: &str, _ctx: &mut DecodeContext<'_>) -> Capture {
        Capture::Detail {
            request: detail_request(identity),
        }
    }
}
