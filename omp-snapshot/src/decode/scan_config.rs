//! Scan configuration decoder; like report formats, configs are recreated
//! from their embedded export.

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
        let nested = matches!(
            tag,
            "tasks" | "families" | "preferences" | "nvt_selectors" | "scanner"
        );
        (COMMON_IGNORED.contains(&tag) || nested).then_some(Section::Ignored)
    }
}

#[derive(Debug, Default)]
pub struct ScanConfigDecoder {
    sections: SectionMachine<Section>,
    name: String,
}

pub fn detail_request(identity: &str) -> String {
    format!("<get_configs config_id=\"{identity}\" export=\"1\" details=\"1\"/>")
}

impl EntityDecoder for ScanConfigDecoder {
    const KIND: EntityKind = EntityKind::ScanConfig;

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
