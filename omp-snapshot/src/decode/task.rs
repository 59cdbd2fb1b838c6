//! Task decoder.
//!
//! A task references its scan config and target, optionally a slave and a
//! schedule, any number of alerts, and a scanner whose identity is kept as
//! is. Scanner preferences are replayed keyed by `scanner_name`.

use super::{
    Capture, DecodeContext, EntityDecoder, SectionMachine, SectionSet, Transition, COMMON_IGNORED,
};
use crate::document::{Document, Reference};
use crate::kind::EntityKind;
use crate::stream::TagEvent;

/// Identity the protocol uses for "no target" (container tasks).
const CONTAINER_TARGET: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Global,
    Ignored,
    Config,
    Target,
    Slave,
    Schedule,
    Scanner,
    Alert,
    Preferences,
}

impl SectionSet for Section {
    const GLOBAL: Self = Section::Global;

    fn enter(tag: &str) -> Option<Self> {
        match tag {
            "config" => Some(Section::Config),
            "target" => Some(Section::Target),
            "slave" => Some(Section::Slave),
            "schedule" => Some(Section::Schedule),
            "scanner" => Some(Section::Scanner),
            "alert" => Some(Section::Alert),
            "preferences" => Some(Section::Preferences),
            "observers" | "last_report" | "current_report" | "reports" => Some(Section::Ignored),
            _ if COMMON_IGNORED.contains(&tag) => Some(Section::Ignored),
            _ => None,
        }
    }
}

/// Rewrite applied to every exported preference: `auto_delete_data=0` is
/// stored as `5`.
pub fn export_preference_value<'a>(scanner_name: &str, value: &'a str) -> &'a str {
    if scanner_name == "auto_delete_data" && value == "0" {
        "5"
    } else {
        value
    }
}

#[derive(Debug, Default)]
pub struct TaskDecoder {
    sections: SectionMachine<Section>,
    name: String,
    comment: String,
    alterable: String,
    hosts_ordering: String,
    config: Option<String>,
    target: Option<String>,
    slave: Option<String>,
    schedule: Option<String>,
    scanner: Option<String>,
    alerts: Vec<String>,
    /// `(scanner_name, value)` in response order.
    preferences: Vec<(String, String)>,
    pending_preference: (String, String),
}

impl EntityDecoder for TaskDecoder {
    const KIND: EntityKind = EntityKind::Task;

    fn feed(&mut self, event: &TagEvent) {
        let id = || event.id().map(str::to_string);
        match self.sections.step(event) {
            Transition::Enter(Section::Config) => self.config = id(),
            Transition::Enter(Section::Target) => self.target = id(),
            Transition::Enter(Section::Slave) => self.slave = id(),
            Transition::Enter(Section::Schedule) => self.schedule = id(),
            Transition::Enter(Section::Scanner) => self.scanner = id(),
            Transition::Enter(Section::Alert) => self.alerts.extend(id()),
            Transition::Within(Section::Preferences) => match event.name.as_str() {
                "preference" => self.pending_preference = Default::default(),
                "scanner_name" => self.pending_preference.0 = event.content.clone(),
                "value" => self.pending_preference.1 = event.content.clone(),
                "/preference" if !self.pending_preference.0.is_empty() => {
                    let preference = std::mem::take(&mut self.pending_preference);
                    self.preferences.push(preference);
                }
                _ => {}
            },
            Transition::Within(Section::Global) => match event.name.as_str() {
                "name" => self.name = event.content.clone(),
                "comment" => self.comment = event.content.clone(),
                "alterable" => self.alterable = event.content.clone(),
                "hosts_ordering" => self.hosts_ordering = event.content.clone(),
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
            .open("create_task")
            .element("name", &self.name)
            .optional_element("comment", &self.comment)
            .optional_element("alterable", &self.alterable)
            .optional_element("hosts_ordering", &self.hosts_ordering);

        if let Some(config) = &self.config {
            let reference = ctx.reference(EntityKind::ScanConfig, config);
            document.id_element("config", &reference);
        }
        let target = match &self.target {
            Some(target) => ctx.reference(EntityKind::Target, target),
            None => Reference::Foreign(CONTAINER_TARGET.to_string()),
        };
        document.id_element("target", &target);
        if let Some(slave) = &self.slave {
            let reference = ctx.reference(EntityKind::Slave, slave);
            document.id_element("slave", &reference);
        }
        if let Some(schedule) = &self.schedule {
            let reference = ctx.reference(EntityKind::Schedule, schedule);
            document.id_element("schedule", &reference);
        }
        if let Some(scanner) = &self.scanner {
            document.id_element("scanner", &Reference::Foreign(scanner.clone()));
        }
        for alert in &self.alerts {
            let reference = ctx.reference(EntityKind::Alert, alert);
            document.id_element("alert", &reference);
        }

        if !self.preferences.is_empty() {
            document.open("preferences");
            for (scanner_name, value) in &self.preferences {
                document
                    .open("preference")
                    .element("scanner_name", scanner_name)
                    .element("value", export_preference_value(scanner_name, value))
                    .close("preference");
            }
            document.close("preferences");
        }

        document.close("create_task");
        Capture::Document(document)
    }
}
