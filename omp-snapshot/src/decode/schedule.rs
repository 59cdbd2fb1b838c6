//! Schedule decoder.
//!
//! The server reports `first_time` as one timestamp while `create_schedule`
//! wants it split into calendar fields.

use super::{
    parse_timestamp, Capture, DecodeContext, EntityDecoder, SectionMachine, SectionSet, Transition,
    COMMON_IGNORED,
};
use crate::document::Document;
use crate::kind::EntityKind;
use crate::stream::TagEvent;
use chrono::{Datelike, NaiveDateTime, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Global,
    Ignored,
}

impl SectionSet for Section {
    const GLOBAL: Self = Section::Global;

    fn enter(tag: &str) -> Option<Self> {
        let nested = matches!(tag, "tasks" | "simple_period" | "simple_duration");
        (COMMON_IGNORED.contains(&tag) || nested).then_some(Section::Ignored)
    }
}

#[derive(Debug, Default)]
pub struct ScheduleDecoder {
    sections: SectionMachine<Section>,
    name: String,
    comment: String,
    first_time: String,
    period: String,
    period_months: String,
    duration: String,
    timezone: String,
}

/// Calendar fields of a schedule's first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstTime {
    pub minute: u32,
    pub hour: u32,
    pub day_of_month: u32,
    pub month: u32,
    pub year: i32,
}

impl From<NaiveDateTime> for FirstTime {
    fn from(time: NaiveDateTime) -> Self {
        Self {
            minute: time.minute(),
            hour: time.hour(),
            day_of_month: time.day(),
            month: time.month(),
            year: time.year(),
        }
    }
}

/// Split a reported timestamp into calendar fields.
pub fn decompose_first_time(text: &str) -> Option<FirstTime> {
    parse_timestamp(text).map(FirstTime::from)
}

fn non_zero(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != "0").then_some(value)
}

impl EntityDecoder for ScheduleDecoder {
    const KIND: EntityKind = EntityKind::Schedule;

    fn feed(&mut self, event: &TagEvent) {
        let Transition::Within(Section::Global) = self.sections.step(event) else {
            return;
        };
        let field = match event.name.as_str() {
            "name" => &mut self.name,
            "comment" => &mut self.comment,
            "first_time" => &mut self.first_time,
            "period" => &mut self.period,
            "period_months" => &mut self.period_months,
            "duration" => &mut self.duration,
            "timezone" => &mut self.timezone,
            _ => return,
        };
        *field = event.content.clone();
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn capture(&self, _identity: &str, ctx: &mut DecodeContext<'_>) -> Capture {
        let mut document = Document::new();
        document
            .open("create_schedule")
            .element("name", &self.name)
            .optional_element("comment", &self.comment);

        match decompose_first_time(&self.first_time) {
            Some(first) => {
                document
                    .open("first_time")
                    .element("minute", &first.minute.to_string())
                    .element("hour", &first.hour.to_string())
                    .element("day_of_month", &first.day_of_month.to_string())
                    .element("month", &first.month.to_string())
                    .element("year", &first.year.to_string())
                    .close("first_time");
            }
            None => ctx.warn(format!(
                "schedule '{}' has unreadable first time '{}'; the destination will pick its own",
                self.name, self.first_time
            )),
        }

        if let Some(duration) = non_zero(&self.duration) {
            document
                .open("duration")
                .text(duration)
                .element("unit", "second")
                .close("duration");
        }

        if let Some(months) = non_zero(&self.period_months) {
            document
                .open("period")
                .text(months)
                .element("unit", "month")
                .close("period");
        } else if let Some(seconds) = non_zero(&self.period) {
            document
                .open("period")
                .text(seconds)
                .element("unit", "second")
                .close("period");
        }

        document
            .optional_element("timezone", &self.timezone)
            .close("create_schedule");
        Capture::Document(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_kind;
    use crate::resolver::ReferenceResolver;
    use chrono::Utc;

    fn capture(response: &str) -> (String, Vec<String>) {
        let mut resolver = ReferenceResolver::new();
        let mut ctx = DecodeContext::new(&mut resolver, Utc::now());
        let records = decode_kind(EntityKind::Schedule, response, &mut ctx);
        let stored = records[0].document().unwrap().to_stored();
        (stored, ctx.warnings)
    }

    #[test]
    fn test_first_time_is_decomposed() {
        let (stored, warnings) = capture(
            r#"<get_schedules_response><schedule id="sc-1"><name>Nightly</name>
               <first_time>Sun Mar  1 22:30:00 2015</first_time><next_time>over</next_time>
               <period>86400</period><period_months>0</period_months><duration>0</duration>
               <simple_period>1<unit>day</unit></simple_period>
               <timezone>Europe/Berlin</timezone>
               <tasks><task id="t-1"><name>Weekly web</name></task></tasks>
               </schedule></get_schedules_response>"#,
        );

        assert_eq!(
            stored,
            "<create_schedule><name>Nightly</name><first_time><minute>30</minute><hour>22</hour>\
             <day_of_month>1</day_of_month><month>3</month><year>2015</year></first_time>\
             <period>86400<unit>second</unit></period><timezone>Europe/Berlin</timezone>\
             </create_schedule>"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_monthly_period_and_duration() {
        let (stored, _) = capture(
            r#"<get_schedules_response><schedule id="sc-2"><name>Monthly</name>
               <first_time>2016-07-04T08:00:00Z</first_time>
               <period>0</period><period_months>1</period_months><duration>7200</duration>
               </schedule></get_schedules_response>"#,
        );

        assert!(stored.contains("<duration>7200<unit>second</unit></duration>"));
        assert!(stored.contains("<period>1<unit>month</unit></period>"));
        assert!(stored.contains("<day_of_month>4</day_of_month><month>7</month><year>2016</year>"));
    }

    #[test]
    fn test_unreadable_first_time_warns() {
        let (stored, warnings) = capture(
            r#"<get_schedules_response><schedule id="sc-3"><name>Odd</name>
               <first_time>whenever</first_time></schedule></get_schedules_response>"#,
        );

        assert!(!stored.contains("first_time"));
        assert_eq!(warnings.len(), 1);
    }
}
