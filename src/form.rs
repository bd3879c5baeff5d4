//! Named controls of the tutor eval form.
//!
//! Every control the driver touches is addressed by a semantic field name
//! (`b2b-yes`, `topic-javascript`, ...) that maps to a CSS selector. Layout
//! changes on the form only need a new selector here or in the config file.

use std::collections::{BTreeMap, HashMap};

use crate::config::FormPolicy;
use crate::error::StepErrorKind;
use crate::models::Meridiem;
use crate::page::ControlHandle;
use crate::topics::TopicTag;

pub const NO_CLASS_CODE: &str = "no-class-code";
pub const CLASS_CODE: &str = "class-code";
pub const STUDENT_NAME: &str = "student-name";
pub const STUDENT_EMAIL: &str = "student-email";
pub const NEXT_PAGE: &str = "next-page";

pub const EVAL_TOLD_YES: &str = "eval-told-yes";
pub const EVAL_TOLD_EMAIL: &str = "eval-told-email";
pub const EVAL_NO_SHOW: &str = "eval-no-show";
pub const B2B_YES: &str = "b2b-yes";
pub const B2B_NO: &str = "b2b-no";
pub const SESSION_DATE: &str = "session-date";
pub const PREWORK_YES: &str = "prework-yes";
pub const PREWORK_NO: &str = "prework-no";
pub const TOPIC_NO_SHOW: &str = "topic-no-show";
pub const TA_YES: &str = "ta-yes";
pub const TA_NO: &str = "ta-no";
pub const RATING_NO_SHOW: &str = "rating-no-show";
pub const DROP_MENTION_YES: &str = "drop-mention-yes";
pub const DROP_MENTION_NO: &str = "drop-mention-no";
pub const COMMENTS: &str = "comments";
pub const SUBMIT: &str = "submit";

/// Which of the two time questions a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Start,
    End,
}

impl TimeSlot {
    fn prefix(self) -> &'static str {
        match self {
            TimeSlot::Start => "start",
            TimeSlot::End => "end",
        }
    }

    fn question(self) -> &'static str {
        match self {
            TimeSlot::Start => "Start Time",
            TimeSlot::End => "End Time",
        }
    }

    pub fn hour_field(self) -> String {
        format!("{}-hour", self.prefix())
    }

    pub fn minute_field(self) -> String {
        format!("{}-minute", self.prefix())
    }

    pub fn meridiem_field(self) -> String {
        format!("{}-meridiem", self.prefix())
    }

    pub fn meridiem_option_field(self, meridiem: Meridiem) -> String {
        let suffix = match meridiem {
            Meridiem::Am => "am",
            Meridiem::Pm => "pm",
        };
        format!("{}-meridiem-{suffix}", self.prefix())
    }
}

pub fn topic_field(tag: TopicTag) -> String {
    format!("topic-{}", tag.slug())
}

pub fn rating_field(score: u8) -> String {
    format!("rating-{score}")
}

/// Fields resolved when the identity page loads.
pub fn identity_page_fields() -> Vec<String> {
    [NO_CLASS_CODE, CLASS_CODE, STUDENT_NAME, STUDENT_EMAIL]
        .iter()
        .map(|field| field.to_string())
        .collect()
}

/// Fields resolved when the eval page loads. Dropdown options are looked up
/// separately once their listbox is open.
pub fn eval_page_fields(policy: &FormPolicy) -> Vec<String> {
    let mut fields: Vec<String> = [
        EVAL_TOLD_YES,
        EVAL_TOLD_EMAIL,
        EVAL_NO_SHOW,
        B2B_YES,
        B2B_NO,
        SESSION_DATE,
    ]
    .iter()
    .map(|field| field.to_string())
    .collect();

    for slot in [TimeSlot::Start, TimeSlot::End] {
        fields.push(slot.hour_field());
        fields.push(slot.minute_field());
    }
    fields.push(TimeSlot::Start.meridiem_field());
    if policy.meridiem == crate::config::MeridiemMode::Derived {
        fields.push(TimeSlot::End.meridiem_field());
    }

    fields.extend([PREWORK_YES, PREWORK_NO, TOPIC_NO_SHOW].map(String::from));
    fields.extend(TopicTag::ALL.iter().map(|tag| topic_field(*tag)));
    fields.extend([TA_YES, TA_NO].map(String::from));
    fields.extend((1..=5).map(rating_field));
    fields.extend(
        [RATING_NO_SHOW, DROP_MENTION_YES, DROP_MENTION_NO, COMMENTS].map(String::from),
    );
    fields
}

fn question(title: &str, inner: &str) -> String {
    format!(r#"div[role="listitem"][data-params*="{title}"] {inner}"#)
}

fn radio(title: &str, value: &str) -> String {
    question(title, &format!(r#"div[role="radio"][data-value="{value}"]"#))
}

fn checkbox(title: &str, value: &str) -> String {
    question(
        title,
        &format!(r#"div[role="checkbox"][data-answer-value="{value}"]"#),
    )
}

/// Semantic field name to CSS selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorTable {
    selectors: BTreeMap<String, String>,
}

impl Default for SelectorTable {
    fn default() -> Self {
        let mut table = SelectorTable {
            selectors: BTreeMap::new(),
        };

        table.set(NO_CLASS_CODE, &radio("Class Code", "Team Calendly"));
        table.set(
            CLASS_CODE,
            &question("Class Code", r#"input[aria-label="Other response"]"#),
        );
        table.set(STUDENT_NAME, &question("Your Name", "input"));
        table.set(STUDENT_EMAIL, &question("Your Email", "input"));
        table.set(
            NEXT_PAGE,
            r#"div[role="button"][jsname="OCpkoe"]"#,
        );

        let told = "Did you tell the student";
        table.set(EVAL_TOLD_YES, &radio(told, "Yes"));
        table.set(EVAL_TOLD_EMAIL, &radio(told, "Emailed"));
        table.set(EVAL_NO_SHOW, &radio(told, "No Show"));
        table.set(B2B_YES, &radio("Back to Back", "Yes"));
        table.set(B2B_NO, &radio("Back to Back", "No"));
        table.set(
            SESSION_DATE,
            &question("Session Date", r#"input[type="date"]"#),
        );

        for slot in [TimeSlot::Start, TimeSlot::End] {
            let title = slot.question();
            table.set(
                &slot.hour_field(),
                &question(title, r#"input[aria-label="Hour"]"#),
            );
            table.set(
                &slot.minute_field(),
                &question(title, r#"input[aria-label="Minute"]"#),
            );
            table.set(
                &slot.meridiem_field(),
                &question(title, r#"div[role="listbox"]"#),
            );
            for (meridiem, value) in [(Meridiem::Am, "AM"), (Meridiem::Pm, "PM")] {
                table.set(
                    &slot.meridiem_option_field(meridiem),
                    &question(
                        title,
                        &format!(r#"div[role="option"][data-value="{value}"]"#),
                    ),
                );
            }
        }

        table.set(PREWORK_YES, &radio("Prework", "Yes"));
        table.set(PREWORK_NO, &radio("Prework", "No"));
        table.set(TOPIC_NO_SHOW, &checkbox("Topics Covered", "No Show"));
        for tag in TopicTag::ALL {
            table.set(&topic_field(tag), &checkbox("Topics Covered", tag.label()));
        }

        table.set(TA_YES, &radio("TA", "Yes"));
        table.set(TA_NO, &radio("TA", "No"));
        for score in 1..=5 {
            table.set(&rating_field(score), &radio("Time Spent", &score.to_string()));
        }
        table.set(RATING_NO_SHOW, &radio("Time Spent", "No Show"));
        table.set(DROP_MENTION_YES, &checkbox("drop", "Yes"));
        table.set(DROP_MENTION_NO, &checkbox("drop", "No"));
        table.set(COMMENTS, &question("Comments", "textarea"));
        table.set(SUBMIT, r#"div[role="button"][jsname="M2UYVd"]"#);

        table
    }
}

impl SelectorTable {
    pub fn set(&mut self, field: &str, selector: &str) {
        self.selectors.insert(field.to_string(), selector.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.selectors.get(field).map(String::as_str)
    }

    pub fn require(&self, field: &str) -> Result<&str, StepErrorKind> {
        self.get(field)
            .ok_or_else(|| StepErrorKind::UnknownField(field.to_string()))
    }
}

/// Resolved controls of the page currently loaded for one session.
#[derive(Debug, Default)]
pub struct FormState {
    controls: HashMap<String, ControlHandle>,
}

impl FormState {
    pub fn insert(&mut self, field: &str, control: ControlHandle) {
        self.controls.insert(field.to_string(), control);
    }

    pub fn control(&self, field: &str) -> Result<&ControlHandle, StepErrorKind> {
        self.controls
            .get(field)
            .ok_or_else(|| StepErrorKind::UnknownField(field.to_string()))
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }
}
