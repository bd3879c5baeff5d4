use chrono::NaiveDate;

use crate::error::RangeError;
use crate::topics::TopicTag;

const COL_CLASS_CODE: usize = 0;
const COL_STUDENT_NAME: usize = 2;
const COL_STUDENT_EMAIL: usize = 3;
const COL_SESSION_DATE: usize = 6;
const COL_TIME_IN: usize = 7;
const COL_TIME_OUT: usize = 8;
const COL_BACK_TO_BACK: usize = 9;
const COL_ATTENDANCE: usize = 11;
const COL_TOPICS: usize = 12;

/// One tutoring session as it appears in the ledger. Fields are kept as the
/// raw cell text; interpretation happens in `mapper`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub row_number: usize,
    pub class_code: String,
    pub student_name: String,
    pub student_email: String,
    pub session_date: String,
    pub time_in: String,
    pub time_out: String,
    pub back_to_back: String,
    pub attendance: String,
    pub topics_covered: Option<String>,
}

impl SessionRecord {
    /// Decode a ledger row. Missing trailing cells read as empty.
    pub fn from_row(row_number: usize, cells: &[String]) -> Self {
        let cell = |idx: usize| cells.get(idx).cloned().unwrap_or_default();
        let topics = cell(COL_TOPICS);

        SessionRecord {
            row_number,
            class_code: cell(COL_CLASS_CODE),
            student_name: cell(COL_STUDENT_NAME),
            student_email: cell(COL_STUDENT_EMAIL),
            session_date: cell(COL_SESSION_DATE),
            time_in: cell(COL_TIME_IN),
            time_out: cell(COL_TIME_OUT),
            back_to_back: cell(COL_BACK_TO_BACK),
            attendance: cell(COL_ATTENDANCE),
            topics_covered: if topics.trim().is_empty() {
                None
            } else {
                Some(topics)
            },
        }
    }

    /// Short label used in diagnostics.
    pub fn label(&self) -> String {
        format!(
            "row {} ({} on {})",
            self.row_number, self.student_name, self.session_date
        )
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        DateRange {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceOutcome {
    Attended,
    NoShow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentTold {
    Yes,
    Emailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRating {
    Score(u8),
    NoShow,
}

/// Operator assessment for one session. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalJudgment {
    pub student_told: Option<StudentTold>,
    pub rating: SessionRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

/// Everything the driver needs for one session, derived from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSession {
    pub label: String,
    pub class_code: Option<String>,
    pub form_name: String,
    pub email: String,
    pub session_date: NaiveDate,
    pub start: ClockTime,
    pub end: ClockTime,
    pub attendance: AttendanceOutcome,
    pub back_to_back: bool,
    pub prework: bool,
    pub topics: Vec<TopicTag>,
}
