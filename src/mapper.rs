use chrono::NaiveDate;

use crate::config::{LedgerClock, MeridiemMode};
use crate::error::MalformedRecord;
use crate::models::{AttendanceOutcome, ClockTime, MappedSession, Meridiem, SessionRecord};
use crate::topics;

const LEDGER_DATE_FORMAT: &str = "%m/%d/%Y";
const NO_SHOW_CODES: [&str; 2] = ["no show", "n"];
const BACK_TO_BACK_MARKER: &str = "Y";
const PREWORK_KEYWORD: &str = "prework";

/// Split "First Last ..." on the first space. The remainder may hold several
/// tokens and is treated as the family name.
pub fn split_name(name: &str) -> (&str, &str) {
    let name = name.trim();
    match name.split_once(' ') {
        Some((first, rest)) => (first, rest.trim()),
        None => (name, ""),
    }
}

/// "Family, Given" as the form expects it; a single-token name is written alone.
pub fn family_given(name: &str) -> String {
    match split_name(name) {
        (first, "") => first.to_string(),
        (first, rest) => format!("{rest}, {first}"),
    }
}

pub fn attendance_outcome(record: &SessionRecord) -> AttendanceOutcome {
    let code = record.attendance.trim().to_lowercase();
    if NO_SHOW_CODES.contains(&code.as_str()) {
        AttendanceOutcome::NoShow
    } else {
        AttendanceOutcome::Attended
    }
}

pub fn back_to_back(record: &SessionRecord) -> bool {
    record.back_to_back.trim() == BACK_TO_BACK_MARKER
}

pub fn prework_flag(topics_covered: Option<&str>) -> bool {
    topics::normalize(topics_covered).contains(PREWORK_KEYWORD)
}

/// Parse "H:MM", with an optional AM/PM suffix in any case ("6:30 PM",
/// "6:30pm"). Bare hours 1-12 are read per `clock`.
pub fn split_time(
    field: &'static str,
    value: &str,
    clock: LedgerClock,
) -> Result<ClockTime, MalformedRecord> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MalformedRecord::Missing { field });
    }

    let invalid = |reason| MalformedRecord::Invalid {
        field,
        value: value.to_string(),
        reason,
    };

    let (digits, suffix) = strip_meridiem(value);
    let (hour, minute) = digits.split_once(':').ok_or_else(|| invalid("expected H:MM"))?;
    let hour: u8 = hour.trim().parse().map_err(|_| invalid("hour is not a number"))?;
    let minute: u8 = minute
        .trim()
        .parse()
        .map_err(|_| invalid("minute is not a number"))?;

    if minute > 59 {
        return Err(invalid("minute out of range"));
    }

    let hour = match suffix {
        Some(_) if !(1..=12).contains(&hour) => {
            return Err(invalid("hour out of range for AM/PM"));
        }
        Some(meridiem) => to_24_hour(hour, meridiem),
        None if hour > 23 => return Err(invalid("hour out of range")),
        None => match clock {
            _ if hour == 0 || hour > 12 => hour,
            LedgerClock::TwentyFourHour => hour,
            LedgerClock::TwelveHourAm => to_24_hour(hour, Meridiem::Am),
            LedgerClock::TwelveHourPm => to_24_hour(hour, Meridiem::Pm),
        },
    };

    Ok(ClockTime { hour, minute })
}

fn strip_meridiem(value: &str) -> (&str, Option<Meridiem>) {
    let lower = value.to_ascii_lowercase();
    for (suffix, meridiem) in [("am", Meridiem::Am), ("pm", Meridiem::Pm)] {
        if lower.ends_with(suffix) {
            return (value[..value.len() - suffix.len()].trim_end(), Some(meridiem));
        }
    }
    (value, None)
}

fn to_24_hour(hour: u8, meridiem: Meridiem) -> u8 {
    match meridiem {
        Meridiem::Am => hour % 12,
        Meridiem::Pm => hour % 12 + 12,
    }
}

pub fn meridiem(time: ClockTime) -> Meridiem {
    if time.hour < 12 {
        Meridiem::Am
    } else {
        Meridiem::Pm
    }
}

impl ClockTime {
    /// Hour text for the form's 12-hour field.
    pub fn form_hour(&self, mode: MeridiemMode) -> String {
        match mode {
            MeridiemMode::Derived => match self.hour % 12 {
                0 => "12".to_string(),
                hour => hour.to_string(),
            },
            MeridiemMode::Legacy => self.hour.to_string(),
        }
    }

    pub fn form_minute(&self) -> String {
        format!("{:02}", self.minute)
    }
}

pub fn session_date(record: &SessionRecord) -> Result<NaiveDate, MalformedRecord> {
    let value = record.session_date.trim();
    if value.is_empty() {
        return Err(MalformedRecord::Missing {
            field: "session date",
        });
    }
    NaiveDate::parse_from_str(value, LEDGER_DATE_FORMAT).map_err(|_| MalformedRecord::Invalid {
        field: "session date",
        value: value.to_string(),
        reason: "expected MM/DD/YYYY",
    })
}

/// Derive every form value for a record, failing on the first bad field.
pub fn map_session(
    record: &SessionRecord,
    clock: LedgerClock,
) -> Result<MappedSession, MalformedRecord> {
    if record.student_name.trim().is_empty() {
        return Err(MalformedRecord::Missing {
            field: "student name",
        });
    }

    let session_date = session_date(record)?;
    let start = split_time("time in", &record.time_in, clock)?;
    let end = split_time("time out", &record.time_out, clock)?;
    let class_code = Some(record.class_code.trim())
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    Ok(MappedSession {
        label: record.label(),
        class_code,
        form_name: family_given(&record.student_name),
        email: record.student_email.trim().to_string(),
        session_date,
        start,
        end,
        attendance: attendance_outcome(record),
        back_to_back: back_to_back(record),
        prework: prework_flag(record.topics_covered.as_deref()),
        topics: topics::classify(record.topics_covered.as_deref()),
    })
}
