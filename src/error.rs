use chrono::NaiveDate;
use thiserror::Error;

use crate::driver::DriverState;

/// A ledger row that cannot be turned into form values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("missing {field}")]
    Missing { field: &'static str },

    #[error("invalid {field} {value:?}: {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("end date {end} is before start date {start}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Error)]
pub enum StepErrorKind {
    #[error("selector for {field} ({selector}) matched {found} controls, expected 1")]
    ControlCount {
        field: String,
        selector: String,
        found: usize,
    },

    #[error("no selector configured for {0}")]
    UnknownField(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error(transparent)]
    Page(#[from] anyhow::Error),
}

/// Abandons the rest of one session's form sequence.
#[derive(Debug, Error)]
#[error("step failed in {state:?}: {kind}")]
pub struct StepFailure {
    pub state: DriverState,
    pub kind: StepErrorKind,
}

impl StepFailure {
    pub fn new(state: DriverState, kind: impl Into<StepErrorKind>) -> Self {
        StepFailure {
            state,
            kind: kind.into(),
        }
    }
}
