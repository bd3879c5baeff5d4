use tracing::warn;

use crate::mapper;
use crate::models::{DateRange, SessionRecord};

/// Rows whose session date falls inside `range`, in ledger order. Rows with an
/// unreadable date can never be in range and are dropped with a warning.
pub fn filter_by_range(rows: &[SessionRecord], range: &DateRange) -> Vec<SessionRecord> {
    rows.iter()
        .filter(|record| match mapper::session_date(record) {
            Ok(date) => range.contains(date),
            Err(err) => {
                warn!("Ignoring {}: {}", record.label(), err);
                false
            }
        })
        .cloned()
        .collect()
}
