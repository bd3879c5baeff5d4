use tracing::{error, info, warn};

use crate::driver::{DriverConfig, DriverState, FormDriver};
use crate::error::MalformedRecord;
use crate::filter::filter_by_range;
use crate::mapper;
use crate::models::{DateRange, SessionRecord};
use crate::page::Page;
use crate::prompt::{self, Prompt};

#[derive(Debug)]
pub enum SessionOutcome {
    Submitted,
    Skipped(MalformedRecord),
    Abandoned { state: DriverState, reason: String },
}

#[derive(Debug)]
pub struct SessionResult {
    pub label: String,
    pub outcome: SessionOutcome,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<SessionResult>,
}

impl BatchSummary {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn submitted(&self) -> usize {
        self.count(|outcome| matches!(outcome, SessionOutcome::Submitted))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, SessionOutcome::Skipped(_)))
    }

    pub fn abandoned(&self) -> usize {
        self.count(|outcome| matches!(outcome, SessionOutcome::Abandoned { .. }))
    }

    fn count(&self, predicate: impl Fn(&SessionOutcome) -> bool) -> usize {
        self.results
            .iter()
            .filter(|result| predicate(&result.outcome))
            .count()
    }
}

/// Walks the sessions of one date range through the eval form, one at a time
/// on a single page.
pub struct BatchRunner<'a, P: Page + ?Sized, Q: Prompt + ?Sized> {
    page: &'a mut P,
    prompt: &'a mut Q,
    config: &'a DriverConfig,
}

impl<'a, P: Page + ?Sized, Q: Prompt + ?Sized> BatchRunner<'a, P, Q> {
    pub fn new(page: &'a mut P, prompt: &'a mut Q, config: &'a DriverConfig) -> Self {
        BatchRunner {
            page,
            prompt,
            config,
        }
    }

    pub async fn run(
        &mut self,
        rows: &[SessionRecord],
        range: &DateRange,
    ) -> anyhow::Result<BatchSummary> {
        let sessions = filter_by_range(rows, range);
        if sessions.is_empty() {
            info!(
                "No sessions between {} and {}.",
                range.start(),
                range.end()
            );
            return Ok(BatchSummary::default());
        }

        info!("{} sessions to fill", sessions.len());
        self.process(&sessions).await
    }

    /// Process records in order. Only operator input failures stop the batch.
    pub async fn process(&mut self, sessions: &[SessionRecord]) -> anyhow::Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        for record in sessions {
            let label = record.label();
            let mapped = match mapper::map_session(record, self.config.clock) {
                Ok(mapped) => mapped,
                Err(err) => {
                    warn!("Skipping {}: {}", label, err);
                    summary.results.push(SessionResult {
                        label,
                        outcome: SessionOutcome::Skipped(err),
                    });
                    continue;
                }
            };

            let judgment = prompt::prompt_judgment(&mut *self.prompt, &record.student_name)?;

            let outcome = match FormDriver::new(&mut *self.page, self.config)
                .run(&mapped, &judgment)
                .await
            {
                Ok(_) => SessionOutcome::Submitted,
                Err(failure) => {
                    error!("Abandoned {}: {}", label, failure);
                    SessionOutcome::Abandoned {
                        state: failure.state,
                        reason: failure.kind.to_string(),
                    }
                }
            };
            summary.results.push(SessionResult { label, outcome });
        }

        Ok(summary)
    }
}
