use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::repository::{NotificationDispatcher, OutboxEntry, RequestRepository};
use crate::workflows::maintenance::store::RepositoryError;

pub const DEFAULT_RELAY_BATCH: usize = 50;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelayReport {
    pub delivered: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

/// Moves queued notification intents from the store to the dispatcher.
///
/// A failed delivery stays queued for the next pass until it has used up `max_attempts`,
/// then it is parked as a dead letter. The transition that produced it is already committed
/// and is never revisited.
pub struct NotificationRelay<R, D> {
    repository: Arc<R>,
    dispatcher: Arc<D>,
    batch_size: usize,
    max_attempts: u32,
}

impl<R, D> NotificationRelay<R, D>
where
    R: RequestRepository + 'static,
    D: NotificationDispatcher + 'static,
{
    pub fn new(repository: Arc<R>, dispatcher: Arc<D>) -> Self {
        Self {
            repository,
            dispatcher,
            batch_size: DEFAULT_RELAY_BATCH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Only a failure to read the queue aborts a pass; per-entry bookkeeping errors are
    /// logged and the remaining entries are still attempted.
    pub fn drain(&self) -> Result<RelayReport, RepositoryError> {
        let mut report = RelayReport::default();

        for entry in self.repository.pending_notifications(self.batch_size)? {
            match self.dispatcher.notify(&entry.notification) {
                Ok(()) => match self.repository.mark_delivered(entry.sequence) {
                    Ok(()) => report.delivered += 1,
                    Err(error) => warn!(
                        sequence = entry.sequence,
                        reference = %entry.notification.reference_id,
                        %error,
                        "notification sent but not acknowledged; it may be sent again"
                    ),
                },
                Err(error) => {
                    report.failed += 1;
                    if self.fail(&entry, &error.to_string()) {
                        report.dead_lettered += 1;
                    }
                }
            }
        }

        if report.delivered > 0 || report.failed > 0 {
            info!(
                delivered = report.delivered,
                failed = report.failed,
                dead_lettered = report.dead_lettered,
                "notification outbox drained"
            );
        }

        Ok(report)
    }

    /// Records the failed attempt; returns true once the entry has been dead-lettered.
    fn fail(&self, entry: &OutboxEntry, reason: &str) -> bool {
        let attempts = entry.attempts + 1;
        warn!(
            sequence = entry.sequence,
            reference = %entry.notification.reference_id,
            attempts,
            reason,
            "notification delivery failed"
        );

        if let Err(error) = self.repository.record_failure(entry.sequence, reason) {
            warn!(sequence = entry.sequence, %error, "could not record delivery failure");
            return false;
        }
        if attempts < self.max_attempts {
            return false;
        }

        match self.repository.dead_letter(entry.sequence) {
            Ok(()) => {
                warn!(
                    sequence = entry.sequence,
                    reference = %entry.notification.reference_id,
                    attempts,
                    "notification dead-lettered"
                );
                true
            }
            Err(error) => {
                warn!(sequence = entry.sequence, %error, "could not dead-letter notification");
                false
            }
        }
    }
}
