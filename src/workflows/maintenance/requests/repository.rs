use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{MaintenanceRequest, RequestId, RequestOrder, RequestStatus};
use crate::workflows::maintenance::identity::{ClientId, UserId};
use crate::workflows::maintenance::store::RepositoryError;

/// Fields rewritten by a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUpdate {
    pub status: RequestStatus,
    pub confirmed_date: Option<NaiveDate>,
    pub admin_notes: Option<String>,
}

impl RequestUpdate {
    pub fn apply_to(&self, request: &mut MaintenanceRequest) {
        request.status = self.status;
        request.confirmed_date = self.confirmed_date;
        request.admin_notes = self.admin_notes.clone();
    }
}

/// Notification payload handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipients: Vec<UserId>,
    pub title: String,
    pub body: String,
    pub reference_id: RequestId,
}

/// Notification intent persisted in the same write as the transition that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboxEntry {
    pub sequence: u64,
    pub notification: Notification,
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Aggregate counters for the notification outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutboxStatusSummary {
    pub pending_count: usize,
    pub sent_count: usize,
    /// Pending entries that have failed at least one delivery attempt.
    pub failed_count: usize,
    /// Entries parked after exhausting their delivery attempts.
    pub dead_letter_count: usize,
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Writes that carry a notification must persist it atomically with the record change.
pub trait RequestRepository: Send + Sync {
    fn next_sequence(&self) -> Result<u64, RepositoryError>;
    fn insert(
        &self,
        request: MaintenanceRequest,
        notification: Option<Notification>,
    ) -> Result<MaintenanceRequest, RepositoryError>;
    fn find_by_id(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError>;
    fn list_by_client(
        &self,
        client_id: &ClientId,
        order: RequestOrder,
    ) -> Result<Vec<MaintenanceRequest>, RepositoryError>;
    /// Compare-and-swap on `expected_version`; a stale version yields `RepositoryError::Conflict`.
    fn update_status(
        &self,
        id: &RequestId,
        expected_version: u64,
        update: RequestUpdate,
        notification: Option<Notification>,
    ) -> Result<MaintenanceRequest, RepositoryError>;
    fn delete(&self, id: &RequestId) -> Result<(), RepositoryError>;

    /// Up to `limit` queued entries, fewest failed attempts first, then oldest first.
    fn pending_notifications(&self, limit: usize) -> Result<Vec<OutboxEntry>, RepositoryError>;
    fn mark_delivered(&self, sequence: u64) -> Result<(), RepositoryError>;
    fn record_failure(&self, sequence: u64, reason: &str) -> Result<(), RepositoryError>;
    /// Removes the entry from the delivery queue and keeps it for inspection.
    fn dead_letter(&self, sequence: u64) -> Result<(), RepositoryError>;
    fn outbox_status(&self) -> Result<OutboxStatusSummary, RepositoryError>;
}

/// Outbound notification hook (e-mail, push, or in-portal inbox adapters).
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
