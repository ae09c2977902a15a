//! In-process adapters for the store, dispatcher, and directory ports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::workflows::maintenance::contracts::{
    ContractRepository, MaintenanceContract, MaintenanceType,
};
use crate::workflows::maintenance::identity::{ClientId, StaffDirectory, UserId};
use crate::workflows::maintenance::requests::{
    sort_requests, DispatchError, MaintenanceRequest, Notification, NotificationDispatcher,
    OutboxEntry, OutboxStatusSummary, RequestId, RequestOrder, RequestRepository, RequestUpdate,
};
use crate::workflows::maintenance::store::RepositoryError;

#[derive(Debug, Default)]
struct RequestStoreState {
    sequence: u64,
    requests: HashMap<RequestId, MaintenanceRequest>,
    outbox_sequence: u64,
    outbox: Vec<OutboxEntry>,
    dead_letters: Vec<OutboxEntry>,
    sent: usize,
}

impl RequestStoreState {
    fn enqueue(&mut self, notification: Option<Notification>) {
        if let Some(notification) = notification {
            self.outbox_sequence += 1;
            self.outbox.push(OutboxEntry {
                sequence: self.outbox_sequence,
                notification,
                attempts: 0,
                last_error: None,
            });
        }
    }
}

/// Request store with its outbox behind a single lock, so a record write and its
/// notification intent commit together.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRequestStore {
    state: Arc<Mutex<RequestStoreState>>,
}

impl InMemoryRequestStore {
    fn lock(&self) -> Result<MutexGuard<'_, RequestStoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("request store lock poisoned".to_string()))
    }
}

impl RequestRepository for InMemoryRequestStore {
    fn next_sequence(&self) -> Result<u64, RepositoryError> {
        let mut state = self.lock()?;
        state.sequence += 1;
        Ok(state.sequence)
    }

    fn insert(
        &self,
        mut request: MaintenanceRequest,
        notification: Option<Notification>,
    ) -> Result<MaintenanceRequest, RepositoryError> {
        let mut state = self.lock()?;
        if state.requests.contains_key(&request.id) {
            return Err(RepositoryError::Duplicate);
        }
        request.version = 1;
        state.requests.insert(request.id.clone(), request.clone());
        state.enqueue(notification);
        Ok(request)
    }

    fn find_by_id(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError> {
        Ok(self.lock()?.requests.get(id).cloned())
    }

    fn list_by_client(
        &self,
        client_id: &ClientId,
        order: RequestOrder,
    ) -> Result<Vec<MaintenanceRequest>, RepositoryError> {
        let mut requests: Vec<MaintenanceRequest> = self
            .lock()?
            .requests
            .values()
            .filter(|request| &request.client_id == client_id)
            .cloned()
            .collect();
        sort_requests(&mut requests, order);
        Ok(requests)
    }

    fn update_status(
        &self,
        id: &RequestId,
        expected_version: u64,
        update: RequestUpdate,
        notification: Option<Notification>,
    ) -> Result<MaintenanceRequest, RepositoryError> {
        let mut state = self.lock()?;
        let stored = state
            .requests
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Conflict {
                expected: expected_version,
                actual: stored.version,
            });
        }

        update.apply_to(stored);
        stored.version += 1;
        let updated = stored.clone();
        state.enqueue(notification);
        Ok(updated)
    }

    fn delete(&self, id: &RequestId) -> Result<(), RepositoryError> {
        self.lock()?
            .requests
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn pending_notifications(&self, limit: usize) -> Result<Vec<OutboxEntry>, RepositoryError> {
        let mut queued = self.lock()?.outbox.clone();
        queued.sort_by_key(|entry| (entry.attempts, entry.sequence));
        queued.truncate(limit);
        Ok(queued)
    }

    fn mark_delivered(&self, sequence: u64) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let position = state
            .outbox
            .iter()
            .position(|entry| entry.sequence == sequence)
            .ok_or(RepositoryError::NotFound)?;
        state.outbox.remove(position);
        state.sent += 1;
        Ok(())
    }

    fn record_failure(&self, sequence: u64, reason: &str) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let entry = state
            .outbox
            .iter_mut()
            .find(|entry| entry.sequence == sequence)
            .ok_or(RepositoryError::NotFound)?;
        entry.attempts += 1;
        entry.last_error = Some(reason.to_string());
        Ok(())
    }

    fn dead_letter(&self, sequence: u64) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let position = state
            .outbox
            .iter()
            .position(|entry| entry.sequence == sequence)
            .ok_or(RepositoryError::NotFound)?;
        let entry = state.outbox.remove(position);
        state.dead_letters.push(entry);
        Ok(())
    }

    fn outbox_status(&self) -> Result<OutboxStatusSummary, RepositoryError> {
        let state = self.lock()?;
        Ok(OutboxStatusSummary {
            pending_count: state.outbox.len(),
            sent_count: state.sent,
            failed_count: state
                .outbox
                .iter()
                .filter(|entry| entry.attempts > 0)
                .count(),
            dead_letter_count: state.dead_letters.len(),
        })
    }
}

/// Contract catalog loaded once at start-up (CSV seed or fixtures).
#[derive(Debug, Default, Clone)]
pub struct InMemoryContractStore {
    contracts: Arc<Vec<MaintenanceContract>>,
    types: Arc<Vec<MaintenanceType>>,
}

impl InMemoryContractStore {
    pub fn new(contracts: Vec<MaintenanceContract>, types: Vec<MaintenanceType>) -> Self {
        Self {
            contracts: Arc::new(contracts),
            types: Arc::new(types),
        }
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl ContractRepository for InMemoryContractStore {
    fn list_by_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<MaintenanceContract>, RepositoryError> {
        Ok(self
            .contracts
            .iter()
            .filter(|contract| &contract.client_id == client_id)
            .cloned()
            .collect())
    }

    fn maintenance_types(&self) -> Result<Vec<MaintenanceType>, RepositoryError> {
        Ok(self.types.as_ref().clone())
    }
}

/// Logs deliveries; stands in until a mail or push adapter is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDispatcher;

impl NotificationDispatcher for TracingDispatcher {
    fn notify(&self, notification: &Notification) -> Result<(), DispatchError> {
        let recipients: Vec<&str> = notification
            .recipients
            .iter()
            .map(|user| user.0.as_str())
            .collect();
        info!(
            reference = %notification.reference_id,
            ?recipients,
            title = %notification.title,
            "notification delivered"
        );
        Ok(())
    }
}

/// Fixed staff roster taken from configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticStaffDirectory {
    staff: Vec<UserId>,
}

impl StaticStaffDirectory {
    pub fn new<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            staff: ids.into_iter().map(|id| UserId(id.into())).collect(),
        }
    }
}

impl StaffDirectory for StaticStaffDirectory {
    fn staff_recipients(&self) -> Vec<UserId> {
        self.staff.clone()
    }
}
