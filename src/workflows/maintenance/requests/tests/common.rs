use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::infra::{InMemoryRequestStore, StaticStaffDirectory};
use crate::workflows::maintenance::identity::{Caller, ClientId, HeaderIdentity};
use crate::workflows::maintenance::requests::domain::{
    MaintenanceRequest, RequestDraft, RequestId, RequestNumber, RequestOrder, RequestStatus,
    TimePeriod,
};
use crate::workflows::maintenance::requests::repository::{
    DispatchError, Notification, NotificationDispatcher, OutboxEntry, OutboxStatusSummary,
    RequestRepository, RequestUpdate,
};
use crate::workflows::maintenance::clock::Clock;
use crate::workflows::maintenance::requests::service::MaintenanceRequestService;
use crate::workflows::maintenance::requests::request_router;
use crate::workflows::maintenance::store::RepositoryError;

pub(super) type TestService = MaintenanceRequestService<InMemoryRequestStore, StaticStaffDirectory>;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Clock pinned to a single instant; `advance` moves it forward between calls.
pub(super) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) fn at(year: i32, month: u32, day: u32) -> Self {
        let now = Utc
            .with_ymd_and_hms(year, month, day, 9, 0, 0)
            .single()
            .expect("valid instant");
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance_minutes(&self, minutes: i64) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = *now + chrono::Duration::minutes(minutes);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn client() -> Caller {
    Caller::client("user-ana", "acme")
}

pub(super) fn other_client() -> Caller {
    Caller::client("user-bo", "globex")
}

pub(super) fn staff() -> Caller {
    Caller::staff("staff-lee")
}

pub(super) fn staff_directory() -> StaticStaffDirectory {
    StaticStaffDirectory::new(["staff-lee", "staff-kim"])
}

pub(super) fn draft(suggested_date: NaiveDate) -> RequestDraft {
    RequestDraft {
        title: Some("Chiller inspection".to_string()),
        description: Some("Unit 3 rattles on start-up".to_string()),
        maintenance_type_id: None,
        suggested_date: Some(suggested_date),
        suggested_time_period: TimePeriod::Morning,
    }
}

pub(super) fn build_service() -> (TestService, Arc<InMemoryRequestStore>, Arc<FixedClock>) {
    let store = Arc::new(InMemoryRequestStore::default());
    let clock = Arc::new(FixedClock::at(2024, 5, 20));
    let service = MaintenanceRequestService::with_clock(
        store.clone(),
        Arc::new(staff_directory()),
        clock.clone(),
    );
    (service, store, clock)
}

/// Request value for engine tests, with a confirmed date consistent with `status`.
pub(super) fn request_in(status: RequestStatus) -> MaintenanceRequest {
    MaintenanceRequest {
        id: RequestId("mr-1".to_string()),
        request_number: RequestNumber::from_sequence(1),
        client_id: ClientId("acme".to_string()),
        requested_by: client().user_id,
        title: "Chiller inspection".to_string(),
        description: None,
        maintenance_type_id: None,
        suggested_date: date(2024, 6, 1),
        suggested_time_period: TimePeriod::Any,
        confirmed_date: status
            .carries_confirmed_date()
            .then(|| date(2024, 6, 5)),
        status,
        admin_notes: None,
        created_at: Utc
            .with_ymd_and_hms(2024, 5, 20, 9, 0, 0)
            .single()
            .expect("valid instant"),
        version: 1,
    }
}

pub(super) fn outbox(store: &InMemoryRequestStore) -> Vec<OutboxEntry> {
    store.pending_notifications(usize::MAX).expect("outbox readable")
}

#[derive(Default)]
pub(super) struct RecordingDispatcher {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingDispatcher {
    pub(super) fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().expect("dispatcher mutex poisoned").clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn notify(&self, notification: &Notification) -> Result<(), DispatchError> {
        self.delivered
            .lock()
            .expect("dispatcher mutex poisoned")
            .push(notification.clone());
        Ok(())
    }
}

pub(super) struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn notify(&self, _notification: &Notification) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("smtp relay refused connection".to_string()))
    }
}

/// Refuses every notification about `failing`, records the rest.
pub(super) struct SelectiveDispatcher {
    failing: RequestId,
    delivered: Mutex<Vec<Notification>>,
}

impl SelectiveDispatcher {
    pub(super) fn failing_for(id: &str) -> Self {
        Self {
            failing: RequestId(id.to_string()),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().expect("dispatcher mutex poisoned").clone()
    }
}

impl NotificationDispatcher for SelectiveDispatcher {
    fn notify(&self, notification: &Notification) -> Result<(), DispatchError> {
        if notification.reference_id == self.failing {
            return Err(DispatchError::Transport("mailbox unavailable".to_string()));
        }
        self.delivered
            .lock()
            .expect("dispatcher mutex poisoned")
            .push(notification.clone());
        Ok(())
    }
}

/// Delegates to an in-memory store but cannot acknowledge one outbox entry.
pub(super) struct UnacknowledgingStore {
    pub(super) inner: Arc<InMemoryRequestStore>,
    pub(super) refused: u64,
}

impl RequestRepository for UnacknowledgingStore {
    fn next_sequence(&self) -> Result<u64, RepositoryError> {
        self.inner.next_sequence()
    }

    fn insert(
        &self,
        request: MaintenanceRequest,
        notification: Option<Notification>,
    ) -> Result<MaintenanceRequest, RepositoryError> {
        self.inner.insert(request, notification)
    }

    fn find_by_id(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError> {
        self.inner.find_by_id(id)
    }

    fn list_by_client(
        &self,
        client_id: &ClientId,
        order: RequestOrder,
    ) -> Result<Vec<MaintenanceRequest>, RepositoryError> {
        self.inner.list_by_client(client_id, order)
    }

    fn update_status(
        &self,
        id: &RequestId,
        expected_version: u64,
        update: RequestUpdate,
        notification: Option<Notification>,
    ) -> Result<MaintenanceRequest, RepositoryError> {
        self.inner
            .update_status(id, expected_version, update, notification)
    }

    fn delete(&self, id: &RequestId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }

    fn pending_notifications(&self, limit: usize) -> Result<Vec<OutboxEntry>, RepositoryError> {
        self.inner.pending_notifications(limit)
    }

    fn mark_delivered(&self, sequence: u64) -> Result<(), RepositoryError> {
        if sequence == self.refused {
            return Err(RepositoryError::Unavailable("acknowledgement lost".to_string()));
        }
        self.inner.mark_delivered(sequence)
    }

    fn record_failure(&self, sequence: u64, reason: &str) -> Result<(), RepositoryError> {
        self.inner.record_failure(sequence, reason)
    }

    fn dead_letter(&self, sequence: u64) -> Result<(), RepositoryError> {
        self.inner.dead_letter(sequence)
    }

    fn outbox_status(&self) -> Result<OutboxStatusSummary, RepositoryError> {
        self.inner.outbox_status()
    }
}

pub(super) struct UnavailableRepository;

impl RequestRepository for UnavailableRepository {
    fn next_sequence(&self) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(
        &self,
        _request: MaintenanceRequest,
        _notification: Option<Notification>,
    ) -> Result<MaintenanceRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_id(&self, _id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_by_client(
        &self,
        _client_id: &ClientId,
        _order: RequestOrder,
    ) -> Result<Vec<MaintenanceRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_status(
        &self,
        _id: &RequestId,
        _expected_version: u64,
        _update: RequestUpdate,
        _notification: Option<Notification>,
    ) -> Result<MaintenanceRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &RequestId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending_notifications(&self, _limit: usize) -> Result<Vec<OutboxEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mark_delivered(&self, _sequence: u64) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_failure(&self, _sequence: u64, _reason: &str) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn dead_letter(&self, _sequence: u64) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn outbox_status(&self) -> Result<OutboxStatusSummary, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    request_router(Arc::new(service), Arc::new(HeaderIdentity))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
