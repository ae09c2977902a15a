use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::domain::{MaintenanceRequest, RequestDraft, RequestId, RequestOrder};
use super::engine::{self, NegotiationAction};
use super::error::NegotiationError;
use super::repository::RequestRepository;
use crate::workflows::maintenance::clock::{Clock, SystemClock};
use crate::workflows::maintenance::identity::{Caller, ClientId, StaffDirectory};

/// Service composing the negotiation rules, the request store, and the staff directory.
///
/// Holds no request state between calls; every operation reads the record, plans the
/// transition, and writes it back guarded by the version it read.
pub struct MaintenanceRequestService<R, S> {
    repository: Arc<R>,
    directory: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<R, S> MaintenanceRequestService<R, S>
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    pub fn new(repository: Arc<R>, directory: Arc<S>) -> Self {
        Self::with_clock(repository, directory, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<R>, directory: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            directory,
            clock,
        }
    }

    /// Open a new request in `pending` and queue the staff notification with it.
    pub fn create(
        &self,
        caller: &Caller,
        draft: RequestDraft,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        let now = self.clock.now();
        let validated = engine::validate_draft(caller, draft, now.date_naive())?;

        let sequence = self.repository.next_sequence()?;
        let request = validated.into_request(sequence, now);
        let notice = engine::creation_notice(&request, self.directory.staff_recipients());

        let stored = self.repository.insert(request, Some(notice))?;
        info!(
            request = %stored.id,
            number = %stored.request_number.0,
            client = %stored.client_id,
            suggested = %stored.suggested_date,
            "maintenance request created"
        );
        Ok(stored)
    }

    pub fn staff_confirm(
        &self,
        caller: &Caller,
        id: &RequestId,
        confirmed_date: NaiveDate,
        expected_version: Option<u64>,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        self.apply(
            caller,
            id,
            NegotiationAction::Confirm { confirmed_date },
            expected_version,
        )
    }

    pub fn staff_reschedule(
        &self,
        caller: &Caller,
        id: &RequestId,
        proposed_date: NaiveDate,
        notes: Option<String>,
        expected_version: Option<u64>,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        self.apply(
            caller,
            id,
            NegotiationAction::Reschedule {
                proposed_date,
                notes,
            },
            expected_version,
        )
    }

    pub fn client_accept(
        &self,
        caller: &Caller,
        id: &RequestId,
        expected_version: Option<u64>,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        self.apply(caller, id, NegotiationAction::Accept, expected_version)
    }

    pub fn client_reject(
        &self,
        caller: &Caller,
        id: &RequestId,
        expected_version: Option<u64>,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        self.apply(caller, id, NegotiationAction::Reject, expected_version)
    }

    /// Cancelling twice reports `NotApplicable` and leaves the record untouched.
    pub fn client_cancel(
        &self,
        caller: &Caller,
        id: &RequestId,
        expected_version: Option<u64>,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        self.apply(caller, id, NegotiationAction::Cancel, expected_version)
    }

    /// Triggered once the accepted visit has been put on the work schedule.
    pub fn convert(
        &self,
        caller: &Caller,
        id: &RequestId,
        expected_version: Option<u64>,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        self.apply(caller, id, NegotiationAction::Convert, expected_version)
    }

    /// Fetch a request the caller is allowed to see.
    pub fn get(
        &self,
        caller: &Caller,
        id: &RequestId,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        let request = self.load(id)?;
        if !caller.can_view(&request.client_id) {
            return Err(NegotiationError::unauthorized(format!(
                "request {} belongs to another client",
                request.request_number.0
            )));
        }
        Ok(request)
    }

    /// Most recent first.
    pub fn list_for_client(
        &self,
        caller: &Caller,
        client_id: &ClientId,
    ) -> Result<Vec<MaintenanceRequest>, NegotiationError> {
        if !caller.can_view(client_id) {
            return Err(NegotiationError::unauthorized(
                "clients can only list their own requests",
            ));
        }
        Ok(self
            .repository
            .list_by_client(client_id, RequestOrder::NewestFirst)?)
    }

    /// Staff clean-up of requests that can no longer change.
    pub fn discard(&self, caller: &Caller, id: &RequestId) -> Result<(), NegotiationError> {
        if !caller.is_staff() {
            return Err(NegotiationError::unauthorized(
                "only staff can discard maintenance requests",
            ));
        }

        let request = self.load(id)?;
        if !request.status.is_terminal() {
            return Err(NegotiationError::InvalidTransition {
                status: request.status,
                action: "discard",
            });
        }

        self.repository.delete(id)?;
        info!(request = %id, status = request.status.as_str(), "maintenance request discarded");
        Ok(())
    }

    fn load(&self, id: &RequestId) -> Result<MaintenanceRequest, NegotiationError> {
        self.repository
            .find_by_id(id)?
            .ok_or_else(|| NegotiationError::NotFound(id.clone()))
    }

    fn apply(
        &self,
        caller: &Caller,
        id: &RequestId,
        action: NegotiationAction,
        expected_version: Option<u64>,
    ) -> Result<MaintenanceRequest, NegotiationError> {
        let request = self.load(id)?;
        let planned = engine::plan(&request, &action, caller);

        // A repeated cancel reports `NotApplicable` even when retried with the version read
        // before the first cancel committed.
        let repeated = matches!(planned, Err(NegotiationError::NotApplicable { .. }));
        if let (Some(expected), false) = (expected_version, repeated) {
            if expected != request.version {
                return Err(NegotiationError::Conflict {
                    expected,
                    actual: request.version,
                });
            }
        }

        let update = match planned {
            Ok(update) => update,
            Err(error) => {
                debug!(request = %id, action = action.name(), %error, "transition refused");
                return Err(error);
            }
        };

        let notice = engine::transition_notice(
            &request,
            &action,
            &update,
            self.directory.staff_recipients(),
        );
        let from = request.status;
        let stored = self
            .repository
            .update_status(id, request.version, update, notice)?;

        info!(
            request = %id,
            action = action.name(),
            from = from.as_str(),
            to = stored.status.as_str(),
            version = stored.version,
            "maintenance request transitioned"
        );
        Ok(stored)
    }
}
