//! Pure negotiation rules.
//!
//! Every function here works on explicit request values and returns the change to persist;
//! nothing touches the store, so callers decide how the result is committed.

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    MaintenanceRequest, RequestDraft, RequestId, RequestNumber, RequestStatus, TimePeriod,
};
use super::error::NegotiationError;
use super::repository::{Notification, RequestUpdate};
use crate::workflows::maintenance::contracts::MaintenanceTypeId;
use crate::workflows::maintenance::identity::{Caller, CallerRole, ClientId, UserId};

/// Status-changing operations on an existing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationAction {
    Confirm {
        confirmed_date: NaiveDate,
    },
    Reschedule {
        proposed_date: NaiveDate,
        notes: Option<String>,
    },
    Accept,
    Reject,
    Cancel,
    Convert,
}

impl NegotiationAction {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Confirm { .. } => "confirm",
            Self::Reschedule { .. } => "reschedule",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::Convert => "convert",
        }
    }

    pub const fn performed_by(&self) -> CallerRole {
        match self {
            Self::Confirm { .. } | Self::Reschedule { .. } | Self::Convert => CallerRole::Staff,
            Self::Accept | Self::Reject | Self::Cancel => CallerRole::Client,
        }
    }
}

/// Draft that passed validation, waiting for the store to assign its sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    pub client_id: ClientId,
    pub requested_by: UserId,
    pub title: String,
    pub description: Option<String>,
    pub maintenance_type_id: Option<MaintenanceTypeId>,
    pub suggested_date: NaiveDate,
    pub suggested_time_period: TimePeriod,
}

impl ValidatedDraft {
    pub fn into_request(self, sequence: u64, created_at: DateTime<Utc>) -> MaintenanceRequest {
        MaintenanceRequest {
            id: RequestId(format!("mr-{sequence}")),
            request_number: RequestNumber::from_sequence(sequence),
            client_id: self.client_id,
            requested_by: self.requested_by,
            title: self.title,
            description: self.description,
            maintenance_type_id: self.maintenance_type_id,
            suggested_date: self.suggested_date,
            suggested_time_period: self.suggested_time_period,
            confirmed_date: None,
            status: RequestStatus::Pending,
            admin_notes: None,
            created_at,
            version: 1,
        }
    }
}

/// Checks a client draft. The suggested date must fall strictly after the submission day.
pub fn validate_draft(
    caller: &Caller,
    draft: RequestDraft,
    submitted_on: NaiveDate,
) -> Result<ValidatedDraft, NegotiationError> {
    let client_id = match (&caller.role, &caller.client_id) {
        (CallerRole::Client, Some(client_id)) => client_id.clone(),
        _ => {
            return Err(NegotiationError::unauthorized(
                "only clients can open maintenance requests",
            ))
        }
    };

    let title = non_blank(draft.title)
        .ok_or_else(|| NegotiationError::validation("title is required"))?;
    let suggested_date = draft
        .suggested_date
        .ok_or_else(|| NegotiationError::validation("suggested_date is required"))?;
    if suggested_date <= submitted_on {
        return Err(NegotiationError::validation(format!(
            "suggested_date {suggested_date} must be after {submitted_on}"
        )));
    }

    Ok(ValidatedDraft {
        client_id,
        requested_by: caller.user_id.clone(),
        title,
        description: non_blank(draft.description),
        maintenance_type_id: draft.maintenance_type_id,
        suggested_date,
        suggested_time_period: draft.suggested_time_period,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn authorize(
    request: &MaintenanceRequest,
    action: &NegotiationAction,
    caller: &Caller,
) -> Result<(), NegotiationError> {
    match action.performed_by() {
        CallerRole::Staff if caller.is_staff() => Ok(()),
        CallerRole::Staff => Err(NegotiationError::unauthorized(format!(
            "only staff can {} maintenance requests",
            action.name()
        ))),
        CallerRole::Client if caller.acts_for(&request.client_id) => Ok(()),
        CallerRole::Client => Err(NegotiationError::unauthorized(format!(
            "only the owning client can {} request {}",
            action.name(),
            request.request_number.0
        ))),
    }
}

/// The edge table. Anything not listed is an invalid transition, except a repeated cancel,
/// which is reported as not applicable.
pub fn transition(
    request: &MaintenanceRequest,
    action: &NegotiationAction,
) -> Result<RequestUpdate, NegotiationError> {
    let keep_notes = || request.admin_notes.clone();

    let update = match (request.status, action) {
        (RequestStatus::Pending, NegotiationAction::Confirm { confirmed_date }) => RequestUpdate {
            status: RequestStatus::Confirmed,
            confirmed_date: Some(*confirmed_date),
            admin_notes: keep_notes(),
        },
        (
            RequestStatus::Pending,
            NegotiationAction::Reschedule {
                proposed_date,
                notes,
            },
        ) => RequestUpdate {
            status: RequestStatus::Rescheduled,
            confirmed_date: Some(*proposed_date),
            admin_notes: non_blank(notes.clone()),
        },
        (RequestStatus::Pending, NegotiationAction::Cancel) => RequestUpdate {
            status: RequestStatus::Cancelled,
            confirmed_date: None,
            admin_notes: keep_notes(),
        },
        (RequestStatus::Rescheduled, NegotiationAction::Accept) => RequestUpdate {
            status: RequestStatus::Accepted,
            confirmed_date: request.confirmed_date,
            admin_notes: keep_notes(),
        },
        (RequestStatus::Rescheduled, NegotiationAction::Reject) => RequestUpdate {
            status: RequestStatus::Rejected,
            confirmed_date: None,
            admin_notes: keep_notes(),
        },
        (RequestStatus::Accepted, NegotiationAction::Convert) => RequestUpdate {
            status: RequestStatus::Converted,
            confirmed_date: None,
            admin_notes: keep_notes(),
        },
        (RequestStatus::Cancelled, NegotiationAction::Cancel) => {
            return Err(NegotiationError::NotApplicable {
                id: request.id.clone(),
                status: request.status,
            })
        }
        (status, action) => {
            return Err(NegotiationError::InvalidTransition {
                status,
                action: action.name(),
            })
        }
    };

    Ok(update)
}

/// Authorization first, then the edge table.
pub fn plan(
    request: &MaintenanceRequest,
    action: &NegotiationAction,
    caller: &Caller,
) -> Result<RequestUpdate, NegotiationError> {
    authorize(request, action, caller)?;
    transition(request, action)
}

pub fn creation_notice(request: &MaintenanceRequest, staff: Vec<UserId>) -> Notification {
    Notification {
        recipients: staff,
        title: format!("New maintenance request {}", request.request_number.0),
        body: format!(
            "{} asked for \"{}\" on {} ({}).",
            request.client_id,
            request.title,
            request.suggested_date,
            request.suggested_time_period.label()
        ),
        reference_id: request.id.clone(),
    }
}

/// Notification owed for a committed transition. Cancellation only gets local feedback.
pub fn transition_notice(
    request: &MaintenanceRequest,
    action: &NegotiationAction,
    update: &RequestUpdate,
    staff: Vec<UserId>,
) -> Option<Notification> {
    let number = &request.request_number.0;
    let client = vec![request.requested_by.clone()];

    let (recipients, title, body) = match action {
        NegotiationAction::Confirm { confirmed_date } => (
            client,
            format!("Maintenance request {number} confirmed"),
            format!("Your visit \"{}\" is confirmed for {confirmed_date}.", request.title),
        ),
        NegotiationAction::Reschedule { proposed_date, .. } => {
            let mut body = format!(
                "We cannot make {} for \"{}\" and propose {proposed_date} instead.",
                request.suggested_date, request.title
            );
            if let Some(notes) = &update.admin_notes {
                body.push(' ');
                body.push_str(notes);
            }
            (client, format!("New date proposed for {number}"), body)
        }
        NegotiationAction::Accept => (
            staff,
            format!("Client accepted {number}"),
            format!(
                "{} accepted the proposed date {} for \"{}\".",
                request.client_id,
                update
                    .confirmed_date
                    .map(|date| date.to_string())
                    .unwrap_or_default(),
                request.title
            ),
        ),
        NegotiationAction::Reject => (
            staff,
            format!("Client rejected {number}"),
            format!(
                "{} rejected the proposed date for \"{}\".",
                request.client_id, request.title
            ),
        ),
        NegotiationAction::Convert => (
            client,
            format!("Maintenance request {number} scheduled"),
            format!("\"{}\" has been added to the work schedule.", request.title),
        ),
        NegotiationAction::Cancel => return None,
    };

    Some(Notification {
        recipients,
        title,
        body,
        reference_id: request.id.clone(),
    })
}
