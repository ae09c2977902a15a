use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::maintenance::contracts::MaintenanceTypeId;
use crate::workflows::maintenance::identity::{ClientId, UserId};

/// Identifier wrapper for maintenance requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-facing reference printed on tickets and e-mails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestNumber(pub String);

impl RequestNumber {
    /// Zero padded so lexical order matches issue order.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("MR-{sequence:06}"))
    }
}

/// Part of the day the client would prefer the visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    Morning,
    Afternoon,
    #[default]
    Any,
}

impl TimePeriod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Any => "Any time",
        }
    }
}

/// Negotiation status of a single maintenance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Confirmed,
    Rescheduled,
    Accepted,
    Rejected,
    Cancelled,
    Converted,
}

impl RequestStatus {
    pub const fn all() -> [Self; 7] {
        [
            Self::Pending,
            Self::Confirmed,
            Self::Rescheduled,
            Self::Accepted,
            Self::Rejected,
            Self::Cancelled,
            Self::Converted,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rescheduled => "rescheduled",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Converted => "converted",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting confirmation",
            Self::Confirmed => "Confirmed",
            Self::Rescheduled => "New date proposed",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
            Self::Converted => "Scheduled",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Pending => "#ca8a04",
            Self::Confirmed => "#16a34a",
            Self::Rescheduled => "#2563eb",
            Self::Accepted => "#0d9488",
            Self::Rejected => "#dc2626",
            Self::Cancelled => "#6b7280",
            Self::Converted => "#7c3aed",
        }
    }

    /// No further status-changing operation is accepted from these states.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Rejected | Self::Cancelled | Self::Converted
        )
    }

    /// Statuses that must carry a confirmed date, and the only ones that may.
    pub const fn carries_confirmed_date(self) -> bool {
        matches!(self, Self::Confirmed | Self::Rescheduled | Self::Accepted)
    }
}

/// Client supplied payload for a new request. Required fields are optional here so the
/// engine can report exactly what is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub maintenance_type_id: Option<MaintenanceTypeId>,
    #[serde(default)]
    pub suggested_date: Option<NaiveDate>,
    #[serde(default)]
    pub suggested_time_period: TimePeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub request_number: RequestNumber,
    pub client_id: ClientId,
    pub requested_by: UserId,
    pub title: String,
    pub description: Option<String>,
    pub maintenance_type_id: Option<MaintenanceTypeId>,
    pub suggested_date: NaiveDate,
    pub suggested_time_period: TimePeriod,
    pub confirmed_date: Option<NaiveDate>,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Incremented by the store on every committed write.
    pub version: u64,
}

impl MaintenanceRequest {
    pub fn status_view(&self) -> RequestStatusView {
        RequestStatusView {
            id: self.id.clone(),
            request_number: self.request_number.clone(),
            title: self.title.clone(),
            status: self.status,
            status_label: self.status.label(),
            status_color: self.status.color(),
            suggested_date: self.suggested_date,
            suggested_time_period: self.suggested_time_period,
            confirmed_date: self.confirmed_date,
            admin_notes: self.admin_notes.clone(),
            created_at: self.created_at,
            version: self.version,
        }
    }
}

/// Representation of a request exposed to portal screens.
#[derive(Debug, Clone, Serialize)]
pub struct RequestStatusView {
    pub id: RequestId,
    pub request_number: RequestNumber,
    pub title: String,
    pub status: RequestStatus,
    pub status_label: &'static str,
    pub status_color: &'static str,
    pub suggested_date: NaiveDate,
    pub suggested_time_period: TimePeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Orders by creation time; equal timestamps fall back to the request number.
pub fn sort_requests(requests: &mut [MaintenanceRequest], order: RequestOrder) {
    requests.sort_by(|a, b| {
        let ascending = a
            .created_at
            .cmp(&b.created_at)
            .then_with(|| a.request_number.cmp(&b.request_number));
        match order {
            RequestOrder::OldestFirst => ascending,
            RequestOrder::NewestFirst => ascending.reverse(),
        }
    });
}
