//! Date negotiation between a client and back-office staff for a single maintenance visit.
//!
//! `engine` holds the pure transition rules; `service` reads and writes the store around
//! them and queues notifications in the store's outbox, which `relay` later delivers.

pub mod domain;
pub mod engine;
mod error;
pub mod relay;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    sort_requests, MaintenanceRequest, RequestDraft, RequestId, RequestNumber, RequestOrder,
    RequestStatus, RequestStatusView, TimePeriod,
};
pub use engine::NegotiationAction;
pub use error::NegotiationError;
pub use relay::{NotificationRelay, RelayReport, DEFAULT_MAX_ATTEMPTS};
pub use repository::{
    DispatchError, Notification, NotificationDispatcher, OutboxEntry, OutboxStatusSummary,
    RequestRepository, RequestUpdate,
};
pub use router::request_router;
pub use service::MaintenanceRequestService;
pub use crate::workflows::maintenance::clock::{Clock, SystemClock};
