use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{MaintenanceRequest, RequestDraft, RequestId};
use super::error::NegotiationError;
use super::repository::RequestRepository;
use super::service::MaintenanceRequestService;
use crate::workflows::maintenance::identity::{
    Caller, ClientId, IdentityProvider, StaffDirectory,
};

pub struct RequestApi<R, S> {
    pub(crate) service: Arc<MaintenanceRequestService<R, S>>,
    pub(crate) identity: Arc<dyn IdentityProvider>,
}

impl<R, S> Clone for RequestApi<R, S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmPayload {
    pub(crate) confirmed_date: NaiveDate,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReschedulePayload {
    pub(crate) proposed_date: NaiveDate,
    #[serde(default)]
    pub(crate) notes: Option<String>,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VersionPayload {
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) client_id: Option<String>,
}

type Decision<R, S> = fn(
    &MaintenanceRequestService<R, S>,
    &Caller,
    &RequestId,
    Option<u64>,
) -> Result<MaintenanceRequest, NegotiationError>;

/// Router builder exposing the negotiation endpoints.
pub fn request_router<R, S>(
    service: Arc<MaintenanceRequestService<R, S>>,
    identity: Arc<dyn IdentityProvider>,
) -> Router
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/maintenance/requests",
            post(create_handler::<R, S>).get(list_handler::<R, S>),
        )
        .route(
            "/api/v1/maintenance/requests/:request_id",
            get(status_handler::<R, S>).delete(discard_handler::<R, S>),
        )
        .route(
            "/api/v1/maintenance/requests/:request_id/confirm",
            post(confirm_handler::<R, S>),
        )
        .route(
            "/api/v1/maintenance/requests/:request_id/reschedule",
            post(reschedule_handler::<R, S>),
        )
        .route(
            "/api/v1/maintenance/requests/:request_id/accept",
            post(accept_handler::<R, S>),
        )
        .route(
            "/api/v1/maintenance/requests/:request_id/reject",
            post(reject_handler::<R, S>),
        )
        .route(
            "/api/v1/maintenance/requests/:request_id/cancel",
            post(cancel_handler::<R, S>),
        )
        .route(
            "/api/v1/maintenance/requests/:request_id/convert",
            post(convert_handler::<R, S>),
        )
        .with_state(RequestApi { service, identity })
}

fn resolve_caller<R, S>(api: &RequestApi<R, S>, headers: &HeaderMap) -> Result<Caller, Response> {
    api.identity.resolve(headers).map_err(|error| {
        let payload = json!({ "error": error.to_string() });
        (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
    })
}

pub(crate) fn error_response(error: NegotiationError) -> Response {
    let message = error.to_string();
    match error {
        NegotiationError::Validation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": message })),
        )
            .into_response(),
        NegotiationError::InvalidTransition { status, action } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": message,
                "status": status,
                "action": action,
            })),
        )
            .into_response(),
        NegotiationError::Authorization(_) => {
            (StatusCode::FORBIDDEN, axum::Json(json!({ "error": message }))).into_response()
        }
        NegotiationError::NotFound(_) => {
            (StatusCode::NOT_FOUND, axum::Json(json!({ "error": message }))).into_response()
        }
        NegotiationError::NotApplicable { id, status } => (
            StatusCode::OK,
            axum::Json(json!({
                "outcome": "not_applicable",
                "id": id,
                "status": status,
                "status_label": status.label(),
            })),
        )
            .into_response(),
        NegotiationError::Conflict { expected, actual } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": message,
                "expected_version": expected,
                "current_version": actual,
            })),
        )
            .into_response(),
        NegotiationError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": message })),
        )
            .into_response(),
    }
}

fn view_response(status: StatusCode, request: MaintenanceRequest) -> Response {
    (status, axum::Json(request.status_view())).into_response()
}

pub(crate) async fn create_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<RequestDraft>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    let caller = match resolve_caller(&api, &headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match api.service.create(&caller, draft) {
        Ok(request) => view_response(StatusCode::CREATED, request),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    let caller = match resolve_caller(&api, &headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let client_id = match (caller.is_staff(), query.client_id, caller.client_id.clone()) {
        (true, Some(client_id), _) => ClientId(client_id),
        (false, _, Some(own)) => own,
        _ => {
            let payload = json!({ "error": "a client_id is required" });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    match api.service.list_for_client(&caller, &client_id) {
        Ok(requests) => {
            let views: Vec<_> = requests.iter().map(MaintenanceRequest::status_view).collect();
            let payload = json!({ "client_id": client_id, "requests": views });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    let caller = match resolve_caller(&api, &headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match api.service.get(&caller, &RequestId(request_id)) {
        Ok(request) => view_response(StatusCode::OK, request),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn discard_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    let caller = match resolve_caller(&api, &headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match api.service.discard(&caller, &RequestId(request_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn confirm_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    axum::Json(payload): axum::Json<ConfirmPayload>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    let caller = match resolve_caller(&api, &headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let result = api.service.staff_confirm(
        &caller,
        &RequestId(request_id),
        payload.confirmed_date,
        payload.expected_version,
    );
    match result {
        Ok(request) => view_response(StatusCode::OK, request),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reschedule_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    axum::Json(payload): axum::Json<ReschedulePayload>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    let caller = match resolve_caller(&api, &headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let result = api.service.staff_reschedule(
        &caller,
        &RequestId(request_id),
        payload.proposed_date,
        payload.notes,
        payload.expected_version,
    );
    match result {
        Ok(request) => view_response(StatusCode::OK, request),
        Err(error) => error_response(error),
    }
}

fn decide<R, S>(
    api: &RequestApi<R, S>,
    headers: &HeaderMap,
    request_id: String,
    payload: Option<axum::Json<VersionPayload>>,
    decision: Decision<R, S>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    let caller = match resolve_caller(api, headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let expected_version = payload.and_then(|axum::Json(body)| body.expected_version);
    match decision(api.service.as_ref(), &caller, &RequestId(request_id), expected_version) {
        Ok(request) => view_response(StatusCode::OK, request),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn accept_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    payload: Option<axum::Json<VersionPayload>>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    decide(
        &api,
        &headers,
        request_id,
        payload,
        MaintenanceRequestService::client_accept,
    )
}

pub(crate) async fn reject_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    payload: Option<axum::Json<VersionPayload>>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    decide(
        &api,
        &headers,
        request_id,
        payload,
        MaintenanceRequestService::client_reject,
    )
}

pub(crate) async fn cancel_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    payload: Option<axum::Json<VersionPayload>>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    decide(
        &api,
        &headers,
        request_id,
        payload,
        MaintenanceRequestService::client_cancel,
    )
}

pub(crate) async fn convert_handler<R, S>(
    State(api): State<RequestApi<R, S>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    payload: Option<axum::Json<VersionPayload>>,
) -> Response
where
    R: RequestRepository + 'static,
    S: StaffDirectory + 'static,
{
    decide(
        &api,
        &headers,
        request_id,
        payload,
        MaintenanceRequestService::convert,
    )
}
