use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::infra::StaticStaffDirectory;
use crate::workflows::maintenance::identity::{
    HeaderIdentity, CLIENT_HEADER, ROLE_HEADER, USER_HEADER,
};
use crate::workflows::maintenance::requests::router::{self, RequestApi};
use crate::workflows::maintenance::requests::service::MaintenanceRequestService;

fn client_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_HEADER, "user-ana")
        .header(CLIENT_HEADER, "acme");
    with_body(builder, body)
}

fn staff_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_HEADER, "staff-lee")
        .header(ROLE_HEADER, "staff");
    with_body(builder, body)
}

fn with_body(builder: axum::http::request::Builder, body: Option<Value>) -> Request<Body> {
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn create_pending(router: &axum::Router) -> String {
    let response = router
        .clone()
        .oneshot(client_request(
            "POST",
            "/api/v1/maintenance/requests",
            Some(json!({
                "title": "Chiller inspection",
                "suggested_date": "2024-06-01",
                "suggested_time_period": "morning"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    body["id"].as_str().expect("id present").to_string()
}

#[tokio::test]
async fn create_route_returns_status_view() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(client_request(
            "POST",
            "/api/v1/maintenance/requests",
            Some(json!({ "title": "Chiller inspection", "suggested_date": "2024-06-01" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["status_label"], "Awaiting confirmation");
    assert_eq!(body["request_number"], "MR-000001");
    assert_eq!(body["version"], 1);
    assert!(body.get("confirmed_date").is_none());
}

#[tokio::test]
async fn create_route_rejects_invalid_drafts() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(client_request(
            "POST",
            "/api/v1/maintenance/requests",
            Some(json!({ "suggested_date": "2024-06-01" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("title"));
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/maintenance/requests")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn negotiation_round_trip_over_http() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let id = create_pending(&router).await;

    let response = router
        .clone()
        .oneshot(staff_request(
            "POST",
            &format!("/api/v1/maintenance/requests/{id}/reschedule"),
            Some(json!({ "proposed_date": "2024-06-05", "notes": "Crew booked", "expected_version": 1 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "rescheduled");
    assert_eq!(body["confirmed_date"], "2024-06-05");

    let response = router
        .clone()
        .oneshot(client_request(
            "POST",
            &format!("/api/v1/maintenance/requests/{id}/accept"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["version"], 3);

    let response = router
        .oneshot(client_request("GET", "/api/v1/maintenance/requests", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["client_id"], "acme");
    assert_eq!(body["requests"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invalid_transition_maps_to_conflict() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let id = create_pending(&router).await;

    let response = router
        .oneshot(client_request(
            "POST",
            &format!("/api/v1/maintenance/requests/{id}/accept"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["action"], "accept");
}

#[tokio::test]
async fn stale_version_maps_to_conflict() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let id = create_pending(&router).await;

    let response = router
        .oneshot(client_request(
            "POST",
            &format!("/api/v1/maintenance/requests/{id}/cancel"),
            Some(json!({ "expected_version": 7 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["expected_version"], 7);
    assert_eq!(body["current_version"], 1);
}

#[tokio::test]
async fn repeated_cancel_reports_not_applicable() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let id = create_pending(&router).await;
    let uri = format!("/api/v1/maintenance/requests/{id}/cancel");

    let first = router
        .clone()
        .oneshot(client_request("POST", &uri, None))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router
        .oneshot(client_request("POST", &uri, None))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let body = read_json_body(second).await;
    assert_eq!(body["outcome"], "not_applicable");
    assert_eq!(body["status"], "cancelled");
}

#[tokio::test]
async fn client_cannot_confirm() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let id = create_pending(&router).await;

    let response = router
        .oneshot(client_request(
            "POST",
            &format!("/api/v1/maintenance/requests/{id}/confirm"),
            Some(json!({ "confirmed_date": "2024-06-01" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(staff_request("GET", "/api/v1/maintenance/requests/mr-99", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_listing_requires_a_client_id() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    create_pending(&router).await;

    let response = router
        .clone()
        .oneshot(staff_request("GET", "/api/v1/maintenance/requests", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(staff_request(
            "GET",
            "/api/v1/maintenance/requests?client_id=acme",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["requests"][0]["title"], "Chiller inspection");
}

#[tokio::test]
async fn discard_route_removes_terminal_requests() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let id = create_pending(&router).await;
    let uri = format!("/api/v1/maintenance/requests/{id}");

    router
        .clone()
        .oneshot(client_request("POST", &format!("{uri}/cancel"), None))
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(staff_request("DELETE", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(staff_request("GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(MaintenanceRequestService::with_clock(
        Arc::new(UnavailableRepository),
        Arc::new(StaticStaffDirectory::default()),
        Arc::new(FixedClock::at(2024, 5, 20)),
    ));
    let api = RequestApi {
        service,
        identity: Arc::new(HeaderIdentity),
    };
    let mut headers = HeaderMap::new();
    headers.insert(USER_HEADER, HeaderValue::from_static("staff-lee"));
    headers.insert(ROLE_HEADER, HeaderValue::from_static("staff"));

    let response = router::status_handler::<UnavailableRepository, StaticStaffDirectory>(
        State(api),
        headers,
        Path("mr-1".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
