use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::registry::{ContractRegistry, ContractRepository};
use crate::workflows::maintenance::clock::{Clock, SystemClock};
use crate::workflows::maintenance::identity::{ClientId, IdentityProvider};

pub struct ContractApi<C> {
    pub(crate) registry: Arc<ContractRegistry<C>>,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<C> Clone for ContractApi<C> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            identity: self.identity.clone(),
            clock: self.clock.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
    /// Staff pick the client they are looking at; clients are pinned to their own scope.
    #[serde(default)]
    pub(crate) client_id: Option<String>,
}

/// Router builder exposing the classified contract dashboard.
pub fn contract_router<C>(
    registry: Arc<ContractRegistry<C>>,
    identity: Arc<dyn IdentityProvider>,
) -> Router
where
    C: ContractRepository + 'static,
{
    contract_router_with_clock(registry, identity, Arc::new(SystemClock))
}

/// Same routes, with "today" taken from `clock` when the query does not pin a date.
pub fn contract_router_with_clock<C>(
    registry: Arc<ContractRegistry<C>>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
) -> Router
where
    C: ContractRepository + 'static,
{
    Router::new()
        .route("/api/v1/maintenance/contracts", get(dashboard_handler::<C>))
        .with_state(ContractApi {
            registry,
            identity,
            clock,
        })
}

pub(crate) async fn dashboard_handler<C>(
    State(api): State<ContractApi<C>>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Response
where
    C: ContractRepository + 'static,
{
    let caller = match api.identity.resolve(&headers) {
        Ok(caller) => caller,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response();
        }
    };

    let client_id = match (caller.is_staff(), query.client_id) {
        (true, Some(client_id)) => ClientId(client_id),
        (true, None) => {
            let payload = json!({ "error": "staff must select a client_id" });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
        (false, _) => match caller.client_id.clone() {
            Some(client_id) => client_id,
            None => {
                let payload = json!({ "error": "caller has no client scope" });
                return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
            }
        },
    };

    let today = query.today.unwrap_or_else(|| api.clock.today());
    let result = api
        .registry
        .dashboard(&client_id, today)
        .and_then(|contracts| {
            api.registry
                .summary(&client_id, today)
                .map(|summary| (contracts, summary))
        });

    match result {
        Ok((contracts, summary)) => {
            let payload = json!({
                "client_id": client_id,
                "today": today,
                "summary": summary,
                "contracts": contracts,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
