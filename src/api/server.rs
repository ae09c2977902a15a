use crate::api::cli::ServeArgs;
use crate::api::routes::{with_operational_routes, AppState};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::infra::{
    InMemoryContractStore, InMemoryRequestStore, StaticStaffDirectory, TracingDispatcher,
};
use crate::telemetry;
use crate::workflows::maintenance::clock::{Clock, SystemClock};
use crate::workflows::maintenance::contracts::{
    contract_router_with_clock, ContractCsvImporter, ContractRegistry, MaintenanceTypeCsvImporter,
};
use crate::workflows::maintenance::identity::{HeaderIdentity, IdentityProvider};
use crate::workflows::maintenance::requests::{
    request_router, MaintenanceRequestService, NotificationRelay,
};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let contracts = match &config.maintenance.contracts_csv {
        Some(path) => {
            let contracts = ContractCsvImporter::from_path(path)?;
            info!(path = %path.display(), count = contracts.len(), "contracts imported");
            contracts
        }
        None => Vec::new(),
    };
    let types = match &config.maintenance.maintenance_types_csv {
        Some(path) => {
            let types = MaintenanceTypeCsvImporter::from_path(path)?;
            info!(path = %path.display(), count = types.len(), "maintenance types imported");
            types
        }
        None => Vec::new(),
    };
    let contract_store = Arc::new(InMemoryContractStore::new(contracts, types));
    let registry = Arc::new(ContractRegistry::new(
        contract_store,
        config.maintenance.reminder_marks.clone(),
    ));

    let request_store = Arc::new(InMemoryRequestStore::default());
    let directory = Arc::new(StaticStaffDirectory::new(
        config.maintenance.staff_users.iter().cloned(),
    ));
    let identity: Arc<dyn IdentityProvider> = Arc::new(HeaderIdentity);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let request_service = Arc::new(MaintenanceRequestService::with_clock(
        request_store.clone(),
        directory,
        clock.clone(),
    ));

    spawn_outbox_relay(
        request_store.clone(),
        Duration::from_secs(config.maintenance.outbox_interval_secs),
        config.maintenance.outbox_max_attempts,
    );

    let app = request_router(request_service, identity.clone())
        .merge(contract_router_with_clock(registry, identity, clock));
    let app = with_operational_routes(app, request_store)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "maintenance portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_outbox_relay(store: Arc<InMemoryRequestStore>, every: Duration, max_attempts: u32) {
    let relay =
        NotificationRelay::new(store, Arc::new(TracingDispatcher)).with_max_attempts(max_attempts);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(error) = relay.drain() {
                warn!(%error, "outbox relay pass failed");
            }
        }
    });
}
