use std::net::SocketAddr;

use axum::{
    routing::{get, put},
    Router,
};

use crate::{service::RecordService, storage::Storage};

mod error;
mod handlers;
mod models;

use handlers::{
    assign_car, create_car, create_customer, delete_car, delete_customer, get_car, get_customer,
    health, list_cars, list_customer_cars, list_customers, not_found, unassign_car,
    update_customer,
};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub service: RecordService<S>,
    pub started_at: std::time::SystemTime,
}

pub fn router<S: Storage + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route("/cars", get(list_cars::<S>).post(create_car::<S>))
        .route("/cars/:id", get(get_car::<S>).delete(delete_car::<S>))
        .route(
            "/customers",
            get(list_customers::<S>).post(create_customer::<S>),
        )
        .route(
            "/customers/:id",
            get(get_customer::<S>)
                .put(update_customer::<S>)
                .delete(delete_customer::<S>),
        )
        .route("/customers/:id/cars", get(list_customer_cars::<S>))
        .route(
            "/customers/:id/cars/:car_id",
            put(assign_car::<S>).delete(unassign_car::<S>),
        )
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    storage: S,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let state = AppState {
        service: RecordService::new(storage),
        started_at: std::time::SystemTime::now(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
