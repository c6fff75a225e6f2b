use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    service::{CarDraft, ServiceError},
    storage::Storage,
};

use super::{
    error::{from_json_rejection, from_path_rejection},
    models::{
        CarRequest, CarResponse, CarsResponse, CustomerRequest, CustomerResponse,
        CustomersResponse, ErrorResponse, HealthResponse, MessageResponse,
    },
    AppState,
};

type ApiResult<T> = Result<Json<T>, ServiceError>;

pub async fn health<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
        }),
    )
}

pub async fn create_car<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<CarRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = body.map_err(from_json_rejection)?;
    let draft = CarDraft::try_from(request)?;
    state.service.create_car(draft)?;
    Ok(Json(MessageResponse::new("success")))
}

pub async fn list_cars<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> ApiResult<CarsResponse> {
    let cars = state
        .service
        .list_cars()?
        .into_iter()
        .map(CarResponse::from)
        .collect();
    Ok(Json(CarsResponse { cars }))
}

pub async fn get_car<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<CarResponse> {
    let Path(id) = id.map_err(from_path_rejection)?;
    Ok(Json(state.service.get_car(id)?.into()))
}

pub async fn delete_car<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<MessageResponse> {
    let Path(id) = id.map_err(from_path_rejection)?;
    state.service.delete_car(id)?;
    Ok(Json(MessageResponse::new("Car deleted.")))
}

pub async fn create_customer<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<CustomerRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = body.map_err(from_json_rejection)?;
    state.service.create_customer(request.into())?;
    Ok(Json(MessageResponse::new("success")))
}

pub async fn list_customers<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> ApiResult<CustomersResponse> {
    let customers = state
        .service
        .list_customers()?
        .into_iter()
        .map(CustomerResponse::from)
        .collect();
    Ok(Json(CustomersResponse { customers }))
}

pub async fn get_customer<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<CustomerResponse> {
    let Path(id) = id.map_err(from_path_rejection)?;
    Ok(Json(state.service.get_customer(id)?.into()))
}

pub async fn update_customer<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<CustomerRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Path(id) = id.map_err(from_path_rejection)?;
    let Json(request) = body.map_err(from_json_rejection)?;
    state.service.update_customer(id, request.into())?;
    Ok(Json(MessageResponse::new("Customer data updated.")))
}

pub async fn delete_customer<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<MessageResponse> {
    let Path(id) = id.map_err(from_path_rejection)?;
    state.service.delete_customer(id)?;
    Ok(Json(MessageResponse::new("Customer deleted.")))
}

pub async fn list_customer_cars<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<CarsResponse> {
    let Path(id) = id.map_err(from_path_rejection)?;
    let cars = state
        .service
        .list_customer_cars(id)?
        .into_iter()
        .map(CarResponse::from)
        .collect();
    Ok(Json(CarsResponse { cars }))
}

pub async fn assign_car<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<MessageResponse> {
    let Path((customer_id, car_id)) = ids.map_err(from_path_rejection)?;
    state.service.assign_car(customer_id, car_id)?;
    Ok(Json(MessageResponse::new("Car assigned.")))
}

pub async fn unassign_car<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<MessageResponse> {
    let Path((customer_id, car_id)) = ids.map_err(from_path_rejection)?;
    state.service.unassign_car(customer_id, car_id)?;
    Ok(Json(MessageResponse::new("Car unassigned.")))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "endpoint not found".to_string(),
        }),
    )
}
