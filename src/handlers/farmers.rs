use crate::{
    dto::farmer::{CreateFarmerRequest, FarmerResponse, UpdateFarmerRequest},
    errors::ServiceError,
    handlers::common::JsonBody,
    services::farmers::FARMER_NOT_FOUND,
    ApiResponse, ApiResult, AppState, MessageResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

pub const FARMER_DELETED: &str = "Farmer deleted successfully";

/// Ids that are not integers can never match a row
fn parse_farmer_id(raw: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ServiceError::NotFound(FARMER_NOT_FOUND.to_string()))
}

#[utoipa::path(
    get,
    path = "/farmers",
    responses(
        (status = 200, description = "All farmers, oldest first", body = ApiResponse<Vec<FarmerResponse>>)
    ),
    tag = "farmers"
)]
pub async fn list_farmers(State(state): State<AppState>) -> ApiResult<Vec<FarmerResponse>> {
    let farmers = state.farmer_service().list_farmers().await?;
    Ok(Json(ApiResponse::success(
        farmers.into_iter().map(FarmerResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/farmers",
    request_body = CreateFarmerRequest,
    responses(
        (status = 201, description = "Farmer created", body = ApiResponse<FarmerResponse>),
        (status = 400, description = "Malformed JSON body", body = crate::errors::ErrorResponse),
        (status = 415, description = "Body is not JSON", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "farmers"
)]
pub async fn create_farmer(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateFarmerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FarmerResponse>>), ServiceError> {
    let created = state.farmer_service().create_farmer(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(FarmerResponse::from(created))),
    ))
}

#[utoipa::path(
    get,
    path = "/farmers/{id}",
    params(
        ("id" = i32, Path, description = "Farmer ID")
    ),
    responses(
        (status = 200, description = "Farmer fetched", body = ApiResponse<FarmerResponse>),
        (status = 404, description = "Farmer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "farmers"
)]
pub async fn show_farmer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<FarmerResponse> {
    let id = parse_farmer_id(&id)?;
    let farmer = state.farmer_service().get_farmer(id).await?;
    Ok(Json(ApiResponse::success(FarmerResponse::from(farmer))))
}

#[utoipa::path(
    put,
    path = "/farmers/{id}",
    request_body = UpdateFarmerRequest,
    params(
        ("id" = i32, Path, description = "Farmer ID")
    ),
    responses(
        (status = 200, description = "Farmer updated", body = ApiResponse<FarmerResponse>),
        (status = 404, description = "Farmer not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "farmers"
)]
pub async fn update_farmer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateFarmerRequest>,
) -> ApiResult<FarmerResponse> {
    let id = parse_farmer_id(&id)?;
    let updated = state.farmer_service().update_farmer(id, payload).await?;
    Ok(Json(ApiResponse::success(FarmerResponse::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/farmers/{id}",
    params(
        ("id" = i32, Path, description = "Farmer ID")
    ),
    responses(
        (status = 200, description = "Farmer deleted", body = MessageResponse),
        (status = 404, description = "Farmer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "farmers"
)]
pub async fn delete_farmer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let id = parse_farmer_id(&id)?;
    state.farmer_service().delete_farmer(id).await?;
    Ok(Json(MessageResponse::success(FARMER_DELETED)))
}

/// Routes for the farmers resource, relative to its mount point
pub fn farmer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_farmers).post(create_farmer))
        .route(
            "/:id",
            get(show_farmer).put(update_farmer).delete(delete_farmer),
        )
}
