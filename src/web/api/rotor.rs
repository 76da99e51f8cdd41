use axum::{extract::State, Json};

use crate::rotor::AzEl;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/rotor",
    responses(
        (status = 200, description = "Current rotor position", body = AzEl)
    ),
    tag = "rotor"
)]
pub async fn get_position(State(state): State<AppState>) -> Json<AzEl> {
    Json(state.rotor.position().await)
}

#[utoipa::path(
    post,
    path = "/api/rotor",
    request_body = AzEl,
    responses(
        (status = 200, description = "Rotor settled at the requested position", body = AzEl),
        (status = 409, description = "Executor is engaged", body = ErrorResponse),
        (status = 500, description = "Rotor drive fault", body = ErrorResponse)
    ),
    tag = "rotor"
)]
pub async fn set_position(
    State(state): State<AppState>,
    Json(target): Json<AzEl>,
) -> ApiResult<Json<AzEl>> {
    // Manual moves would fight the tracker over the rotor.
    if state.executor.is_engaged() {
        return Err(ApiError::Conflict("executor_engaged"));
    }

    state.rotor.seek(target).await?;

    Ok(Json(state.rotor.position().await))
}
