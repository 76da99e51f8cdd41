use axum::{extract::State, http::StatusCode, Json};

use crate::executor::ExecutorStatus;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/executor",
    responses(
        (status = 200, description = "Executor status", body = ExecutorStatus)
    ),
    tag = "executor"
)]
pub async fn status(State(state): State<AppState>) -> Json<ExecutorStatus> {
    Json(state.executor.status())
}

#[utoipa::path(
    post,
    path = "/api/executor/abort",
    responses(
        (status = 202, description = "Abort delivered to the active tracker"),
        (status = 409, description = "No pass is being tracked", body = ErrorResponse)
    ),
    tag = "executor"
)]
pub async fn abort(State(state): State<AppState>) -> ApiResult<StatusCode> {
    if state.executor.request_abort() {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(ApiError::Conflict("executor_idle"))
    }
}
