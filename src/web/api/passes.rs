use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

use crate::passes::{PassQuery, PassRequest, TrackingPass};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListPassesQuery {
    #[serde(default)]
    pub spacecraft: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub to: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "passes",
    params(
        ("spacecraft" = Option<String>, Query, description = "Filter by spacecraft name"),
        ("from" = Option<String>, Query, description = "Only include passes starting at or after this time (RFC3339)"),
        ("to" = Option<String>, Query, description = "Only include passes starting at or before this time (RFC3339)")
    ),
    responses(
        (status = 200, description = "Passes ordered by start time", body = Vec<TrackingPass>)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<ListPassesQuery>,
) -> ApiResult<Json<Vec<TrackingPass>>> {
    let query = PassQuery {
        spacecraft: query.spacecraft,
        from: query.from,
        to: query.to,
    };
    Ok(Json(state.store.query(&query)?))
}

#[utoipa::path(
    post,
    path = "/api/passes",
    tag = "passes",
    request_body = PassRequest,
    responses(
        (status = 201, description = "Pass stored", body = TrackingPass),
        (status = 400, description = "Validation error", body = ErrorResponse)
    )
)]
pub async fn create_pass(
    State(state): State<AppState>,
    Json(request): Json<PassRequest>,
) -> ApiResult<impl IntoResponse> {
    let pass = state.store.insert(request)?;
    state.updates.notify();

    let location = format!("/api/passes/{}", pass.id());
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(pass),
    ))
}

#[utoipa::path(
    get,
    path = "/api/passes/{id}",
    tag = "passes",
    params(
        ("id" = String, Path, description = "Pass ID")
    ),
    responses(
        (status = 200, description = "Pass details", body = TrackingPass),
        (status = 404, description = "Pass not found", body = ErrorResponse)
    )
)]
pub async fn get_pass(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TrackingPass>> {
    Ok(Json(state.store.get(&id)?))
}

#[utoipa::path(
    put,
    path = "/api/passes/{id}",
    tag = "passes",
    params(
        ("id" = String, Path, description = "Pass ID")
    ),
    request_body = PassRequest,
    responses(
        (status = 200, description = "Pass replaced", body = TrackingPass),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Pass not found", body = ErrorResponse)
    )
)]
pub async fn update_pass(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PassRequest>,
) -> ApiResult<Json<TrackingPass>> {
    let pass = state.store.update(&id, request)?;
    state.updates.notify();
    Ok(Json(pass))
}

#[utoipa::path(
    delete,
    path = "/api/passes/{id}",
    tag = "passes",
    params(
        ("id" = String, Path, description = "Pass ID")
    ),
    responses(
        (status = 204, description = "Pass deleted"),
        (status = 404, description = "Pass not found", body = ErrorResponse)
    )
)]
pub async fn delete_pass(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete(&id)?;
    state.updates.notify();
    Ok(StatusCode::NO_CONTENT)
}

fn deserialize_option_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
