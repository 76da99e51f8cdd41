use axum::{routing::delete, routing::get, routing::post, routing::put, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::executor::{ExecutorHandle, SignalSender};
use crate::passes::PassStore;
use crate::rotor::Rotor;

use super::api::executor as executor_handlers;
use super::api::passes as pass_handlers;
use super::api::rotor as rotor_handlers;
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PassStore>,
    pub rotor: Arc<Rotor>,
    pub executor: ExecutorHandle,
    pub updates: SignalSender,
}

pub async fn run_server(bind_addr: &str, state: AppState) -> std::io::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Rotor endpoints
        .route("/api/rotor", get(rotor_handlers::get_position))
        .route("/api/rotor", post(rotor_handlers::set_position))
        // Pass CRUD endpoints
        .route("/api/passes", get(pass_handlers::list_passes))
        .route("/api/passes", post(pass_handlers::create_pass))
        .route("/api/passes/{id}", get(pass_handlers::get_pass))
        .route("/api/passes/{id}", put(pass_handlers::update_pass))
        .route("/api/passes/{id}", delete(pass_handlers::delete_pass))
        // Executor endpoints
        .route("/api/executor", get(executor_handlers::status))
        .route("/api/executor/abort", post(executor_handlers::abort))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await
}
