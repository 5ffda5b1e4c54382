//! REST API surface (C10): Axum router, `AppState` extraction,
//! `IntoResponse` error mapping, and CORS/trace middleware layered over
//! the whole router.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::dto::{SearchRequestDto, SearchResponseDto};
use crate::error::ApiError;
use crate::state::AppState;
use crate::websocket::ws_handler;

#[cfg(feature = "openapi")]
use utoipa::OpenApi;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/v1/stores/{store}/search", post(search_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler));

    #[cfg(feature = "openapi")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /v1/stores/{store}/search`
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/v1/stores/{store}/search",
        request_body = SearchRequestDto,
        responses(
            (status = 200, description = "Search results", body = SearchResponseDto),
            (status = 400, description = "Invalid query, filter, or top_k"),
            (status = 404, description = "Store not found"),
            (status = 500, description = "Internal error"),
        ),
        tag = "search",
    )
)]
async fn search_handler(
    State(state): State<AppState>,
    Path(store): Path<String>,
    Json(request): Json<SearchRequestDto>,
) -> Result<Json<SearchResponseDto>, ApiError> {
    tracing::info!(store = %store, query = %request.query, "search request received");

    let request = request.into_orchestrator_request(store);
    let response = state
        .orchestrator
        .search(request, CancellationToken::new())
        .await?;

    Ok(Json(response.into()))
}

/// `GET /health`
#[cfg_attr(
    feature = "openapi",
    utoipa::path(get, path = "/health", responses((status = 200, description = "Service is healthy")), tag = "health")
)]
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(search_handler, health_handler),
    components(schemas(
        SearchRequestDto,
        SearchResponseDto,
        crate::dto::IntelligenceDto,
        crate::dto::RerankingDto,
        crate::dto::PostrankDto,
    )),
    tags(
        (name = "search", description = "Hybrid code search endpoints"),
        (name = "health", description = "Health check endpoint"),
    )
)]
struct ApiDoc;
