use axum::extract::DefaultBodyLimit;
use axum::{Router, ServiceExt, extract::Request};
use tokio::net::TcpListener;
use tower::{Layer, ServiceBuilder};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::infrastructure::settings::Settings;
use crate::presentation::middleware::cors::build_cors_layer;
use crate::presentation::openapi::ApiDoc;
use crate::presentation::{AppState, routes};

pub(crate) async fn run_http(settings: &Settings, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let cors = build_cors_layer(settings)?;
    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(
                settings.http_request_body_limit_bytes,
            )),
    );
    // `/titles` and `/titles/` hit the same handler
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let listener = TcpListener::bind(&settings.http_addr).await?;

    info!("HTTP server listening on {}", settings.http_addr);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}

pub(crate) fn build_router(state: AppState) -> Router {
    routes::routes(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
