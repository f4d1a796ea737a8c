use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth, products,
    rate_limit::{rate_limit, RateLimiter},
    routes::health,
    state::AppState,
};

/// Builds the full HTTP stack for one worker. Every call gets fresh rate
/// limiters.
pub fn build_app(state: AppState) -> Router {
    let limits = &state.config.rate_limit;
    let api_limiter = Arc::new(RateLimiter::api(limits));
    let auth_limiter = Arc::new(RateLimiter::auth(limits));

    let api = Router::new()
        .merge(auth::router().layer(from_fn_with_state(auth_limiter, rate_limit)))
        .merge(products::router())
        .merge(health::health_routes())
        .layer(from_fn_with_state(api_limiter, rate_limit));

    let worker = state.worker;
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, worker)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = res.status();
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, %origin, "invalid CORS origin; cross-origin requests disabled");
            layer
        }
    }
}

/// Serves one worker's router on its copy of the shared listener.
pub async fn serve_worker(
    worker: usize,
    listener: std::net::TcpListener,
    state: AppState,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::from_std(listener)?;
    let app = build_app(state.for_worker(worker));

    tracing::info!(worker, pid = std::process::id(), "worker listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
