use std::any::Any;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::Extension,
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer, services::ServeDir, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::pages;
use crate::models::{UserInput, UserRole};
use crate::routes::route_table;
use crate::state::AppState;
use crate::store::{JsonUserStore, UserStore};

pub const API_TITLE: &str = "user-portal-api";

/// Full application router: API routes, pages, docs, static files, layers.
pub fn app(state: AppState) -> Router {
    let table = route_table(&state);
    let openapi = Arc::new(table.openapi(API_TITLE, env!("CARGO_PKG_VERSION")));
    let config = state.config.clone();

    let router = table
        .into_router()
        .route("/users", get(pages::users_page))
        .route("/api-docs", get(pages::swagger_ui))
        .route(
            "/api-docs/openapi.json",
            get(pages::openapi_json).layer(Extension(openapi)),
        )
        .fallback_service(ServeDir::new(&config.paths.static_dir))
        .with_state(state);

    apply_layers(router, &config)
}

/// Environment-dependent middleware shared by every route.
pub fn apply_layers(router: Router, config: &AppConfig) -> Router {
    let mut router = router;

    if config.is_production() {
        for (name, value) in security_headers() {
            router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
        }
    }

    if config.is_development() {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.layer(CatchPanicLayer::custom(panic_response))
}

/// Default policy; pages that need more (Swagger UI) send their own.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';\
font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';\
img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';\
style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

fn security_headers() -> Vec<(HeaderName, HeaderValue)> {
    vec![
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("origin-agent-cluster"),
            HeaderValue::from_static("?1"),
        ),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("x-download-options"),
            HeaderValue::from_static("noopen"),
        ),
    ]
}

/// A panicking handler still gets the standard error envelope.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown error".to_string()
    };
    ApiError::from(anyhow::anyhow!(message)).into_response()
}

/// Build the store described by `config`, seeding the bootstrap admin if set.
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn UserStore> = match &config.store.path {
        Some(path) => Arc::new(
            JsonUserStore::open(path)
                .await
                .with_context(|| format!("failed to open user store {}", path.display()))?,
        ),
        None => Arc::new(JsonUserStore::in_memory()),
    };

    let admin = config
        .security
        .admin_email
        .clone()
        .zip(config.security.admin_password.clone());
    let state = AppState::new(config, store);

    if let Some((email, password)) = admin {
        let created = state
            .users
            .ensure_admin(UserInput {
                id: 0,
                name: "Administrator".to_string(),
                email: email.clone(),
                role: UserRole::Admin,
                password: Some(password),
            })
            .await
            .map_err(|e| anyhow::anyhow!("failed to seed admin user: {}", e))?;
        if created {
            tracing::info!("Seeded admin user {}", email);
        }
    }

    Ok(state)
}

pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting in {:?} mode", config.environment);

    let state = build_state(config).await?;
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
