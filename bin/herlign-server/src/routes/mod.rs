//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI and OpenAPI document (disable with `HERLIGN_ENABLE_SWAGGER=false`)
//! - Health route
//! - Guest chat, auth, cron and public content routes under `/api`
//! - Admin routes under `/api/admin`, protected by a bearer token
//! - Uploaded files under `/media`

mod admin;
mod auth;
mod chat;
mod cron;
pub mod doc;
mod health;
mod public;

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// CDN caching for unauthenticated content lists.
pub(crate) const PUBLIC_CACHE: [(HeaderName, &str); 1] = [(
    header::CACHE_CONTROL,
    "public, s-maxage=300, stale-while-revalidate=600",
)];

/// Uploaded SVGs can carry script; served files never get to run any.
const MEDIA_CSP: &str = "default-src 'none'; style-src 'unsafe-inline'; sandbox";

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .merge(chat::router())
        .merge(auth::router())
        .merge(cron::router())
        .merge(public::router())
        .nest("/admin", admin::router(state.clone()));

    let media = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(MEDIA_CSP),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .service(ServeDir::new(&state.config.media_dir));

    let mut app = Router::new()
        .merge(health::router())
        .nest("/api", api_router)
        .nest_service("/media", media);

    let api_doc = doc::get_docs();

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&state)))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

/// Helpers shared by the handler tests.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, Response};
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::entities::dao::AdminUser;
    use crate::entities::AdminStore;
    use crate::state::AppState;

    pub async fn send(state: &Arc<AppState>, req: Request<Body>) -> Response<Body> {
        super::build(state.clone()).oneshot(req).await.unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", "198.51.100.7")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.7")
            .body(Body::empty())
            .unwrap()
    }

    pub fn authed(mut req: Request<Body>, token: &str) -> Request<Body> {
        req.headers_mut()
            .insert("authorization", format!("Bearer {token}").parse().unwrap());
        req
    }

    /// Creates an admin and a valid token for it.
    pub async fn admin_token(state: &Arc<AppState>, email: &str) -> (AdminUser, String) {
        let admin = state.store.create_admin(email, "correct-horse").await.unwrap();
        let token = Uuid::new_v4().to_string();
        state
            .store
            .insert_token(&token, &admin.id, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        (admin.user(), token)
    }
}
