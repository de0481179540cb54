use std::sync::Arc;
use std::time::Duration;

use auth::TokenService;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Extension;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::check_email::check_email;
use super::handlers::check_enrollment::check_enrollment;
use super::handlers::check_external_id::check_external_id;
use super::handlers::check_reset_token::check_reset_token;
use super::handlers::forgot_password::forgot_password;
use super::handlers::login::login;
use super::handlers::protected::protected;
use super::handlers::register::register;
use super::handlers::resend_otp::resend_otp;
use super::handlers::reset_password::reset_password;
use super::handlers::upload_note::upload_note;
use super::handlers::verify_otp::verify_otp;
use super::middleware as auth_middleware;
use crate::documents::ports::DocumentStore;
use crate::principal::models::Role;
use crate::principal::ports::AuthServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub documents: Arc<dyn DocumentStore>,
    pub tokens: Arc<TokenService>,
}

/// The flows every endpoint family exposes; the family's `Role` extension
/// scopes each handler.
fn family_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/check-email/:email", get(check_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", post(reset_password))
        .route("/check-reset-token/:token", get(check_reset_token))
        .route("/verify-otp", post(verify_otp))
        .route("/resend-otp", post(resend_otp))
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    documents: Arc<dyn DocumentStore>,
    tokens: Arc<TokenService>,
) -> Router {
    let state = AppState {
        auth_service,
        documents,
        tokens,
    };

    let student_routes = family_routes()
        .route("/check-studentId/:student_id", get(check_enrollment))
        .layer(Extension(Role::Student));

    let teacher_routes = family_routes()
        .route("/check-teacherId/:teacher_id", get(check_external_id))
        .layer(Extension(Role::Teacher));

    let protected_routes = Router::new()
        .route("/api/protected", get(protected))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::authenticate,
        ));

    let upload_routes = Router::new()
        .route("/api/notes/upload", post(upload_note))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_teacher,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .nest("/api/students", student_routes)
        .nest("/api/teachers", teacher_routes)
        .merge(protected_routes)
        .merge(upload_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
