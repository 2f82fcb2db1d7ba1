// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{documents, exams, weak_topics},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (exams, weak topics).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config, Generation Service).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let exam_routes = Router::new()
        .route("/", post(exams::create_exam).get(exams::list_exams))
        .route("/{id}", get(exams::get_exam))
        .route("/{id}/regenerate", post(exams::regenerate_exam))
        .route("/{id}/documents", post(documents::attach_document));

    let weak_topic_routes = Router::new().route(
        "/",
        post(weak_topics::create_weak_topic).get(weak_topics::list_weak_topics),
    );

    Router::new()
        .nest("/api/exams", exam_routes)
        .nest("/api/weak-topics", weak_topic_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
