use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{contracts, conversations, earnings, goals, influencers, jobs, media, proposals};

/// Assemble the full HTTP surface. Kept separate from the binary so
/// integration tests can drive the router directly.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health))
        .route("/media/{public_id}", get(media::download))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/callback", get(auth::callback))
        .route("/jobs/new", get(jobs::list_new))
        .route("/jobs/saved", get(jobs::list_saved))
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}", delete(jobs::delete_job))
        .route("/jobs/{id}/complete", post(jobs::complete_job))
        .route("/jobs/{id}/save", put(jobs::save_job))
        .route("/jobs/{id}/save", delete(jobs::unsave_job))
        .route("/jobs/{id}/proposals", post(proposals::create))
        .route("/jobs/{id}/proposals", get(proposals::list_for_job))
        .route("/proposals/{id}/accept", post(proposals::accept))
        .route("/proposals/{id}/reject", post(proposals::reject))
        .route("/contracts", post(contracts::create))
        .route("/contracts", get(contracts::list))
        .route("/contracts/{id}/accept", post(contracts::accept))
        .route("/contracts/{id}/decline", post(contracts::decline))
        .route("/influencers", get(influencers::list))
        .route("/conversations", post(conversations::create))
        .route("/conversations", get(conversations::list))
        .route("/conversations/{id}/messages", get(conversations::get_messages))
        .route("/conversations/{id}/messages", post(conversations::send_message))
        .route("/conversations/{id}/read", post(conversations::mark_read))
        .route("/earnings", get(earnings::list))
        .route("/earnings/{id}/pay", post(earnings::pay))
        .route("/goals", post(goals::create))
        .route("/goals", get(goals::list))
        .route("/goals/{id}", get(goals::get))
        .route("/upload", post(media::upload))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> &'static str {
    "ok"
}
