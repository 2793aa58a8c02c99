use std::{sync::Arc, time::Duration};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::state::AppState;

pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

fn api() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tags/", get(tags::list))
        .route("/tags/{id}/", get(tags::retrieve))
        .route("/ingredients/", get(ingredients::list))
        .route("/ingredients/{id}/", get(ingredients::retrieve))
        .route("/recipes/", get(recipes::list).post(recipes::create))
        .route(
            "/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(recipes::retrieve)
                .patch(recipes::update)
                .put(recipes::update)
                .delete(recipes::destroy),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(recipes::favorite).delete(recipes::unfavorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .route("/users/", get(users::list).post(users::register))
        .route("/users/me/", get(users::me))
        .route("/users/subscriptions/", get(users::subscriptions))
        .route("/users/{id}/", get(users::retrieve))
        .route(
            "/users/{id}/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let mut app = Router::new().nest("/api", api());

    // Absolute media URLs point at another host that serves the files itself
    let media_url = &state.config.media_url;
    let prefix = media_url.trim_end_matches('/');
    if media_url.starts_with('/') && !prefix.is_empty() {
        info!(
            "Serving {} under {media_url}",
            state.media.root().display()
        );
        app = app.nest_service(prefix, ServeDir::new(state.media.root()));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
