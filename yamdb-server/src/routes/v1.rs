use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::{
    AppState,
    auth::actor_middleware,
    handlers::{auth, catalog, comments, reviews, titles, users},
};

/// Create all v1 API routes.
///
/// Every path lists the methods its resource supports; any other method
/// answers 405.
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/token/", post(auth::obtain_token))
        .route("/auth/token/refresh/", post(auth::refresh_token))
        .merge(create_user_routes())
        .merge(create_catalog_routes())
        .merge(create_review_routes())
        .route_layer(middleware::from_fn_with_state(state, actor_middleware))
}

fn create_user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me/", get(users::me).patch(users::update_me))
        .route("/users/", get(users::list).post(users::create))
        .route(
            "/users/{username}/",
            get(users::retrieve)
                .patch(users::update)
                .put(users::replace)
                .delete(users::destroy),
        )
}

fn create_catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories/",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route("/categories/{slug}/", delete(catalog::delete_category))
        .route(
            "/genres/",
            get(catalog::list_genres).post(catalog::create_genre),
        )
        .route("/genres/{slug}/", delete(catalog::delete_genre))
        .route("/titles/", get(titles::list).post(titles::create))
        .route(
            "/titles/{title_id}/",
            get(titles::retrieve)
                .patch(titles::update)
                .put(titles::replace)
                .delete(titles::destroy),
        )
}

fn create_review_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/titles/{title_id}/reviews/",
            get(reviews::list).post(reviews::create),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/",
            get(reviews::retrieve)
                .patch(reviews::update)
                .put(reviews::replace)
                .delete(reviews::destroy),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/",
            get(comments::list).post(comments::create),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/",
            get(comments::retrieve)
                .patch(comments::update)
                .put(comments::update)
                .delete(comments::destroy),
        )
}
