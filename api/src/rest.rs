use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{asks, auth},
    AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/auth/signout", post(auth::signout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password", post(auth::change_password))
        .route("/api/asks", post(asks::create_ask).get(asks::list_asks))
        .with_state(state)
}
