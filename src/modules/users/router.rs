use axum::{Router, middleware, routing::get};

use super::controller::{get_profile, update_profile};
use crate::middleware::auth::authenticate;
use crate::state::AppState;

pub fn init_users_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}
