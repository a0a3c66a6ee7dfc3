use axum::{
    Router, middleware,
    http::StatusCode,
    routing::{get, post},
};

use crate::insults;
use crate::middleware::log_request;
use crate::state::AppState;
use crate::submitters;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/api/generateKeys", get(submitters::generate_keys))
        .route("/api/submitters", get(submitters::list_submitters))
        .route("/api/submitters/{identity}", get(submitters::get_submitter))
        .route(
            "/api/submitters/{identity}/addInsult",
            post(insults::add_insult_for_submitter),
        )
        .route("/api/insults", get(insults::list_insults).post(insults::add_insult))
        .route(
            "/api/insults/{iid}",
            get(insults::get_insult).delete(insults::delete_insult),
        );

    // Paths served by earlier releases.
    let legacy = Router::new()
        .route("/api/submitter/{identity}", get(submitters::get_submitter))
        .route(
            "/api/submitter/{identity}/addInsult",
            post(insults::add_insult_for_submitter),
        )
        .route("/api/addInsult", post(insults::add_insult))
        .route(
            "/api/insult/{iid}",
            get(insults::get_insult).delete(insults::delete_insult),
        );

    Router::new()
        .merge(routes)
        .merge(legacy)
        .route("/makeCoffee", get(make_coffee))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn make_coffee() -> StatusCode {
    StatusCode::IM_A_TEAPOT
}
