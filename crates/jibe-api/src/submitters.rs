use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use jibe_core::build_filter;
use jibe_core::filter::SUBMITTER_SCHEMA;
use jibe_types::api::requested_key_count;
use jibe_types::models::Submitter;

use crate::convert::submitter_from_row;
use crate::error::ApiError;
use crate::input::RequestInput;
use crate::state::{AppState, run_blocking};

/// Upper bound on keys minted by one `generateKeys` call.
pub const MAX_KEYS_PER_REQUEST: i64 = 1000;

/// GET /api/generateKeys — mint `count` fresh submitters, return their authcodes.
pub async fn generate_keys(
    State(state): State<AppState>,
    RequestInput(input): RequestInput,
) -> Result<Json<Vec<String>>, ApiError> {
    let requested = requested_key_count(&input);
    if requested > MAX_KEYS_PER_REQUEST {
        return Err(ApiError::BadRequest(format!(
            "At most {} keys per request",
            MAX_KEYS_PER_REQUEST
        )));
    }
    let count = usize::try_from(requested).unwrap_or(0);

    let created = run_blocking(&state, move |store| store.create_submitters(count)).await?;

    let keys = created
        .into_iter()
        .map(|row| {
            info!("Generated code {} with ID {}.", row.authcode, row.sid);
            row.authcode
        })
        .collect();
    Ok(Json(keys))
}

/// GET /api/submitters — filter on `sid`, `userid`, `free`, `authcode`.
pub async fn list_submitters(
    State(state): State<AppState>,
    RequestInput(input): RequestInput,
) -> Result<Json<Vec<Submitter>>, ApiError> {
    let filter = build_filter(&input, SUBMITTER_SCHEMA);
    let rows = run_blocking(&state, move |store| store.find_submitters(&filter)).await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(rows.into_iter().map(submitter_from_row).collect()))
}

/// GET /api/submitters/{identity}
pub async fn get_submitter(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<Submitter>, ApiError> {
    let row = run_blocking(&state, move |store| store.get_submitter_by_userid(&identity))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(submitter_from_row(row)))
}
