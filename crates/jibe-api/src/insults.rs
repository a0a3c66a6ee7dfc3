use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::info;

use jibe_core::filter::INSULT_SCHEMA;
use jibe_core::{Decision, build_filter};
use jibe_db::models::InsultRow;
use jibe_types::api::{AddInsultError, AddInsultRequest, MAX_CONTENT_LEN};
use jibe_types::models::Insult;

use crate::convert::insult_from_row;
use crate::error::ApiError;
use crate::input::RequestInput;
use crate::state::{AppState, run_blocking};

enum Admission {
    Created(InsultRow),
    Duplicate { matched: String, score: f64 },
}

/// POST /api/insults — `{content, by?}`.
pub async fn add_insult(
    State(state): State<AppState>,
    RequestInput(input): RequestInput,
) -> Result<impl IntoResponse, ApiError> {
    let req = AddInsultRequest::from_input(&input).map_err(bad_request)?;

    if let Some(sid) = req.by {
        run_blocking(&state, move |store| store.get_submitter(sid))
            .await?
            .ok_or_else(|| ApiError::BadRequest(format!("No submitter with id {}", sid)))?;
    }

    let insult = admit(&state, req.content, req.by).await?;
    Ok(created(insult))
}

/// POST /api/submitters/{identity}/addInsult — `{content}`.
pub async fn add_insult_for_submitter(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    RequestInput(input): RequestInput,
) -> Result<impl IntoResponse, ApiError> {
    let req = AddInsultRequest::from_input(&input).map_err(bad_request)?;

    let submitter = run_blocking(&state, move |store| store.get_submitter_by_userid(&identity))
        .await?
        .ok_or(ApiError::NotFound)?;

    let insult = admit(&state, req.content, Some(submitter.sid)).await?;
    Ok(created(insult))
}

/// GET /api/insults — filter on `iid`, `content`, `used`, `by`.
pub async fn list_insults(
    State(state): State<AppState>,
    RequestInput(input): RequestInput,
) -> Result<Json<Vec<Insult>>, ApiError> {
    let filter = build_filter(&input, INSULT_SCHEMA);
    let rows = run_blocking(&state, move |store| store.find_insults(&filter)).await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(rows.into_iter().map(insult_from_row).collect()))
}

/// GET /api/insults/{iid}
pub async fn get_insult(
    State(state): State<AppState>,
    Path(iid): Path<i64>,
) -> Result<Json<Insult>, ApiError> {
    let row = run_blocking(&state, move |store| store.get_insult(iid))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(insult_from_row(row)))
}

/// DELETE /api/insults/{iid}
pub async fn delete_insult(
    State(state): State<AppState>,
    Path(iid): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let row = run_blocking(&state, move |store| store.delete_insult(iid))
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Deleted insult {}: {:?}", row.iid, row.content);
    Ok(StatusCode::NO_CONTENT)
}

/// Checks `content` against every stored insult and inserts it if nothing
/// is too similar. The check is global even for submitter-scoped creation.
///
/// The corpus read and the insert are separate statements, so two
/// near-identical concurrent requests can both get through.
async fn admit(state: &AppState, content: String, by: Option<i64>) -> Result<Insult, ApiError> {
    let gate = state.gate;
    let admission = run_blocking(state, move |store| {
        let corpus = store.insult_contents()?;
        match gate.accept(&content, &corpus) {
            Decision::Accept => Ok(Admission::Created(store.create_insult(&content, by)?)),
            Decision::Reject { matched, score } => Ok(Admission::Duplicate { matched, score }),
        }
    })
    .await?;

    match admission {
        Admission::Created(row) => {
            info!("Created insult {} (by {:?})", row.iid, row.by);
            Ok(insult_from_row(row))
        }
        Admission::Duplicate { matched, score } => {
            info!("Rejected duplicate insult, {:.3} similar to {:?}", score, matched);
            Err(ApiError::Conflict(matched))
        }
    }
}

fn created(insult: Insult) -> impl IntoResponse {
    let location = format!("/api/insults/{}", insult.iid);
    (StatusCode::CREATED, [(header::LOCATION, location)], Json(insult))
}

fn bad_request(err: AddInsultError) -> ApiError {
    let msg = match err {
        AddInsultError::MissingContent => "Missing content".to_string(),
        AddInsultError::ContentTooLong => {
            format!("Content longer than {} characters", MAX_CONTENT_LEN)
        }
        AddInsultError::InvalidSubmitter => "Field 'by' must be a submitter id".to_string(),
    };
    ApiError::BadRequest(msg)
}
