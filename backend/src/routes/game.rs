use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use skyhunt_common::{GameResponse, PhotoVerdict, SubmitPhotoRequest};

use crate::auth::AuthUser;
use crate::error::{GameError, Result};
use crate::game::Submission;
use crate::AppState;

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser> {
    state.session.authenticate(headers).map_err(|e| {
        tracing::debug!(error = %e, "Rejected game request");
        GameError::Unauthorized(e.to_string())
    })
}

/// GET /game/getprompt - the player's active prompt (empty when none)
async fn get_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<GameResponse<String>>> {
    let user = authenticate(&state, &headers)?;
    let prompt = state.game.current_prompt(&user.id).await?;
    Ok(Json(GameResponse::ok(prompt)))
}

/// POST /game/makeprompt - issue a new challenge
async fn make_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<GameResponse<String>>> {
    let user = authenticate(&state, &headers)?;
    let prompt = state.game.make_prompt(&user.id).await?;
    Ok(Json(GameResponse::ok(prompt)))
}

/// GET /game/getpoints - the player's total
async fn get_points(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<GameResponse<u64>>> {
    let user = authenticate(&state, &headers)?;
    let points = state.game.points(&user.id).await?;
    Ok(Json(GameResponse::ok(points)))
}

/// POST /game/submitphoto - judge a photo against the active prompt
async fn submit_photo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: std::result::Result<Json<SubmitPhotoRequest>, JsonRejection>,
) -> Result<Json<GameResponse<PhotoVerdict>>> {
    let user = authenticate(&state, &headers)?;
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => recover_body(&state, &headers, rejection)?,
    };

    let response = match state.game.submit_photo(&user.id, request.photo.as_deref()).await? {
        Submission::Valid { total, .. } => GameResponse::ok(PhotoVerdict::Valid).with_total(total),
        Submission::Invalid => GameResponse::ok(PhotoVerdict::Invalid),
    };
    Ok(Json(response))
}

/// A bare request with no body is a missing photo; anything else that is not
/// a readable JSON body is reported as such.
fn recover_body(
    state: &AppState,
    headers: &HeaderMap,
    rejection: JsonRejection,
) -> Result<SubmitPhotoRequest> {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Err(GameError::PayloadTooLarge(body_limit(state)));
    }

    let bodyless = matches!(rejection, JsonRejection::MissingJsonContentType(_))
        && !headers.contains_key(header::CONTENT_TYPE);
    if bodyless {
        return Ok(SubmitPhotoRequest::default());
    }

    tracing::debug!(error = %rejection.body_text(), "Rejected photo submission body");
    Err(GameError::InvalidInput(rejection.body_text()))
}

/// base64 inflates the photo by a third, plus room for the JSON envelope.
fn body_limit(state: &AppState) -> usize {
    state.config.game.max_photo_bytes / 3 * 4 + 64 * 1024
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = body_limit(&state);

    Router::new()
        .route("/getprompt", get(get_prompt))
        .route("/makeprompt", post(make_prompt))
        .route("/getpoints", get(get_points))
        .route("/submitphoto", post(submit_photo))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
