use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppError,
    models::ask::{Ask, CreateAsk},
    store,
    token::AuthUser,
    AppState,
};

/// Creates an ask. A blank title is replaced by a label derived from the
/// video's transcript, which never fails the request.
pub async fn create_ask(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateAsk>,
) -> Result<(StatusCode, Json<Ask>), AppError> {
    let video_url = payload.video_url.trim();
    if video_url.is_empty() {
        return Err(AppError::BadRequest("video_url is required".to_string()));
    }

    let title = match payload.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => state.labeler.derive_label(video_url).await,
    };

    let ask = store::insert_ask(&state.db, identity.id, &title, video_url).await?;
    Ok((StatusCode::CREATED, Json(ask)))
}

pub async fn list_asks(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<Ask>>, AppError> {
    Ok(Json(store::list_asks(&state.db, identity.id).await?))
}
