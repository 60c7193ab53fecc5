use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json, State};
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::routes::body;
use crate::types::{request, response};
use crate::utils::auth::BearerToken;

#[instrument(skip_all)]
pub(crate) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<request::LoginData>, JsonRejection>,
) -> Result<Json<response::TokenPair>, Error> {
    let data = body(payload)?;

    let tokens = state.session.login(&data.username, &data.password).await?;

    Ok(Json(tokens))
}

#[instrument(skip_all)]
pub(crate) async fn refresh(
    State(state): State<AppState>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<response::TokenPair>, Error> {
    Ok(Json(state.session.refresh(&token).await?))
}

#[instrument(skip_all)]
pub(crate) async fn logout(
    State(state): State<AppState>,
    payload: Result<Json<request::LogoutData>, JsonRejection>,
) -> Result<Json<response::Message>, Error> {
    let token = payload
        .ok()
        .and_then(|Json(data)| data.refresh_token)
        .filter(|token| !token.trim().is_empty())
        .ok_or(Error::MissingRefreshToken)?;

    state.session.logout(&token).await?;

    Ok(Json(response::Message::new("Logged out successfully")))
}
