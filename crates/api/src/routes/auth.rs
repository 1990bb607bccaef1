//! Account route handlers (JSON).

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, MembershipTier, User};
use crate::services::auth::AuthService;
use crate::services::membership::effective_tier;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The logged-in user's profile and plan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub tier: Option<MembershipTier>,
}

fn session_error(e: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    set_current_user(session, &current)
        .await
        .map_err(session_error)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

async fn profile(state: &AppState, user: User) -> Result<Profile> {
    let tier = effective_tier(state.stores().tiers.as_ref(), user.membership_tier).await?;
    Ok(Profile { user, tier })
}

/// `POST /api/auth/register`
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Profile>)> {
    let user = AuthService::new(state.stores(), state.email())
        .register(&body.email, &body.password, &body.name)
        .await?;
    start_session(&session, &user).await?;

    Ok((StatusCode::CREATED, Json(profile(&state, user).await?)))
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Profile>> {
    let user = AuthService::new(state.stores(), state.email())
        .login(&body.email, &body.password)
        .await?;
    start_session(&session, &user).await?;

    Ok(Json(profile(&state, user).await?))
}

/// `POST /api/auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await.map_err(session_error)?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Profile>> {
    let Some(user) = state.stores().users.get_user(current.id).await? else {
        // Account removed while the session was alive
        clear_current_user(&session).await.map_err(session_error)?;
        return Err(AppError::Unauthorized("Not authenticated".to_owned()));
    };

    Ok(Json(profile(&state, user).await?))
}
