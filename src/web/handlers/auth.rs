//! Authentication handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::AppState;
use crate::auth::{authenticate, register as register_user, RegistrationRequest};
use crate::db::UserRepository;
use crate::web::dto::{
    ApiResponse, LoginRequest, LoginResponse, RegisterRequest, UserInfo, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/auth/register - Create a student or recruiter account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let mut request = RegistrationRequest::new(req.fullname.trim(), req.email.trim(), req.password);
    if let Some(role) = req.role {
        request = request.with_role(role);
    }

    let user = register_user(&UserRepository::new(&state.pool), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserInfo::from(&user))),
    ))
}

/// POST /api/auth/login - Issue an access token.
///
/// The token is returned in the body and set as an HttpOnly cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    let user =
        authenticate(&UserRepository::new(&state.pool), req.email.trim(), &req.password).await?;

    let access_token = state.generate_access_token(&user)?;
    let cookie = Cookie::build((state.cookie_name.clone(), access_token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");

    tracing::info!(user_id = user.id, "User logged in");

    let response = LoginResponse {
        access_token,
        expires_in: state.access_token_expiry,
        user: UserInfo::from(&user),
    };
    Ok((jar.add(cookie), Json(ApiResponse::new(response))))
}

/// POST /api/auth/logout - Clear the token cookie.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let cookie = Cookie::build((state.cookie_name.clone(), "")).path("/");
    (jar.remove(cookie), Json(ApiResponse::new(())))
}

/// GET /api/auth/me - Current user.
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = UserRepository::new(&state.pool)
        .get_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    Ok(Json(ApiResponse::new(UserInfo::from(&user))))
}
