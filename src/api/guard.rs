//! Bearer-token gate for protected routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Validate the bearer token and attach its claims to the request.
///
/// Absent, malformed, expired or foreign-signed tokens are rejected with 401
/// before the handler runs. Role checks are left to the handlers.
pub async fn require_bearer(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(|| {
        AppError::Unauthorized("missing or malformed authorization header".to_string())
    })?;

    let claims = state.services.tokens.verify(bearer.token())?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
