//! Bearer-token authentication middleware
//!
//! Resolves the `Authorization` header to a [`User`], checks it against the
//! configured [`Authorizer`](movie_common::api::Authorizer) and stores the
//! user in request extensions for handlers to extract.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use movie_common::api::AccessToken;
use movie_common::{Error, User};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// **Note:** Applied to `/api/v1` routes only. `/health` does NOT use it.
pub async fn access_token_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthenticated("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| Error::Unauthenticated("Authorization header is not valid ASCII".to_string()))?;

    let token = AccessToken::parse_authorization(header)?;
    let user: User = state.token_converter.convert(&token).await?;

    state
        .authorizer
        .authorize(&user, request.method().as_str(), request.uri().path())?;

    debug!(
        email = %user.email,
        method = %request.method(),
        path = %request.uri().path(),
        "Authorized request"
    );

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
