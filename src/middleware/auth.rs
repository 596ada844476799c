use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::config::Config;
use crate::error::AppError;
use crate::utils::verify_token;

/// Session-token verification for routes that act on behalf of a user.
/// The gating pipeline only checks that a bearer token is present; this is
/// where the signature and expiry are actually verified.
pub async fn session_auth(
    State(config): State<Arc<Config>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    let claims = verify_token(bearer.token(), &config)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
