use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use crate::{error::ApiError, state::AppState};

/// Header carrying the credential token.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Identity attached to the request by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
}

impl AuthRejection {
    fn message(self) -> &'static str {
        match self {
            AuthRejection::MissingToken => "No token, authorization denied",
            AuthRejection::InvalidToken => "Invalid token",
        }
    }
}

impl From<AuthRejection> for ApiError {
    fn from(r: AuthRejection) -> Self {
        ApiError::Unauthenticated(r.message())
    }
}

/// Resolves the caller's identity from request headers. Never touches the store.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, AuthRejection> {
    let raw = headers
        .get(TOKEN_HEADER)
        .ok_or(AuthRejection::MissingToken)?;
    let token = raw
        .to_str()
        .map_err(|_| {
            warn!("token header is not visible ascii");
            AuthRejection::InvalidToken
        })?
        .trim();
    if token.is_empty() {
        return Err(AuthRejection::MissingToken);
    }

    match keys.verify(token) {
        Ok(claims) => Ok(AuthUser(claims.sub)),
        Err(TokenError::Expired) => {
            debug!("token expired");
            Err(AuthRejection::InvalidToken)
        }
        Err(e) => {
            warn!(error = %e, "token rejected");
            Err(AuthRejection::InvalidToken)
        }
    }
}

/// Rejects the request with 401 unless it carries a valid token; otherwise
/// stores [`AuthUser`] in the request extensions and runs the next handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(req.headers(), &state.keys)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::HeaderValue;
    use time::OffsetDateTime;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 5,
        })
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        let err = authenticate(&HeaderMap::new(), &keys("s")).unwrap_err();
        assert_eq!(err, AuthRejection::MissingToken);
    }

    #[test]
    fn empty_header_counts_as_missing() {
        let err = authenticate(&headers_with(""), &keys("s")).unwrap_err();
        assert_eq!(err, AuthRejection::MissingToken);
    }

    #[test]
    fn foreign_token_is_invalid() {
        let token = keys("other").issue(Uuid::new_v4()).unwrap();
        let err = authenticate(&headers_with(&token), &keys("s")).unwrap_err();
        assert_eq!(err, AuthRejection::InvalidToken);
    }

    #[test]
    fn unreadable_header_is_invalid_not_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_bytes(b"\xfftoken").unwrap());
        let err = authenticate(&headers, &keys("s")).unwrap_err();
        assert_eq!(err, AuthRejection::InvalidToken);
    }

    #[test]
    fn expired_token_is_invalid() {
        let k = keys("s");
        let issued = OffsetDateTime::now_utc() - time::Duration::minutes(10);
        let token = k.issue_at(Uuid::new_v4(), issued).unwrap();
        let err = authenticate(&headers_with(&token), &k).unwrap_err();
        assert_eq!(err, AuthRejection::InvalidToken);
    }

    #[test]
    fn valid_token_yields_identity() {
        let k = keys("s");
        let user_id = Uuid::new_v4();
        let token = k.issue(user_id).unwrap();
        let user = authenticate(&headers_with(&token), &k).unwrap();
        assert_eq!(user, AuthUser(user_id));
    }

    #[test]
    fn rejection_messages() {
        assert!(matches!(
            ApiError::from(AuthRejection::MissingToken),
            ApiError::Unauthenticated("No token, authorization denied")
        ));
        assert!(matches!(
            ApiError::from(AuthRejection::InvalidToken),
            ApiError::Unauthenticated("Invalid token")
        ));
    }
}
