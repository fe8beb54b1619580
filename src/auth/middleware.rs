// Identity middleware and access guards
//
// `identify` runs on every request and never rejects: it attaches a
// `RequestContext` whose identity is `None` when the header is missing or the
// token does not verify. Rejection happens later, in the guards. The admin
// guard reads role and active flag from the stored user, never from the token.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use tracing::debug;

use crate::auth::models::{Identity, Role, User};
use crate::error::ApiError;
use crate::AppState;

/// Per-request context attached by `identify`
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub identity: Option<Identity>,
}

/// Extract the token from an authorization header value
///
/// The token is the second space-separated segment, as in `Bearer <token>`.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .split(' ')
        .nth(1)
        .filter(|token| !token.is_empty())
}

/// Attach the caller's identity (if any) to the request
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .and_then(|token| state.auth.identify(token));

    if let Some(identity) = &identity {
        debug!("Request identified as user {}", identity.id);
    }

    request.extensions_mut().insert(RequestContext { identity });
    next.run(request).await
}

/// Passes when an identity is attached
pub fn is_logged_in(identity: Option<&Identity>) -> Result<&Identity, ApiError> {
    identity.ok_or_else(|| ApiError::Unauthorized("Un-Authorized".to_string()))
}

/// Passes when the stored user is an active admin; a missing user counts as non-admin
pub fn is_admin(user: Option<&User>) -> Result<&User, ApiError> {
    match user {
        Some(user) if user.role == Role::Admin && user.active => Ok(user),
        Some(user) => Err(ApiError::Forbidden(format!(
            "User {} is not allowed to access this resource",
            user.username
        ))),
        None => Err(ApiError::Forbidden(
            "Admin privileges are required".to_string(),
        )),
    }
}

fn current_identity(request: &Request) -> Option<&Identity> {
    request
        .extensions()
        .get::<RequestContext>()
        .and_then(|context| context.identity.as_ref())
}

/// Route guard rejecting requests without an identity (401)
pub async fn require_login(request: Request, next: Next) -> Result<Response, ApiError> {
    is_logged_in(current_identity(&request))?;
    Ok(next.run(request).await)
}

/// Route guard rejecting callers whose stored account is not an active admin (403)
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match current_identity(&request) {
        Some(identity) => state.users.find_by_id(identity.id).await?,
        None => None,
    };
    is_admin(user.as_ref())?;
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Handlers take `Identity` to receive the logged-in caller
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<RequestContext>()
            .and_then(|context| context.identity.as_ref());

        is_logged_in(identity).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use chrono::Utc;

    fn identity() -> Identity {
        Identity {
            id: 1,
            username: "someone".to_string(),
        }
    }

    fn stored_user(role: Role, active: bool) -> User {
        User {
            id: 1,
            username: "someone".to_string(),
            password_hash: "hash".to_string(),
            role,
            active,
            created_at: Utc::now(),
        }
    }

    fn parts_with_context(context: Option<RequestContext>) -> Parts {
        let mut request = HttpRequest::builder().uri("/").body(()).unwrap();
        if let Some(context) = context {
            request.extensions_mut().insert(context);
        }
        request.into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("token_without_scheme"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn test_is_logged_in() {
        let caller = identity();
        assert!(is_logged_in(Some(&caller)).is_ok());
        assert!(matches!(is_logged_in(None), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_is_admin() {
        let admin = stored_user(Role::Admin, true);
        let user = stored_user(Role::User, true);
        let disabled_admin = stored_user(Role::Admin, false);

        assert!(is_admin(Some(&admin)).is_ok());
        assert!(matches!(is_admin(Some(&user)), Err(ApiError::Forbidden(_))));
        assert!(matches!(is_admin(Some(&disabled_admin)), Err(ApiError::Forbidden(_))));
        assert!(matches!(is_admin(None), Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_identity_extractor_requires_identity() {
        let mut missing = parts_with_context(None);
        let result = Identity::from_request_parts(&mut missing, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));

        let mut anonymous = parts_with_context(Some(RequestContext::default()));
        let result = Identity::from_request_parts(&mut anonymous, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));

        let mut known = parts_with_context(Some(RequestContext {
            identity: Some(identity()),
        }));
        let result = Identity::from_request_parts(&mut known, &()).await.unwrap();
        assert_eq!(result.username, "someone");
    }

    #[tokio::test]
    async fn test_request_context_defaults_to_anonymous() {
        let mut parts = parts_with_context(None);
        let context = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(context.identity.is_none());
    }
}
