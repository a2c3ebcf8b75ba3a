use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::service::persistence::Session;

/// Header carrying the uid of the signed-in user, set by the auth layer in front of us.
pub const SESSION_HEADER: &str = "x-session-uid";

/// The caller's session, if the request carries one.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(|uid| Session {
                uid: uid.to_string(),
            });
        Ok(Self(session))
    }
}
